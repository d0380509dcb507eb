//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Timing wheel delay queue
//!
//! The wheel is a fixed ring of `N` buckets with a cursor that moves one bucket per
//! tick. A callback due in `d` ticks lands in bucket `(cursor + d) mod N` and carries a
//! pass count of `(d - 1) div N`, the number of times the cursor will visit that bucket
//! before the callback is due. Each visit to a bucket decrements the pass count of the
//! entries that are not yet due and reports the rest.
//!
//! ```text
//!            cursor
//!              v
//!   +----+----+----+----+----+----+----+----+
//!   | b0 | b1 | b2 | b3 | b4 | b5 | b6 | b7 |    N = 8
//!   +----+----+----+----+----+----+----+----+
//!                          ^
//!              enqueue(delay = 10): bucket (2 + 10) mod 8 = 4, passes 9 div 8 = 1
//! ```
//!
//! Every callback is also linked into the list of its [`Owner`], so all callbacks of a
//! connection or session can be cancelled in one call when the owner goes away.
//!
//! The wheel never runs callbacks itself. [`TimingWheel::advance`] returns a snapshot of
//! due ids; the caller fires each id that is still scheduled and then decides whether
//! to dequeue it. Dequeueing inside that loop is always safe.

use crate::error::ScheduleError;
use crate::types::{ConnectionId, SessionId};
use std::collections::HashMap;
use std::fmt;
use tracing::{error, trace, warn};

/// Handle to a scheduled callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(u64);

impl EventId {
    /// Get the underlying u64 value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "event-{}", self.0)
    }
}

/// The entity a callback belongs to
///
/// Owners are plain keys; the wheel never dereferences them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Owner {
    /// No owner. Never accepted by the wheel.
    None,
    /// Server wide maintenance
    Global,
    /// A client connection
    Connection(ConnectionId),
    /// A player session
    Session(SessionId),
}

/// A scheduled callback
#[derive(Debug, Clone)]
pub struct TimedEvent<K> {
    kind: K,
    owner: Owner,
    bucket: usize,
    passes: u64,
}

impl<K: Copy> TimedEvent<K> {
    /// What the callback does
    pub fn kind(&self) -> K {
        self.kind
    }

    /// Who the callback belongs to
    pub fn owner(&self) -> Owner {
        self.owner
    }

    /// Bucket the callback is linked into
    pub fn bucket(&self) -> usize {
        self.bucket
    }

    /// Remaining revolutions before the callback is due
    pub fn passes(&self) -> u64 {
        self.passes
    }
}

/// Fixed width delay queue
#[derive(Debug)]
pub struct TimingWheel<K> {
    buckets: Vec<Vec<EventId>>,
    events: HashMap<EventId, TimedEvent<K>>,
    owners: HashMap<Owner, Vec<EventId>>,
    cursor: usize,
    next_id: u64,
}

impl<K> TimingWheel<K>
where
    K: Copy + PartialEq + fmt::Debug,
{
    /// Create a wheel with `size` buckets. A size of zero is treated as one.
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            buckets: vec![Vec::new(); size],
            events: HashMap::new(),
            owners: HashMap::new(),
            cursor: 0,
            next_id: 1,
        }
    }

    /// Number of buckets
    pub fn size(&self) -> usize {
        self.buckets.len()
    }

    /// Bucket the cursor currently points at
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of scheduled callbacks
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True when nothing is scheduled
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Schedule `kind` to fire `delay` ticks from now on behalf of `owner`.
    ///
    /// A delay below one is clamped to one; a callback can never fire on the tick that
    /// scheduled it.
    ///
    /// # Errors
    /// [`ScheduleError::Unowned`] when `owner` is [`Owner::None`].
    pub fn enqueue(&mut self, kind: K, owner: Owner, delay: i64) -> Result<EventId, ScheduleError> {
        if owner == Owner::None {
            error!(?kind, "Refusing to enqueue an event without an owner");
            return Err(ScheduleError::Unowned);
        }
        let delay = Self::clamp(kind, delay);
        let id = EventId(self.next_id);
        self.next_id += 1;

        let (bucket, passes) = self.placement(delay);
        self.buckets[bucket].push(id);
        self.owners.entry(owner).or_default().push(id);
        self.events.insert(
            id,
            TimedEvent {
                kind,
                owner,
                bucket,
                passes,
            },
        );
        trace!(%id, ?kind, ?owner, delay, bucket, passes, "Enqueued event");
        Ok(id)
    }

    /// Schedule a server wide callback.
    pub fn register_global(&mut self, kind: K, delay: i64) -> Result<EventId, ScheduleError> {
        self.enqueue(kind, Owner::Global, delay)
    }

    /// Schedule a callback owned by a connection or session.
    pub fn register_owned(
        &mut self,
        owner: Owner,
        kind: K,
        delay: i64,
    ) -> Result<EventId, ScheduleError> {
        self.enqueue(kind, owner, delay)
    }

    /// Move a scheduled callback so that it fires `delay` ticks from now.
    pub fn reschedule(&mut self, id: EventId, delay: i64) -> Result<(), ScheduleError> {
        let Some(event) = self.events.get(&id) else {
            return Err(ScheduleError::NotScheduled(id));
        };
        let delay = Self::clamp(event.kind, delay);
        let old_bucket = event.bucket;
        let (bucket, passes) = self.placement(delay);

        self.buckets[old_bucket].retain(|entry| *entry != id);
        self.buckets[bucket].push(id);
        if let Some(event) = self.events.get_mut(&id) {
            event.bucket = bucket;
            event.passes = passes;
        }
        Ok(())
    }

    /// Remove a callback from its bucket and from its owner list.
    ///
    /// Returns false if the callback was not scheduled; calling it twice is harmless.
    pub fn dequeue(&mut self, id: EventId) -> bool {
        let Some(event) = self.events.remove(&id) else {
            return false;
        };
        self.buckets[event.bucket].retain(|entry| *entry != id);
        if let Some(list) = self.owners.get_mut(&event.owner) {
            list.retain(|entry| *entry != id);
            if list.is_empty() {
                self.owners.remove(&event.owner);
            }
        }
        trace!(%id, kind = ?event.kind, "Dequeued event");
        true
    }

    /// Remove every callback belonging to `owner`. Returns how many were removed.
    pub fn dequeue_owner(&mut self, owner: Owner) -> usize {
        let ids = self.owners.remove(&owner).unwrap_or_default();
        for id in &ids {
            if let Some(event) = self.events.remove(id) {
                self.buckets[event.bucket].retain(|entry| entry != id);
            }
        }
        ids.len()
    }

    /// Remove every callback of `kind` belonging to `owner`. Returns how many were removed.
    pub fn strip(&mut self, owner: Owner, kind: K) -> usize {
        let matching: Vec<EventId> = self
            .events_of(owner)
            .iter()
            .copied()
            .filter(|id| self.events.get(id).is_some_and(|event| event.kind == kind))
            .collect();
        for id in &matching {
            self.dequeue(*id);
        }
        matching.len()
    }

    /// First callback of `kind` belonging to `owner`.
    pub fn find(&self, owner: Owner, kind: K) -> Option<EventId> {
        self.events_of(owner)
            .iter()
            .copied()
            .find(|id| self.events.get(id).is_some_and(|event| event.kind == kind))
    }

    /// Callbacks belonging to `owner`, in scheduling order.
    pub fn events_of(&self, owner: Owner) -> &[EventId] {
        self.owners.get(&owner).map_or(&[], Vec::as_slice)
    }

    /// Look up a scheduled callback.
    pub fn get(&self, id: EventId) -> Option<&TimedEvent<K>> {
        self.events.get(&id)
    }

    /// True while the callback is linked into the wheel.
    pub fn is_scheduled(&self, id: EventId) -> bool {
        self.events.contains_key(&id)
    }

    /// Move the cursor one bucket forward and report the callbacks that are now due.
    ///
    /// Callbacks in the new bucket with passes left have their count decremented and
    /// stay put. Due callbacks are not removed; the caller fires them and dequeues those
    /// that do not persist themselves.
    pub fn advance(&mut self) -> Vec<EventId> {
        self.cursor = (self.cursor + 1) % self.buckets.len();
        let mut due = Vec::new();
        for id in &self.buckets[self.cursor] {
            if let Some(event) = self.events.get_mut(id) {
                if event.passes > 0 {
                    event.passes -= 1;
                } else {
                    due.push(*id);
                }
            }
        }
        due
    }

    fn clamp(kind: K, delay: i64) -> u64 {
        if delay < 1 {
            warn!(?kind, delay, "Event delay below one tick, clamping to one");
            1
        } else {
            delay.unsigned_abs()
        }
    }

    fn placement(&self, delay: u64) -> (usize, u64) {
        let size = self.buckets.len() as u64;
        let bucket = (self.cursor as u64 + delay) % size;
        let passes = (delay - 1) / size;
        (bucket as usize, passes)
    }
}
