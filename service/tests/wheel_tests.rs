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

//! Property tests for the timing wheel

use proptest::prelude::*;
use pulsemud_service::{ConnectionId, EventKind, Owner, TimingWheel};

/// Advance until the event comes due and return how many ticks that took
fn ticks_until_due(wheel: &mut TimingWheel<EventKind>, limit: u64) -> Option<u64> {
    for tick in 1..=limit {
        if !wheel.advance().is_empty() {
            return Some(tick);
        }
    }
    None
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn fires_exactly_after_delay(size in 1usize..64, delay in 1i64..500, skew in 0usize..64) {
        let mut wheel = TimingWheel::new(size);
        for _ in 0..skew {
            wheel.advance();
        }
        wheel.register_global(EventKind::GameTick, delay).unwrap();
        prop_assert_eq!(ticks_until_due(&mut wheel, 1000), Some(delay as u64));
    }

    #[test]
    fn reschedule_moves_due_tick(size in 1usize..32, first in 1i64..100, second in 1i64..100) {
        let mut wheel = TimingWheel::new(size);
        let id = wheel.register_global(EventKind::GameTick, first).unwrap();
        wheel.reschedule(id, second).unwrap();
        prop_assert_eq!(ticks_until_due(&mut wheel, 500), Some(second as u64));
    }

    #[test]
    fn owner_lists_track_dequeues(count in 1usize..20, remove in 0usize..20) {
        let mut wheel = TimingWheel::new(16);
        let owner = Owner::Connection(ConnectionId::new(1));
        let ids: Vec<_> = (0..count)
            .map(|n| wheel.register_owned(owner, EventKind::ConnectionIdle, n as i64 + 1).unwrap())
            .collect();
        let removed = remove.min(count);
        for id in &ids[..removed] {
            prop_assert!(wheel.dequeue(*id));
        }
        prop_assert_eq!(wheel.events_of(owner).len(), count - removed);
        prop_assert_eq!(wheel.len(), count - removed);
        prop_assert_eq!(wheel.dequeue_owner(owner), count - removed);
        prop_assert!(wheel.is_empty());
    }
}

#[test]
fn test_due_events_stay_until_dequeued() {
    let mut wheel = TimingWheel::new(4);
    let id = wheel.register_global(EventKind::GameTick, 2).unwrap();
    assert!(wheel.advance().is_empty());
    assert_eq!(wheel.advance(), vec![id]);
    assert!(wheel.is_scheduled(id));
    assert!(wheel.dequeue(id));
    assert!(!wheel.dequeue(id));
}

#[test]
fn test_unowned_event_rejected() {
    let mut wheel = TimingWheel::new(4);
    assert!(wheel.enqueue(EventKind::GameTick, Owner::None, 3).is_err());
    assert!(wheel.is_empty());
}
