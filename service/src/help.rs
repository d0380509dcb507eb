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

//! Help files
//!
//! Every regular file in the help directory is one entry, keyed by its upper-cased
//! file name. Entries are reloaded on lookup when the file on disk is newer than the
//! loaded copy, so help text can be edited while the server runs.

use crate::{Result, ServerError};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info, warn};

/// Keyword of the text sent to new connections
pub const GREETING: &str = "GREETING";

/// Keyword of the message of the day
pub const MOTD: &str = "MOTD";

const DEFAULT_GREETING: &str = "\r\nWelcome to PulseMUD!\r\n\r\n";

/// A loaded help entry
#[derive(Debug, Clone)]
pub struct HelpEntry {
    keyword: String,
    path: PathBuf,
    text: String,
    loaded_at: SystemTime,
}

impl HelpEntry {
    /// Upper-cased keyword
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// Entry text with CR LF line endings
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// The set of loaded help entries
#[derive(Debug, Clone)]
pub struct HelpLibrary {
    dir: PathBuf,
    max_len: usize,
    entries: Vec<HelpEntry>,
    greeting: String,
    motd: String,
}

impl HelpLibrary {
    /// Create an empty library reading from `dir`
    ///
    /// Entries longer than `max_len` bytes after line ending conversion are refused.
    pub fn new(dir: impl Into<PathBuf>, max_len: usize) -> Self {
        Self {
            dir: dir.into(),
            max_len,
            entries: Vec::new(),
            greeting: DEFAULT_GREETING.to_string(),
            motd: String::new(),
        }
    }

    /// Create a library and load every entry in `dir`
    pub fn load(dir: impl Into<PathBuf>, max_len: usize) -> Result<Self> {
        let mut library = Self::new(dir, max_len);
        library.load_all()?;
        Ok(library)
    }

    /// Load every file in the help directory, replacing what was loaded before.
    ///
    /// Unreadable entries are logged and skipped. Returns how many were loaded.
    pub fn load_all(&mut self) -> Result<usize> {
        info!(dir = %self.dir.display(), "Loading help files");
        self.entries.clear();
        for dir_entry in std::fs::read_dir(&self.dir)? {
            let path = dir_entry?.path();
            if !path.is_file() {
                continue;
            }
            let Some(keyword) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            let keyword = keyword.to_ascii_uppercase();
            match read_entry(&path, self.max_len) {
                Ok(text) => {
                    self.insert(keyword, path, text);
                }
                Err(err) => warn!(path = %path.display(), error = %err, "Skipping help file"),
            }
        }
        debug!(count = self.entries.len(), "Help files loaded");
        Ok(self.entries.len())
    }

    fn insert(&mut self, keyword: String, path: PathBuf, text: String) -> usize {
        if keyword == GREETING {
            self.greeting = text.clone();
        } else if keyword == MOTD {
            self.motd = text.clone();
        }
        self.entries.push(HelpEntry {
            keyword,
            path,
            text,
            loaded_at: SystemTime::now(),
        });
        self.entries.len() - 1
    }

    /// Text sent to every new connection
    pub fn greeting(&self) -> &str {
        &self.greeting
    }

    /// Message of the day sent on entering the game
    pub fn motd(&self) -> &str {
        &self.motd
    }

    /// Loaded keywords in load order
    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.keyword.as_str())
    }

    /// Number of loaded entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing is loaded
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find the entry whose keyword starts with `topic`, ignoring case.
    ///
    /// A matching entry is reloaded first if its file changed since it was loaded. When
    /// nothing matches, a file named after the topic is loaded on demand.
    pub fn lookup(&mut self, topic: &str) -> Option<&HelpEntry> {
        let topic = topic.trim().to_ascii_uppercase();
        if topic.is_empty() {
            return None;
        }

        let index = match self
            .entries
            .iter()
            .position(|entry| entry.keyword.starts_with(&topic))
        {
            Some(index) => {
                self.refresh(index);
                index
            }
            None => {
                if !is_valid_topic(&topic) {
                    debug!(keyword = %topic, "Refusing help topic outside the help directory");
                    return None;
                }
                let path = self.dir.join(&topic);
                let text = read_entry(&path, self.max_len).ok()?;
                debug!(keyword = %topic, "Loaded help file on demand");
                self.insert(topic, path, text)
            }
        };
        self.entries.get(index)
    }

    fn refresh(&mut self, index: usize) {
        let Some(entry) = self.entries.get_mut(index) else {
            return;
        };
        let modified = std::fs::metadata(&entry.path).and_then(|meta| meta.modified());
        if !matches!(modified, Ok(modified) if modified > entry.loaded_at) {
            return;
        }
        match read_entry(&entry.path, self.max_len) {
            Ok(text) => {
                debug!(keyword = %entry.keyword, "Reloaded help file");
                entry.text = text;
                entry.loaded_at = SystemTime::now();
            }
            Err(err) => warn!(keyword = %entry.keyword, error = %err, "Keeping stale help file"),
        }
    }
}

/// Topics loaded on demand name a file directly inside the help directory
fn is_valid_topic(topic: &str) -> bool {
    topic
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Read a help file, converting line endings to CR LF
fn read_entry(path: &Path, max_len: usize) -> Result<String> {
    let raw = std::fs::read_to_string(path)?;
    let mut text = String::with_capacity(raw.len() + raw.len() / 16);
    for c in raw.chars() {
        match c {
            '\r' => {}
            '\n' => text.push_str("\r\n"),
            c => text.push(c),
        }
    }
    if text.len() > max_len {
        return Err(ServerError::Help(format!(
            "{} is {} bytes, limit {}",
            path.display(),
            text.len(),
            max_len
        )));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn write(dir: &Path, name: &str, text: &str) {
        std::fs::write(dir.join(name), text).unwrap();
    }

    #[test]
    fn test_load_all_and_specials() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "GREETING", "Hello\n");
        write(dir.path(), "MOTD", "Be nice\r\n");
        write(dir.path(), "help", "Try harder\n");
        std::fs::create_dir(dir.path().join("drafts")).unwrap();

        let library = HelpLibrary::load(dir.path(), 1024).unwrap();
        assert_eq!(library.len(), 3);
        assert_eq!(library.greeting(), "Hello\r\n");
        assert_eq!(library.motd(), "Be nice\r\n");
        assert!(library.keywords().any(|keyword| keyword == "HELP"));
    }

    #[test]
    fn test_missing_greeting_uses_default() {
        let dir = tempfile::tempdir().unwrap();
        let library = HelpLibrary::load(dir.path(), 1024).unwrap();
        assert!(library.is_empty());
        assert!(library.greeting().contains("PulseMUD"));
        assert_eq!(library.motd(), "");
    }

    #[test]
    fn test_oversized_entry_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "BIG", &"x".repeat(64));
        write(dir.path(), "SMALL", "ok");
        let library = HelpLibrary::load(dir.path(), 32).unwrap();
        assert_eq!(library.keywords().collect::<Vec<_>>(), vec!["SMALL"]);
    }

    #[test]
    fn test_lookup_by_prefix() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "COMMANDS", "list\n");
        let mut library = HelpLibrary::load(dir.path(), 1024).unwrap();

        let entry = library.lookup("com").unwrap();
        assert_eq!(entry.keyword(), "COMMANDS");
        assert_eq!(entry.text(), "list\r\n");
        assert!(library.lookup("zzz").is_none());
        assert!(library.lookup("").is_none());
    }

    #[test]
    fn test_lookup_loads_unseen_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut library = HelpLibrary::load(dir.path(), 1024).unwrap();
        write(dir.path(), "NEWBIE", "Welcome\n");

        let entry = library.lookup("newbie").unwrap();
        assert_eq!(entry.text(), "Welcome\r\n");
        assert_eq!(library.len(), 1);
    }

    #[test]
    fn test_lookup_reloads_newer_file() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "RULES", "old\n");
        let mut library = HelpLibrary::load(dir.path(), 1024).unwrap();

        write(dir.path(), "RULES", "new\n");
        let file = std::fs::File::options()
            .write(true)
            .open(dir.path().join("RULES"))
            .unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(60))
            .unwrap();

        assert_eq!(library.lookup("RULES").unwrap().text(), "new\r\n");
    }

    #[test]
    fn test_lookup_stays_inside_help_dir() {
        let root = tempfile::tempdir().unwrap();
        let help = root.path().join("help");
        std::fs::create_dir(&help).unwrap();
        write(root.path(), "SECRET", "top secret\n");
        let mut library = HelpLibrary::load(&help, 1024).unwrap();

        assert!(library.lookup("../secret").is_none());
        assert!(library.lookup("..").is_none());
        assert!(library.lookup("/etc/passwd").is_none());
        assert!(library.is_empty());
    }
}
