// BMPSIM: Synthetic BMP Session Generation and Replay for Collector Stress Testing
// Copyright (C) 2025-2026 the bmpsim developers
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//! Module that persists compiled message sets to disk and reloads them.

use std::{
    io::Write,
    path::{Path, PathBuf},
};

use thiserror::Error;

use crate::compiler::MessageSet;

/// Write a serialized message set to `path`, overwriting an existing file.
pub fn persist(set: &MessageSet, path: impl AsRef<Path>) -> Result<(), CacheError> {
    let serialized = serde_json::to_string(set)?;

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(path.as_ref())?;
    file.write_all(serialized.as_bytes())?;

    log::debug!(
        "persisted {} messages ({} bytes on the wire) to {}",
        set.num_messages(),
        set.wire_size(),
        path.as_ref().display()
    );
    Ok(())
}

/// Read a message set back from `path`.
pub fn reload(path: impl AsRef<Path>) -> Result<MessageSet, CacheError> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Persist a message set and verify that reloading yields the identical set.
///
/// A mismatch signals a serialization defect; the file is left in place as evidence.
pub fn persist_checked(set: &MessageSet, path: impl AsRef<Path>) -> Result<(), CacheError> {
    persist(set, path.as_ref())?;
    let reloaded = reload(path.as_ref())?;
    if &reloaded != set {
        return Err(CacheError::Mismatch {
            path: path.as_ref().to_path_buf(),
        });
    }
    Ok(())
}

/// Error thrown when a message set cannot be stored or retrieved byte-exact.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cannot access message-set file: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot (de-)serialize message set: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("reloading {path} does not reproduce the persisted message set")]
    Mismatch { path: PathBuf },
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{compiler::compile, test_util::basic_scenario};

    fn tmp_file(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("bmpsim_cache_test_{name}_{}.json", std::process::id()));
        path
    }

    #[test]
    fn round_trip_reproduces_the_set() {
        let set = compile(&basic_scenario()).unwrap();
        let path = tmp_file("round_trip");
        persist(&set, &path).unwrap();
        let reloaded = reload(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(reloaded, set);
    }

    #[test]
    fn persist_checked_accepts_a_faithful_store() {
        let set = compile(&basic_scenario()).unwrap();
        let path = tmp_file("checked");
        persist_checked(&set, &path).unwrap();
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn reload_of_missing_file_fails() {
        assert!(matches!(
            reload("/nonexistent/bmpsim.json"),
            Err(CacheError::Io(_))
        ));
    }
}
