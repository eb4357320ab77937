//! Saving and restoring whole games.
//!
//! A snapshot is the engine serialized as JSON, wrapped with a format
//! version. It carries pending sub-commands and the legal set, so a restored
//! engine accepts exactly the moves the saved one would have.

use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::Engine;
use crate::faction::FactionData;

/// Current snapshot format.
pub const SNAPSHOT_VERSION: u32 = 1;

/// A saved game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Format version.
    pub version: u32,
    /// The game.
    pub engine: Engine,
}

impl Engine {
    /// Capture the game.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            version: SNAPSHOT_VERSION,
            engine: self.clone(),
        }
    }

    /// Rebuild a game from a snapshot, keeping the standard faction boards.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot comes from another format version.
    pub fn from_snapshot(snapshot: Snapshot) -> io::Result<Self> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "snapshot version {} is not supported (expected {SNAPSHOT_VERSION})",
                    snapshot.version
                ),
            ));
        }
        Ok(snapshot.engine)
    }

    /// Rebuild a game from a snapshot and attach another faction table.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot comes from another format version.
    pub fn from_snapshot_with(snapshot: Snapshot, factions: Arc<dyn FactionData>) -> io::Result<Self> {
        let mut engine = Self::from_snapshot(snapshot)?;
        engine.factions = factions;
        Ok(engine)
    }

    /// Serialize a snapshot as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.snapshot())
    }

    /// Restore from JSON written by [`Engine::to_json`].
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is not a snapshot of a supported version.
    pub fn from_json(json: &str) -> io::Result<Self> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        Self::from_snapshot(snapshot)
    }

    /// Write a snapshot file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file operations fail.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(&self.snapshot())?;
        fs::write(path, json)
    }

    /// Read a snapshot file.
    ///
    /// # Errors
    ///
    /// Returns an error if file operations fail or the file is not a
    /// supported snapshot.
    pub fn load(path: &Path) -> io::Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineOptions;

    #[test]
    fn test_version_mismatch_is_rejected() {
        let mut snapshot = Engine::new(EngineOptions::default()).snapshot();
        snapshot.version = SNAPSHOT_VERSION + 1;
        let err = Engine::from_snapshot(snapshot).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_json_round_trip_keeps_legal_set() {
        let mut engine = Engine::new(EngineOptions::default());
        engine.apply("init 2 seed7").unwrap();
        engine.apply("p1 faction terrans").unwrap();

        let restored = Engine::from_json(&engine.to_json().unwrap()).unwrap();
        assert_eq!(restored.round, engine.round);
        assert_eq!(restored.current_player, engine.current_player);
        assert_eq!(restored.players, engine.players);
        assert_eq!(restored.available_commands(), engine.available_commands());
    }
}
