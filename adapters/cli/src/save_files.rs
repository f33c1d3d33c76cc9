//! Save files and the high score table on disk.
//!
//! Both are plain JSON. Save files carry a format tag and a version so that
//! foreign or newer files are rejected before their snapshot is used.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use tower_siege_core::{HighScoreTable, SaveSnapshot};

/// Format tag written at the top of every save file.
const SAVE_FORMAT: &str = "tower-siege-save";
/// Version of the save file layout.
const SAVE_VERSION: u32 = 1;

/// Save file contents: the snapshot plus the seed needed to replay it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct SaveFile {
    format: String,
    version: u32,
    /// Seed of the match that produced the snapshot.
    pub(crate) seed: u64,
    /// Persisted match state.
    pub(crate) snapshot: SaveSnapshot,
}

impl SaveFile {
    pub(crate) fn new(seed: u64, snapshot: SaveSnapshot) -> Self {
        Self {
            format: SAVE_FORMAT.to_owned(),
            version: SAVE_VERSION,
            seed,
            snapshot,
        }
    }

    /// Encodes the save file as pretty JSON.
    pub(crate) fn encode(&self) -> Result<String, SaveFileError> {
        serde_json::to_string_pretty(self).map_err(SaveFileError::InvalidPayload)
    }

    /// Decodes a save file, checking its format tag and version.
    pub(crate) fn decode(value: &str) -> Result<Self, SaveFileError> {
        if value.trim().is_empty() {
            return Err(SaveFileError::EmptyPayload);
        }
        let decoded: Self = serde_json::from_str(value).map_err(SaveFileError::InvalidPayload)?;
        if decoded.format != SAVE_FORMAT {
            return Err(SaveFileError::InvalidFormat(decoded.format));
        }
        if decoded.version != SAVE_VERSION {
            return Err(SaveFileError::UnsupportedVersion(decoded.version));
        }
        Ok(decoded)
    }

    pub(crate) fn read(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("could not read {}", path.display()))?;
        Self::decode(&text).with_context(|| format!("could not load {}", path.display()))
    }

    pub(crate) fn write(&self, path: &Path) -> anyhow::Result<()> {
        write_creating_parents(path, &self.encode()?)
    }
}

/// Errors that can occur while decoding save files.
#[derive(Debug, thiserror::Error)]
pub(crate) enum SaveFileError {
    /// The file was empty or contained only whitespace.
    #[error("save file was empty")]
    EmptyPayload,
    /// The file was written by something other than this tool.
    #[error("save format '{0}' is not supported")]
    InvalidFormat(String),
    /// The file uses a layout this build cannot read.
    #[error("save version {0} is not supported")]
    UnsupportedVersion(u32),
    /// The JSON payload could not be (de)serialised.
    #[error("could not process save payload: {0}")]
    InvalidPayload(#[source] serde_json::Error),
}

/// Location of the high score table when none is given on the command line.
pub(crate) fn default_scores_path() -> PathBuf {
    dirs::data_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tower-siege")
        .join("scores.json")
}

/// Loads the high score table, starting empty if the file does not exist.
pub(crate) fn load_scores(path: &Path) -> anyhow::Result<HighScoreTable> {
    if !path.exists() {
        return Ok(HighScoreTable::default());
    }
    let text =
        fs::read_to_string(path).with_context(|| format!("could not read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("could not parse {}", path.display()))
}

pub(crate) fn store_scores(path: &Path, table: &HighScoreTable) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(table)?;
    write_creating_parents(path, &json)
}

fn write_creating_parents(path: &Path, contents: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("could not create {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("could not write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower_siege_core::{HighScore, TowerRecord};

    fn snapshot() -> SaveSnapshot {
        SaveSnapshot {
            money: 410,
            lives: 15,
            score: 2300,
            wave: 4,
            difficulty: "hard".to_owned(),
            map_type: "cyber".to_owned(),
            towers: vec![TowerRecord {
                archetype: "laser".to_owned(),
                x: 160.0,
                y: 96.0,
                level: 3,
            }],
        }
    }

    #[test]
    fn save_file_keeps_seed_and_snapshot() {
        let file = SaveFile::new(99, snapshot());
        let encoded = file.encode().expect("snapshot serialises");
        assert!(encoded.contains("\"format\": \"tower-siege-save\""));

        let decoded = SaveFile::decode(&encoded).expect("save decodes");
        assert_eq!(decoded.seed, 99);
        assert_eq!(decoded.snapshot, snapshot());
    }

    #[test]
    fn foreign_or_newer_files_are_rejected() {
        let mut file = SaveFile::new(1, snapshot());
        file.version = SAVE_VERSION + 1;
        let encoded = file.encode().expect("snapshot serialises");
        assert!(matches!(
            SaveFile::decode(&encoded),
            Err(SaveFileError::UnsupportedVersion(2))
        ));

        file.format = "campaign-save".to_owned();
        file.version = SAVE_VERSION;
        let encoded = file.encode().expect("snapshot serialises");
        assert!(matches!(
            SaveFile::decode(&encoded),
            Err(SaveFileError::InvalidFormat(_))
        ));
        assert!(matches!(
            SaveFile::decode("  "),
            Err(SaveFileError::EmptyPayload)
        ));
    }

    #[test]
    fn scores_persist_across_loads() {
        let path = std::env::temp_dir()
            .join(format!("tower-siege-scores-{}", std::process::id()))
            .join("scores.json");
        let mut table = load_scores(&path).expect("missing file loads empty");
        assert!(table.entries().is_empty());

        let _ = table.record(HighScore {
            name: "ada".to_owned(),
            score: 5000,
            wave: 14,
            difficulty: "easy".to_owned(),
            map: "forest".to_owned(),
            timestamp: 1,
        });
        store_scores(&path, &table).expect("table stores");

        let reloaded = load_scores(&path).expect("table reloads");
        assert_eq!(reloaded, table);
        if let Some(parent) = path.parent() {
            let _ = fs::remove_dir_all(parent);
        }
    }
}
