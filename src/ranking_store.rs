use std::fs;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::constants::{MAX_FLOOR, RANKING_CAPACITY};
use crate::types::GameSummary;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub name: String,
    pub score: i64,
    pub floor: u32,
    pub date: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct RankingStoreFile {
    version: u8,
    entries: Vec<RankingEntry>,
}

#[derive(Clone, Debug, Deserialize)]
struct RankingStoreFileRaw {
    version: u8,
    entries: Vec<serde_json::Value>,
}

/// Top runs on disk, best score first, capped at ten.
pub struct RankingStore {
    file_path: PathBuf,
    entries: Vec<RankingEntry>,
}

impl RankingStore {
    pub fn new(file_path: PathBuf) -> Self {
        let entries = load_entries(&file_path);
        Self { file_path, entries }
    }

    pub fn entries(&self) -> &[RankingEntry] {
        &self.entries
    }

    /// Returns the 1-based rank when the run made the table.
    pub fn record_run(&mut self, name: &str, summary: &GameSummary) -> Option<usize> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let entry = RankingEntry {
            name: name.to_string(),
            score: summary.score.max(0),
            floor: summary.floor,
            date: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        };
        self.entries.push(entry.clone());
        sort_and_cap(&mut self.entries);
        let rank = self
            .entries
            .iter()
            .position(|current| *current == entry)
            .map(|idx| idx + 1);
        self.save();
        rank
    }

    fn save(&self) {
        if let Some(parent) = self.file_path.parent() {
            if let Err(error) = fs::create_dir_all(parent) {
                warn!(path = %parent.display(), %error, "failed to create ranking dir");
                return;
            }
        }

        let payload = RankingStoreFile {
            version: 1,
            entries: self.entries.clone(),
        };
        match serde_json::to_string_pretty(&payload) {
            Ok(text) => {
                if let Err(error) = fs::write(&self.file_path, text) {
                    warn!(path = %self.file_path.display(), %error, "failed to write rankings");
                }
            }
            Err(error) => {
                warn!(path = %self.file_path.display(), %error, "failed to serialize rankings");
            }
        }
    }
}

fn sort_and_cap(entries: &mut Vec<RankingEntry>) {
    entries.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| b.floor.cmp(&a.floor))
            .then_with(|| a.date.cmp(&b.date))
    });
    entries.truncate(RANKING_CAPACITY);
}

fn load_entries(path: &Path) -> Vec<RankingEntry> {
    let text = match fs::read_to_string(path) {
        Ok(value) => value,
        Err(error) => {
            if error.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %path.display(), %error, "failed to read rankings");
            }
            return Vec::new();
        }
    };
    let parsed = match serde_json::from_str::<RankingStoreFileRaw>(&text) {
        Ok(value) if value.version == 1 => value,
        Ok(value) => {
            warn!(path = %path.display(), version = value.version, "unsupported ranking version");
            return Vec::new();
        }
        Err(error) => {
            warn!(path = %path.display(), %error, "failed to parse rankings");
            return Vec::new();
        }
    };

    let mut entries: Vec<RankingEntry> = parsed
        .entries
        .into_iter()
        .filter_map(|raw| match serde_json::from_value::<RankingEntry>(raw) {
            Ok(entry) => sanitize_entry(entry),
            Err(error) => {
                warn!(path = %path.display(), %error, "skipping malformed ranking entry");
                None
            }
        })
        .collect();
    sort_and_cap(&mut entries);
    entries
}

fn sanitize_entry(entry: RankingEntry) -> Option<RankingEntry> {
    let name = entry.name.trim().to_string();
    if name.is_empty() || entry.score < 0 {
        return None;
    }
    if entry.floor == 0 || entry.floor > MAX_FLOOR {
        return None;
    }
    Some(RankingEntry { name, ..entry })
}
