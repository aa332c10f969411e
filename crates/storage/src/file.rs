use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use tally_core::{RuleError, RuleSet};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Rule(#[from] RuleError),
}

/// File-backed category ruleset.
///
/// The store owns the live `RuleSet` for a session and rewrites the whole
/// file after every successful mutation, so a restart (or a concurrent
/// last-writer-wins session) always sees the latest rules. Unreadable
/// content falls back to the default single-category set rather than
/// failing the session; the next save overwrites whatever was there.
pub struct RuleStore {
    path: PathBuf,
    rules: RuleSet,
}

impl RuleStore {
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let rules = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<RuleSet>(&raw) {
                Ok(mut rules) => {
                    rules.ensure_reserved();
                    rules
                }
                Err(e) => {
                    tracing::warn!(
                        "Unreadable rules file {}: {e}; starting from defaults",
                        path.display()
                    );
                    RuleSet::default()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => RuleSet::default(),
            Err(e) => {
                tracing::warn!(
                    "Could not open rules file {}: {e}; starting from defaults",
                    path.display()
                );
                RuleSet::default()
            }
        };
        RuleStore { path, rules }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Serializes the full rule set, overwriting prior content.
    pub fn save(&self) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let raw = serde_json::to_string(&self.rules)?;
        fs::write(&self.path, raw)?;
        Ok(())
    }

    /// Creates an empty category and persists. `Ok(false)` means the name
    /// already existed and nothing was written.
    pub fn create_category(&mut self, name: &str) -> Result<bool, StoreError> {
        let created = self.rules.create_category(name)?;
        if created {
            self.save()?;
        }
        Ok(created)
    }

    /// Learns a user correction as a keyword rule and persists. `Ok(false)`
    /// means the rule set already covered the correction and nothing was
    /// written; repeating a correction is therefore harmless.
    pub fn record_correction(&mut self, category: &str, narrative: &str) -> Result<bool, StoreError> {
        let added = self.rules.add_keyword(category, narrative)?;
        if added {
            self.save()?;
        }
        Ok(added)
    }
}
