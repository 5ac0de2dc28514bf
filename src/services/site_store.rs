use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::models::{Record, Roster, ThemeId, coerce_number, format_number, sample_records};

pub const RECORDS_KEY: &str = "arena-records";
pub const SITE_NAME_KEY: &str = "arena-site";
pub const THEME_KEY: &str = "arena-theme";
pub const GLOBAL_TARGET_KEY: &str = "arena-global-target";
pub const CUSTOM_LOGO_KEY: &str = "arena-custom-logo";

pub const DEFAULT_SITE_NAME: &str = "Distribution Center 1";
pub const DEFAULT_GLOBAL_TARGET: f64 = 5000.0;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Everything that survives a restart.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteState {
    pub roster: Roster,
    pub site_name: String,
    pub theme: ThemeId,
    pub global_target: f64,
    /// `data:` URL of an uploaded logo, or empty.
    pub custom_logo: String,
}

impl Default for SiteState {
    fn default() -> Self {
        Self {
            roster: Roster::from_records(sample_records()),
            site_name: DEFAULT_SITE_NAME.to_string(),
            theme: ThemeId::default(),
            global_target: DEFAULT_GLOBAL_TARGET,
            custom_logo: String::new(),
        }
    }
}

/// A single JSON file of string values keyed like a browser's local storage.
pub struct SiteStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl SiteStore {
    /// Opens the store. A missing or unreadable file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|err| {
                warn!("Ignoring unreadable store {}: {}", path.display(), err);
                BTreeMap::new()
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!("No store at {}, starting fresh", path.display());
                BTreeMap::new()
            }
            Err(err) => {
                warn!("Failed to read store {}: {}", path.display(), err);
                BTreeMap::new()
            }
        };
        Self { path, values }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Reads each key once, falling back to its default.
    pub fn load_state(&self) -> SiteState {
        let defaults = SiteState::default();

        let roster = match self.get(RECORDS_KEY) {
            Some(raw) => match serde_json::from_str::<Vec<Record>>(raw) {
                Ok(records) => Roster::from_records(records),
                Err(err) => {
                    warn!("Stored records unreadable, using sample data: {err}");
                    defaults.roster
                }
            },
            None => defaults.roster,
        };

        let site_name = self
            .get(SITE_NAME_KEY)
            .filter(|name| !name.is_empty())
            .map_or(defaults.site_name, ToOwned::to_owned);

        let theme = self
            .get(THEME_KEY)
            .and_then(ThemeId::parse)
            .unwrap_or(defaults.theme);

        let global_target = self
            .get(GLOBAL_TARGET_KEY)
            .map_or(DEFAULT_GLOBAL_TARGET, |raw| {
                coerce_number(raw, DEFAULT_GLOBAL_TARGET)
            });

        let custom_logo = self
            .get(CUSTOM_LOGO_KEY)
            .map_or(defaults.custom_logo, ToOwned::to_owned);

        SiteState {
            roster,
            site_name,
            theme,
            global_target,
            custom_logo,
        }
    }

    /// Writes every key whose value differs from what is stored. Returns how
    /// many keys changed.
    pub fn sync(&mut self, state: &SiteState) -> Result<usize, StoreError> {
        let encoded = [
            (RECORDS_KEY, serde_json::to_string(state.roster.records())?),
            (SITE_NAME_KEY, state.site_name.clone()),
            (THEME_KEY, state.theme.as_str().to_string()),
            (GLOBAL_TARGET_KEY, format_number(state.global_target)),
            (CUSTOM_LOGO_KEY, state.custom_logo.clone()),
        ];

        let mut candidate = self.values.clone();
        let mut changed = Vec::new();
        for (key, value) in encoded {
            if self.get(key) != Some(value.as_str()) {
                candidate.insert(key.to_string(), value);
                changed.push(key);
            }
        }

        if changed.is_empty() {
            return Ok(0);
        }

        // Only a successful write updates the in-memory copy, so a failed
        // sync is retried on the next call.
        self.write_file(&candidate)?;
        self.values = candidate;
        info!("Persisted {:?} to {}", changed, self.path.display());
        Ok(changed.len())
    }

    fn write_file(&self, values: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, serde_json::to_vec_pretty(values)?)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}
