use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::csv_handler::ParseSettings;
use crate::csv_mmap::MMAP_MIN_BYTES;
use crate::error::{Result, ViewerError};

pub const CONFIG_FILE: &str = "csv-reader.json";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewerConfig {
    pub parse: ParseSettings,
    /// Clear the filter text when a new file is loaded.
    pub reset_query_on_load: bool,
    pub mmap_threshold_bytes: u64,
    pub filter_cache_capacity: usize,
    pub log_level: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            parse: ParseSettings::default(),
            reset_query_on_load: true,
            mmap_threshold_bytes: MMAP_MIN_BYTES,
            filter_cache_capacity: 32,
            log_level: "info".to_string(),
        }
    }
}

impl ViewerConfig {
    /// Loads settings from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(ViewerError::Config {
                    message: format!("{}: {err}", path.display()),
                })
            }
        };
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let raw = serde_json::to_string_pretty(self)?;
        fs::write(path, raw).map_err(|err| ViewerError::Config {
            message: format!("{}: {err}", path.display()),
        })
    }
}
