use std::path::PathBuf;

const DEFAULT_DATA_DIR: &str = "data";

/// Settings read from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub initiator_id: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            data_dir: std::env::var("JSON_STORE_DATA_DIR")
                .unwrap_or_else(|_| DEFAULT_DATA_DIR.to_string())
                .into(),
            initiator_id: std::env::var("JSON_STORE_INITIATOR")
                .ok()
                .filter(|s| !s.is_empty()),
        }
    }
}
