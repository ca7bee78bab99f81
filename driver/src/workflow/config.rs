use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Defaults stamped onto every imported CSV row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportDefaults {
    pub color: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub radius_km: f64,
    pub pacing_ms: u64,
}

impl Default for ImportDefaults {
    fn default() -> Self {
        Self {
            color: "red".into(),
            kind: "DMR".into(),
            radius_km: 20.0,
            pacing_ms: 1000,
        }
    }
}

impl ImportDefaults {
    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub store_path: PathBuf,
    pub device_state_path: PathBuf,
    pub cooldown_secs: u64,
    pub bind: SocketAddr,
    pub import: ImportDefaults,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("data/signals.json"),
            device_state_path: PathBuf::from("data/device_state.json"),
            cooldown_secs: 30,
            bind: SocketAddr::from(([127, 0, 0, 1], 9000)),
            import: ImportDefaults::default(),
        }
    }
}

impl AppConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading config {}", path_ref.display()))?;
        let config: AppConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing config {}", path_ref.display()))?;
        Ok(config)
    }

    /// Defaults with command-line overrides applied.
    pub fn from_args(store_path: Option<PathBuf>, bind: Option<SocketAddr>) -> Self {
        Self::default().with_overrides(store_path, bind)
    }

    pub fn with_overrides(mut self, store_path: Option<PathBuf>, bind: Option<SocketAddr>) -> Self {
        if let Some(store_path) = store_path {
            self.store_path = store_path;
        }
        if let Some(bind) = bind {
            self.bind = bind;
        }
        self
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }
}
