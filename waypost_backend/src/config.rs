use anyhow::{anyhow, Result};
use std::env;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct WaypostConfig {
    pub api_port: u16,
    pub paths: WaypostPaths,
    pub geocode: GeocodeConfig,
    pub upload: UploadConfig,
}

impl WaypostConfig {
    pub fn from_env() -> Result<Self> {
        let paths = WaypostPaths::discover()?;
        let api_port = env::var("WAYPOST_API_PORT")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(8080);
        let geocode = GeocodeConfig::from_env();
        let upload = UploadConfig::from_env();
        Ok(Self {
            api_port,
            paths,
            geocode,
            upload,
        })
    }

    pub fn new(api_port: u16, paths: WaypostPaths) -> Self {
        Self {
            api_port,
            paths,
            geocode: GeocodeConfig::from_env(),
            upload: UploadConfig::from_env(),
        }
    }

    pub fn with_geocode(api_port: u16, paths: WaypostPaths, geocode: GeocodeConfig) -> Self {
        Self {
            api_port,
            paths,
            geocode,
            upload: UploadConfig::from_env(),
        }
    }
}

pub const DEFAULT_MAPBOX_API_BASE: &str = "https://api.mapbox.com";

#[derive(Debug, Clone)]
pub struct GeocodeConfig {
    /// Server-held secret for the upstream mapping API. When absent the
    /// geocode endpoint answers 500 without calling upstream.
    pub mapbox_token: Option<String>,
    pub api_base: String,
}

impl Default for GeocodeConfig {
    fn default() -> Self {
        Self {
            mapbox_token: None,
            api_base: DEFAULT_MAPBOX_API_BASE.to_string(),
        }
    }
}

impl GeocodeConfig {
    pub fn from_env() -> Self {
        let mapbox_token = env::var("MAPBOX_TOKEN").ok().and_then(|raw| {
            if raw.trim().is_empty() {
                None
            } else {
                Some(raw)
            }
        });
        let api_base = env::var("MAPBOX_API_BASE")
            .ok()
            .filter(|raw| !raw.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MAPBOX_API_BASE.to_string());
        Self {
            mapbox_token,
            api_base,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct UploadConfig {
    pub max_upload_bytes: Option<u64>,
}

impl UploadConfig {
    pub fn from_env() -> Self {
        let max_upload_bytes = env::var("WAYPOST_MAX_UPLOAD_BYTES")
            .ok()
            .and_then(|raw| raw.parse::<u64>().ok());
        Self { max_upload_bytes }
    }
}

#[derive(Debug, Clone, Default)]
pub struct WaypostPaths {
    pub base: PathBuf,
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub photos_dir: PathBuf,
    pub logs_dir: PathBuf,
}

impl WaypostPaths {
    pub fn discover() -> Result<Self> {
        let exe_path = std::env::current_exe()
            .map_err(|err| anyhow!("failed to resolve current executable: {err}"))?;
        let base = exe_path
            .parent()
            .ok_or_else(|| anyhow!("executable path missing parent"))?
            .to_path_buf();
        Self::from_base_dir(base)
    }

    pub fn from_base_dir<P: AsRef<Path>>(base: P) -> Result<Self> {
        let base = base.as_ref().to_path_buf();
        let data_dir = base.join("data");
        let db_path = data_dir.join("waypost.db");
        let photos_dir = base.join("photos");
        let logs_dir = base.join("logs");

        Ok(Self {
            base,
            data_dir,
            db_path,
            photos_dir,
            logs_dir,
        })
    }
}
