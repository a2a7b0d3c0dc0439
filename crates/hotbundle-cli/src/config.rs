use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use hotbundle_core::{default_platform, random_token, DeviceIdentity};
use hotbundle_session::DEFAULT_HTTP_TIMEOUT;
use hotbundle_store::{default_store_layout, StoreLayout, DEFAULT_UNPACK_TIMEOUT};
use serde::{Deserialize, Serialize};

pub(crate) const CONFIG_ENV: &str = "HOTBUNDLE_CONFIG";
const DEVICE_ID_FILE: &str = "device_id";
const DEVICE_ID_LEN: usize = 32;
const POINTER_FILE: &str = "activation.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct CliConfig {
    pub hot_root: Option<PathBuf>,
    pub persist_root: Option<PathBuf>,
    pub entry_point: Option<String>,
    pub metadata_url: Option<String>,
    pub stats_url: Option<String>,
    pub platform: Option<String>,
    pub app_id: Option<String>,
    pub version_build: Option<String>,
    pub device_id: Option<String>,
    pub http_timeout_secs: Option<u64>,
    pub unpack_timeout_secs: Option<u64>,
    pub pointer_path: Option<PathBuf>,
}

impl CliConfig {
    pub(crate) fn from_toml_str(input: &str) -> Result<Self> {
        let config: Self = toml::from_str(input).context("failed to parse hotbundle config")?;
        if let Some(entry_point) = &config.entry_point {
            validate_entry_point(entry_point)?;
        }
        for (key, value) in [
            ("http_timeout_secs", config.http_timeout_secs),
            ("unpack_timeout_secs", config.unpack_timeout_secs),
        ] {
            if value == Some(0) {
                return Err(anyhow!("{key} must be greater than zero"));
            }
        }
        Ok(config)
    }

    /// Reads the file named by `--config` or `HOTBUNDLE_CONFIG`. With
    /// neither set, every setting takes its default.
    pub(crate) fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("invalid config: {}", path.display()))
    }

    pub(crate) fn store_layout(&self) -> Result<StoreLayout> {
        let layout = match (&self.hot_root, &self.persist_root) {
            (Some(hot), Some(persist)) => StoreLayout::new(hot, persist),
            (hot, persist) => {
                let defaults = default_store_layout()?;
                StoreLayout::new(
                    hot.clone()
                        .unwrap_or_else(|| defaults.hot_root().to_path_buf()),
                    persist
                        .clone()
                        .unwrap_or_else(|| defaults.persist_root().to_path_buf()),
                )
            }
        };

        Ok(match &self.entry_point {
            Some(entry_point) => layout.with_entry_point(entry_point),
            None => layout,
        })
    }

    pub(crate) fn pointer_path(&self, layout: &StoreLayout) -> PathBuf {
        self.pointer_path
            .clone()
            .unwrap_or_else(|| layout.persist_root().join(POINTER_FILE))
    }

    pub(crate) fn http_timeout(&self) -> Duration {
        self.http_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_HTTP_TIMEOUT)
    }

    pub(crate) fn unpack_timeout(&self) -> Duration {
        self.unpack_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_UNPACK_TIMEOUT)
    }

    pub(crate) fn device_identity(&self, layout: &StoreLayout) -> Result<DeviceIdentity> {
        let device_id = match &self.device_id {
            Some(device_id) => device_id.clone(),
            None => load_or_create_device_id(layout.persist_root())?,
        };
        Ok(DeviceIdentity {
            platform: self
                .platform
                .clone()
                .unwrap_or_else(|| default_platform().to_string()),
            device_id,
            version_build: self.version_build.clone().unwrap_or_default(),
            app_id: self.app_id.clone().unwrap_or_default(),
        })
    }
}

fn validate_entry_point(entry_point: &str) -> Result<()> {
    let trimmed = entry_point.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("entry_point must not be empty"));
    }
    if trimmed.contains(['/', '\\']) || trimmed == "." || trimmed == ".." {
        return Err(anyhow!(
            "entry_point must be a plain file name: {entry_point}"
        ));
    }
    Ok(())
}

/// Stable per-install identifier, generated on first use.
pub(crate) fn load_or_create_device_id(root: &Path) -> Result<String> {
    let path = root.join(DEVICE_ID_FILE);
    match fs::read_to_string(&path) {
        Ok(raw) if !raw.trim().is_empty() => return Ok(raw.trim().to_string()),
        Ok(_) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read device id: {}", path.display()));
        }
    }

    fs::create_dir_all(root).with_context(|| format!("failed to create {}", root.display()))?;
    let device_id = random_token(DEVICE_ID_LEN);
    fs::write(&path, format!("{device_id}\n"))
        .with_context(|| format!("failed to write device id: {}", path.display()))?;
    Ok(device_id)
}
