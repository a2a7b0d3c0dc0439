use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use hotbundle_core::ActivationPointer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Durability {
    /// Leave flushing to the OS.
    Lazy,
    /// Flush to stable storage before returning.
    Sync,
}

/// Persisted home of the activation pointer. `load` must observe the latest
/// `save`, and `save` replaces all fields at once.
pub trait PointerStore: Send + Sync {
    fn load(&self) -> Result<ActivationPointer>;
    fn save(&self, pointer: &ActivationPointer, durability: Durability) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct FilePointerStore {
    path: PathBuf,
}

impl FilePointerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "pointer".to_string());
        self.path.with_file_name(format!("{file_name}.tmp"))
    }
}

impl PointerStore for FilePointerStore {
    fn load(&self) -> Result<ActivationPointer> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(ActivationPointer::default());
            }
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("failed to read activation pointer: {}", self.path.display())
                });
            }
        };

        if raw.trim().is_empty() {
            return Ok(ActivationPointer::default());
        }
        serde_json::from_str(&raw).with_context(|| {
            format!(
                "failed parsing activation pointer: {}",
                self.path.display()
            )
        })
    }

    fn save(&self, pointer: &ActivationPointer, durability: Durability) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let content = serde_json::to_string_pretty(pointer)
            .context("failed serializing activation pointer")?;
        let staging = self.staging_path();
        let mut file = fs::File::create(&staging)
            .with_context(|| format!("failed to create {}", staging.display()))?;
        file.write_all(content.as_bytes())
            .with_context(|| format!("failed to write {}", staging.display()))?;
        if durability == Durability::Sync {
            file.sync_all()
                .with_context(|| format!("failed to sync {}", staging.display()))?;
        }
        drop(file);

        fs::rename(&staging, &self.path).with_context(|| {
            format!(
                "failed to replace activation pointer: {}",
                self.path.display()
            )
        })?;
        if durability == Durability::Sync {
            sync_parent_dir(&self.path)?;
        }
        Ok(())
    }
}

/// Makes a completed rename durable.
#[cfg(unix)]
pub(crate) fn sync_parent_dir(path: &Path) -> Result<()> {
    let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) else {
        return Ok(());
    };
    fs::File::open(parent)
        .and_then(|dir| dir.sync_all())
        .with_context(|| format!("failed to sync {}", parent.display()))
}

#[cfg(not(unix))]
pub(crate) fn sync_parent_dir(_path: &Path) -> Result<()> {
    Ok(())
}

#[derive(Debug, Default)]
pub struct MemoryPointerStore {
    pointer: Mutex<ActivationPointer>,
}

impl PointerStore for MemoryPointerStore {
    fn load(&self) -> Result<ActivationPointer> {
        let guard = self
            .pointer
            .lock()
            .map_err(|_| anyhow!("activation pointer lock poisoned"))?;
        Ok(guard.clone())
    }

    fn save(&self, pointer: &ActivationPointer, _durability: Durability) -> Result<()> {
        let mut guard = self
            .pointer
            .lock()
            .map_err(|_| anyhow!("activation pointer lock poisoned"))?;
        *guard = pointer.clone();
        Ok(())
    }
}
