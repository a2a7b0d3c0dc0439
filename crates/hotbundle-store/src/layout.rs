use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use hotbundle_core::VersionId;

pub const HOT_VERSIONS_SEGMENT: &str = "versions";
pub const PERSIST_VERSIONS_SEGMENT: &str = "NoCloud/ionic_built_snapshots";
pub const DEFAULT_ENTRY_POINT: &str = "index.html";

/// One of the two mirrored copies every version keeps on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreTarget {
    Hot,
    Persist,
}

impl StoreTarget {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hot => "hot",
            Self::Persist => "persist",
        }
    }
}

pub fn version_path(root: &Path, segment: &str, id: &VersionId) -> PathBuf {
    join_segment(root, segment).join(id.as_str())
}

fn join_segment(root: &Path, segment: &str) -> PathBuf {
    segment
        .split('/')
        .filter(|part| !part.is_empty())
        .fold(root.to_path_buf(), |path, part| path.join(part))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLayout {
    hot_root: PathBuf,
    persist_root: PathBuf,
    entry_point: String,
}

impl StoreLayout {
    pub fn new(hot_root: impl Into<PathBuf>, persist_root: impl Into<PathBuf>) -> Self {
        Self {
            hot_root: hot_root.into(),
            persist_root: persist_root.into(),
            entry_point: DEFAULT_ENTRY_POINT.to_string(),
        }
    }

    pub fn with_entry_point(mut self, entry_point: impl Into<String>) -> Self {
        self.entry_point = entry_point.into();
        self
    }

    pub fn hot_root(&self) -> &Path {
        &self.hot_root
    }

    pub fn persist_root(&self) -> &Path {
        &self.persist_root
    }

    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    pub fn hot_versions_dir(&self) -> PathBuf {
        join_segment(&self.hot_root, HOT_VERSIONS_SEGMENT)
    }

    pub fn persist_versions_dir(&self) -> PathBuf {
        join_segment(&self.persist_root, PERSIST_VERSIONS_SEGMENT)
    }

    pub fn hot_version_dir(&self, id: &VersionId) -> PathBuf {
        version_path(&self.hot_root, HOT_VERSIONS_SEGMENT, id)
    }

    pub fn persist_version_dir(&self, id: &VersionId) -> PathBuf {
        version_path(&self.persist_root, PERSIST_VERSIONS_SEGMENT, id)
    }

    pub fn version_dir(&self, target: StoreTarget, id: &VersionId) -> PathBuf {
        match target {
            StoreTarget::Hot => self.hot_version_dir(id),
            StoreTarget::Persist => self.persist_version_dir(id),
        }
    }

    /// Scratch archives and extraction dirs live at the top of the hot root.
    pub fn scratch_path(&self, name: &str) -> PathBuf {
        self.hot_root.join(name)
    }

    pub fn ensure_base_dirs(&self) -> Result<()> {
        for dir in [self.hot_versions_dir(), self.persist_versions_dir()] {
            fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        Ok(())
    }
}

pub fn default_store_layout() -> Result<StoreLayout> {
    if cfg!(windows) {
        let local = std::env::var("LOCALAPPDATA")
            .context("LOCALAPPDATA is not set; cannot resolve hot bundle root")?;
        let roaming = std::env::var("APPDATA")
            .context("APPDATA is not set; cannot resolve persistent bundle root")?;
        return Ok(StoreLayout::new(
            PathBuf::from(local).join("Hotbundle"),
            PathBuf::from(roaming).join("Hotbundle"),
        ));
    }

    let home = std::env::var("HOME").context("HOME is not set; cannot resolve bundle roots")?;
    let data_home = std::env::var("XDG_DATA_HOME")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(&home).join(".local").join("share"));
    Ok(StoreLayout::new(
        data_home.join("hotbundle"),
        PathBuf::from(home).join(".hotbundle"),
    ))
}
