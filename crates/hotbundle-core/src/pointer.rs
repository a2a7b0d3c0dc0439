use std::path::Path;

use serde::{Deserialize, Serialize};

/// Which bundle the host should serve. All-empty means the shipped content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationPointer {
    #[serde(rename = "lastPathHot", default)]
    pub hot_path: String,
    #[serde(rename = "lastPathPersist", default)]
    pub persist_path: String,
    #[serde(rename = "versionName", default)]
    pub version_name: String,
}

impl ActivationPointer {
    pub fn new(hot_path: &Path, persist_path: &Path, version_name: &str) -> Self {
        Self {
            hot_path: hot_path.display().to_string(),
            persist_path: persist_path.display().to_string(),
            version_name: version_name.to_string(),
        }
    }

    pub fn is_active(&self) -> bool {
        !self.hot_path.is_empty() || !self.persist_path.is_empty()
    }

    pub fn references(&self, hot_path: &Path, persist_path: &Path) -> bool {
        self.hot_path == hot_path.display().to_string()
            || self.persist_path == persist_path.display().to_string()
    }
}
