use std::fs;
use std::sync::Arc;

use hotbundle_core::{ActivationPointer, StatsAction, StatsReporter, VersionId};
use tracing::{debug, info, warn};

use crate::fs_utils::has_entry_point;
use crate::{Durability, PointerStore, StoreLayout};

/// Installed versions on disk plus the pointer to the active one.
///
/// No internal locking: callers serialize install, activate, delete and
/// reset against the same roots.
pub struct VersionStore {
    layout: StoreLayout,
    pointer: Arc<dyn PointerStore>,
    stats: Arc<dyn StatsReporter>,
}

impl VersionStore {
    pub fn new(
        layout: StoreLayout,
        pointer: Arc<dyn PointerStore>,
        stats: Arc<dyn StatsReporter>,
    ) -> Self {
        Self {
            layout,
            pointer,
            stats,
        }
    }

    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    pub fn list(&self) -> Vec<VersionId> {
        let dir = self.layout.hot_versions_dir();
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(path = %dir.display(), error = %err, "no version available");
                return Vec::new();
            }
        };

        let mut versions = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(path = %dir.display(), error = %err, "failed reading versions dir entry");
                    continue;
                }
            };
            let name = entry.file_name();
            let name = name.to_string_lossy();
            match VersionId::parse(&name) {
                Ok(id) => versions.push(id),
                Err(_) => debug!(entry = %name, "skipping non-version entry"),
            }
        }
        versions.sort();
        versions
    }

    /// Both copies exist and carry the entry point. Always read from disk so
    /// an evicted hot copy is noticed.
    pub fn is_complete(&self, id: &VersionId) -> bool {
        let entry_point = self.layout.entry_point();
        has_entry_point(&self.layout.hot_version_dir(id), entry_point)
            && has_entry_point(&self.layout.persist_version_dir(id), entry_point)
    }

    pub fn activate(&self, id: &VersionId, version_name: &str) -> bool {
        if !self.is_complete(id) {
            warn!(version = %id, name = version_name, "refusing to activate incomplete version");
            self.stats.report(StatsAction::SetFail, version_name);
            return false;
        }

        let pointer = ActivationPointer::new(
            &self.layout.hot_version_dir(id),
            &self.layout.persist_version_dir(id),
            version_name,
        );
        if let Err(err) = self.pointer.save(&pointer, Durability::Lazy) {
            warn!(version = %id, error = %format!("{err:#}"), "activation pointer not saved");
            self.stats.report(StatsAction::SetFail, version_name);
            return false;
        }

        info!(version = %id, name = version_name, "version activated");
        self.stats.report(StatsAction::Set, version_name);
        true
    }

    /// Removes both copies. Only a failure to remove the persistent copy is
    /// reported. The activation pointer is left as is, even when it names
    /// this version.
    pub fn delete(&self, id: &VersionId, version_name: &str) -> bool {
        let hot_dir = self.layout.hot_version_dir(id);
        let persist_dir = self.layout.persist_version_dir(id);

        if self.current().references(&hot_dir, &persist_dir) {
            warn!(version = %id, "deleting the active version; pointer still references it");
        }

        if let Err(err) = fs::remove_dir_all(&hot_dir) {
            warn!(path = %hot_dir.display(), error = %err, "hot copy not removed");
        }
        if let Err(err) = fs::remove_dir_all(&persist_dir) {
            warn!(path = %persist_dir.display(), error = %err, "persistent copy not removed");
            return false;
        }

        info!(version = %id, name = version_name, "version deleted");
        self.stats.report(StatsAction::Delete, version_name);
        true
    }

    /// Back to the shipped content. Installed versions stay on disk.
    pub fn reset(&self) {
        let previous = self.version_name();
        self.stats.report(StatsAction::Reset, &previous);
        if let Err(err) = self
            .pointer
            .save(&ActivationPointer::default(), Durability::Sync)
        {
            warn!(error = %format!("{err:#}"), "activation pointer not cleared");
            return;
        }
        info!(previous = %previous, "activation reset");
    }

    pub fn current(&self) -> ActivationPointer {
        match self.pointer.load() {
            Ok(pointer) => pointer,
            Err(err) => {
                warn!(error = %format!("{err:#}"), "activation pointer unreadable");
                ActivationPointer::default()
            }
        }
    }

    pub fn version_name(&self) -> String {
        self.current().version_name
    }

    pub fn hot_path(&self) -> String {
        self.current().hot_path
    }

    pub fn persist_path(&self) -> String {
        self.current().persist_path
    }
}
