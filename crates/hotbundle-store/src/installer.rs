use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use hotbundle_core::{random_token, VersionId, VERSION_ID_LEN};
use tracing::{debug, warn};

use crate::fs_utils::{move_dir_or_copy, remove_path_if_exists};
use crate::{StoreLayout, StoreTarget, Unpacker};

#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    #[error("failed to write bundle archive {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to move bundle from {} to {}", from.display(), to.display())]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result of installing one bundle into both roots. Each copy fails on its
/// own; whether the version is usable is decided later from disk.
#[derive(Debug)]
pub struct InstallOutcome {
    pub hot: Result<PathBuf, InstallError>,
    pub persist: Result<PathBuf, InstallError>,
}

impl InstallOutcome {
    pub fn is_ok(&self) -> bool {
        self.hot.is_ok() && self.persist.is_ok()
    }
}

pub struct BundleInstaller {
    layout: StoreLayout,
    unpacker: Arc<dyn Unpacker>,
}

impl BundleInstaller {
    pub fn new(layout: StoreLayout, unpacker: Arc<dyn Unpacker>) -> Self {
        Self { layout, unpacker }
    }

    pub fn install(&self, bytes: &[u8], id: &VersionId) -> InstallOutcome {
        // Usually already present from an earlier run.
        if let Err(err) = self.layout.ensure_base_dirs() {
            warn!(error = %format!("{err:#}"), "cannot create versions dirs");
        }

        InstallOutcome {
            hot: self.install_target(bytes, id, StoreTarget::Hot),
            persist: self.install_target(bytes, id, StoreTarget::Persist),
        }
    }

    fn install_target(
        &self,
        bytes: &[u8],
        id: &VersionId,
        target: StoreTarget,
    ) -> Result<PathBuf, InstallError> {
        let archive_path = self.layout.scratch_path(&random_token(VERSION_ID_LEN));
        let unpack_dir = self.layout.scratch_path(&random_token(VERSION_ID_LEN));
        let dst = self.layout.version_dir(target, id);

        let result = self.stage_and_move(bytes, &archive_path, &unpack_dir, &dst);

        for scratch in [&unpack_dir, &archive_path] {
            if let Err(err) = remove_path_if_exists(scratch) {
                warn!(path = %scratch.display(), error = %err, "scratch path not removed");
            }
        }

        match &result {
            Ok(()) => {
                debug!(
                    copy = target.as_str(),
                    version = %id,
                    path = %dst.display(),
                    "bundle copy installed"
                );
            }
            Err(err) => {
                warn!(
                    copy = target.as_str(),
                    version = %id,
                    error = %err,
                    "bundle copy not installed"
                );
            }
        }
        result.map(|()| dst)
    }

    fn stage_and_move(
        &self,
        bytes: &[u8],
        archive_path: &Path,
        unpack_dir: &Path,
        dst: &Path,
    ) -> Result<(), InstallError> {
        fs::write(archive_path, bytes).map_err(|source| InstallError::Write {
            path: archive_path.to_path_buf(),
            source,
        })?;

        // A broken archive surfaces as an incomplete version, not here.
        if let Err(err) = self.unpacker.unpack(archive_path, unpack_dir) {
            warn!(
                archive = %archive_path.display(),
                error = %format!("{err:#}"),
                "bundle extraction failed"
            );
        }

        let bundle_root = self.bundle_root(unpack_dir);
        move_dir_or_copy(&bundle_root, dst).map_err(|source| InstallError::Move {
            from: bundle_root,
            to: dst.to_path_buf(),
            source,
        })
    }

    /// Archives that wrap everything in one top-level folder are installed
    /// from inside that folder.
    fn bundle_root(&self, unpack_dir: &Path) -> PathBuf {
        let entries = match fs::read_dir(unpack_dir) {
            Ok(entries) => entries
                .filter_map(|entry| entry.ok().map(|entry| entry.path()))
                .collect::<Vec<_>>(),
            Err(_) => return unpack_dir.to_path_buf(),
        };

        match entries.as_slice() {
            [single]
                if single.is_dir() && !unpack_dir.join(self.layout.entry_point()).exists() =>
            {
                single.clone()
            }
            _ => unpack_dir.to_path_buf(),
        }
    }
}
