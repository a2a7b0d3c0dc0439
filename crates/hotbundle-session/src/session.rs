use std::sync::Arc;

use hotbundle_core::{RemoteVersionDescriptor, VersionId};
use hotbundle_store::BundleInstaller;
use tracing::{info, warn};

use crate::Fetcher;

/// Checks for and downloads new bundles. Activation stays with the host,
/// through `VersionStore`.
pub struct UpdateSession {
    fetcher: Arc<dyn Fetcher>,
    installer: BundleInstaller,
}

impl UpdateSession {
    pub fn new(fetcher: Arc<dyn Fetcher>, installer: BundleInstaller) -> Self {
        Self { fetcher, installer }
    }

    /// `None` covers both "nothing newer" and "could not ask"; callers retry
    /// later either way.
    pub fn fetch_latest(&self, metadata_url: &str) -> Option<RemoteVersionDescriptor> {
        let response = match self.fetcher.get(metadata_url) {
            Ok(response) => response,
            Err(err) => {
                warn!(
                    url = metadata_url,
                    error = %format!("{err:#}"),
                    "error getting latest version"
                );
                return None;
            }
        };
        if !response.is_success() {
            warn!(url = metadata_url, status = response.status, "error getting latest version");
            return None;
        }

        match RemoteVersionDescriptor::from_json_slice(&response.body) {
            Ok(Some(latest)) => Some(latest),
            Ok(None) => {
                info!(url = metadata_url, "no update available");
                None
            }
            Err(err) => {
                warn!(
                    url = metadata_url,
                    error = %format!("{err:#}"),
                    "unreadable version metadata"
                );
                None
            }
        }
    }

    /// Returns the new id once the bytes are fetched, even if a copy failed
    /// to install; `VersionStore::is_complete` is the judge of that.
    pub fn download(&self, bundle_url: &str) -> Option<VersionId> {
        let response = match self.fetcher.get(bundle_url) {
            Ok(response) => response,
            Err(err) => {
                warn!(url = bundle_url, error = %format!("{err:#}"), "error downloading bundle");
                return None;
            }
        };
        if !response.is_success() {
            warn!(url = bundle_url, status = response.status, "error downloading bundle");
            return None;
        }

        let id = VersionId::generate();
        let outcome = self.installer.install(&response.body, &id);
        if outcome.is_ok() {
            info!(version = %id, bytes = response.body.len(), "bundle downloaded");
        } else {
            warn!(version = %id, "bundle downloaded but not fully installed");
        }
        Some(id)
    }

    pub fn check_and_download(
        &self,
        metadata_url: &str,
    ) -> Option<(RemoteVersionDescriptor, VersionId)> {
        let latest = self.fetch_latest(metadata_url)?;
        let id = self.download(&latest.url)?;
        Some((latest, id))
    }
}
