use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Latest-version answer from the metadata endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteVersionDescriptor {
    pub version: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct RawDescriptor {
    version: Option<String>,
    url: Option<String>,
}

impl RemoteVersionDescriptor {
    /// `Err` for a body that is not JSON, `Ok(None)` for JSON lacking a
    /// usable `version` or `url`.
    pub fn from_json_slice(body: &[u8]) -> anyhow::Result<Option<Self>> {
        let raw: RawDescriptor =
            serde_json::from_slice(body).context("failed to parse version metadata")?;

        let version = raw.version.filter(|value| !value.trim().is_empty());
        let url = raw.url.filter(|value| !value.trim().is_empty());
        match (version, url) {
            (Some(version), Some(url)) => Ok(Some(Self { version, url })),
            _ => Ok(None),
        }
    }
}
