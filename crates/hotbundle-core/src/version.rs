use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use rand::Rng;

pub const VERSION_ID_LEN: usize = 10;

const TOKEN_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Storage-directory name of one installed bundle. Only ASCII alphanumerics,
/// so it can be joined onto a root without escaping.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionId(String);

impl VersionId {
    pub fn generate() -> Self {
        Self(random_token(VERSION_ID_LEN))
    }

    pub fn parse(value: &str) -> anyhow::Result<Self> {
        if value.is_empty() {
            return Err(anyhow!("version id must not be empty"));
        }
        if let Some(invalid) = value.chars().find(|ch| !ch.is_ascii_alphanumeric()) {
            return Err(anyhow!(
                "version id contains invalid character '{invalid}': {value}"
            ));
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for VersionId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Random string over the version id alphabet. Also used for scratch names
/// and generated device ids.
pub fn random_token(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| TOKEN_ALPHABET[rng.gen_range(0..TOKEN_ALPHABET.len())] as char)
        .collect()
}
