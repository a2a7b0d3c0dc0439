use std::time::Duration;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatsAction {
    Set,
    SetFail,
    Delete,
    Reset,
}

impl StatsAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Set => "set",
            Self::SetFail => "set_fail",
            Self::Delete => "delete",
            Self::Reset => "reset",
        }
    }
}

/// The per-install constant part of every stats payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub platform: String,
    pub device_id: String,
    pub version_build: String,
    pub app_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsPayload {
    pub platform: String,
    pub action: StatsAction,
    pub device_id: String,
    pub version_name: String,
    pub version_build: String,
    pub app_id: String,
}

impl DeviceIdentity {
    pub fn payload(&self, action: StatsAction, version_name: &str) -> StatsPayload {
        StatsPayload {
            platform: self.platform.clone(),
            action,
            device_id: self.device_id.clone(),
            version_name: version_name.to_string(),
            version_build: self.version_build.clone(),
            app_id: self.app_id.clone(),
        }
    }
}

/// Usage telemetry sink. Implementations must not block the caller and must
/// swallow their own failures.
pub trait StatsReporter: Send + Sync {
    fn report(&self, action: StatsAction, version_name: &str);

    /// Waits up to `timeout` for reports still in flight. Returns `false` if
    /// some were still pending at the deadline. Hosts call this before exit.
    fn flush(&self, _timeout: Duration) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopStatsReporter;

impl StatsReporter for NoopStatsReporter {
    fn report(&self, _action: StatsAction, _version_name: &str) {}
}

pub fn default_platform() -> &'static str {
    match std::env::consts::OS {
        "macos" => "macos",
        "ios" => "ios",
        "android" => "android",
        "windows" => "windows",
        _ => "linux",
    }
}
