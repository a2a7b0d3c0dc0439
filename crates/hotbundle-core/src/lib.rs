mod descriptor;
mod pointer;
mod stats;
mod version;

pub use descriptor::RemoteVersionDescriptor;
pub use pointer::ActivationPointer;
pub use stats::{
    default_platform, DeviceIdentity, NoopStatsReporter, StatsAction, StatsPayload, StatsReporter,
};
pub use version::{random_token, VersionId, VERSION_ID_LEN};

#[cfg(test)]
mod tests;
