mod fs_utils;
mod installer;
mod layout;
mod pointer;
mod unpack;
mod versions;

pub use installer::{BundleInstaller, InstallError, InstallOutcome};
pub use layout::{
    default_store_layout, version_path, StoreLayout, StoreTarget, DEFAULT_ENTRY_POINT,
    HOT_VERSIONS_SEGMENT, PERSIST_VERSIONS_SEGMENT,
};
pub use pointer::{Durability, FilePointerStore, MemoryPointerStore, PointerStore};
pub use unpack::{CommandUnpacker, Unpacker, DEFAULT_UNPACK_TIMEOUT};
pub use versions::VersionStore;
