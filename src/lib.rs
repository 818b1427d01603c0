//! CSI Volume Translator
//!
//! A pluggable translation layer between legacy in-tree cloud-disk volume
//! descriptors and their CSI counterparts. An external controller hands a
//! volume, persistent volume, or storage class to the dispatcher once per
//! object; the dispatcher routes it to the provider translator that claims
//! it, which returns a freshly constructed descriptor or a typed error.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       CsiTranslator                          │
//! │       ordered registry of provider translators;              │
//! │       first matching predicate wins                          │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌──────────────────────────┐  ┌──────────────────────────┐  │
//! │  │        Azure Disk        │  │         Portworx         │  │
//! │  │    disk.csi.azure.com    │  │     pxd.portworx.com     │  │
//! │  │  locator parsing, field  │  │   contract shape only;   │  │
//! │  │  mapping, handle repair  │  │    bodies not built yet  │  │
//! │  └──────────────────────────┘  └──────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything is synchronous and stateless: translators are pure functions
//! over borrowed descriptors, inputs are never mutated, and no call blocks,
//! retries, or touches the network.
//!
//! # Modules
//!
//! - [`translator`]: dispatcher over the registered provider translators
//! - [`plugins`]: the translator contract and per-provider implementations
//! - [`error`]: error types and handling

pub mod error;
pub mod plugins;
pub mod translator;

// Re-export commonly used types
pub use error::{Error, Result};

pub use plugins::{
    classify_disk_uri, default_translators, disk_name, AzureDiskTranslator, DiskKind,
    InTreeTranslator, InTreeTranslatorRef, PortworxTranslator, AZURE_DISK_CACHING_MODE,
    AZURE_DISK_DRIVER_NAME, AZURE_DISK_FS_TYPE, AZURE_DISK_IN_TREE_PLUGIN_NAME, AZURE_DISK_KIND,
    DEFAULT_ACCESS_MODE, PORTWORX_DRIVER_NAME, PORTWORX_IN_TREE_PLUGIN_NAME,
};

pub use translator::CsiTranslator;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
