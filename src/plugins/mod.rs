//! Per-provider in-tree translators
//!
//! Provides translators between legacy in-tree volume sources and their CSI
//! counterparts:
//! - Azure Disk: fully implemented, both directions
//! - Portworx: contract shape only; translation bodies are not built yet

pub mod azure_disk;
pub mod portworx;

pub use azure_disk::*;
pub use portworx::*;

use crate::error::Result;
use k8s_openapi::api::core::v1::{PersistentVolume, Volume};
use k8s_openapi::api::storage::v1::StorageClass;
use std::sync::Arc;

/// Access mode granted to freshly translated persistent volumes.
pub const DEFAULT_ACCESS_MODE: &str = "ReadWriteOnce";

// =============================================================================
// Translator Contract
// =============================================================================

/// Capability set every in-tree provider translator implements.
///
/// Translators are stateless: every method is a pure function of its
/// arguments, inputs are taken by reference and never mutated, and outputs
/// are freshly constructed. That makes any translator safe to share across
/// threads behind an [`Arc`].
pub trait InTreeTranslator: Send + Sync {
    /// Translate an in-tree storage class into its CSI counterpart.
    fn translate_in_tree_storage_class_to_csi(&self, sc: &StorageClass) -> Result<StorageClass>;

    /// Translate an inline (pod-embedded) volume into a CSI persistent
    /// volume.
    fn translate_in_tree_inline_volume_to_csi(&self, volume: &Volume) -> Result<PersistentVolume>;

    /// Translate an in-tree persistent volume into its CSI counterpart.
    fn translate_in_tree_pv_to_csi(&self, pv: &PersistentVolume) -> Result<PersistentVolume>;

    /// Reconstruct the in-tree persistent volume from a CSI descriptor.
    fn translate_csi_pv_to_in_tree(&self, pv: &PersistentVolume) -> Result<PersistentVolume>;

    /// Whether this translator handles the given persistent volume.
    fn can_support(&self, pv: &PersistentVolume) -> bool;

    /// Whether this translator handles the given inline volume.
    fn can_support_inline(&self, volume: &Volume) -> bool;

    /// Name of the in-tree plugin this translator replaces.
    fn in_tree_plugin_name(&self) -> &'static str;

    /// Name of the CSI driver this translator targets.
    fn csi_plugin_name(&self) -> &'static str;

    /// Normalize an opaque volume handle for the given node context.
    ///
    /// Repair is idempotent: repairing an already repaired handle yields the
    /// same string. A translator with no meaningful repair rule returns the
    /// handle unchanged; one whose rule is simply not built yet reports
    /// [`crate::Error::NotImplemented`].
    fn repair_volume_handle(&self, volume_handle: &str, node_id: &str) -> Result<String>;
}

/// Shared handle to a registered translator
pub type InTreeTranslatorRef = Arc<dyn InTreeTranslator>;

/// Translators registered by [`crate::CsiTranslator::new`], in dispatch
/// order.
pub fn default_translators() -> Vec<InTreeTranslatorRef> {
    vec![
        Arc::new(AzureDiskTranslator::new()),
        Arc::new(PortworxTranslator::new()),
    ]
}
