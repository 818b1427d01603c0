//! Portworx translation
//!
//! Contract shape for the in-tree `kubernetes.io/portworx-volume` plugin.
//! Identity and dispatch predicates are wired up; the translation bodies are
//! not built yet and report [`Error::NotImplemented`] instead of
//! translating.

use crate::error::{Error, Result};
use crate::plugins::InTreeTranslator;
use k8s_openapi::api::core::v1::{PersistentVolume, Volume};
use k8s_openapi::api::storage::v1::StorageClass;

/// Name of the Portworx CSI driver
pub const PORTWORX_DRIVER_NAME: &str = "pxd.portworx.com";

/// Name of the in-tree plugin the Portworx CSI driver replaces
pub const PORTWORX_IN_TREE_PLUGIN_NAME: &str = "kubernetes.io/portworx-volume";

fn not_implemented(operation: &'static str) -> Error {
    Error::NotImplemented {
        plugin: PORTWORX_IN_TREE_PLUGIN_NAME,
        operation,
    }
}

/// Translator between the in-tree Portworx plugin and `pxd.portworx.com`
#[derive(Debug, Default)]
pub struct PortworxTranslator;

impl PortworxTranslator {
    /// Create a new Portworx translator
    pub fn new() -> Self {
        Self
    }
}

impl InTreeTranslator for PortworxTranslator {
    fn translate_in_tree_storage_class_to_csi(&self, sc: &StorageClass) -> Result<StorageClass> {
        // Provisioning parameters are provider-agnostic at this layer.
        Ok(sc.clone())
    }

    fn translate_in_tree_inline_volume_to_csi(&self, volume: &Volume) -> Result<PersistentVolume> {
        if volume.portworx_volume.is_none() {
            return Err(Error::UnsupportedSource {
                descriptor: "volume",
                plugin: "Portworx",
            });
        }
        Err(not_implemented("translate_in_tree_inline_volume_to_csi"))
    }

    fn translate_in_tree_pv_to_csi(&self, pv: &PersistentVolume) -> Result<PersistentVolume> {
        if !self.can_support(pv) {
            return Err(Error::UnsupportedSource {
                descriptor: "persistent volume",
                plugin: "Portworx",
            });
        }
        Err(not_implemented("translate_in_tree_pv_to_csi"))
    }

    fn translate_csi_pv_to_in_tree(&self, pv: &PersistentVolume) -> Result<PersistentVolume> {
        let csi_source = pv
            .spec
            .as_ref()
            .and_then(|spec| spec.csi.as_ref())
            .ok_or(Error::UnsupportedSource {
                descriptor: "persistent volume",
                plugin: "CSI",
            })?;
        if csi_source.driver != PORTWORX_DRIVER_NAME {
            return Err(Error::UnsupportedDriver {
                driver: csi_source.driver.clone(),
                expected: PORTWORX_DRIVER_NAME,
            });
        }
        Err(not_implemented("translate_csi_pv_to_in_tree"))
    }

    fn can_support(&self, pv: &PersistentVolume) -> bool {
        pv.spec
            .as_ref()
            .map_or(false, |spec| spec.portworx_volume.is_some())
    }

    fn can_support_inline(&self, volume: &Volume) -> bool {
        volume.portworx_volume.is_some()
    }

    fn in_tree_plugin_name(&self) -> &'static str {
        PORTWORX_IN_TREE_PLUGIN_NAME
    }

    fn csi_plugin_name(&self) -> &'static str {
        PORTWORX_DRIVER_NAME
    }

    fn repair_volume_handle(&self, _volume_handle: &str, _node_id: &str) -> Result<String> {
        Err(not_implemented("repair_volume_handle"))
    }
}
