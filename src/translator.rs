//! Translator dispatch
//!
//! [`CsiTranslator`] holds the ordered set of registered provider
//! translators and routes each descriptor to the first translator that
//! claims it. Selection inspects only the descriptor itself: the populated
//! in-tree source field, or the CSI driver name for the reverse direction.

use crate::error::{Error, Result};
use crate::plugins::{default_translators, InTreeTranslator, InTreeTranslatorRef};
use k8s_openapi::api::core::v1::{PersistentVolume, Volume};
use k8s_openapi::api::storage::v1::StorageClass;
use std::sync::LazyLock;
use tracing::debug;

/// Process-wide dispatcher over the default translator set, initialized on
/// first use.
static SHARED_TRANSLATOR: LazyLock<CsiTranslator> = LazyLock::new(CsiTranslator::new);

/// Dispatcher over the registered in-tree translators
pub struct CsiTranslator {
    /// Registration order is the dispatch tie-break; predicates are disjoint
    /// for well-formed descriptors, so order only matters for malformed
    /// inputs that populate more than one source.
    translators: Vec<InTreeTranslatorRef>,
}

impl CsiTranslator {
    /// Create a dispatcher over the default translator set.
    pub fn new() -> Self {
        Self::with_translators(default_translators())
    }

    /// Create a dispatcher over a custom translator set. The set is fixed
    /// for the lifetime of the dispatcher; register everything up front.
    pub fn with_translators(translators: Vec<InTreeTranslatorRef>) -> Self {
        Self { translators }
    }

    /// Shared dispatcher over the default translator set.
    pub fn shared() -> &'static CsiTranslator {
        &SHARED_TRANSLATOR
    }

    // =========================================================================
    // Translation
    // =========================================================================

    /// Translate an in-tree storage class for the named in-tree plugin.
    pub fn translate_in_tree_storage_class_to_csi(
        &self,
        plugin_name: &str,
        sc: &StorageClass,
    ) -> Result<StorageClass> {
        let translator = self.translator_for_in_tree_name(plugin_name)?;
        translator.translate_in_tree_storage_class_to_csi(sc)
    }

    /// Translate an inline volume into a CSI persistent volume.
    pub fn translate_in_tree_inline_volume_to_csi(
        &self,
        volume: &Volume,
    ) -> Result<PersistentVolume> {
        let translator = self
            .translators
            .iter()
            .find(|translator| translator.can_support_inline(volume))
            .ok_or_else(|| Error::NoTranslatorFound {
                descriptor: volume.name.clone(),
            })?;
        debug!(
            "translating inline volume {} via {}",
            volume.name,
            translator.in_tree_plugin_name()
        );
        translator.translate_in_tree_inline_volume_to_csi(volume)
    }

    /// Translate an in-tree persistent volume into its CSI counterpart.
    pub fn translate_in_tree_pv_to_csi(&self, pv: &PersistentVolume) -> Result<PersistentVolume> {
        let translator = self.translator_for_pv(pv)?;
        debug!(
            "translating persistent volume {} via {}",
            pv_name(pv),
            translator.in_tree_plugin_name()
        );
        translator.translate_in_tree_pv_to_csi(pv)
    }

    /// Reconstruct the in-tree persistent volume from a CSI descriptor,
    /// routed by the descriptor's driver name.
    pub fn translate_csi_pv_to_in_tree(&self, pv: &PersistentVolume) -> Result<PersistentVolume> {
        let csi_source = pv
            .spec
            .as_ref()
            .and_then(|spec| spec.csi.as_ref())
            .ok_or(Error::UnsupportedSource {
                descriptor: "persistent volume",
                plugin: "CSI",
            })?;
        let translator = self.translator_for_csi_name(&csi_source.driver)?;
        translator.translate_csi_pv_to_in_tree(pv)
    }

    /// Normalize a volume handle for the given node context, routed by CSI
    /// driver name.
    pub fn repair_volume_handle(
        &self,
        driver: &str,
        volume_handle: &str,
        node_id: &str,
    ) -> Result<String> {
        let translator = self.translator_for_csi_name(driver)?;
        translator.repair_volume_handle(volume_handle, node_id)
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Whether some registered translator claims this persistent volume.
    pub fn is_pv_migratable(&self, pv: &PersistentVolume) -> bool {
        self.translators
            .iter()
            .any(|translator| translator.can_support(pv))
    }

    /// Whether some registered translator claims this inline volume.
    pub fn is_inline_migratable(&self, volume: &Volume) -> bool {
        self.translators
            .iter()
            .any(|translator| translator.can_support_inline(volume))
    }

    /// Whether the named in-tree plugin has a registered translator.
    pub fn is_migratable_in_tree_plugin_by_name(&self, plugin_name: &str) -> bool {
        self.translator_for_in_tree_name(plugin_name).is_ok()
    }

    /// Whether the named CSI driver replaces a registered in-tree plugin.
    pub fn is_migrated_csi_driver_by_name(&self, driver: &str) -> bool {
        self.translator_for_csi_name(driver).is_ok()
    }

    /// CSI driver name for the named in-tree plugin.
    pub fn csi_name_from_in_tree_name(&self, plugin_name: &str) -> Result<&'static str> {
        self.translator_for_in_tree_name(plugin_name)
            .map(|translator| translator.csi_plugin_name())
    }

    /// In-tree plugin name for the named CSI driver.
    pub fn in_tree_name_from_csi_name(&self, driver: &str) -> Result<&'static str> {
        self.translator_for_csi_name(driver)
            .map(|translator| translator.in_tree_plugin_name())
    }

    /// In-tree plugin name claiming the given persistent volume.
    pub fn in_tree_plugin_name_from_pv(&self, pv: &PersistentVolume) -> Result<&'static str> {
        self.translator_for_pv(pv)
            .map(|translator| translator.in_tree_plugin_name())
    }

    // =========================================================================
    // Selection
    // =========================================================================

    fn translator_for_pv(&self, pv: &PersistentVolume) -> Result<&dyn InTreeTranslator> {
        self.translators
            .iter()
            .find(|translator| translator.can_support(pv))
            .map(|translator| translator.as_ref())
            .ok_or_else(|| Error::NoTranslatorFound {
                descriptor: pv_name(pv),
            })
    }

    fn translator_for_csi_name(&self, driver: &str) -> Result<&dyn InTreeTranslator> {
        self.translators
            .iter()
            .find(|translator| translator.csi_plugin_name() == driver)
            .map(|translator| translator.as_ref())
            .ok_or_else(|| Error::NoTranslatorFound {
                descriptor: driver.to_string(),
            })
    }

    fn translator_for_in_tree_name(&self, plugin_name: &str) -> Result<&dyn InTreeTranslator> {
        self.translators
            .iter()
            .find(|translator| translator.in_tree_plugin_name() == plugin_name)
            .map(|translator| translator.as_ref())
            .ok_or_else(|| Error::NoTranslatorFound {
                descriptor: plugin_name.to_string(),
            })
    }
}

impl Default for CsiTranslator {
    fn default() -> Self {
        Self::new()
    }
}

fn pv_name(pv: &PersistentVolume) -> String {
    pv.metadata.name.clone().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::{
        AZURE_DISK_DRIVER_NAME, AZURE_DISK_IN_TREE_PLUGIN_NAME, PORTWORX_DRIVER_NAME,
        PORTWORX_IN_TREE_PLUGIN_NAME,
    };
    use assert_matches::assert_matches;
    use k8s_openapi::api::core::v1::{
        AzureDiskVolumeSource, CSIPersistentVolumeSource, NFSVolumeSource, PersistentVolumeSpec,
        PortworxVolumeSource,
    };

    fn azure_pv(name: &str) -> PersistentVolume {
        let mut pv = PersistentVolume {
            spec: Some(PersistentVolumeSpec {
                azure_disk: Some(AzureDiskVolumeSource {
                    disk_name: "disk-0".to_string(),
                    disk_uri: "datadiskuri".to_string(),
                    ..AzureDiskVolumeSource::default()
                }),
                ..PersistentVolumeSpec::default()
            }),
            ..PersistentVolume::default()
        };
        pv.metadata.name = Some(name.to_string());
        pv
    }

    fn nfs_pv(name: &str) -> PersistentVolume {
        let mut pv = PersistentVolume {
            spec: Some(PersistentVolumeSpec {
                nfs: Some(NFSVolumeSource {
                    path: "/export".to_string(),
                    server: "nfs.local".to_string(),
                    ..NFSVolumeSource::default()
                }),
                ..PersistentVolumeSpec::default()
            }),
            ..PersistentVolume::default()
        };
        pv.metadata.name = Some(name.to_string());
        pv
    }

    #[test]
    fn test_dispatch_selects_azure_for_azure_pv() {
        let translator = CsiTranslator::new();
        let translated = translator
            .translate_in_tree_pv_to_csi(&azure_pv("pv-azure"))
            .unwrap();
        let csi = translated.spec.as_ref().unwrap().csi.as_ref().unwrap();
        assert_eq!(csi.driver, AZURE_DISK_DRIVER_NAME);
    }

    #[test]
    fn test_dispatch_selects_portworx_for_portworx_pv() {
        let translator = CsiTranslator::new();
        let pv = PersistentVolume {
            spec: Some(PersistentVolumeSpec {
                portworx_volume: Some(PortworxVolumeSource {
                    volume_id: "pxd-1".to_string(),
                    ..PortworxVolumeSource::default()
                }),
                ..PersistentVolumeSpec::default()
            }),
            ..PersistentVolume::default()
        };
        // Selection lands on the Portworx translator, whose body is a
        // development-time gap rather than a dispatch failure.
        let err = translator.translate_in_tree_pv_to_csi(&pv).unwrap_err();
        assert!(err.is_not_implemented());
    }

    #[test]
    fn test_dispatch_without_match() {
        let translator = CsiTranslator::new();
        let err = translator
            .translate_in_tree_pv_to_csi(&nfs_pv("pv-nfs"))
            .unwrap_err();
        assert_matches!(err, Error::NoTranslatorFound { ref descriptor } => {
            assert_eq!(descriptor, "pv-nfs");
        });
        assert!(!translator.is_pv_migratable(&nfs_pv("pv-nfs")));
    }

    #[test]
    fn test_dispatch_inline_volume() {
        let translator = CsiTranslator::new();
        let volume = Volume {
            name: "data".to_string(),
            azure_disk: Some(AzureDiskVolumeSource {
                disk_name: "diskname".to_string(),
                disk_uri: "datadiskuri".to_string(),
                ..AzureDiskVolumeSource::default()
            }),
            ..Volume::default()
        };
        let pv = translator
            .translate_in_tree_inline_volume_to_csi(&volume)
            .unwrap();
        assert_eq!(
            pv.metadata.name.as_deref(),
            Some("disk.csi.azure.com-diskname")
        );

        assert!(translator.is_inline_migratable(&volume));

        let plain = Volume {
            name: "scratch".to_string(),
            ..Volume::default()
        };
        assert!(!translator.is_inline_migratable(&plain));
        assert_matches!(
            translator
                .translate_in_tree_inline_volume_to_csi(&plain)
                .unwrap_err(),
            Error::NoTranslatorFound { .. }
        );
    }

    #[test]
    fn test_dispatch_csi_pv_by_driver() {
        let translator = CsiTranslator::new();
        let pv = PersistentVolume {
            spec: Some(PersistentVolumeSpec {
                csi: Some(CSIPersistentVolumeSource {
                    driver: AZURE_DISK_DRIVER_NAME.to_string(),
                    volume_handle:
                        "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.Compute/disks/disk-0"
                            .to_string(),
                    ..CSIPersistentVolumeSource::default()
                }),
                ..PersistentVolumeSpec::default()
            }),
            ..PersistentVolume::default()
        };

        let translated = translator.translate_csi_pv_to_in_tree(&pv).unwrap();
        let azure = translated
            .spec
            .as_ref()
            .unwrap()
            .azure_disk
            .as_ref()
            .unwrap();
        assert_eq!(azure.disk_name, "disk-0");

        let mut foreign = pv.clone();
        if let Some(csi) = foreign.spec.as_mut().and_then(|spec| spec.csi.as_mut()) {
            csi.driver = "ebs.csi.aws.com".to_string();
        }
        assert_matches!(
            translator.translate_csi_pv_to_in_tree(&foreign).unwrap_err(),
            Error::NoTranslatorFound { .. }
        );
    }

    #[test]
    fn test_storage_class_dispatch_by_plugin_name() {
        let translator = CsiTranslator::new();
        let sc = StorageClass {
            provisioner: AZURE_DISK_IN_TREE_PLUGIN_NAME.to_string(),
            ..StorageClass::default()
        };
        assert_eq!(
            translator
                .translate_in_tree_storage_class_to_csi(AZURE_DISK_IN_TREE_PLUGIN_NAME, &sc)
                .unwrap(),
            sc
        );
        assert_matches!(
            translator
                .translate_in_tree_storage_class_to_csi("kubernetes.io/gce-pd", &sc)
                .unwrap_err(),
            Error::NoTranslatorFound { .. }
        );
    }

    #[test]
    fn test_name_lookups() {
        let translator = CsiTranslator::new();
        assert_eq!(
            translator
                .csi_name_from_in_tree_name(AZURE_DISK_IN_TREE_PLUGIN_NAME)
                .unwrap(),
            AZURE_DISK_DRIVER_NAME
        );
        assert_eq!(
            translator
                .in_tree_name_from_csi_name(PORTWORX_DRIVER_NAME)
                .unwrap(),
            PORTWORX_IN_TREE_PLUGIN_NAME
        );
        assert_eq!(
            translator
                .in_tree_plugin_name_from_pv(&azure_pv("pv-azure"))
                .unwrap(),
            AZURE_DISK_IN_TREE_PLUGIN_NAME
        );

        assert!(translator.is_migratable_in_tree_plugin_by_name(PORTWORX_IN_TREE_PLUGIN_NAME));
        assert!(!translator.is_migratable_in_tree_plugin_by_name("kubernetes.io/gce-pd"));
        assert!(translator.is_migrated_csi_driver_by_name(AZURE_DISK_DRIVER_NAME));
        assert!(!translator.is_migrated_csi_driver_by_name("ebs.csi.aws.com"));

        assert_matches!(
            translator
                .csi_name_from_in_tree_name("kubernetes.io/gce-pd")
                .unwrap_err(),
            Error::NoTranslatorFound { .. }
        );
    }

    #[test]
    fn test_repair_dispatch() {
        let translator = CsiTranslator::new();
        let handle = "/Subscriptions/sub/resourceGroups/rg/providers/Microsoft.Compute/disks/d";
        let repaired = translator
            .repair_volume_handle(AZURE_DISK_DRIVER_NAME, handle, "node-1")
            .unwrap();
        assert_eq!(
            repaired,
            "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.Compute/disks/d"
        );

        assert!(translator
            .repair_volume_handle(PORTWORX_DRIVER_NAME, "pxd-1", "node-1")
            .unwrap_err()
            .is_not_implemented());

        assert_matches!(
            translator
                .repair_volume_handle("ebs.csi.aws.com", "vol-1", "node-1")
                .unwrap_err(),
            Error::NoTranslatorFound { .. }
        );
    }

    #[test]
    fn test_dispatch_does_not_mutate_input() {
        let translator = CsiTranslator::new();
        let pv = azure_pv("pv-azure");
        let original = pv.clone();
        let _ = translator.translate_in_tree_pv_to_csi(&pv).unwrap();
        assert_eq!(pv, original);
    }

    #[test]
    fn test_shared_dispatcher() {
        let translated = CsiTranslator::shared()
            .translate_in_tree_pv_to_csi(&azure_pv("pv-azure"))
            .unwrap();
        assert!(translated.spec.as_ref().unwrap().csi.is_some());
    }
}
