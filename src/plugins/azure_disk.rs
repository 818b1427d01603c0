//! Azure Disk translation
//!
//! Translates the in-tree `kubernetes.io/azure-disk` volume source to the
//! `disk.csi.azure.com` CSI driver and back. Covers locator classification
//! (managed resource path vs unmanaged blob URI), disk name extraction,
//! field mapping in both directions, and volume handle repair.

use crate::error::{Error, Result};
use crate::plugins::{InTreeTranslator, DEFAULT_ACCESS_MODE};
use k8s_openapi::api::core::v1::{
    AzureDiskVolumeSource, CSIPersistentVolumeSource, PersistentVolume, PersistentVolumeSpec,
    Volume,
};
use k8s_openapi::api::storage::v1::StorageClass;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::debug;

// =============================================================================
// Driver Constants
// =============================================================================

/// Name of the Azure Disk CSI driver
pub const AZURE_DISK_DRIVER_NAME: &str = "disk.csi.azure.com";

/// Name of the in-tree plugin the Azure Disk CSI driver replaces
pub const AZURE_DISK_IN_TREE_PLUGIN_NAME: &str = "kubernetes.io/azure-disk";

/// Volume attribute carrying the provisioning kind (`Managed`/`Unmanaged`)
pub const AZURE_DISK_KIND: &str = "kind";

/// Volume attribute carrying the host caching mode
pub const AZURE_DISK_CACHING_MODE: &str = "cachingmode";

/// Volume attribute carrying the filesystem type
pub const AZURE_DISK_FS_TYPE: &str = "fstype";

// =============================================================================
// Disk Locator Patterns
// =============================================================================

/// Managed-disk resource path, e.g.
/// `/subscriptions/<s>/resourceGroups/<g>/providers/Microsoft.Compute/disks/<name>`.
static MANAGED_DISK_PATH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r".*/subscriptions/(?:.*)/resourceGroups/(?:.*)/providers/Microsoft.Compute/disks/(.+)",
    )
    .expect("managed disk path pattern must compile")
});

/// Unmanaged blob URI, e.g. `https://<account>/vhds/<name>.vhd`. The capture
/// is the blob filename with any `.vhd` extension dropped.
static UNMANAGED_DISK_PATH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"http(?:.*)://(?:.*)/vhds/(.+?)(?:\.vhd)?$")
        .expect("unmanaged disk path pattern must compile")
});

/// Network locator shape used for classification: lowercase scheme plus at
/// least one path segment after the host.
static UNMANAGED_LOCATOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://[^/]+/.+").expect("unmanaged locator pattern must compile")
});

/// Managed-disk resource path matched without case sensitivity, split into
/// its variable segments for canonical-casing repair.
static MANAGED_DISK_PATH_CI_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?P<prefix>.*)/subscriptions/(?P<sub>[^/]+)/resourceGroups/(?P<group>[^/]+)/providers/Microsoft\.Compute/disks/(?P<disk>[^/]+)$",
    )
    .expect("case-insensitive managed disk path pattern must compile")
});

// =============================================================================
// Disk Locator Parsing
// =============================================================================

/// Provisioning model of an Azure disk, derived from the shape of its
/// locator string alone, never from accompanying metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiskKind {
    Managed,
    Unmanaged,
}

impl std::fmt::Display for DiskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiskKind::Managed => write!(f, "Managed"),
            DiskKind::Unmanaged => write!(f, "Unmanaged"),
        }
    }
}

/// Classify a disk locator by shape.
///
/// A locator is [`DiskKind::Unmanaged`] only when it carries a lowercase
/// `http`/`https` scheme and at least one path segment after the host.
/// Resource paths and bare hostnames are [`DiskKind::Managed`].
///
/// The scheme match is case sensitive: `HTTP://host/container/name` does not
/// match the unmanaged shape and falls through to `Managed`. Inherited,
/// possibly unintended behavior that existing handles rely on; kept as-is.
pub fn classify_disk_uri(disk_uri: &str) -> DiskKind {
    if UNMANAGED_LOCATOR_RE.is_match(disk_uri) {
        DiskKind::Unmanaged
    } else {
        DiskKind::Managed
    }
}

/// Extract the bare disk name from a locator string.
///
/// Applies the managed or unmanaged pattern depending on
/// [`classify_disk_uri`]. On no match the returned
/// [`Error::MalformedLocator`] spells out both the offending input and the
/// pattern that was expected.
pub fn disk_name(disk_uri: &str) -> Result<String> {
    let pattern: &Regex = match classify_disk_uri(disk_uri) {
        DiskKind::Managed => &*MANAGED_DISK_PATH_RE,
        DiskKind::Unmanaged => &*UNMANAGED_DISK_PATH_RE,
    };

    pattern
        .captures(disk_uri)
        .and_then(|captures| captures.get(1))
        .map(|name| name.as_str().to_string())
        .ok_or_else(|| Error::MalformedLocator {
            locator: disk_uri.to_string(),
            expected_format: pattern.as_str().to_string(),
        })
}

/// Provisioning kind recorded in the volume attributes: the explicit source
/// field wins when present and non-empty, otherwise the kind is derived from
/// the locator shape.
fn provisioning_kind(explicit: Option<&String>, disk_uri: &str) -> String {
    match explicit {
        Some(kind) if !kind.is_empty() => kind.clone(),
        _ => classify_disk_uri(disk_uri).to_string(),
    }
}

/// Read an attribute value, treating empty strings as absent.
fn non_empty_attribute(attributes: &BTreeMap<String, String>, key: &str) -> Option<String> {
    attributes.get(key).filter(|value| !value.is_empty()).cloned()
}

// =============================================================================
// Azure Disk Translator
// =============================================================================

/// Translator between the in-tree Azure Disk plugin and
/// `disk.csi.azure.com`
#[derive(Debug, Default)]
pub struct AzureDiskTranslator;

impl AzureDiskTranslator {
    /// Create a new Azure Disk translator
    pub fn new() -> Self {
        Self
    }
}

impl InTreeTranslator for AzureDiskTranslator {
    fn translate_in_tree_storage_class_to_csi(&self, sc: &StorageClass) -> Result<StorageClass> {
        // Provisioning parameters are provider-agnostic at this layer.
        Ok(sc.clone())
    }

    fn translate_in_tree_inline_volume_to_csi(&self, volume: &Volume) -> Result<PersistentVolume> {
        let azure_source = volume.azure_disk.as_ref().ok_or(Error::UnsupportedSource {
            descriptor: "volume",
            plugin: "Azure Disk",
        })?;

        let mut volume_attributes = BTreeMap::new();
        volume_attributes.insert(
            AZURE_DISK_KIND.to_string(),
            provisioning_kind(azure_source.kind.as_ref(), &azure_source.disk_uri),
        );

        Ok(PersistentVolume {
            metadata: ObjectMeta {
                // Must be unique per disk: downstream consumers key staging
                // paths off this name.
                name: Some(format!(
                    "{}-{}",
                    AZURE_DISK_DRIVER_NAME, azure_source.disk_name
                )),
                ..ObjectMeta::default()
            },
            spec: Some(PersistentVolumeSpec {
                access_modes: Some(vec![DEFAULT_ACCESS_MODE.to_string()]),
                csi: Some(CSIPersistentVolumeSource {
                    driver: AZURE_DISK_DRIVER_NAME.to_string(),
                    volume_handle: azure_source.disk_uri.clone(),
                    fs_type: azure_source.fs_type.clone(),
                    read_only: azure_source.read_only,
                    volume_attributes: Some(volume_attributes),
                    ..CSIPersistentVolumeSource::default()
                }),
                ..PersistentVolumeSpec::default()
            }),
            ..PersistentVolume::default()
        })
    }

    fn translate_in_tree_pv_to_csi(&self, pv: &PersistentVolume) -> Result<PersistentVolume> {
        let azure_source = pv
            .spec
            .as_ref()
            .and_then(|spec| spec.azure_disk.as_ref())
            .ok_or(Error::UnsupportedSource {
                descriptor: "persistent volume",
                plugin: "Azure Disk",
            })?;

        let mut volume_attributes = BTreeMap::new();
        volume_attributes.insert(
            AZURE_DISK_KIND.to_string(),
            provisioning_kind(azure_source.kind.as_ref(), &azure_source.disk_uri),
        );
        if let Some(caching_mode) = &azure_source.caching_mode {
            if !caching_mode.is_empty() {
                volume_attributes.insert(AZURE_DISK_CACHING_MODE.to_string(), caching_mode.clone());
            }
        }
        if let Some(fs_type) = &azure_source.fs_type {
            volume_attributes.insert(AZURE_DISK_FS_TYPE.to_string(), fs_type.clone());
        }

        let csi_source = CSIPersistentVolumeSource {
            driver: AZURE_DISK_DRIVER_NAME.to_string(),
            volume_handle: azure_source.disk_uri.clone(),
            fs_type: azure_source.fs_type.clone(),
            read_only: azure_source.read_only,
            volume_attributes: Some(volume_attributes),
            ..CSIPersistentVolumeSource::default()
        };

        // PV-to-PV translation never renames; swap the source variant on a
        // fresh copy so exactly one remains populated.
        let mut translated = pv.clone();
        if let Some(spec) = translated.spec.as_mut() {
            spec.azure_disk = None;
            spec.csi = Some(csi_source);
        }
        Ok(translated)
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
        if csi_source.driver != AZURE_DISK_DRIVER_NAME {
            return Err(Error::UnsupportedDriver {
                driver: csi_source.driver.clone(),
                expected: AZURE_DISK_DRIVER_NAME,
            });
        }

        let disk_uri = csi_source.volume_handle.clone();
        let name = disk_name(&disk_uri)?;

        let mut azure_source = AzureDiskVolumeSource {
            disk_name: name,
            disk_uri,
            fs_type: csi_source.fs_type.clone(),
            read_only: csi_source.read_only,
            ..AzureDiskVolumeSource::default()
        };
        if let Some(attributes) = &csi_source.volume_attributes {
            if let Some(caching_mode) = non_empty_attribute(attributes, AZURE_DISK_CACHING_MODE) {
                azure_source.caching_mode = Some(caching_mode);
            }
            if let Some(fs_type) = non_empty_attribute(attributes, AZURE_DISK_FS_TYPE) {
                azure_source.fs_type = Some(fs_type);
            }
            if let Some(kind) = non_empty_attribute(attributes, AZURE_DISK_KIND) {
                azure_source.kind = Some(kind);
            }
        }

        let mut translated = pv.clone();
        if let Some(spec) = translated.spec.as_mut() {
            spec.csi = None;
            spec.azure_disk = Some(azure_source);
        }
        Ok(translated)
    }

    fn can_support(&self, pv: &PersistentVolume) -> bool {
        pv.spec
            .as_ref()
            .map_or(false, |spec| spec.azure_disk.is_some())
    }

    fn can_support_inline(&self, volume: &Volume) -> bool {
        volume.azure_disk.is_some()
    }

    fn in_tree_plugin_name(&self) -> &'static str {
        AZURE_DISK_IN_TREE_PLUGIN_NAME
    }

    fn csi_plugin_name(&self) -> &'static str {
        AZURE_DISK_DRIVER_NAME
    }

    fn repair_volume_handle(&self, volume_handle: &str, _node_id: &str) -> Result<String> {
        // ARM resource IDs are case insensitive at the provider API but are
        // string-matched verbatim elsewhere in the stack. Rewrite the fixed
        // path segments to canonical casing, keeping every variable segment.
        // Handles that are not managed disk paths pass through untouched.
        match MANAGED_DISK_PATH_CI_RE.captures(volume_handle) {
            Some(captures) => {
                let repaired = format!(
                    "{}/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Compute/disks/{}",
                    &captures["prefix"], &captures["sub"], &captures["group"], &captures["disk"],
                );
                if repaired != volume_handle {
                    debug!(
                        "repaired azure disk volume handle {} -> {}",
                        volume_handle, repaired
                    );
                }
                Ok(repaired)
            }
            None => Ok(volume_handle.to_string()),
        }
    }
}
