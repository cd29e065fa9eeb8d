// ── Device repository loaders ──
//
// A repository yields the full device set before the tree is built. The
// JSON loader applies patch files in order and can strip capabilities the
// caller never asks for.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::Device;
use crate::constants::CONTROL_GROUP;
use crate::error::CoreError;

/// Source of device records.
pub trait Repository: Send + Sync {
    fn load(&self) -> Result<Vec<Device>, CoreError>;
}

/// On-disk layout shared by the main file and its patches.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepositoryFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub devices: Vec<Device>,
}

impl RepositoryFile {
    pub fn read(path: &Path) -> Result<Self, CoreError> {
        let raw = fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(|e| CoreError::Repository {
            message: format!("{}: {e}", path.display()),
        })
    }
}

// ── Patching ────────────────────────────────────────────────────────

/// Merge `patch` into `devices`. A known id has its groups merged over the
/// existing ones (and may replace the identification string or parent);
/// an unknown id is appended.
pub fn apply_patch(devices: &mut Vec<Device>, patch: Vec<Device>) {
    let mut positions: HashMap<String, usize> = devices
        .iter()
        .enumerate()
        .map(|(i, d)| (d.id.clone(), i))
        .collect();

    for patched in patch {
        match positions.get(&patched.id) {
            Some(&i) => merge_device(&mut devices[i], patched),
            None => {
                warn!(id = %patched.id, "patch adds a device the repository does not know");
                positions.insert(patched.id.clone(), devices.len());
                devices.push(patched);
            }
        }
    }
}

fn merge_device(existing: &mut Device, patched: Device) {
    if !patched.user_agent.is_empty() {
        existing.user_agent = patched.user_agent;
    }
    if patched.fall_back.is_some() {
        existing.fall_back = patched.fall_back;
    }
    existing.actual_device_root |= patched.actual_device_root;
    for (group, caps) in patched.groups {
        existing.groups.entry(group).or_default().extend(caps);
    }
}

// ── Capability filter ───────────────────────────────────────────────

/// Keeps only the named capabilities; the control group always survives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilityFilter {
    keep: BTreeSet<String>,
}

impl CapabilityFilter {
    /// `names` plus `required`, typically the virtual-rule inputs.
    pub fn new<'a>(
        names: impl IntoIterator<Item = impl Into<String>>,
        required: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let mut keep: BTreeSet<String> = names.into_iter().map(Into::into).collect();
        keep.extend(required.into_iter().map(str::to_owned));
        Self { keep }
    }

    pub fn keeps(&self, group: &str, name: &str) -> bool {
        group == CONTROL_GROUP || self.keep.contains(name)
    }

    pub fn apply(&self, device: &mut Device) {
        for (group, caps) in &mut device.groups {
            caps.retain(|name, _| self.keeps(group, name));
        }
        device.groups.retain(|_, caps| !caps.is_empty());
    }
}

// ── JSON file ───────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct JsonRepository {
    path: PathBuf,
    patches: Vec<PathBuf>,
    filter: Option<CapabilityFilter>,
}

impl JsonRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            patches: Vec::new(),
            filter: None,
        }
    }

    pub fn with_patches(mut self, patches: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        self.patches.extend(patches.into_iter().map(Into::into));
        self
    }

    pub fn with_filter(mut self, filter: CapabilityFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Repository for JsonRepository {
    fn load(&self) -> Result<Vec<Device>, CoreError> {
        let file = RepositoryFile::read(&self.path)?;
        info!(
            path = %self.path.display(),
            version = file.version.as_deref().unwrap_or("unknown"),
            devices = file.devices.len(),
            "repository loaded"
        );
        let mut devices = file.devices;

        for patch_path in &self.patches {
            let patch = RepositoryFile::read(patch_path)?;
            debug!(path = %patch_path.display(), devices = patch.devices.len(), "applying patch");
            apply_patch(&mut devices, patch.devices);
        }

        if let Some(filter) = &self.filter {
            for device in &mut devices {
                filter.apply(device);
            }
        }
        Ok(devices)
    }
}

// ── In memory ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    devices: Vec<Device>,
}

impl InMemoryRepository {
    pub fn new(devices: Vec<Device>) -> Self {
        Self { devices }
    }
}

impl Repository for InMemoryRepository {
    fn load(&self) -> Result<Vec<Device>, CoreError> {
        Ok(self.devices.clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const BASE: &str = r#"{
        "version": "test-1",
        "devices": [
            { "id": "generic", "fall_back": "root",
              "groups": { "product_info": { "brand_name": "", "is_wireless_device": "false" },
                          "virtual": { "controlcap_is_mobile": "default" } } },
            { "id": "nokia_6300", "fall_back": "generic", "user_agent": "Nokia6300/2.0",
              "groups": { "product_info": { "brand_name": "Nokia" } } }
        ]
    }"#;

    const PATCH: &str = r#"{
        "devices": [
            { "id": "nokia_6300", "groups": { "product_info": { "is_wireless_device": "true" } } },
            { "id": "sagem_x5", "fall_back": "generic", "user_agent": "SAGEM-myX5-2/1.0" }
        ]
    }"#;

    fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn loads_and_patches() {
        let tmp = tempfile::tempdir().unwrap();
        let base = write(tmp.path(), "devices.json", BASE);
        let patch = write(tmp.path(), "patch.json", PATCH);

        let devices = JsonRepository::new(base).with_patches([patch]).load().unwrap();
        assert_eq!(devices.len(), 3);

        let nokia = devices.iter().find(|d| d.id == "nokia_6300").unwrap();
        assert_eq!(nokia.own_capability("product_info", "brand_name"), Some("Nokia"));
        assert_eq!(nokia.own_capability("product_info", "is_wireless_device"), Some("true"));
        assert_eq!(nokia.user_agent, "Nokia6300/2.0");
        assert_eq!(nokia.fall_back.as_deref(), Some("generic"));
    }

    #[test]
    fn filter_keeps_listed_required_and_control() {
        let tmp = tempfile::tempdir().unwrap();
        let base = write(tmp.path(), "devices.json", BASE);
        let filter = CapabilityFilter::new(["brand_name"], std::iter::empty());

        let devices = JsonRepository::new(base).with_filter(filter).load().unwrap();
        let root = devices.iter().find(|d| d.id == "generic").unwrap();
        assert_eq!(root.own_capability("product_info", "is_wireless_device"), None);
        assert_eq!(root.own_capability("product_info", "brand_name"), Some(""));
        assert_eq!(root.own_capability("virtual", "controlcap_is_mobile"), Some("default"));
    }

    #[test]
    fn malformed_file_is_a_repository_error() {
        let tmp = tempfile::tempdir().unwrap();
        let base = write(tmp.path(), "devices.json", "{ nope");
        assert!(matches!(
            JsonRepository::new(base).load(),
            Err(CoreError::Repository { .. })
        ));
    }

    #[test]
    fn missing_file_is_io() {
        let repo = JsonRepository::new("/definitely/not/here.json");
        assert!(matches!(repo.load(), Err(CoreError::Io(_))));
    }
}
