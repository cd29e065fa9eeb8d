//! Device records and the immutable fall-back tree.
//!
//! Every device names its parent through `fall_back`; capabilities a device
//! does not define itself are inherited by walking towards the root, which
//! must define the full capability universe.

mod repository;

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::constants::ROOT_FALL_BACK;
use crate::error::CoreError;

pub use repository::{
    CapabilityFilter, InMemoryRepository, JsonRepository, Repository, RepositoryFile, apply_patch,
};

/// Capability groups: group name → capability name → value.
pub type Groups = BTreeMap<String, BTreeMap<String, String>>;

// ── Device ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    /// Reference identification string; empty for devices that only
    /// group capabilities.
    #[serde(default)]
    pub user_agent: String,
    /// Parent id. Absent, empty or `"root"` marks the root device.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fall_back: Option<String>,
    /// Marks real hardware as opposed to a firmware or browser variant.
    #[serde(default)]
    pub actual_device_root: bool,
    #[serde(default)]
    pub groups: Groups,
}

impl Device {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_fall_back(mut self, parent: impl Into<String>) -> Self {
        self.fall_back = Some(parent.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_actual_device_root(mut self, flag: bool) -> Self {
        self.actual_device_root = flag;
        self
    }

    pub fn with_capability(
        mut self,
        group: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.groups
            .entry(group.into())
            .or_default()
            .insert(name.into(), value.into());
        self
    }

    pub fn is_root(&self) -> bool {
        self.parent().is_none()
    }

    /// Parent id, or `None` for the root.
    pub fn parent(&self) -> Option<&str> {
        self.fall_back
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty() && *p != ROOT_FALL_BACK)
    }

    /// Value defined on this device itself, without inheritance.
    pub fn own_capability(&self, group: &str, name: &str) -> Option<&str> {
        self.groups
            .get(group)
            .and_then(|caps| caps.get(name))
            .map(String::as_str)
    }

    /// Every `(group, name)` pair defined on this device.
    pub fn capability_names(&self) -> impl Iterator<Item = (&str, &str)> {
        self.groups.iter().flat_map(|(group, caps)| {
            caps.keys().map(move |name| (group.as_str(), name.as_str()))
        })
    }
}

// ── Tree ────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct DeviceTree {
    devices: HashMap<String, Arc<Device>>,
    root_id: String,
    /// Capability name → group, taken from the root.
    name_to_group: HashMap<String, String>,
}

impl DeviceTree {
    /// Validate and index a full device set.
    pub fn build(devices: impl IntoIterator<Item = Device>) -> Result<Self, CoreError> {
        let mut map: HashMap<String, Arc<Device>> = HashMap::new();
        let mut root_id: Option<String> = None;

        for device in devices {
            if device.is_root() {
                if let Some(first) = &root_id {
                    return Err(CoreError::MultipleRoots {
                        first: first.clone(),
                        second: device.id,
                    });
                }
                root_id = Some(device.id.clone());
            }
            if map.contains_key(&device.id) {
                return Err(CoreError::DuplicateDevice { id: device.id });
            }
            map.insert(device.id.clone(), Arc::new(device));
        }

        let root_id = root_id.ok_or(CoreError::MissingRoot)?;
        check_parents(&map)?;
        check_cycles(&map)?;

        let root = &map[&root_id];
        check_defined_at_root(&map, root)?;

        let name_to_group = index_capability_names(root)?;

        info!(devices = map.len(), root = %root_id, "device tree built");
        Ok(Self {
            devices: map,
            root_id,
            name_to_group,
        })
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn root(&self) -> &Device {
        &self.devices[&self.root_id]
    }

    pub fn contains(&self, id: &str) -> bool {
        self.devices.contains_key(id)
    }

    /// All devices, in no particular order.
    pub fn devices(&self) -> impl Iterator<Item = &Device> {
        self.devices.values().map(AsRef::as_ref)
    }

    pub fn resolve(&self, id: &str) -> Result<&Arc<Device>, CoreError> {
        self.devices
            .get(id)
            .ok_or_else(|| CoreError::UnknownDevice { id: id.to_owned() })
    }

    // ── Capabilities ─────────────────────────────────────────────────

    pub fn is_capability_defined(&self, group: &str, name: &str) -> bool {
        self.root().own_capability(group, name).is_some()
    }

    pub fn is_group_defined(&self, group: &str) -> bool {
        self.root().groups.contains_key(group)
    }

    /// Group a capability name belongs to.
    pub fn group_of(&self, name: &str) -> Option<&str> {
        self.name_to_group.get(name).map(String::as_str)
    }

    /// Every capability name the root defines.
    pub fn capability_names(&self) -> impl Iterator<Item = &str> {
        self.name_to_group.keys().map(String::as_str)
    }

    /// Inherited lookup: device, then its parent, up to the root.
    pub fn capability(&self, id: &str, group: &str, name: &str) -> Result<&str, CoreError> {
        if !self.is_capability_defined(group, name) {
            return Err(CoreError::UnknownCapability {
                name: format!("{group}/{name}"),
            });
        }
        let device = self.resolve(id)?;
        self.ancestry(device)
            .find_map(|d| d.own_capability(group, name))
            .ok_or_else(|| CoreError::UnknownCapability {
                name: format!("{group}/{name}"),
            })
    }

    /// Inherited lookup with the group taken from the root's name index.
    pub fn capability_by_name(&self, id: &str, name: &str) -> Result<&str, CoreError> {
        let group = self
            .group_of(name)
            .ok_or_else(|| CoreError::UnknownCapability {
                name: name.to_owned(),
            })?;
        self.capability(id, group, name)
    }

    /// Ids from `id` up to and including the root.
    pub fn fall_back_path(&self, id: &str) -> Result<Vec<&str>, CoreError> {
        let device = self.resolve(id)?;
        Ok(self.ancestry(device).map(|d| d.id.as_str()).collect())
    }

    /// Every capability resolved for `id`, children overriding parents.
    pub fn all_capabilities(&self, id: &str) -> Result<Groups, CoreError> {
        let device = self.resolve(id)?;
        let path: Vec<&Device> = self.ancestry(device).collect();
        let mut merged = Groups::new();
        for ancestor in path.into_iter().rev() {
            for (group, caps) in &ancestor.groups {
                let target = merged.entry(group.clone()).or_default();
                for (name, value) in caps {
                    target.insert(name.clone(), value.clone());
                }
            }
        }
        Ok(merged)
    }

    /// Nearest ancestor-or-self flagged as a real device.
    pub fn actual_device_root(&self, id: &str) -> Result<Option<&Device>, CoreError> {
        let device = self.resolve(id)?;
        Ok(self.ancestry(device).find(|d| d.actual_device_root))
    }

    /// Fails unless the root defines every name in `names`.
    pub fn check_required<'n>(
        &self,
        names: impl IntoIterator<Item = &'n str>,
    ) -> Result<(), CoreError> {
        for name in names {
            if self.group_of(name).is_none() {
                return Err(CoreError::MissingRequiredCapability {
                    name: name.to_owned(),
                });
            }
        }
        Ok(())
    }

    fn ancestry<'t>(&'t self, start: &'t Device) -> Ancestry<'t> {
        Ancestry {
            tree: self,
            next: Some(start),
            remaining: self.devices.len(),
        }
    }
}

/// Walks parent links. Bounded by the device count even though the build
/// already rejected cycles.
struct Ancestry<'t> {
    tree: &'t DeviceTree,
    next: Option<&'t Device>,
    remaining: usize,
}

impl<'t> Iterator for Ancestry<'t> {
    type Item = &'t Device;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        self.next = current
            .parent()
            .and_then(|parent| self.tree.devices.get(parent))
            .map(AsRef::as_ref);
        Some(current)
    }
}

// ── Validation ──────────────────────────────────────────────────────

fn check_parents(map: &HashMap<String, Arc<Device>>) -> Result<(), CoreError> {
    for device in map.values() {
        if let Some(parent) = device.parent() {
            if !map.contains_key(parent) {
                return Err(CoreError::MissingParent {
                    id: device.id.clone(),
                    parent: parent.to_owned(),
                });
            }
        }
    }
    Ok(())
}

/// Every device must reach the root. Devices already proven to reach it
/// end later walks early, keeping the check linear overall.
fn check_cycles(map: &HashMap<String, Arc<Device>>) -> Result<(), CoreError> {
    let mut reaches_root: HashSet<&str> = HashSet::new();
    for device in map.values() {
        let mut seen: Vec<&str> = Vec::new();
        let mut current: &Device = device;
        loop {
            if reaches_root.contains(current.id.as_str()) {
                break;
            }
            if seen.contains(&current.id.as_str()) {
                return Err(CoreError::Cycle {
                    id: current.id.clone(),
                });
            }
            seen.push(current.id.as_str());
            match current.parent().and_then(|p| map.get(p)) {
                Some(parent) => current = Arc::as_ref(parent),
                None => break,
            }
        }
        reaches_root.extend(seen);
    }
    Ok(())
}

fn check_defined_at_root(
    map: &HashMap<String, Arc<Device>>,
    root: &Device,
) -> Result<(), CoreError> {
    for device in map.values() {
        for (group, name) in device.capability_names() {
            if root.own_capability(group, name).is_none() {
                return Err(CoreError::UndefinedAtRoot {
                    id: device.id.clone(),
                    group: group.to_owned(),
                    name: name.to_owned(),
                });
            }
        }
    }
    Ok(())
}

/// Capability name → group. Names must be unique across groups.
fn index_capability_names(root: &Device) -> Result<HashMap<String, String>, CoreError> {
    let mut index: HashMap<String, String> = HashMap::new();
    for (group, name) in root.capability_names() {
        if let Some(first) = index.insert(name.to_owned(), group.to_owned()) {
            return Err(CoreError::AmbiguousCapability {
                name: name.to_owned(),
                first,
                second: group.to_owned(),
            });
        }
    }
    Ok(index)
}

// ── Resolved view ───────────────────────────────────────────────────

/// A device together with the tree it lives in. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ResolvedDevice {
    tree: Arc<DeviceTree>,
    device: Arc<Device>,
}

impl ResolvedDevice {
    pub fn new(tree: Arc<DeviceTree>, id: &str) -> Result<Self, CoreError> {
        let device = Arc::clone(tree.resolve(id)?);
        Ok(Self { tree, device })
    }

    /// The tree's root device.
    pub fn root(tree: Arc<DeviceTree>) -> Self {
        let device = Arc::clone(&tree.devices[&tree.root_id]);
        Self { tree, device }
    }

    pub fn id(&self) -> &str {
        &self.device.id
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn tree(&self) -> &DeviceTree {
        &self.tree
    }

    pub fn capability(&self, group: &str, name: &str) -> Result<&str, CoreError> {
        self.tree.capability(&self.device.id, group, name)
    }

    pub fn capability_by_name(&self, name: &str) -> Result<&str, CoreError> {
        self.tree.capability_by_name(&self.device.id, name)
    }

    pub fn is_capability_defined(&self, group: &str, name: &str) -> bool {
        self.tree.is_capability_defined(group, name)
    }

    pub fn fall_back_path(&self) -> Vec<&str> {
        self.tree
            .fall_back_path(&self.device.id)
            .unwrap_or_default()
    }

    pub fn all_capabilities(&self) -> Groups {
        self.tree
            .all_capabilities(&self.device.id)
            .unwrap_or_default()
    }

    pub fn actual_device_root(&self) -> Option<&Device> {
        self.tree
            .actual_device_root(&self.device.id)
            .ok()
            .flatten()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn root() -> Device {
        Device::new("generic")
            .with_fall_back("root")
            .with_capability("product_info", "brand_name", "")
            .with_capability("product_info", "model_name", "")
            .with_capability("display", "resolution_width", "90")
    }

    fn tree() -> DeviceTree {
        DeviceTree::build([
            root(),
            Device::new("generic_mobile").with_fall_back("generic"),
            Device::new("nokia_6300")
                .with_fall_back("generic_mobile")
                .with_actual_device_root(true)
                .with_capability("product_info", "brand_name", "Nokia")
                .with_capability("display", "resolution_width", "240"),
            Device::new("nokia_6300_sub")
                .with_fall_back("nokia_6300")
                .with_capability("product_info", "model_name", "6300 v2"),
        ])
        .unwrap()
    }

    #[test]
    fn capabilities_are_inherited() {
        let tree = tree();
        assert_eq!(tree.capability("nokia_6300_sub", "product_info", "brand_name").unwrap(), "Nokia");
        assert_eq!(tree.capability("nokia_6300_sub", "product_info", "model_name").unwrap(), "6300 v2");
        assert_eq!(tree.capability("generic_mobile", "display", "resolution_width").unwrap(), "90");
        assert_eq!(tree.capability_by_name("nokia_6300", "resolution_width").unwrap(), "240");
    }

    #[test]
    fn every_device_resolves_every_root_capability() {
        let tree = tree();
        let names: Vec<(String, String)> = tree
            .root()
            .capability_names()
            .map(|(g, n)| (g.to_owned(), n.to_owned()))
            .collect();
        for device in tree.devices() {
            for (group, name) in &names {
                assert!(tree.capability(&device.id, group, name).is_ok());
            }
        }
    }

    #[test]
    fn unknown_lookups_fail() {
        let tree = tree();
        assert!(matches!(tree.resolve("nope"), Err(CoreError::UnknownDevice { .. })));
        assert!(matches!(
            tree.capability("nokia_6300", "display", "colors"),
            Err(CoreError::UnknownCapability { .. })
        ));
        assert!(!tree.is_capability_defined("display", "colors"));
        assert!(tree.is_group_defined("display"));
    }

    #[test]
    fn path_merge_and_actual_root() {
        let tree = tree();
        assert_eq!(
            tree.fall_back_path("nokia_6300_sub").unwrap(),
            vec!["nokia_6300_sub", "nokia_6300", "generic_mobile", "generic"]
        );
        let merged = tree.all_capabilities("nokia_6300_sub").unwrap();
        assert_eq!(merged["product_info"]["brand_name"], "Nokia");
        assert_eq!(merged["product_info"]["model_name"], "6300 v2");
        assert_eq!(
            tree.actual_device_root("nokia_6300_sub").unwrap().map(|d| d.id.as_str()),
            Some("nokia_6300")
        );
        assert!(tree.actual_device_root("generic_mobile").unwrap().is_none());
    }

    #[test]
    fn rejects_missing_and_multiple_roots() {
        let orphan = Device::new("a").with_fall_back("b");
        let orphan_b = Device::new("b").with_fall_back("a");
        assert!(matches!(
            DeviceTree::build([orphan, orphan_b]),
            Err(CoreError::MissingRoot)
        ));
        assert!(matches!(
            DeviceTree::build([root(), Device::new("other")]),
            Err(CoreError::MultipleRoots { .. })
        ));
    }

    #[test]
    fn rejects_duplicates_missing_parents_and_cycles() {
        assert!(matches!(
            DeviceTree::build([root(), Device::new("x").with_fall_back("generic"), Device::new("x").with_fall_back("generic")]),
            Err(CoreError::DuplicateDevice { .. })
        ));
        assert!(matches!(
            DeviceTree::build([root(), Device::new("x").with_fall_back("ghost")]),
            Err(CoreError::MissingParent { .. })
        ));
        assert!(matches!(
            DeviceTree::build([
                root(),
                Device::new("a").with_fall_back("b"),
                Device::new("b").with_fall_back("a"),
            ]),
            Err(CoreError::Cycle { .. })
        ));
    }

    #[test]
    fn rejects_capabilities_unknown_to_root() {
        let err = DeviceTree::build([
            root(),
            Device::new("x")
                .with_fall_back("generic")
                .with_capability("display", "colors", "256"),
        ])
        .unwrap_err();
        assert!(matches!(err, CoreError::UndefinedAtRoot { ref name, .. } if name == "colors"));
    }

    #[test]
    fn rejects_a_capability_name_in_two_groups() {
        let err = DeviceTree::build([
            root().with_capability("markup", "resolution_width", "90"),
            Device::new("generic_mobile").with_fall_back("generic"),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            CoreError::AmbiguousCapability { ref name, ref first, ref second }
                if name == "resolution_width" && first == "display" && second == "markup"
        ));
    }

    #[test]
    fn required_names_are_checked_against_root() {
        let tree = tree();
        assert!(tree.check_required(["brand_name", "resolution_width"]).is_ok());
        assert!(matches!(
            tree.check_required(["pointing_method"]),
            Err(CoreError::MissingRequiredCapability { .. })
        ));
    }

    #[test]
    fn resolved_view_shares_the_tree() {
        let tree = Arc::new(tree());
        let device = ResolvedDevice::new(Arc::clone(&tree), "nokia_6300").unwrap();
        assert_eq!(device.id(), "nokia_6300");
        assert_eq!(device.capability_by_name("brand_name").unwrap(), "Nokia");
        assert_eq!(device.fall_back_path().len(), 3);
        assert!(ResolvedDevice::new(tree, "missing").is_err());
    }
}
