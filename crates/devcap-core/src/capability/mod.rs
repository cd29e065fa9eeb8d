//! Virtual capabilities: values derived from stored capabilities and the
//! request rather than read from the repository.
//!
//! A [`VirtualCapabilityProvider`] lives for one request. It memoizes what
//! it computes and honours per-device control overrides stored under the
//! `virtual` group as `controlcap_<name>`.

mod device_browser;
mod rules;

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::Serialize;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};
use tracing::trace;

use crate::constants::{
    CONTROL_DEFAULT, CONTROL_FORCE_FALSE, CONTROL_FORCE_TRUE, CONTROL_GROUP, CONTROL_PREFIX,
};
use crate::device::ResolvedDevice;
use crate::error::CoreError;
use crate::request::Request;

pub use device_browser::DeviceBrowser;

// ── Rule table ──────────────────────────────────────────────────────

/// Every registered virtual capability.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum VirtualCapability {
    IsAndroid,
    IsIos,
    IsWindowsPhone,
    IsApp,
    IsFullDesktop,
    IsLargescreen,
    IsMobile,
    IsRobot,
    IsSmartphone,
    IsTouchscreen,
    IsWmlPreferred,
    IsXhtmlmpPreferred,
    IsHtmlPreferred,
    AdvertisedDeviceOs,
    AdvertisedDeviceOsVersion,
    AdvertisedBrowser,
    AdvertisedBrowserVersion,
}

/// Rules that compute several outputs in one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum RuleGroup {
    DeviceBrowser,
}

impl VirtualCapability {
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// The group this capability is computed by, if it is not a single rule.
    pub fn group(self) -> Option<RuleGroup> {
        match self {
            Self::AdvertisedDeviceOs
            | Self::AdvertisedDeviceOsVersion
            | Self::AdvertisedBrowser
            | Self::AdvertisedBrowserVersion => Some(RuleGroup::DeviceBrowser),
            _ => None,
        }
    }

    /// Stored capabilities the rule reads.
    pub fn required_capabilities(self) -> &'static [&'static str] {
        match self {
            Self::IsAndroid | Self::IsIos | Self::IsWindowsPhone | Self::IsApp => &["device_os"],
            Self::IsFullDesktop => &["ux_full_desktop"],
            Self::IsLargescreen => &["resolution_width", "resolution_height"],
            Self::IsMobile => &["is_wireless_device"],
            Self::IsSmartphone => &[
                "is_wireless_device",
                "is_tablet",
                "pointing_method",
                "resolution_width",
                "can_assign_phone_number",
                "device_os",
                "device_os_version",
            ],
            Self::IsTouchscreen => &["pointing_method"],
            Self::IsWmlPreferred => &["xhtml_support_level"],
            Self::IsXhtmlmpPreferred => &["xhtml_support_level", "preferred_markup"],
            Self::IsHtmlPreferred => &["preferred_markup"],
            Self::IsRobot
            | Self::AdvertisedDeviceOs
            | Self::AdvertisedDeviceOsVersion
            | Self::AdvertisedBrowser
            | Self::AdvertisedBrowserVersion => &[],
        }
    }

    fn control_capability(self) -> String {
        format!("{CONTROL_PREFIX}{self}")
    }
}

/// Union of the stored capabilities every rule reads.
pub fn required_capabilities() -> BTreeSet<&'static str> {
    VirtualCapability::iter()
        .flat_map(|cap| cap.required_capabilities().iter().copied())
        .collect()
}

/// Registered names in table order.
pub fn names() -> impl Iterator<Item = &'static str> {
    VirtualCapability::iter().map(VirtualCapability::name)
}

pub fn exists(name: &str) -> bool {
    VirtualCapability::from_str(name).is_ok()
}

// ── Values ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum VirtualValue {
    Bool(bool),
    Text(String),
}

impl VirtualValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Text(_) => None,
        }
    }
}

impl fmt::Display for VirtualValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

// ── Provider ────────────────────────────────────────────────────────

/// Per-request virtual capability resolver. Queries take `&mut self`, so
/// one provider cannot serve two requests at once.
#[derive(Debug)]
pub struct VirtualCapabilityProvider {
    device: ResolvedDevice,
    request: Request,
    cache: HashMap<VirtualCapability, VirtualValue>,
    group_cache: HashMap<RuleGroup, DeviceBrowser>,
}

impl VirtualCapabilityProvider {
    pub fn new(device: ResolvedDevice, request: Request) -> Self {
        Self {
            device,
            request,
            cache: HashMap::new(),
            group_cache: HashMap::new(),
        }
    }

    pub fn device(&self) -> &ResolvedDevice {
        &self.device
    }

    /// Resolve `name`, failing for names that are not registered.
    pub fn get(&mut self, name: &str) -> Result<VirtualValue, CoreError> {
        let capability =
            VirtualCapability::from_str(name).map_err(|_| CoreError::UnknownVirtualCapability {
                name: name.to_owned(),
            })?;
        Ok(self.value(capability))
    }

    /// Every registered capability, keyed by name, in table order.
    pub fn get_all(&mut self) -> IndexMap<&'static str, VirtualValue> {
        VirtualCapability::iter()
            .map(|cap| (cap.name(), self.value(cap)))
            .collect()
    }

    pub fn value(&mut self, capability: VirtualCapability) -> VirtualValue {
        match self.control_value(capability).as_deref() {
            None | Some(CONTROL_DEFAULT) => self.computed(capability),
            Some(CONTROL_FORCE_TRUE) => VirtualValue::Bool(true),
            Some(CONTROL_FORCE_FALSE) => VirtualValue::Bool(false),
            Some(other) => VirtualValue::Text(other.to_owned()),
        }
    }

    /// Stored override, consulted only when the root defines it.
    fn control_value(&self, capability: VirtualCapability) -> Option<String> {
        let tree = self.device.tree();
        if !tree.is_group_defined(CONTROL_GROUP) {
            return None;
        }
        let control = capability.control_capability();
        if !tree.is_capability_defined(CONTROL_GROUP, &control) {
            return None;
        }
        self.device
            .capability(CONTROL_GROUP, &control)
            .ok()
            .map(str::to_owned)
    }

    fn computed(&mut self, capability: VirtualCapability) -> VirtualValue {
        if let Some(hit) = self.cache.get(&capability) {
            return hit.clone();
        }
        let value = match capability.group() {
            Some(group) => {
                let outputs = self.group_outputs(group);
                VirtualValue::Text(
                    match capability {
                        VirtualCapability::AdvertisedDeviceOs => &outputs.device_os,
                        VirtualCapability::AdvertisedDeviceOsVersion => &outputs.device_os_version,
                        VirtualCapability::AdvertisedBrowser => &outputs.browser,
                        _ => &outputs.browser_version,
                    }
                    .clone(),
                )
            }
            None => VirtualValue::Bool(
                rules::compute(capability, &self.device, &self.request).unwrap_or_default(),
            ),
        };
        trace!(capability = %capability, value = %value, "virtual capability computed");
        self.cache.insert(capability, value.clone());
        value
    }

    fn group_outputs(&mut self, group: RuleGroup) -> &DeviceBrowser {
        let ua = self.request.user_agent();
        self.group_cache.entry(group).or_insert_with(|| match group {
            RuleGroup::DeviceBrowser => DeviceBrowser::compute(ua),
        })
    }

    /// Number of groups computed so far.
    pub fn computed_groups(&self) -> usize {
        self.group_cache.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::device::{Device, DeviceTree};

    const ANDROID_UA: &str = "Mozilla/5.0 (Linux; Android 4.4.2; SM-G900F Build/KOT49H) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/35.0.1916.141 Mobile Safari/537.36";

    fn root() -> Device {
        let mut root = Device::new("generic").with_fall_back("root");
        for name in required_capabilities() {
            root = root.with_capability("product_info", name, "");
        }
        root.with_capability("virtual", "controlcap_is_mobile", "default")
            .with_capability("virtual", "controlcap_is_robot", "default")
            .with_capability("virtual", "controlcap_advertised_browser", "default")
    }

    fn provider_for(device: Device, request: Request) -> VirtualCapabilityProvider {
        let id = device.id.clone();
        let tree = Arc::new(DeviceTree::build([root(), device]).unwrap());
        VirtualCapabilityProvider::new(ResolvedDevice::new(tree, &id).unwrap(), request)
    }

    fn galaxy() -> Device {
        Device::new("samsung_gt_i9505")
            .with_fall_back("generic")
            .with_capability("product_info", "device_os", "Android")
            .with_capability("product_info", "device_os_version", "4.4")
            .with_capability("product_info", "is_wireless_device", "true")
            .with_capability("product_info", "is_tablet", "false")
            .with_capability("product_info", "pointing_method", "touchscreen")
            .with_capability("product_info", "resolution_width", "1080")
            .with_capability("product_info", "resolution_height", "1920")
            .with_capability("product_info", "can_assign_phone_number", "true")
            .with_capability("product_info", "preferred_markup", "html_web_4_0")
            .with_capability("product_info", "xhtml_support_level", "4")
    }

    #[test]
    fn names_follow_the_table() {
        let all: Vec<&str> = names().collect();
        assert_eq!(all.len(), 17);
        assert_eq!(all.first(), Some(&"is_android"));
        assert_eq!(all.last(), Some(&"advertised_browser_version"));
        assert!(exists("is_xhtmlmp_preferred"));
        assert!(!exists("is_toaster"));
    }

    #[test]
    fn single_rules_read_stored_capabilities() {
        let mut provider = provider_for(galaxy(), Request::from_user_agent(ANDROID_UA));
        assert_eq!(provider.get("is_android").unwrap(), VirtualValue::Bool(true));
        assert_eq!(provider.get("is_smartphone").unwrap(), VirtualValue::Bool(true));
        assert_eq!(provider.get("is_largescreen").unwrap(), VirtualValue::Bool(true));
        assert_eq!(provider.get("is_html_preferred").unwrap(), VirtualValue::Bool(true));
        assert_eq!(provider.get("is_xhtmlmp_preferred").unwrap(), VirtualValue::Bool(false));
        assert_eq!(provider.get("is_wml_preferred").unwrap(), VirtualValue::Bool(false));
        assert_eq!(provider.get("is_ios").unwrap(), VirtualValue::Bool(false));
    }

    #[test]
    fn force_true_overrides_the_rule() {
        let device = galaxy()
            .with_capability("product_info", "is_wireless_device", "false")
            .with_capability("virtual", "controlcap_is_mobile", "force_true");
        let mut provider = provider_for(device, Request::from_user_agent(ANDROID_UA));
        assert_eq!(provider.get("is_mobile").unwrap(), VirtualValue::Bool(true));
    }

    #[test]
    fn other_control_values_pass_through_verbatim() {
        let device = galaxy().with_capability("virtual", "controlcap_advertised_browser", "Custom");
        let mut provider = provider_for(device, Request::from_user_agent(ANDROID_UA));
        assert_eq!(
            provider.get("advertised_browser").unwrap(),
            VirtualValue::Text("Custom".into())
        );
    }

    #[test]
    fn undefined_control_capability_is_ignored() {
        // The root defines no controlcap_is_android, so the stored value on
        // the device (if any) cannot exist and the rule decides.
        let mut provider = provider_for(galaxy(), Request::from_user_agent(ANDROID_UA));
        assert_eq!(provider.get("is_android").unwrap(), VirtualValue::Bool(true));
    }

    #[test]
    fn grouped_rule_is_computed_once() {
        let mut provider = provider_for(galaxy(), Request::from_user_agent(ANDROID_UA));
        assert_eq!(
            provider.get("advertised_device_os").unwrap(),
            VirtualValue::Text("Android".into())
        );
        assert_eq!(
            provider.get("advertised_browser_version").unwrap(),
            VirtualValue::Text("35.0.1916.141".into())
        );
        assert_eq!(provider.computed_groups(), 1);
    }

    #[test]
    fn robot_detection_uses_headers() {
        let request = Request::from_headers([
            ("User-Agent", "Mozilla/5.0 (Windows NT 6.3; Trident/7.0; rv:11.0) like Gecko"),
            ("Accept-Encoding", "gzip"),
        ]);
        let mut provider = provider_for(galaxy(), request);
        assert_eq!(provider.get("is_robot").unwrap(), VirtualValue::Bool(true));

        let bot = Request::from_user_agent("Googlebot/2.1 (+http://www.google.com/bot.html)");
        let mut provider = provider_for(galaxy(), bot);
        assert_eq!(provider.get("is_robot").unwrap(), VirtualValue::Bool(true));
    }

    #[test]
    fn unknown_name_fails_fast() {
        let mut provider = provider_for(galaxy(), Request::from_user_agent(ANDROID_UA));
        assert!(matches!(
            provider.get("is_toaster"),
            Err(CoreError::UnknownVirtualCapability { .. })
        ));
    }

    #[test]
    fn get_all_covers_every_name() {
        let mut provider = provider_for(galaxy(), Request::from_user_agent(ANDROID_UA));
        let all = provider.get_all();
        assert_eq!(all.len(), names().count());
        assert_eq!(all.keys().copied().collect::<Vec<_>>(), names().collect::<Vec<_>>());
        assert_eq!(all["is_touchscreen"], VirtualValue::Bool(true));
    }

    #[test]
    fn required_capabilities_union() {
        let required = required_capabilities();
        assert!(required.contains("device_os"));
        assert!(required.contains("preferred_markup"));
        assert!(required.contains("ux_full_desktop"));
    }
}
