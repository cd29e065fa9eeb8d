// ── Single-output virtual capability rules ──

use super::VirtualCapability;
use crate::classifier::heuristics::is_robot;
use crate::device::ResolvedDevice;
use crate::request::Request;
use crate::text::contains_any;

/// Identification strings of embedded web views and native HTTP clients.
const APP_MARKERS: &[&str] = &[
    "CFNetwork/",
    "Dalvik/",
    "okhttp/",
    "Apache-HttpClient/",
    "AppleCoreMedia/",
    "FBAN/",
    "FBAV/",
    "Twitter for ",
    "Instagram ",
    "Windows Phone Search",
];

/// Stored capability value, empty when the repository lacks it.
fn stored<'d>(device: &'d ResolvedDevice, name: &str) -> &'d str {
    device.capability_by_name(name).unwrap_or("")
}

fn stored_is(device: &ResolvedDevice, name: &str, expected: &str) -> bool {
    stored(device, name) == expected
}

fn stored_int(device: &ResolvedDevice, name: &str) -> i64 {
    stored(device, name).trim().parse().unwrap_or(0)
}

/// Leading `major.minor` of a version string as a float (`"4.4.2"` → 4.4).
fn leading_version(raw: &str) -> f64 {
    let raw = raw.trim();
    let mut end = 0;
    let mut dots = 0;
    for (i, c) in raw.char_indices() {
        match c {
            '0'..='9' => end = i + 1,
            '.' if dots == 0 => dots += 1,
            _ => break,
        }
    }
    raw[..end].parse().unwrap_or(0.0)
}

/// Value of a single-output rule; `None` for members of a rule group.
pub(super) fn compute(
    capability: VirtualCapability,
    device: &ResolvedDevice,
    request: &Request,
) -> Option<bool> {
    use VirtualCapability as V;

    let value = match capability {
        V::IsAndroid => stored_is(device, "device_os", "Android"),
        V::IsIos => stored_is(device, "device_os", "iOS"),
        V::IsWindowsPhone => stored_is(device, "device_os", "Windows Phone"),
        V::IsApp => is_app(device, request),
        V::IsFullDesktop => stored_is(device, "ux_full_desktop", "true"),
        V::IsLargescreen => {
            stored_int(device, "resolution_width") >= 480
                && stored_int(device, "resolution_height") >= 480
        }
        V::IsMobile => stored_is(device, "is_wireless_device", "true"),
        V::IsRobot => is_robot_request(request),
        V::IsSmartphone => is_smartphone(device),
        V::IsTouchscreen => stored_is(device, "pointing_method", "touchscreen"),
        V::IsWmlPreferred => stored_int(device, "xhtml_support_level") <= 0,
        V::IsXhtmlmpPreferred => {
            stored_int(device, "xhtml_support_level") > 0
                && !stored(device, "preferred_markup").starts_with("html_web")
        }
        V::IsHtmlPreferred => stored(device, "preferred_markup").starts_with("html_web"),
        V::AdvertisedDeviceOs
        | V::AdvertisedDeviceOsVersion
        | V::AdvertisedBrowser
        | V::AdvertisedBrowserVersion => return None,
    };
    Some(value)
}

fn is_app(device: &ResolvedDevice, request: &Request) -> bool {
    let ua = request.user_agent();
    match stored(device, "device_os") {
        "iOS" if !ua.contains("Safari") => true,
        "Android" if ua.contains("; wv)") => true,
        _ => contains_any(ua, APP_MARKERS),
    }
}

/// IE that refuses deflate is a crawler in disguise; otherwise the robot
/// keyword list decides, on the string the client originally sent.
fn is_robot_request(request: &Request) -> bool {
    if let Some(encoding) = request.header("accept-encoding") {
        if request.user_agent().contains("Trident/") && !encoding.contains("deflate") {
            return true;
        }
    }
    is_robot(request.original_user_agent())
}

fn is_smartphone(device: &ResolvedDevice) -> bool {
    if !stored_is(device, "is_wireless_device", "true")
        || stored_is(device, "is_tablet", "true")
        || !stored_is(device, "pointing_method", "touchscreen")
        || stored_int(device, "resolution_width") < 320
        || stored_is(device, "can_assign_phone_number", "false")
    {
        return false;
    }
    let version = leading_version(stored(device, "device_os_version"));
    match stored(device, "device_os") {
        "iOS" => version >= 3.0,
        "Android" => version >= 2.2,
        "Windows Phone" | "Windows Phone OS" | "webOS" | "MeeGo" => true,
        "RIM OS" => version >= 7.0,
        "Bada OS" => version >= 2.0,
        _ => false,
    }
}
