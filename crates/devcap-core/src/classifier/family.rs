// ── Device families ──
//
// The fixed, ordered classifier chain. Each family owns a partition of the
// identification-string space and knows how to shrink a string for the
// conclusive tier and how to recover a generic id when nothing matched.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator, IntoStaticStr};

use super::catalog;
use super::heuristics::{is_desktop_browser, is_mobile_browser, is_robot, is_smart_tv};
use crate::constants::{
    GENERIC_SMARTTV, GENERIC_WEB_BROWSER, GENERIC_WEB_CRAWLER, INDEX_KEY_SUFFIX, WORST_MATCH,
};
use crate::normalizer::{SpecificStep, android_version};
use crate::text::{
    after_ris_delimiter, cached_regex, contains_all, contains_any, first_close_paren,
    first_slash, first_space, index_of_any_or_length, index_of_or_length, major_version_after,
    starts_with_any, through_major_version,
};

static APPLE_VERSION: OnceLock<Regex> = OnceLock::new();
static WINDOWS_PHONE_VERSION: OnceLock<Regex> = OnceLock::new();
static BLACKBERRY_VERSION: OnceLock<Regex> = OnceLock::new();
static MSIE_VERSION: OnceLock<Regex> = OnceLock::new();
static SAFARI_VERSION: OnceLock<Regex> = OnceLock::new();
static SAFARI_BUILD: OnceLock<Regex> = OnceLock::new();

/// Device family, declared in registration order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    IntoStaticStr,
)]
pub enum Family {
    JavaMidlet,
    SmartTv,
    Kindle,
    LgUplus,
    Maemo,
    Xbox,
    WindowsPhone,
    Android,
    Apple,
    BlackBerry,
    Nokia,
    Sagem,
    Sharp,
    Mitsubishi,
    Spv,
    Bot,
    Chrome,
    Firefox,
    Msie,
    Opera,
    Safari,
    CatchAll,
}

/// How a family runs its conclusive tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conclusive {
    /// Prefix reduction starting at `tolerance` bytes.
    Reduction { tolerance: usize },
    /// Edit distance over the index keys.
    Distance {
        max_distance: usize,
        length_window: Option<usize>,
    },
    /// A fixed device id.
    Fixed(&'static str),
    /// Nothing conclusive; the recovery tier answers.
    Recovery,
    /// No conclusive tier.
    Skip,
}

impl Family {
    /// Every family in the order the chain consults them.
    pub fn registration_order() -> impl Iterator<Item = Family> {
        Self::iter()
    }

    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Persistence prefix.
    pub fn prefix(self) -> &'static str {
        match self {
            Self::JavaMidlet => "JAVAMIDLET",
            Self::SmartTv => "SMARTTV",
            Self::Kindle => "KINDLE",
            Self::LgUplus => "LGUPLUS",
            Self::Maemo => "MAEMO",
            Self::Xbox => "XBOX",
            Self::WindowsPhone => "WINDOWSPHONE",
            Self::Android => "ANDROID",
            Self::Apple => "APPLE",
            Self::BlackBerry => "BLACKBERRY",
            Self::Nokia => "NOKIA",
            Self::Sagem => "SAGEM",
            Self::Sharp => "SHARP",
            Self::Mitsubishi => "MITSUBISHI",
            Self::Spv => "SPV",
            Self::Bot => "BOT",
            Self::Chrome => "CHROME",
            Self::Firefox => "FIREFOX",
            Self::Msie => "MSIE",
            Self::Opera => "OPERA",
            Self::Safari => "SAFARI",
            Self::CatchAll => "CATCH_ALL",
        }
    }

    /// Storage key of this family's index, e.g. `APPLE_DEVICEIDS`.
    pub fn index_key(self) -> String {
        format!("{}{INDEX_KEY_SUFFIX}", self.prefix())
    }

    // ── Ownership ────────────────────────────────────────────────────

    /// Cheap syntactic test deciding whether this family takes the string.
    pub fn owns(self, ua: &str) -> bool {
        match self {
            Self::JavaMidlet => ua.contains("UNTRUSTED/1.0"),
            Self::SmartTv => is_smart_tv(ua),
            Self::Kindle => !is_desktop_browser(ua) && contains_any(ua, &["Kindle", "Silk"]),
            Self::LgUplus => !is_desktop_browser(ua) && contains_any(ua, &["LGUPLUS", "lgtelecom"]),
            Self::Maemo => !is_desktop_browser(ua) && ua.contains("Maemo"),
            Self::Xbox => ua.contains("Xbox"),
            Self::WindowsPhone => contains_any(ua, &["Windows Phone", "WindowsPhone", "ZuneWP7"]),
            Self::Android => !is_desktop_browser(ua) && ua.contains("Android"),
            Self::Apple => {
                !is_desktop_browser(ua)
                    && ua.starts_with("Mozilla/5")
                    && contains_any(ua, &["iPhone", "iPod", "iPad"])
            }
            Self::BlackBerry => !is_desktop_browser(ua) && contains_any(ua, &["BlackBerry", "BB10"]),
            Self::Nokia => !is_desktop_browser(ua) && ua.contains("Nokia"),
            Self::Sagem => !is_desktop_browser(ua) && starts_with_any(ua, &["Sagem", "SAGEM"]),
            Self::Sharp => !is_desktop_browser(ua) && starts_with_any(ua, &["Sharp", "SHARP"]),
            Self::Mitsubishi => !is_desktop_browser(ua) && ua.starts_with("Mitsu"),
            Self::Spv => ua.contains("SPV"),
            Self::Bot => is_robot(ua),
            Self::Chrome => !is_mobile_browser(ua) && ua.contains("Chrome"),
            Self::Firefox => !is_mobile_browser(ua) && ua.contains("Firefox"),
            Self::Msie => {
                !is_mobile_browser(ua)
                    && !ua.contains("Opera")
                    && contains_any(ua, &["MSIE", "Trident/"])
            }
            Self::Opera => !is_mobile_browser(ua) && ua.starts_with("Opera"),
            Self::Safari => !is_mobile_browser(ua) && ua.contains("Safari"),
            Self::CatchAll => true,
        }
    }

    /// Vendor-token injection applied after the generic normalizer.
    pub fn specific_step(self) -> Option<SpecificStep> {
        match self {
            Self::Android => Some(SpecificStep::Android),
            Self::Kindle => Some(SpecificStep::Kindle),
            Self::Maemo => Some(SpecificStep::Maemo),
            _ => None,
        }
    }

    // ── Conclusive tier ──────────────────────────────────────────────

    pub fn conclusive(self, ua: &str) -> Conclusive {
        let full = ua.len();
        let reduction = |tolerance: usize| Conclusive::Reduction { tolerance };
        match self {
            Self::JavaMidlet => Conclusive::Fixed(catalog::JAVA_MIDLET),
            Self::SmartTv => reduction(full),
            Self::Kindle => reduction(after_ris_delimiter(ua).or_else(|| first_slash(ua)).unwrap_or(full)),
            Self::Maemo => reduction(after_ris_delimiter(ua).or_else(|| first_space(ua)).unwrap_or(full)),
            Self::Android => {
                reduction(after_ris_delimiter(ua).or_else(|| first_close_paren(ua)).unwrap_or(full))
            }
            Self::LgUplus | Self::Xbox => Conclusive::Skip,
            Self::WindowsPhone => reduction(
                ua.find("Windows Phone ")
                    .map_or(full, |pos| index_of_or_length(ua, ";", pos)),
            ),
            Self::Apple => reduction(apple_tolerance(ua)),
            Self::BlackBerry => Conclusive::Distance {
                max_distance: WORST_MATCH,
                length_window: Some(WORST_MATCH),
            },
            Self::Nokia => reduction(
                ua.find("Nokia")
                    .map_or(full, |pos| index_of_any_or_length(ua, &["/", " "], pos)),
            ),
            Self::Sagem | Self::Sharp | Self::Bot => reduction(first_slash(ua).unwrap_or(full)),
            Self::Mitsubishi => reduction(first_space(ua).unwrap_or(full)),
            Self::Spv => reduction(
                ua.find("SPV")
                    .map_or(full, |pos| index_of_or_length(ua, ";", pos)),
            ),
            Self::Chrome => reduction(through_major_version(ua, "Chrome/").unwrap_or(full)),
            Self::Firefox => reduction(through_major_version(ua, "Firefox/").unwrap_or(full)),
            Self::Msie => reduction(
                through_major_version(ua, "MSIE ")
                    .or_else(|| through_major_version(ua, "Trident/"))
                    .unwrap_or(full),
            ),
            Self::Opera => reduction(
                through_major_version(ua, "Version/")
                    .or_else(|| through_major_version(ua, "Opera/"))
                    .unwrap_or(full),
            ),
            Self::Safari => Conclusive::Recovery,
            Self::CatchAll => {
                let tolerance = if ua.starts_with("Mozilla") {
                    first_close_paren(ua)
                } else {
                    first_slash(ua)
                };
                reduction(tolerance.unwrap_or(full))
            }
        }
    }

    // ── Recovery tier ────────────────────────────────────────────────

    /// Family-specific guess at a generic id. `None` hands over to the
    /// recovery-catchall tier.
    pub fn recovery(self, ua: &str) -> Option<&'static str> {
        match self {
            Self::JavaMidlet
            | Self::Sagem
            | Self::Sharp
            | Self::Mitsubishi
            | Self::Spv
            | Self::CatchAll => None,
            Self::SmartTv => Some(smart_tv_recovery(ua)),
            Self::Kindle => Some(kindle_recovery(ua)),
            Self::LgUplus => lguplus_recovery(ua),
            Self::Maemo => Some(if ua.contains("Opera Mobi") {
                catalog::MAEMO_OPERA
            } else {
                catalog::MAEMO_GENERIC
            }),
            Self::Xbox => Some(xbox_recovery(ua)),
            Self::WindowsPhone => Some(windows_phone_recovery(ua)),
            Self::Android => Some(android_recovery(ua)),
            Self::Apple => Some(apple_recovery(ua)),
            Self::BlackBerry => Some(blackberry_recovery(ua)),
            Self::Nokia => nokia_recovery(ua),
            Self::Bot => Some(GENERIC_WEB_CRAWLER),
            Self::Chrome => Some(
                major_version_after(ua, "Chrome/")
                    .and_then(|v| catalog::lookup(catalog::CHROME, &format!("google_chrome_{v}")))
                    .unwrap_or(catalog::CHROME_GENERIC),
            ),
            Self::Firefox => Some(
                major_version_after(ua, "Firefox/")
                    .and_then(|v| catalog::lookup(catalog::FIREFOX, &format!("firefox_{v}")))
                    .unwrap_or(catalog::FIREFOX_GENERIC),
            ),
            Self::Msie => Some(msie_recovery(ua)),
            Self::Opera => Some(
                major_version_after(ua, "Version/")
                    .or_else(|| major_version_after(ua, "Opera/"))
                    .and_then(|v| catalog::lookup(catalog::OPERA, &format!("opera_{v}")))
                    .unwrap_or(catalog::OPERA_GENERIC),
            ),
            Self::Safari => safari_recovery(ua),
        }
    }

    /// Device ids this family may return without consulting its index.
    pub fn constant_ids(self) -> &'static [&'static str] {
        match self {
            Self::JavaMidlet => &[catalog::JAVA_MIDLET],
            Self::SmartTv => catalog::SMART_TV,
            Self::Kindle => catalog::KINDLE,
            Self::LgUplus => catalog::LGUPLUS,
            Self::Maemo => &[catalog::MAEMO_OPERA, catalog::MAEMO_GENERIC],
            Self::Xbox => catalog::XBOX,
            Self::WindowsPhone => catalog::WINDOWS_PHONE,
            Self::Android => catalog::ANDROID,
            Self::Apple => catalog::APPLE,
            Self::BlackBerry => catalog::BLACKBERRY,
            Self::Nokia => catalog::NOKIA,
            Self::Bot => &[GENERIC_WEB_CRAWLER],
            Self::Chrome => catalog::CHROME,
            Self::Firefox => catalog::FIREFOX,
            Self::Msie => catalog::MSIE,
            Self::Opera => catalog::OPERA,
            Self::Safari => catalog::SAFARI,
            Self::Sagem | Self::Sharp | Self::Mitsubishi | Self::Spv | Self::CatchAll => &[],
        }
    }
}

// ── Per-family helpers ──────────────────────────────────────────────

fn apple_tolerance(ua: &str) -> usize {
    if let Some(pos) = ua.find('_') {
        return pos + 1;
    }
    ua.find("like Mac OS X;")
        .map_or(ua.len(), |pos| pos + "like Mac OS X;".len())
}

fn apple_recovery(ua: &str) -> &'static str {
    let major = cached_regex(&APPLE_VERSION, r" (\d+)_(\d+)[ _]")
        .captures(ua)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok());

    // iPods also say iPhone, so they go first.
    if ua.contains("iPod") {
        return major
            .and_then(|v| catalog::lookup(catalog::APPLE, &format!("apple_ipod_touch_ver{v}")))
            .unwrap_or("apple_ipod_touch_ver1");
    }
    if ua.contains("iPad") {
        return match major {
            Some(3) => "apple_ipad_ver1_subua32",
            Some(4) => "apple_ipad_ver1_sub42",
            Some(v) => catalog::lookup(catalog::APPLE, &format!("apple_ipad_ver1_sub{v}"))
                .unwrap_or("apple_ipad_ver1"),
            None => "apple_ipad_ver1",
        };
    }
    major
        .and_then(|v| catalog::lookup(catalog::APPLE, &format!("apple_iphone_ver{v}")))
        .unwrap_or("apple_iphone_ver1")
}

fn smart_tv_recovery(ua: &str) -> &'static str {
    let lower = ua.to_lowercase();
    catalog::SMART_TV_KEYWORDS
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map_or(GENERIC_SMARTTV, |(_, id)| *id)
}

fn kindle_recovery(ua: &str) -> &'static str {
    if contains_any(ua, &["Kindle Fire", "Silk"]) {
        return "amazon_kindle_fire_ver1";
    }
    for (marker, id) in [
        ("Kindle/3", "amazon_kindle3_ver1"),
        ("Kindle/2", "amazon_kindle2_ver1"),
        ("Kindle/1", "amazon_kindle_ver1"),
    ] {
        if ua.contains(marker) {
            return id;
        }
    }
    "generic_amazon_kindle"
}

fn lguplus_recovery(ua: &str) -> Option<&'static str> {
    if contains_all(ua, &["Windows NT 5", "POLARIS"]) {
        Some("generic_lguplus_rexos_facebook_browser")
    } else if ua.contains("Windows NT 5") {
        Some("generic_lguplus_rexos_webviewer_browser")
    } else if contains_all(ua, &["Windows CE", "POLARIS"]) {
        Some("generic_lguplus_winmo_facebook_browser")
    } else if contains_all(ua, &["Android", "AppleWebKit"]) {
        Some("generic_lguplus_android_webkit_browser")
    } else {
        None
    }
}

fn xbox_recovery(ua: &str) -> &'static str {
    if contains_all(ua, &["MSIE 10.0", "Xbox One"]) {
        "microsoft_xboxone_ver1"
    } else if ua.contains("MSIE 10.0") {
        "microsoft_xbox360_ver1_subie10"
    } else {
        "microsoft_xbox360_ver1"
    }
}

fn windows_phone_recovery(ua: &str) -> &'static str {
    if contains_any(ua, &["WindowsPhone", "ZuneWP7"]) {
        return "generic_ms_phone_os7";
    }
    let version = cached_regex(&WINDOWS_PHONE_VERSION, r"Windows Phone(?: OS)? (\d+)\.(\d+)")
        .captures(ua)
        .and_then(|caps| {
            let major = caps.get(1)?.as_str().parse::<u32>().ok()?;
            let minor = caps.get(2)?.as_str().parse::<u32>().ok()?;
            Some((major, minor))
        });
    match version {
        Some((v, _)) if v >= 10 => "generic_ms_phone_os10",
        Some((8, 1)) => "generic_ms_phone_os8_1",
        Some((8, _)) => "generic_ms_phone_os8",
        Some((7, 8)) => "generic_ms_phone_os7_8",
        Some((7, 5)) => "generic_ms_phone_os7_5",
        _ => "generic_ms_phone_os7",
    }
}

fn android_recovery(ua: &str) -> &'static str {
    android_version(ua)
        .and_then(|v| {
            catalog::lookup(
                catalog::ANDROID,
                &format!("generic_android_ver{}", v.replace('.', "_")),
            )
        })
        .unwrap_or(catalog::ANDROID_GENERIC)
}

fn blackberry_recovery(ua: &str) -> &'static str {
    if ua.contains("BB10") {
        return "blackberry_generic_ver10";
    }
    let major = cached_regex(&BLACKBERRY_VERSION, r"BlackBerry[^/\s]*/(\d+)")
        .captures(ua)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .or_else(|| major_version_after(ua, "Version/"));
    major
        .and_then(|v| catalog::lookup(catalog::BLACKBERRY, &format!("blackberry_generic_ver{v}")))
        .unwrap_or(catalog::BLACKBERRY_GENERIC)
}

fn nokia_recovery(ua: &str) -> Option<&'static str> {
    if ua.contains("Series60") {
        Some("nokia_generic_series60")
    } else if ua.contains("Series80") {
        Some("nokia_generic_series80")
    } else if ua.contains("MeeGo") {
        Some("nokia_generic_meego")
    } else {
        None
    }
}

fn msie_recovery(ua: &str) -> &'static str {
    if ua.contains("Trident/7") && ua.contains("rv:11") {
        return "msie_11";
    }
    cached_regex(&MSIE_VERSION, r"MSIE (\d+)\.")
        .captures(ua)
        .and_then(|caps| caps.get(1))
        .and_then(|m| catalog::lookup(catalog::MSIE, &format!("msie_{}", m.as_str())))
        .unwrap_or(catalog::MSIE_GENERIC)
}

/// `Version/x.y` on Mozilla strings, otherwise the first two digits of a
/// four-digit `Safari/` build number. A string with neither maps to plain
/// `safari`; a version outside the catalog is a generic web browser.
fn safari_recovery(ua: &str) -> Option<&'static str> {
    let mut version = None;
    if ua.starts_with("Mozilla") && ua.contains("Safari") {
        version = cached_regex(&SAFARI_VERSION, r"Version/(\d+\.\d+)")
            .captures(ua)
            .and_then(|caps| caps.get(1));
    }
    if version.is_none() && ua.contains("Safari") {
        version = cached_regex(&SAFARI_BUILD, r"Safari/(\d{2})\d{2}\.")
            .captures(ua)
            .and_then(|caps| caps.get(1));
    }
    let Some(version) = version else {
        return Some(catalog::SAFARI_GENERIC);
    };
    Some(
        catalog::SAFARI_VERSIONS
            .iter()
            .find(|(known, _)| *known == version.as_str())
            .map_or(GENERIC_WEB_BROWSER, |(_, id)| *id),
    )
}
