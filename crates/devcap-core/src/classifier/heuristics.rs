// ── Family-independent detection heuristics ──
//
// All functions are pure: they look only at the string they are given.
// Nothing is memoized across calls, so concurrent requests cannot see
// each other's answers.

use std::sync::OnceLock;

use regex::Regex;

use crate::constants::{
    GENERIC, GENERIC_MOBILE, GENERIC_SMARTTV, GENERIC_WEB_BROWSER, GENERIC_WEB_CRAWLER,
};
use crate::text::{cached_regex, contains_all, contains_any, starts_with_any};

const MOBILE_KEYWORDS: &[&str] = &[
    "midp",
    "mobile",
    "android",
    "samsung",
    "nokia",
    "up.browser",
    "phone",
    "opera mini",
    "opera mobi",
    "brew",
    "sonyericsson",
    "blackberry",
    "netfront",
    "uc browser",
    "symbian",
    "j2me",
    "wap2.",
    "up.link",
    " arm;",
    "windows ce",
    "vodafone",
    "ucweb",
    "zte-",
    "ipad;",
    "docomo",
    "armv",
    "maemo",
    "palm",
    "bolt",
    "fennec",
    "wireless",
    "adr-",
    "htc",
    "; xbox",
    "nintendo",
    "zunewp7",
    "skyfire",
    "silk",
    "untrusted",
    "lgtelecom",
    " gt-",
    "ventana",
];

const SMART_TV_KEYWORDS: &[&str] = &[
    "googletv",
    "boxee",
    "sonydtv",
    "appletv",
    "smarttv",
    "smart-tv",
    "dlna",
    "ce-html",
    "inettvbrowser",
    "opera tv",
    "viera",
    "konfabulator",
    "sony bravia",
    "crkey",
    "sonycebrowser",
    "hbbtv",
    "large screen",
    "netcast",
    "philipstv",
    "digital-tv",
    " mb90/",
    " mb91/",
    " mb95/",
    "vizio-dtv",
    "bravia",
];

const DESKTOP_KEYWORDS: &[&str] = &[
    "wow64",
    ".net clr",
    "gtb7",
    "macintosh",
    "slcc1",
    "gtb6",
    "funwebproducts",
    "aol 9.",
    "gtb8",
    "iceweasel",
    "epiphany",
];

const ROBOT_KEYWORDS: &[&str] = &[
    "+http",
    "bot",
    "crawler",
    "spider",
    "novarra",
    "transcoder",
    "yahoo! searchmonkey",
    "yahoo! slurp",
    "feedfetcher-google",
    "mowser",
    "trove",
    "google web preview",
    "googleimageproxy",
    "mediapartners-google",
    "azureus",
    "inquisitor",
    "baiduspider",
    "baidumobaider",
    "holmes/",
    "libwww-perl",
    "netsprint",
    "yandex",
    "ineturl",
    "jakarta",
    "lorkyll",
    "microsoft url control",
    "indy library",
    "slurp",
    "crawl",
    "wget",
    "ucweblient",
    "snoopy",
    "untrursted",
    "mozfdsilla",
    "ask jeeves",
    "jeeves/teoma",
    "mechanize",
    "http client",
    "servicemonitor",
    "httpunit",
    "hatena",
    "ichiro",
];

/// Ordered catch-all table for mobile strings no family recognised.
const MOBILE_CATCH_ALL: &[(&str, &str)] = &[
    ("CoreMedia", "apple_iphone_coremedia_ver1"),
    ("Windows CE", "generic_ms_mobile"),
    ("UP.Browser/7.2", "opwv_v72_generic"),
    ("UP.Browser/7", "opwv_v7_generic"),
    ("UP.Browser/6.2", "opwv_v62_generic"),
    ("UP.Browser/6", "opwv_v6_generic"),
    ("UP.Browser/5", "upgui_generic"),
    ("UP.Browser/4", "uptext_generic"),
    ("UP.Browser/3", "uptext_generic"),
    ("Series60", "nokia_generic_series60"),
    ("NetFront/3.0", "generic_netfront_ver3"),
    ("ACS-NF/3.0", "generic_netfront_ver3"),
    ("NetFront/3.1", "generic_netfront_ver3_1"),
    ("ACS-NF/3.1", "generic_netfront_ver3_1"),
    ("NetFront/3.2", "generic_netfront_ver3_2"),
    ("ACS-NF/3.2", "generic_netfront_ver3_2"),
    ("NetFront/3.3", "generic_netfront_ver3_3"),
    ("ACS-NF/3.3", "generic_netfront_ver3_3"),
    ("NetFront/3.4", "generic_netfront_ver3_4"),
    ("NetFront/3.5", "generic_netfront_ver3_5"),
    ("NetFront/4.0", "generic_netfront_ver4_0"),
    ("NetFront/4.1", "generic_netfront_ver4_1"),
    ("Opera Mini/1", "generic_opera_mini_version1"),
    ("Opera Mini/2", "generic_opera_mini_version2"),
    ("Opera Mini/3", "generic_opera_mini_version3"),
    ("Opera Mini/4", "generic_opera_mini_version4"),
    ("Opera Mini/5", "generic_opera_mini_version5"),
    ("Android", "generic_android"),
];

static SCREEN_SIZE: OnceLock<Regex> = OnceLock::new();
static DESKTOP_SAFARI: OnceLock<Regex> = OnceLock::new();
static IE_11: OnceLock<Regex> = OnceLock::new();
static IE_9_10: OnceLock<Regex> = OnceLock::new();
static IE_LEGACY: OnceLock<Regex> = OnceLock::new();

/// Desktop keyword present (`WOW64`, `Macintosh`, `.NET CLR`, ...).
pub fn is_desktop_browser(ua: &str) -> bool {
    contains_any(&ua.to_lowercase(), DESKTOP_KEYWORDS)
}

/// Mobile keyword or a `NNNxNNN` screen size, and no desktop keyword.
pub fn is_mobile_browser(ua: &str) -> bool {
    if is_desktop_browser(ua) {
        return false;
    }
    contains_any(&ua.to_lowercase(), MOBILE_KEYWORDS)
        || cached_regex(&SCREEN_SIZE, r"[^\d]\d{3}x\d{3}").is_match(ua)
}

pub fn is_smart_tv(ua: &str) -> bool {
    contains_any(&ua.to_lowercase(), SMART_TV_KEYWORDS)
}

pub fn is_robot(ua: &str) -> bool {
    contains_any(&ua.to_lowercase(), ROBOT_KEYWORDS)
}

/// Full desktop-browser analysis: keyword lists plus the shapes of the
/// common desktop browsers. Smart TVs and Windows-on-ARM Edge never count.
pub fn is_desktop_heavy_duty(ua: &str) -> bool {
    if is_smart_tv(ua) {
        return false;
    }
    if contains_all(ua, &["Mozilla/5.0 (Windows NT ", " ARM;", " Edge/"]) {
        return false;
    }
    if ua.contains("Chrome") && !contains_any(ua, &["Android", "Ventana"]) {
        return true;
    }
    if is_mobile_browser(ua) {
        return false;
    }
    // PowerPC is not always mobile, but it is kept out of the desktop bucket.
    if ua.contains("PPC") {
        return false;
    }
    if ua.contains("Firefox") && !ua.contains("Tablet") {
        return true;
    }
    let safari = cached_regex(
        &DESKTOP_SAFARI,
        r"^Mozilla/5\.0 \((?:Macintosh|Windows)[^)]+\) AppleWebKit/[\d.]+ \(KHTML, like Gecko\) Version/[\d.]+ Safari/[\d.]+$",
    );
    if safari.is_match(ua) {
        return true;
    }
    if starts_with_any(ua, &["Opera/9.80 (Windows NT", "Opera/9.80 (Macintosh"]) {
        return true;
    }
    if is_desktop_browser(ua) {
        return true;
    }
    cached_regex(
        &IE_11,
        r"^Mozilla/5\.0 \(Windows NT.+?Trident.+?; rv:\d\d\.\d+\)",
    )
    .is_match(ua)
        || cached_regex(
            &IE_9_10,
            r"^Mozilla/5\.0 \(compatible; MSIE (?:9|10)\.0; Windows NT \d\.\d",
        )
        .is_match(ua)
        || cached_regex(
            &IE_LEGACY,
            r"^Mozilla/4\.0 \(compatible; MSIE \d\.\d; Windows NT \d\.\d",
        )
        .is_match(ua)
}

/// Generic id for a mobile string that carries a well known browser or
/// platform token, if any.
pub fn mobile_catch_all_id(ua: &str) -> Option<&'static str> {
    MOBILE_CATCH_ALL
        .iter()
        .find(|(needle, _)| ua.contains(needle))
        .map(|(_, id)| *id)
}

/// The recovery-catchall tier shared by every family.
pub fn recovery_catch_all(ua: &str) -> &'static str {
    if is_smart_tv(ua) {
        return GENERIC_SMARTTV;
    }
    if is_robot(ua) {
        return GENERIC_WEB_CRAWLER;
    }
    if is_desktop_heavy_duty(ua) {
        return GENERIC_WEB_BROWSER;
    }
    let desktop = is_desktop_browser(ua);
    if !desktop {
        if let Some(id) = mobile_catch_all_id(ua) {
            return id;
        }
    }
    if is_mobile_browser(ua) {
        GENERIC_MOBILE
    } else if desktop {
        GENERIC_WEB_BROWSER
    } else {
        GENERIC
    }
}
