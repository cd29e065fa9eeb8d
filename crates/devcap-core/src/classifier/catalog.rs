// ── Constant device-id catalogs ──
//
// Ids the recovery tier may hand out without an index hit. The engine
// warns at build time about any of these the repository lacks.

pub const JAVA_MIDLET: &str = "generic_midp_midlet";

pub const SMART_TV: &[&str] = &[
    "generic_smarttv_browser",
    "generic_smarttv_googletv_browser",
    "generic_smarttv_appletv_browser",
    "generic_smarttv_boxeebox_browser",
    "generic_smarttv_chromecast",
];

/// Lowercase keyword → smart-TV id, checked in order.
pub const SMART_TV_KEYWORDS: &[(&str, &str)] = &[
    ("googletv", "generic_smarttv_googletv_browser"),
    ("appletv", "generic_smarttv_appletv_browser"),
    ("boxee", "generic_smarttv_boxeebox_browser"),
    ("crkey", "generic_smarttv_chromecast"),
];

pub const KINDLE: &[&str] = &[
    "amazon_kindle_ver1",
    "amazon_kindle2_ver1",
    "amazon_kindle3_ver1",
    "amazon_kindle_fire_ver1",
    "generic_amazon_kindle",
];

pub const LGUPLUS: &[&str] = &[
    "generic_lguplus_rexos_facebook_browser",
    "generic_lguplus_rexos_webviewer_browser",
    "generic_lguplus_winmo_facebook_browser",
    "generic_lguplus_android_webkit_browser",
];

pub const MAEMO_OPERA: &str = "generic_opera_mobi_maemo";
pub const MAEMO_GENERIC: &str = "nokia_generic_maemo";

pub const XBOX: &[&str] = &[
    "microsoft_xboxone_ver1",
    "microsoft_xbox360_ver1",
    "microsoft_xbox360_ver1_subie10",
];

pub const WINDOWS_PHONE: &[&str] = &[
    "generic_ms_phone_os7",
    "generic_ms_phone_os7_5",
    "generic_ms_phone_os7_8",
    "generic_ms_phone_os8",
    "generic_ms_phone_os8_1",
    "generic_ms_phone_os10",
];

pub const ANDROID_GENERIC: &str = "generic_android";

pub const ANDROID: &[&str] = &[
    "generic_android",
    "generic_android_ver1_5",
    "generic_android_ver1_6",
    "generic_android_ver2_0",
    "generic_android_ver2_1",
    "generic_android_ver2_2",
    "generic_android_ver2_3",
    "generic_android_ver3_0",
    "generic_android_ver3_1",
    "generic_android_ver3_2",
    "generic_android_ver4_0",
    "generic_android_ver4_1",
    "generic_android_ver4_2",
    "generic_android_ver4_3",
    "generic_android_ver4_4",
    "generic_android_ver5_0",
    "generic_android_ver5_1",
    "generic_android_ver6_0",
    "generic_android_ver7_0",
    "generic_android_ver7_1",
    "generic_android_ver8_0",
    "generic_android_ver8_1",
    "generic_android_ver9_0",
];

pub const APPLE: &[&str] = &[
    "apple_ipod_touch_ver1",
    "apple_ipod_touch_ver2",
    "apple_ipod_touch_ver3",
    "apple_ipod_touch_ver4",
    "apple_ipod_touch_ver5",
    "apple_ipod_touch_ver6",
    "apple_ipod_touch_ver7",
    "apple_ipad_ver1",
    "apple_ipad_ver1_subua32",
    "apple_ipad_ver1_sub42",
    "apple_ipad_ver1_sub5",
    "apple_ipad_ver1_sub6",
    "apple_ipad_ver1_sub7",
    "apple_iphone_ver1",
    "apple_iphone_ver2",
    "apple_iphone_ver3",
    "apple_iphone_ver4",
    "apple_iphone_ver5",
    "apple_iphone_ver6",
    "apple_iphone_ver7",
];

pub const BLACKBERRY_GENERIC: &str = "blackberry_generic_ver2";

pub const BLACKBERRY: &[&str] = &[
    "blackberry_generic_ver2",
    "blackberry_generic_ver3",
    "blackberry_generic_ver4",
    "blackberry_generic_ver5",
    "blackberry_generic_ver6",
    "blackberry_generic_ver7",
    "blackberry_generic_ver10",
];

pub const NOKIA: &[&str] = &[
    "nokia_generic_series60",
    "nokia_generic_series80",
    "nokia_generic_meego",
];

pub const CHROME_GENERIC: &str = "google_chrome";

pub const CHROME: &[&str] = &[
    "google_chrome",
    "google_chrome_30",
    "google_chrome_31",
    "google_chrome_32",
    "google_chrome_33",
    "google_chrome_34",
    "google_chrome_35",
    "google_chrome_36",
    "google_chrome_37",
    "google_chrome_38",
    "google_chrome_39",
    "google_chrome_40",
    "google_chrome_41",
    "google_chrome_42",
    "google_chrome_43",
    "google_chrome_44",
    "google_chrome_45",
];

pub const FIREFOX_GENERIC: &str = "firefox";

pub const FIREFOX: &[&str] = &[
    "firefox",
    "firefox_3",
    "firefox_4",
    "firefox_5",
    "firefox_10",
    "firefox_20",
    "firefox_30",
    "firefox_31",
    "firefox_32",
    "firefox_33",
    "firefox_34",
    "firefox_35",
    "firefox_36",
    "firefox_37",
    "firefox_38",
    "firefox_39",
    "firefox_40",
];

pub const MSIE_GENERIC: &str = "msie";

pub const MSIE: &[&str] = &[
    "msie", "msie_4", "msie_5", "msie_6", "msie_7", "msie_8", "msie_9", "msie_10", "msie_11",
];

pub const OPERA_GENERIC: &str = "opera";

pub const OPERA: &[&str] = &[
    "opera", "opera_7", "opera_8", "opera_9", "opera_10", "opera_11", "opera_12",
];

pub const SAFARI_GENERIC: &str = "safari";

/// `Version/x.y` or two-digit `Safari/` build prefix → id.
pub const SAFARI_VERSIONS: &[(&str, &str)] = &[
    ("3.0", "safari_3_0"),
    ("3.1", "safari_3_1"),
    ("3.2", "safari_3_2"),
    ("4.0", "safari_4_0"),
    ("4.1", "safari_4_1"),
    ("5.0", "safari_5_0"),
    ("5.1", "safari_5_1"),
    ("55", "safari_5_0"),
    ("65", "safari_5_0"),
    ("75", "safari_5_1"),
];

pub const SAFARI: &[&str] = &[
    "safari",
    "safari_3_0",
    "safari_3_1",
    "safari_3_2",
    "safari_4_0",
    "safari_4_1",
    "safari_5_0",
    "safari_5_1",
];

/// The catalogued id equal to `candidate`, with a `'static` lifetime.
pub fn lookup(ids: &'static [&'static str], candidate: &str) -> Option<&'static str> {
    ids.iter().copied().find(|id| *id == candidate)
}
