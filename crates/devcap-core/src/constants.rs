// ── Sentinel ids and reserved tokens ──
//
// Classification always terminates in a concrete device id or one of
// these sentinels. None of them is an error.

/// Fully generic device: nothing is known about the requester.
pub const GENERIC: &str = "generic";

/// Some mobile device the chain could not pin down.
pub const GENERIC_MOBILE: &str = "generic_mobile";

/// Some desktop web browser.
pub const GENERIC_WEB_BROWSER: &str = "generic_web_browser";

/// Some smart TV browser.
pub const GENERIC_SMARTTV: &str = "generic_smarttv_browser";

/// Some robot, crawler or transcoder.
pub const GENERIC_WEB_CRAWLER: &str = "generic_web_crawler";

/// Separator between an injected vendor token and the original string.
pub const RIS_DELIMITER: &str = "---";

/// Placeholder written over locale tokens by the normalizer.
pub const LOCALE_PLACEHOLDER: &str = "xx-xx";

/// Capability group that carries virtual-capability overrides.
pub const CONTROL_GROUP: &str = "virtual";

/// Prefix of a control capability name (`controlcap_is_mobile`, ...).
pub const CONTROL_PREFIX: &str = "controlcap_";

/// Control value meaning "no override, compute the rule".
pub const CONTROL_DEFAULT: &str = "default";

/// Control value forcing a virtual capability to `true`.
pub const CONTROL_FORCE_TRUE: &str = "force_true";

/// Control value forcing a virtual capability to `false`.
pub const CONTROL_FORCE_FALSE: &str = "force_false";

/// `fall_back` value used by repositories to mark the root device.
pub const ROOT_FALL_BACK: &str = "root";

/// Suffix appended to a family prefix to form its persistence key.
pub const INDEX_KEY_SUFFIX: &str = "_DEVICEIDS";

/// Largest edit distance the BlackBerry conclusive tier accepts.
pub const WORST_MATCH: usize = 7;
