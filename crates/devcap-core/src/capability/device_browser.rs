// ── Advertised OS / browser group ──
//
// One pass over the identification string produces all four
// `advertised_*` values, so sibling queries share the work.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

/// OS patterns in precedence order; capture 1 is the version, if any.
const OS_PATTERNS: &[(&str, &str)] = &[
    ("Windows Phone", r"Windows Phone(?: OS)? ([\d.]+)"),
    ("iOS", r"(?:iPhone|CPU|iPad; CPU) OS (\d+(?:_\d+)*)"),
    ("Android", r"Android(?:[ /-]([\d.]+))?"),
    ("BlackBerry", r"BB(10)"),
    ("BlackBerry", r"BlackBerry[^/\s]*/([\d.]+)"),
    ("Symbian", r"Symbian(?:OS)?/([\d.]+)"),
    ("Windows", r"Windows NT ([\d.]+)"),
    ("Mac OS X", r"Mac OS X ([\d_.]+)"),
    ("Linux", r"Linux()"),
];

/// Browser patterns in precedence order; capture 1 is the version.
const BROWSER_PATTERNS: &[(&str, &str)] = &[
    ("Opera Mini", r"Opera Mini/([\d.]+)"),
    ("Opera", r"OPR/([\d.]+)"),
    ("Opera", r"Opera.*Version/([\d.]+)"),
    ("IEMobile", r"IEMobile/([\d.]+)"),
    ("Edge", r"Edge/([\d.]+)"),
    ("IE", r"MSIE ([\d.]+)"),
    ("IE", r"Trident/.*rv:([\d.]+)"),
    ("UC Browser", r"UC ?Browser/([\d.]+)"),
    ("Chrome", r"(?:Chrome|CriOS)/([\d.]+)"),
    ("Firefox", r"Firefox/([\d.]+)"),
    ("Android Webkit", r"Android.*Version/([\d.]+).*Safari"),
    ("Mobile Safari", r"Version/([\d.]+).*Mobile.*Safari"),
    ("Safari", r"Version/([\d.]+).*Safari"),
    ("NetFront", r"NetFront/([\d.]+)"),
    ("Openwave", r"UP\.Browser/([\d.]+)"),
];

static OS_RULES: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
static BROWSER_RULES: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();

fn compiled(
    cell: &'static OnceLock<Vec<(&'static str, Regex)>>,
    table: &'static [(&'static str, &'static str)],
) -> &'static [(&'static str, Regex)] {
    cell.get_or_init(|| {
        table
            .iter()
            .map(|(name, pattern)| (*name, Regex::new(pattern).expect("static pattern compiles")))
            .collect()
    })
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeviceBrowser {
    pub device_os: String,
    pub device_os_version: String,
    pub browser: String,
    pub browser_version: String,
}

impl DeviceBrowser {
    pub fn compute(ua: &str) -> Self {
        let (device_os, device_os_version) = first_match(compiled(&OS_RULES, OS_PATTERNS), ua);
        let (browser, browser_version) =
            first_match(compiled(&BROWSER_RULES, BROWSER_PATTERNS), ua);
        Self {
            device_os,
            device_os_version: device_os_version.replace('_', "."),
            browser,
            browser_version,
        }
    }
}

fn first_match(rules: &[(&'static str, Regex)], ua: &str) -> (String, String) {
    rules
        .iter()
        .find_map(|(name, re)| {
            let caps = re.captures(ua)?;
            let version = caps.get(1).map_or("", |m| m.as_str());
            Some(((*name).to_owned(), version.to_owned()))
        })
        .unwrap_or_default()
}
