// ── Family-specific vendor-token injection ──
//
// Each step detects a model/OS fingerprint buried in the string and
// prepends it, followed by the reserved delimiter, so that the owning
// family's prefix matcher compares on it first. Strings that already
// carry the delimiter are left alone, which keeps the steps idempotent.

use std::sync::OnceLock;

use regex::Regex;

use crate::constants::RIS_DELIMITER;
use crate::text::{cached_regex, contains_all};

static ANDROID_VERSION: OnceLock<Regex> = OnceLock::new();
static ANDROID_MODEL: OnceLock<Regex> = OnceLock::new();
static MAEMO_MODEL: OnceLock<Regex> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecificStep {
    /// `"<version> <model>---"` for Android strings.
    Android,
    /// `"<version> <model>---"` for Android-based Kindle Fire strings.
    Kindle,
    /// `"Maemo <model>---"` for Maemo browser strings.
    Maemo,
}

impl SpecificStep {
    pub fn apply(self, ua: &str) -> String {
        if ua.contains(RIS_DELIMITER) {
            return ua.to_owned();
        }
        let prefix = match self {
            Self::Android => android_prefix(ua),
            Self::Kindle if contains_all(ua, &["Android", "Kindle Fire"]) => android_prefix(ua),
            Self::Kindle => None,
            Self::Maemo => maemo_model(ua).map(|model| format!("Maemo {model}")),
        };
        match prefix {
            Some(prefix) => format!("{prefix}{RIS_DELIMITER}{ua}"),
            None => ua.to_owned(),
        }
    }
}

fn android_prefix(ua: &str) -> Option<String> {
    let version = android_version(ua)?;
    let model = android_model(ua)?;
    Some(format!("{version} {model}"))
}

/// `major.minor` of the Android release in the string.
pub(crate) fn android_version(ua: &str) -> Option<String> {
    cached_regex(&ANDROID_VERSION, r"Android[ /-]?(\d+\.\d+)")
        .captures(ua)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_owned())
}

/// Device model named between the Android version (and optional locale)
/// and `Build/` or the closing parenthesis.
pub(crate) fn android_model(ua: &str) -> Option<String> {
    cached_regex(
        &ANDROID_MODEL,
        r"Android [\d.]+;(?: [a-z]{2}[-_][a-zA-Z]{2};| xx-xx;)? ([^;)]+?)(?: Build/|\))",
    )
    .captures(ua)
    .and_then(|caps| caps.get(1))
    .map(|m| m.as_str().trim().to_owned())
    .filter(|model| !model.is_empty())
}

/// Model after `Maemo Browser <version>`, without trailing toolbar tokens.
pub(crate) fn maemo_model(ua: &str) -> Option<String> {
    let caps = cached_regex(&MAEMO_MODEL, r"Maemo [bB]rowser [\d.]+ (.+)").captures(ua)?;
    let model = caps.get(1)?.as_str();
    let model = match model.find(" GTB") {
        Some(pos) => &model[..pos],
        None => model,
    };
    let model = model.trim();
    (!model.is_empty()).then(|| model.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    const NEXUS_S: &str = "Mozilla/5.0 (Linux; U; Android 2.3.4; xx-xx; Nexus S Build/GRJ22) AppleWebKit/533.1 (KHTML, like Gecko) Version/4.0 Mobile Safari/533.1";

    #[test]
    fn android_prefix_is_injected() {
        assert_eq!(
            SpecificStep::Android.apply(NEXUS_S),
            format!("2.3 Nexus S---{NEXUS_S}")
        );
    }

    #[test]
    fn android_model_without_build_token() {
        let ua = "Mozilla/5.0 (Linux; Android 4.4.2; SM-G900F) AppleWebKit/537.36";
        assert_eq!(android_model(ua).as_deref(), Some("SM-G900F"));
        assert_eq!(android_version(ua).as_deref(), Some("4.4"));
    }

    #[test]
    fn injection_is_idempotent() {
        let once = SpecificStep::Android.apply(NEXUS_S);
        assert_eq!(SpecificStep::Android.apply(&once), once);
    }

    #[test]
    fn kindle_needs_kindle_fire() {
        let fire = "Mozilla/5.0 (Linux; U; Android 2.3.4; xx-xx; Kindle Fire Build/GINGERBREAD) AppleWebKit/533.1 (KHTML, like Gecko) Version/4.0 Mobile Safari/533.1";
        assert!(SpecificStep::Kindle.apply(fire).starts_with("2.3 Kindle Fire---"));
        assert_eq!(SpecificStep::Kindle.apply(NEXUS_S), NEXUS_S);
    }

    #[test]
    fn maemo_model_drops_toolbar_suffix() {
        let ua = "Mozilla/5.0 (X11; U; Linux armv7l; xx-xx; rv:1.9.2.3pre) Gecko/20100624 Firefox/3.5 Maemo Browser 1.7.4.8 RX-51 N900 GTB7.1";
        assert_eq!(maemo_model(ua).as_deref(), Some("RX-51 N900"));
        assert!(SpecificStep::Maemo.apply(ua).starts_with("Maemo RX-51 N900---"));
    }

    #[test]
    fn strings_without_fingerprint_pass_through() {
        assert_eq!(SpecificStep::Maemo.apply("Nokia6300/2.0"), "Nokia6300/2.0");
        assert_eq!(SpecificStep::Android.apply("Android"), "Android");
    }
}
