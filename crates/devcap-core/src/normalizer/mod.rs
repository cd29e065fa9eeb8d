//! Identification-string normalization.
//!
//! A [`Normalizer`] is an ordered list of [`NormalizeStep`]s. Each step is a
//! pure rewrite; order matters because later steps see earlier output.
//! [`Normalizer::generic`] is applied to every request before chain
//! dispatch. Families add one [`SpecificStep`] of their own, applied both
//! when their index is built and before they match.

mod specific;

use std::sync::OnceLock;

use regex::Regex;

use crate::constants::LOCALE_PLACEHOLDER;
use crate::text::cached_regex;

pub use specific::SpecificStep;
pub(crate) use specific::{android_model, android_version, maemo_model};

static BABEL_FISH: OnceLock<Regex> = OnceLock::new();
static SERIAL_NUMBER: OnceLock<Regex> = OnceLock::new();
static DOCOMO_SERIAL: OnceLock<Regex> = OnceLock::new();
static LOCALE: OnceLock<Regex> = OnceLock::new();

/// A single generic rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizeStep {
    /// Drop the ` (via babelfish.yahoo.com)` translator suffix.
    BabelFish,
    /// Drop everything from the ` UP.Link` gateway token on.
    UpLink,
    /// Mask handset serial numbers so identical models collapse.
    SerialNumbers,
    /// Drop operator junk in front of `BlackBerry`.
    BlackBerry,
    /// Replace locale tokens with [`LOCALE_PLACEHOLDER`].
    LocaleRemover,
    /// Drop `,gzip(gfe)` residue appended by some proxies.
    TransferEncoding,
    /// A family-specific vendor-token injection.
    Specific(SpecificStep),
}

impl NormalizeStep {
    pub fn apply(self, ua: &str) -> String {
        match self {
            Self::BabelFish => cached_regex(&BABEL_FISH, r"\s*\(via babelfish\.yahoo\.com\)\s*")
                .replace_all(ua, "")
                .into_owned(),
            Self::UpLink => match ua.find(" UP.Link") {
                Some(pos) => ua[..pos].to_owned(),
                None => ua.to_owned(),
            },
            Self::SerialNumbers => {
                let masked = cached_regex(&SERIAL_NUMBER, r"/SN\d{15}")
                    .replace_all(ua, "/SNXXXXXXXXXXXXXXX");
                cached_regex(&DOCOMO_SERIAL, r"\[(?:NT|ST|TF)[\dX]+\]")
                    .replace_all(&masked, "")
                    .into_owned()
            }
            Self::BlackBerry => match ua.find("BlackBerry") {
                Some(pos) if pos > 0 && !ua.contains("AppleWebKit") => ua[pos..].to_owned(),
                _ => ua.to_owned(),
            },
            Self::LocaleRemover => remove_locale(ua),
            Self::TransferEncoding => ua.replace(",gzip(gfe)", ""),
            Self::Specific(step) => step.apply(ua),
        }
    }
}

/// Ordered, composable normalization pipeline.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    steps: Vec<NormalizeStep>,
}

impl Normalizer {
    /// A pipeline that returns its input unchanged.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The pipeline applied to every request before chain dispatch.
    pub fn generic() -> Self {
        Self::empty()
            .then(NormalizeStep::BabelFish)
            .then(NormalizeStep::UpLink)
            .then(NormalizeStep::SerialNumbers)
            .then(NormalizeStep::BlackBerry)
            .then(NormalizeStep::LocaleRemover)
            .then(NormalizeStep::TransferEncoding)
    }

    /// Append a step to the end of the pipeline.
    pub fn then(mut self, step: NormalizeStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn steps(&self) -> &[NormalizeStep] {
        &self.steps
    }

    pub fn normalize(&self, ua: &str) -> String {
        self.steps
            .iter()
            .fold(ua.to_owned(), |acc, step| step.apply(&acc))
    }
}

/// Replace locale tokens (`; en-us`, `(de`, `; zh-rTW.big5`) with the
/// placeholder, keeping the delimiter that introduced them. A token that
/// is directly followed by `:` (`rv:11.0`) is not a locale.
pub fn remove_locale(ua: &str) -> String {
    let re = cached_regex(
        &LOCALE,
        r"(?P<lead>; ?|\()[a-z]{2}(?:-r?[a-zA-Z]{2})?(?:\.utf8|\.big5)?\b-?",
    );

    let mut out = String::with_capacity(ua.len());
    let mut last = 0;
    for caps in re.captures_iter(ua) {
        let (Some(whole), Some(lead)) = (caps.get(0), caps.name("lead")) else {
            continue;
        };
        if ua[whole.end()..].starts_with(':') {
            continue;
        }
        out.push_str(&ua[last..whole.start()]);
        out.push_str(if lead.as_str().starts_with(';') { "; " } else { "(" });
        out.push_str(LOCALE_PLACEHOLDER);
        last = whole.end();
    }
    out.push_str(&ua[last..]);
    out
}
