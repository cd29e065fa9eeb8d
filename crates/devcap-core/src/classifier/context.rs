// ── Per-call match diagnostics ──

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use strum::{Display, EnumString, IntoStaticStr};

/// How far down the cascade a classification went.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum MatchTier {
    Exact,
    Conclusive,
    Recovery,
    #[serde(rename = "recovery-catchall")]
    #[strum(serialize = "recovery-catchall")]
    RecoveryCatchAll,
    None,
}

impl MatchTier {
    /// The tiers every owning family runs, in order.
    pub const CASCADE: [MatchTier; 4] = [
        MatchTier::Exact,
        MatchTier::Conclusive,
        MatchTier::Recovery,
        MatchTier::RecoveryCatchAll,
    ];
}

/// One attempted `(matcher, tier)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrailStep {
    pub matcher: &'static str,
    pub tier: MatchTier,
}

impl fmt::Display for TrailStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.matcher, self.tier)
    }
}

/// Created fresh for every classification call.
#[derive(Debug, Clone, Serialize)]
pub struct MatchContext {
    /// Family (or shortcut) that produced the result; `None` when no
    /// family owned the string.
    pub matcher: Option<&'static str>,
    pub tier: MatchTier,
    pub elapsed: Duration,
    pub trail: Vec<TrailStep>,
    pub original_user_agent: String,
    /// The string the owning family matched against.
    pub normalized_user_agent: String,
}

impl MatchContext {
    pub(crate) fn new(original: &str, normalized: &str) -> Self {
        Self {
            matcher: None,
            tier: MatchTier::None,
            elapsed: Duration::ZERO,
            trail: Vec::new(),
            original_user_agent: original.to_owned(),
            normalized_user_agent: normalized.to_owned(),
        }
    }

    /// Trail rendered as `Apple(exact) -> Apple(conclusive)`.
    pub fn trail_summary(&self) -> String {
        self.trail
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}
