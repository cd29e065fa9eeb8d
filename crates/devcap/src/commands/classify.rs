//! Classify command handler.

use serde::Serialize;

use devcap_core::{Engine, MatchContext, MatchTier};

use crate::cli::{ClassifyArgs, GlobalOpts};
use crate::error::CliError;
use crate::output::{self, Report};

use super::util;

// ── Report ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ClassifyReport {
    device_id: String,
    matcher: Option<&'static str>,
    tier: MatchTier,
    elapsed_us: u128,
    trail: Vec<String>,
    user_agent: String,
    normalized_user_agent: String,
}

impl ClassifyReport {
    fn new(device_id: String, ctx: MatchContext) -> Self {
        Self {
            device_id,
            matcher: ctx.matcher,
            tier: ctx.tier,
            elapsed_us: ctx.elapsed.as_micros(),
            trail: ctx.trail.iter().map(ToString::to_string).collect(),
            user_agent: ctx.original_user_agent,
            normalized_user_agent: ctx.normalized_user_agent,
        }
    }
}

impl Report for ClassifyReport {
    fn table(&self, color: bool) -> String {
        let trail = if self.trail.is_empty() {
            "-".to_owned()
        } else {
            self.trail.join(" -> ")
        };
        [
            format!("Device:     {}", self.device_id),
            format!("Matcher:    {}", self.matcher.unwrap_or("-")),
            format!("Tier:       {}", output::tier_label(self.tier, color)),
            format!("Time:       {}µs", self.elapsed_us),
            format!("Trail:      {trail}"),
            format!("User-Agent: {}", self.user_agent),
            format!("Normalized: {}", self.normalized_user_agent),
        ]
        .join("\n")
    }

    fn plain(&self) -> String {
        self.device_id.clone()
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(engine: &Engine, args: ClassifyArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let request = util::build_request(&args.request)?;
    let (device_id, ctx) = engine.classify(&request);
    output::emit(&ClassifyReport::new(device_id, ctx), global);
    Ok(())
}
