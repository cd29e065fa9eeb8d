// ── Classifier chain ──
//
// Ordered families, each with its own sorted index. The first family that
// owns a string takes the call exclusively and runs the tier cascade; the
// chain never falls through to the next family because a cascade failed.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::{debug, info, trace};

use super::context::{MatchContext, MatchTier, TrailStep};
use super::family::{Conclusive, Family};
use super::heuristics::{is_desktop_heavy_duty, is_smart_tv, recovery_catch_all};
use super::index::ClassifierIndex;
use crate::constants::{GENERIC, GENERIC_MOBILE, GENERIC_SMARTTV, GENERIC_WEB_BROWSER};
use crate::error::CoreError;
use crate::normalizer::Normalizer;
use crate::request::Request;
use crate::storage::Storage;

/// Matcher name reported by the performance-mode shortcut.
pub const HIGH_PERFORMANCE: &str = "HighPerformance";

// ── Policy ──────────────────────────────────────────────────────────

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum MatchMode {
    /// Full chain for every string.
    #[default]
    Accuracy,
    /// Desktop browsers and smart TVs short-circuit to generic ids.
    Performance,
}

/// How far the conclusive prefix reduction may shrink.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ReductionFloor {
    /// Down to a single byte.
    #[default]
    One,
    /// Only at the family's own tolerance.
    Tolerance,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchPolicy {
    pub mode: MatchMode,
    pub reduction_floor: ReductionFloor,
}

/// `true` for results that let the cascade continue.
pub fn is_blank_or_generic(id: &str) -> bool {
    let id = id.trim();
    id.is_empty() || id == GENERIC
}

// ── Chain ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct Slot {
    family: Family,
    index: ClassifierIndex,
}

#[derive(Debug, Clone)]
pub struct ClassifierChain {
    slots: Vec<Slot>,
    normalizer: Normalizer,
    policy: MatchPolicy,
}

impl ClassifierChain {
    /// Every family in registration order, with empty indices.
    pub fn new(policy: MatchPolicy) -> Self {
        Self::with_families(Family::registration_order(), policy)
    }

    /// A custom chain over `families`, consulted in the given order.
    pub fn with_families(families: impl IntoIterator<Item = Family>, policy: MatchPolicy) -> Self {
        Self {
            slots: families
                .into_iter()
                .map(|family| Slot {
                    family,
                    index: ClassifierIndex::new(),
                })
                .collect(),
            normalizer: Normalizer::generic(),
            policy,
        }
    }

    /// Build every index from `(identification string, device id)` pairs.
    pub fn build<'a, I>(references: I, policy: MatchPolicy) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut chain = Self::new(policy);
        let mut skipped = 0usize;
        for (user_agent, device_id) in references {
            if chain.insert_reference(user_agent, device_id).is_none() {
                skipped += 1;
            }
        }
        for slot in &chain.slots {
            debug!(family = %slot.family, entries = slot.index.len(), "classifier index built");
        }
        info!(
            families = chain.slots.len(),
            entries = chain.slots.iter().map(|s| s.index.len()).sum::<usize>(),
            skipped,
            "classifier chain built"
        );
        chain
    }

    /// File one reference string under the family that owns it. Returns
    /// that family, or `None` for blank strings and unowned strings.
    pub fn insert_reference(&mut self, user_agent: &str, device_id: &str) -> Option<Family> {
        if user_agent.trim().is_empty() {
            return None;
        }
        let normalized = self.normalizer.normalize(user_agent);
        let slot = self
            .slots
            .iter_mut()
            .find(|slot| slot.family.owns(&normalized))?;
        let key = match slot.family.specific_step() {
            Some(step) => step.apply(&normalized),
            None => normalized,
        };
        slot.index.insert(key, device_id.to_owned());
        Some(slot.family)
    }

    pub fn families(&self) -> impl Iterator<Item = Family> + '_ {
        self.slots.iter().map(|slot| slot.family)
    }

    pub fn index(&self, family: Family) -> Option<&ClassifierIndex> {
        self.slot(family).map(|slot| &slot.index)
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    /// The first family whose ownership test accepts `user_agent`, which
    /// must already be generically normalized.
    pub fn owner(&self, user_agent: &str) -> Option<Family> {
        self.owning_slot(user_agent).map(|slot| slot.family)
    }

    fn slot(&self, family: Family) -> Option<&Slot> {
        self.slots.iter().find(|slot| slot.family == family)
    }

    fn owning_slot(&self, user_agent: &str) -> Option<&Slot> {
        self.slots.iter().find(|slot| slot.family.owns(user_agent))
    }

    // ── Classification ───────────────────────────────────────────────

    /// Classify a request. Never fails: the worst outcome is a sentinel.
    pub fn classify(&self, request: &Request) -> (String, MatchContext) {
        let started = Instant::now();
        let original = request.user_agent();
        let normalized = self.normalizer.normalize(original);
        let mut ctx = MatchContext::new(original, &normalized);

        let id = self.run(request, &normalized, &mut ctx);
        ctx.elapsed = started.elapsed();

        debug!(
            device_id = %id,
            matcher = ctx.matcher.unwrap_or("none"),
            tier = %ctx.tier,
            elapsed = ?ctx.elapsed,
            "classified"
        );
        (id, ctx)
    }

    fn run(&self, request: &Request, normalized: &str, ctx: &mut MatchContext) -> String {
        if self.policy.mode == MatchMode::Performance {
            if let Some(id) = high_performance_shortcut(normalized) {
                ctx.matcher = Some(HIGH_PERFORMANCE);
                ctx.tier = MatchTier::RecoveryCatchAll;
                return id.to_owned();
            }
        }

        let Some(slot) = self.owning_slot(normalized) else {
            trace!("no family owns the string");
            return GENERIC.to_owned();
        };

        let family = slot.family;
        let user_agent = match family.specific_step() {
            Some(step) => step.apply(normalized),
            None => normalized.to_owned(),
        };
        ctx.matcher = Some(family.name());
        ctx.normalized_user_agent.clone_from(&user_agent);

        match self.cascade(slot, &user_agent, ctx) {
            Some((id, tier)) => {
                ctx.tier = tier;
                id.to_owned()
            }
            None => {
                ctx.tier = MatchTier::None;
                if request.user_agent_profile().is_some() {
                    GENERIC_MOBILE.to_owned()
                } else {
                    GENERIC.to_owned()
                }
            }
        }
    }

    fn cascade<'s>(
        &'s self,
        slot: &'s Slot,
        user_agent: &str,
        ctx: &mut MatchContext,
    ) -> Option<(&'s str, MatchTier)> {
        let family = slot.family;
        for tier in MatchTier::CASCADE {
            ctx.trail.push(TrailStep {
                matcher: family.name(),
                tier,
            });
            let candidate = match tier {
                MatchTier::Exact => slot.index.get(user_agent),
                MatchTier::Conclusive => self.conclusive(slot, user_agent),
                MatchTier::Recovery => family.recovery(user_agent),
                MatchTier::RecoveryCatchAll => Some(recovery_catch_all(user_agent)),
                MatchTier::None => None,
            };
            trace!(family = %family, tier = %tier, candidate = candidate.unwrap_or(""), "tier attempted");
            if let Some(id) = candidate.filter(|id| !is_blank_or_generic(id)) {
                return Some((id, tier));
            }
        }
        None
    }

    fn conclusive<'s>(&self, slot: &'s Slot, user_agent: &str) -> Option<&'s str> {
        match slot.family.conclusive(user_agent) {
            Conclusive::Reduction { tolerance } => {
                let floor = match self.policy.reduction_floor {
                    ReductionFloor::One => 1,
                    ReductionFloor::Tolerance => tolerance,
                };
                slot.index.reduction_match(user_agent, tolerance, floor)
            }
            Conclusive::Distance {
                max_distance,
                length_window,
            } => slot
                .index
                .distance_match(user_agent, max_distance, length_window),
            Conclusive::Fixed(id) => Some(id),
            Conclusive::Recovery | Conclusive::Skip => None,
        }
    }

    // ── Persistence ──────────────────────────────────────────────────

    /// Save every family's index, empty ones included.
    pub fn persist(&self, storage: &dyn Storage) -> Result<(), CoreError> {
        for slot in &self.slots {
            storage.save(&slot.family.index_key(), &slot.index)?;
        }
        debug!(families = self.slots.len(), "classifier indices persisted");
        Ok(())
    }

    /// Rebuild a full chain from storage. `None` unless every family's
    /// index is present.
    pub fn load(storage: &dyn Storage, policy: MatchPolicy) -> Result<Option<Self>, CoreError> {
        let mut chain = Self::new(policy);
        for slot in &mut chain.slots {
            match storage.load(&slot.family.index_key())? {
                Some(index) => slot.index = index,
                None => {
                    debug!(family = %slot.family, "persisted index missing");
                    return Ok(None);
                }
            }
        }
        info!(families = chain.slots.len(), "classifier chain loaded from storage");
        Ok(Some(chain))
    }
}

fn high_performance_shortcut(user_agent: &str) -> Option<&'static str> {
    if is_desktop_heavy_duty(user_agent) {
        Some(GENERIC_WEB_BROWSER)
    } else if is_smart_tv(user_agent) {
        Some(GENERIC_SMARTTV)
    } else {
        None
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::constants::GENERIC_WEB_CRAWLER;
    use crate::storage::MemoryStorage;

    const NOKIA_6300: &str = "Nokia6300/2.0 (05.00) Profile/MIDP-2.0 Configuration/CLDC-1.1";
    const IPHONE_7: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 7_0 like Mac OS X) AppleWebKit/537.51.1 (KHTML, like Gecko) Version/7.0 Mobile/11A465 Safari/9537.53";
    const CHROME_DESKTOP: &str = "Mozilla/5.0 (Windows NT 6.1; WOW64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/41.0.2272.101 Safari/537.36";

    fn chain() -> ClassifierChain {
        ClassifierChain::build(
            [
                (NOKIA_6300, "nokia_6300_ver1"),
                ("Nokia6230i/2.0 (03.25) Profile/MIDP-2.0", "nokia_6230i_ver1"),
                (IPHONE_7, "apple_iphone_ver7"),
                ("", "ignored"),
            ],
            MatchPolicy::default(),
        )
    }

    #[test]
    fn references_are_filed_by_owner() {
        let chain = chain();
        assert_eq!(chain.index(Family::Nokia).unwrap().len(), 2);
        assert_eq!(chain.index(Family::Apple).unwrap().len(), 1);
        assert!(chain.index(Family::Bot).unwrap().is_empty());
    }

    #[test]
    fn exact_hit_skips_later_tiers() {
        let (id, ctx) = chain().classify(&Request::from_user_agent(NOKIA_6300));
        assert_eq!(id, "nokia_6300_ver1");
        assert_eq!(ctx.tier, MatchTier::Exact);
        assert_eq!(ctx.trail.len(), 1);
        assert_eq!(ctx.matcher, Some("Nokia"));
    }

    #[test]
    fn conclusive_hit_on_shared_prefix() {
        let (id, ctx) = chain().classify(&Request::from_user_agent(
            "Nokia6300/2.0 (07.21) Profile/MIDP-2.0 Configuration/CLDC-1.1",
        ));
        assert_eq!(id, "nokia_6300_ver1");
        assert_eq!(ctx.tier, MatchTier::Conclusive);
        assert_eq!(ctx.trail_summary(), "Nokia(exact) -> Nokia(conclusive)");
    }

    #[test]
    fn tolerance_floor_hands_over_to_recovery() {
        let policy = MatchPolicy {
            reduction_floor: ReductionFloor::Tolerance,
            ..MatchPolicy::default()
        };
        let mut chain = ClassifierChain::new(policy);
        chain.insert_reference(NOKIA_6300, "nokia_6300_ver1");
        let (id, ctx) = chain.classify(&Request::from_user_agent(
            "Nokia5800d-1/21.0.025 (SymbianOS/9.4; U; Series60/5.0)",
        ));
        assert_eq!(id, "nokia_generic_series60");
        assert_eq!(ctx.tier, MatchTier::Recovery);
    }

    #[test]
    fn empty_input_degrades_to_generic() {
        let (id, ctx) = chain().classify(&Request::from_user_agent(""));
        assert_eq!(id, GENERIC);
        assert_eq!(ctx.tier, MatchTier::None);
        assert_eq!(ctx.matcher, Some("CatchAll"));
    }

    #[test]
    fn profile_header_turns_total_failure_into_generic_mobile() {
        let request = Request::from_user_agent("").with_user_agent_profile("http://example.test/uaprof.xml");
        let (id, _) = chain().classify(&request);
        assert_eq!(id, GENERIC_MOBILE);
    }

    #[test]
    fn owner_takes_the_call_exclusively() {
        // Nokia owns the string but has no index entry sharing a prefix
        // and no recovery hint; the chain must not move on to CatchAll.
        let chain = ClassifierChain::with_families([Family::Nokia, Family::CatchAll], MatchPolicy::default());
        let (_, ctx) = chain.classify(&Request::from_user_agent("NokiaX/1.0 Mobile"));
        assert_eq!(ctx.matcher, Some("Nokia"));
        assert!(ctx.trail.iter().all(|step| step.matcher == "Nokia"));
    }

    #[test]
    fn unowned_string_in_custom_chain() {
        let chain = ClassifierChain::with_families([Family::Sagem], MatchPolicy::default());
        let (id, ctx) = chain.classify(&Request::from_user_agent("Nokia6300/2.0"));
        assert_eq!(id, GENERIC);
        assert_eq!(ctx.matcher, None);
        assert!(ctx.trail.is_empty());
    }

    #[test]
    fn performance_mode_short_circuits_desktops() {
        let policy = MatchPolicy {
            mode: MatchMode::Performance,
            ..MatchPolicy::default()
        };
        let chain = ClassifierChain::new(policy);
        let (id, ctx) = chain.classify(&Request::from_user_agent(CHROME_DESKTOP));
        assert_eq!(id, GENERIC_WEB_BROWSER);
        assert_eq!(ctx.matcher, Some(HIGH_PERFORMANCE));
        assert_eq!(ctx.tier, MatchTier::RecoveryCatchAll);
    }

    #[test]
    fn classification_is_deterministic() {
        let chain = chain();
        let request = Request::from_user_agent("Mozilla/5.0 (iPhone; CPU iPhone OS 6_1 like Mac OS X)");
        let (first, _) = chain.classify(&request);
        let (second, _) = chain.classify(&request);
        assert_eq!(first, second);
    }

    #[test]
    fn persisted_chain_round_trips_through_storage() {
        let storage = MemoryStorage::new();
        let built = chain();
        built.persist(&storage).unwrap();
        assert_eq!(storage.len(), Family::registration_order().count());

        let loaded = ClassifierChain::load(&storage, MatchPolicy::default())
            .unwrap()
            .unwrap();
        assert_eq!(loaded.index(Family::Nokia), built.index(Family::Nokia));
    }

    #[test]
    fn partial_storage_is_ignored() {
        let storage = MemoryStorage::new();
        storage
            .save(&Family::Apple.index_key(), &ClassifierIndex::new())
            .unwrap();
        assert!(ClassifierChain::load(&storage, MatchPolicy::default()).unwrap().is_none());
    }

    #[test]
    fn owned_crawler_falls_to_the_crawler_sentinel() {
        let chain = ClassifierChain::new(MatchPolicy::default());
        let (id, ctx) = chain.classify(&Request::from_user_agent(
            "NokiaCrawler/1.0 (+http://example.test/crawler)",
        ));
        assert_eq!(id, GENERIC_WEB_CRAWLER);
        assert_eq!(ctx.matcher, Some("Nokia"));
        assert_eq!(ctx.tier, MatchTier::RecoveryCatchAll);
    }

    #[test]
    fn owned_smart_tv_falls_to_the_tv_sentinel() {
        let chain = ClassifierChain::with_families([Family::Nokia, Family::CatchAll], MatchPolicy::default());
        let (id, ctx) = chain.classify(&Request::from_user_agent("NokiaBrowser/1.0 (HbbTV/1.1.1)"));
        assert_eq!(id, GENERIC_SMARTTV);
        assert_eq!(ctx.tier, MatchTier::RecoveryCatchAll);
    }

    #[test]
    fn safari_reports_the_recovery_tier() {
        let (id, ctx) = chain().classify(&Request::from_user_agent(
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_6_8) AppleWebKit/534.50 (KHTML, like Gecko) Version/5.1 Safari/534.50",
        ));
        assert_eq!(id, "safari_5_1");
        assert_eq!(ctx.matcher, Some("Safari"));
        assert_eq!(ctx.tier, MatchTier::Recovery);
        assert_eq!(
            ctx.trail_summary(),
            "Safari(exact) -> Safari(conclusive) -> Safari(recovery)"
        );
    }

    #[test]
    fn blank_and_generic_results_continue() {
        assert!(is_blank_or_generic(""));
        assert!(is_blank_or_generic("  "));
        assert!(is_blank_or_generic("generic"));
        assert!(!is_blank_or_generic("generic_mobile"));
    }
}
