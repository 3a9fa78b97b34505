// Rate sources
//
// This module abstracts where primitive to primitive rates come from. The engine only
// needs a rate and a validity flag per (base, quote) pair and regime; whether the number
// came from Chainlink, a TWAP or a test fixture is the source's business. RateTable is the
// in-memory snapshot used by the config loader, the demo and the tests.

use crate::types::{AssetId, Rate, Regime, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::trace;

/// A rate and whether it may be used. Invalid rates must be discarded, not read as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateQuote {
    pub rate: Rate,
    pub is_valid: bool,
}

impl RateQuote {
    pub fn valid(rate: Rate) -> Self {
        Self {
            rate,
            is_valid: true,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            rate: Rate::zero(),
            is_valid: false,
        }
    }
}

/// Trait for rate providers. Defined for pairs of registered primitives.
pub trait RateSource {
    /// Committed, manipulation resistant rate.
    fn canonical_rate(&self, base: &AssetId, quote: &AssetId) -> RateQuote;

    /// Spot rate for live mark to market.
    fn live_rate(&self, base: &AssetId, quote: &AssetId) -> RateQuote;

    fn rate(&self, regime: Regime, base: &AssetId, quote: &AssetId) -> RateQuote {
        match regime {
            Regime::Canonical => self.canonical_rate(base, quote),
            Regime::Live => self.live_rate(base, quote),
        }
    }
}

impl<T: RateSource + ?Sized> RateSource for &T {
    fn canonical_rate(&self, base: &AssetId, quote: &AssetId) -> RateQuote {
        (**self).canonical_rate(base, quote)
    }

    fn live_rate(&self, base: &AssetId, quote: &AssetId) -> RateQuote {
        (**self).live_rate(base, quote)
    }
}

impl<T: RateSource + ?Sized> RateSource for Arc<T> {
    fn canonical_rate(&self, base: &AssetId, quote: &AssetId) -> RateQuote {
        (**self).canonical_rate(base, quote)
    }

    fn live_rate(&self, base: &AssetId, quote: &AssetId) -> RateQuote {
        (**self).live_rate(base, quote)
    }
}

/// A single posted rate and when it was posted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateEntry {
    pub rate: Rate,
    pub updated_at: Timestamp,
}

impl RateEntry {
    pub fn is_stale(&self, now: Timestamp, max_age_ms: i64) -> bool {
        now.millis_since(&self.updated_at) > max_age_ms
    }
}

type Pair = (AssetId, AssetId);

/// In-memory canonical and live rates with staleness and per-asset outages.
#[derive(Debug, Clone, Default)]
pub struct RateTable {
    canonical: HashMap<Pair, RateEntry>,
    live: HashMap<Pair, RateEntry>,
    /// Assets whose feeds are down; every pair touching them reads invalid
    unavailable: HashSet<AssetId>,
    /// Time the snapshot is read at
    as_of: Timestamp,
    /// Entries older than this (relative to as_of) read invalid. None disables the check.
    max_age_ms: Option<i64>,
}

impl RateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_age(mut self, max_age_ms: i64) -> Self {
        self.max_age_ms = Some(max_age_ms);
        self
    }

    pub fn set_time(&mut self, now: Timestamp) {
        self.as_of = now;
    }

    pub fn time(&self) -> Timestamp {
        self.as_of
    }

    pub fn set_canonical_rate(&mut self, base: AssetId, quote: AssetId, rate: Rate) {
        let entry = RateEntry {
            rate,
            updated_at: self.as_of,
        };
        self.canonical.insert((base, quote), entry);
    }

    pub fn set_live_rate(&mut self, base: AssetId, quote: AssetId, rate: Rate) {
        let entry = RateEntry {
            rate,
            updated_at: self.as_of,
        };
        self.live.insert((base, quote), entry);
    }

    /// Post the same rate to both regimes.
    pub fn set_rate(&mut self, base: AssetId, quote: AssetId, rate: Rate) {
        self.set_canonical_rate(base.clone(), quote.clone(), rate);
        self.set_live_rate(base, quote, rate);
    }

    pub fn remove_rate(&mut self, regime: Regime, base: &AssetId, quote: &AssetId) -> bool {
        let key = (base.clone(), quote.clone());
        self.entries_mut(regime).remove(&key).is_some()
    }

    pub fn mark_unavailable(&mut self, asset: AssetId) {
        self.unavailable.insert(asset);
    }

    pub fn restore(&mut self, asset: &AssetId) -> bool {
        self.unavailable.remove(asset)
    }

    pub fn entry(&self, regime: Regime, base: &AssetId, quote: &AssetId) -> Option<&RateEntry> {
        self.entries(regime).get(&(base.clone(), quote.clone()))
    }

    fn entries(&self, regime: Regime) -> &HashMap<Pair, RateEntry> {
        match regime {
            Regime::Canonical => &self.canonical,
            Regime::Live => &self.live,
        }
    }

    fn entries_mut(&mut self, regime: Regime) -> &mut HashMap<Pair, RateEntry> {
        match regime {
            Regime::Canonical => &mut self.canonical,
            Regime::Live => &mut self.live,
        }
    }

    fn lookup(&self, regime: Regime, base: &AssetId, quote: &AssetId) -> RateQuote {
        if self.unavailable.contains(base) || self.unavailable.contains(quote) {
            trace!(%base, %quote, %regime, "feed unavailable");
            return RateQuote::unavailable();
        }

        let Some(entry) = self.entry(regime, base, quote) else {
            trace!(%base, %quote, %regime, "no rate posted");
            return RateQuote::unavailable();
        };

        if let Some(max_age_ms) = self.max_age_ms {
            if entry.is_stale(self.as_of, max_age_ms) {
                trace!(%base, %quote, %regime, updated_at = entry.updated_at.as_millis(), "stale rate");
                return RateQuote::unavailable();
            }
        }

        RateQuote::valid(entry.rate)
    }
}

impl RateSource for RateTable {
    fn canonical_rate(&self, base: &AssetId, quote: &AssetId) -> RateQuote {
        self.lookup(Regime::Canonical, base, quote)
    }

    fn live_rate(&self, base: &AssetId, quote: &AssetId) -> RateQuote {
        self.lookup(Regime::Live, base, quote)
    }
}
