//! Shared fixtures: a snapshot builder and collaborator doubles.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use valuation_core::*;

pub const E18: u128 = 1_000_000_000_000_000_000;

pub fn id(s: &str) -> AssetId {
    AssetId::from(s)
}

/// Rate source that counts calls per regime.
pub struct CountingRates<S> {
    inner: S,
    canonical: AtomicUsize,
    live: AtomicUsize,
}

impl<S: RateSource> CountingRates<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            canonical: AtomicUsize::new(0),
            live: AtomicUsize::new(0),
        }
    }

    pub fn canonical_calls(&self) -> usize {
        self.canonical.load(Ordering::SeqCst)
    }

    pub fn live_calls(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

impl<S: RateSource> RateSource for CountingRates<S> {
    fn canonical_rate(&self, base: &AssetId, quote: &AssetId) -> RateQuote {
        self.canonical.fetch_add(1, Ordering::SeqCst);
        self.inner.canonical_rate(base, quote)
    }

    fn live_rate(&self, base: &AssetId, quote: &AssetId) -> RateQuote {
        self.live.fetch_add(1, Ordering::SeqCst);
        self.inner.live_rate(base, quote)
    }
}

/// Decomposer whose state is corrupt: every call fails.
pub struct FailingDecomposer;

impl DerivativeDecomposer for FailingDecomposer {
    fn family(&self) -> &str {
        "broken"
    }

    fn underlying_amounts(
        &self,
        derivative: &AssetId,
        _amount: Amount,
    ) -> Result<Vec<DecompositionLeg>, DecomposeError> {
        Err(DecomposeError::Malformed {
            derivative: derivative.clone(),
            reason: "corrupt state".to_string(),
        })
    }
}

/// Builds a registry and rate table. Rates and units are raw integers.
#[derive(Default)]
pub struct Fixture {
    primitives: Vec<Asset>,
    derivatives: Vec<(Asset, &'static str)>,
    exchange_rate: ExchangeRateDecomposer,
    basket: BasketDecomposer,
    pool_share: PoolShareDecomposer,
    rates: RateTable,
}

impl Fixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn primitive(mut self, asset: &str, decimals: u8) -> Self {
        self.primitives.push(Asset::new(asset, decimals));
        self
    }

    /// Same rate in both regimes.
    pub fn rate(mut self, base: &str, quote: &str, raw: u128) -> Self {
        self.rates.set_rate(id(base), id(quote), Rate::from_u128(raw));
        self
    }

    pub fn canonical_rate(mut self, base: &str, quote: &str, raw: u128) -> Self {
        self.rates
            .set_canonical_rate(id(base), id(quote), Rate::from_u128(raw));
        self
    }

    pub fn live_rate(mut self, base: &str, quote: &str, raw: u128) -> Self {
        self.rates.set_live_rate(id(base), id(quote), Rate::from_u128(raw));
        self
    }

    pub fn wrapped(mut self, asset: &str, decimals: u8, underlying: &str, raw_rate: u128) -> Self {
        let derivative = Asset::new(asset, decimals);
        self.exchange_rate
            .insert(derivative.clone(), id(underlying), Rate::from_u128(raw_rate));
        self.derivatives.push((derivative, "exchange_rate"));
        self
    }

    pub fn basket(mut self, asset: &str, decimals: u8, components: &[(&str, u128)]) -> Self {
        let derivative = Asset::new(asset, decimals);
        let components = components
            .iter()
            .map(|(underlying, units)| BasketComponent::new(*underlying, Rate::from_u128(*units)))
            .collect();
        self.basket.insert(derivative.clone(), components);
        self.derivatives.push((derivative, "basket"));
        self
    }

    pub fn pool(mut self, asset: &str, decimals: u8, state: PoolState) -> Self {
        self.pool_share.set_pool(id(asset), state);
        self.derivatives.push((Asset::new(asset, decimals), "pool_share"));
        self
    }

    pub fn broken(mut self, asset: &str) -> Self {
        self.derivatives.push((Asset::new(asset, 18), "broken"));
        self
    }

    pub fn build(self) -> (InMemoryRegistry, RateTable) {
        let mut registry = InMemoryRegistry::new();
        registry
            .add_decomposer(DecomposerId::new("exchange_rate"), self.exchange_rate)
            .unwrap();
        registry
            .add_decomposer(DecomposerId::new("basket"), self.basket)
            .unwrap();
        registry
            .add_decomposer(DecomposerId::new("pool_share"), self.pool_share)
            .unwrap();
        registry
            .add_decomposer(DecomposerId::new("broken"), FailingDecomposer)
            .unwrap();

        for asset in self.primitives {
            registry.add_primitive(asset).unwrap();
        }
        for (asset, family) in self.derivatives {
            registry
                .add_derivative(asset, DecomposerId::new(family))
                .unwrap();
        }
        (registry, self.rates)
    }

    pub fn engine(self) -> ValuationEngine<InMemoryRegistry, RateTable> {
        self.engine_with(EngineConfig::default())
    }

    pub fn engine_with(self, config: EngineConfig) -> ValuationEngine<InMemoryRegistry, RateTable> {
        let (registry, rates) = self.build();
        ValuationEngine::new(registry, rates, config)
    }

    pub fn counting_engine(
        self,
    ) -> ValuationEngine<InMemoryRegistry, CountingRates<RateTable>> {
        let (registry, rates) = self.build();
        ValuationEngine::new(registry, CountingRates::new(rates), EngineConfig::default())
    }
}
