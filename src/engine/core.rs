// 6.1 engine/core.rs: the engine struct and its public valuation operations.

use super::config::EngineConfig;
use super::resolve::Budget;
use super::results::ValuationError;
use crate::rate_source::RateSource;
use crate::registry::{AssetRegistry, Classification};
use crate::types::{Amount, AssetId, Holding, Regime, Valuation};
use tracing::{debug, debug_span};

/** 6.1: the engine. owns (or borrows, via the blanket impls) its read-only collaborators */
#[derive(Debug, Clone)]
pub struct ValuationEngine<R, S> {
    pub(super) registry: R,
    pub(super) rates: S,
    pub(super) config: EngineConfig,
}

impl<R, S> ValuationEngine<R, S> {
    pub fn new(registry: R, rates: S, config: EngineConfig) -> Self {
        Self {
            registry,
            rates,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn rates(&self) -> &S {
        &self.rates
    }

    pub fn into_parts(self) -> (R, S, EngineConfig) {
        (self.registry, self.rates, self.config)
    }
}

impl<R: AssetRegistry, S: RateSource> ValuationEngine<R, S> {
    /// Value `amount` of `base` in `quote` using canonical rates at every depth.
    pub fn calc_canonical_asset_value(
        &self,
        base: &AssetId,
        amount: Amount,
        quote: &AssetId,
    ) -> Result<Valuation, ValuationError> {
        self.calc_asset_value(base, amount, quote, Regime::Canonical)
    }

    /// Value `amount` of `base` in `quote` using live rates at every depth.
    pub fn calc_live_asset_value(
        &self,
        base: &AssetId,
        amount: Amount,
        quote: &AssetId,
    ) -> Result<Valuation, ValuationError> {
        self.calc_asset_value(base, amount, quote, Regime::Live)
    }

    pub fn calc_asset_value(
        &self,
        base: &AssetId,
        amount: Amount,
        quote: &AssetId,
        regime: Regime,
    ) -> Result<Valuation, ValuationError> {
        let _span = debug_span!("valuation", %base, %quote, %regime).entered();

        let mut budget = Budget::new(self.config.max_steps);
        let valuation = self.resolve(base, amount, quote, regime, 0, &mut budget)?;

        debug!(%amount, value = %valuation.value, is_valid = valuation.is_valid, steps = budget.used(), "resolved");
        Ok(valuation)
    }

    pub fn calc_canonical_assets_total_value(
        &self,
        holdings: &[Holding],
        quote: &AssetId,
    ) -> Result<Valuation, ValuationError> {
        self.calc_assets_total_value(holdings, quote, Regime::Canonical)
    }

    pub fn calc_live_assets_total_value(
        &self,
        holdings: &[Holding],
        quote: &AssetId,
    ) -> Result<Valuation, ValuationError> {
        self.calc_assets_total_value(holdings, quote, Regime::Live)
    }

    // totals are only meaningful in a directly priced denomination
    pub fn calc_assets_total_value(
        &self,
        holdings: &[Holding],
        quote: &AssetId,
        regime: Regime,
    ) -> Result<Valuation, ValuationError> {
        let _span = debug_span!("total_valuation", %quote, %regime, holdings = holdings.len()).entered();

        if !matches!(self.registry.classify(quote), Classification::Primitive { .. }) {
            return Err(ValuationError::UnsupportedQuoteAsset(quote.clone()));
        }

        // one budget for the whole call
        let mut budget = Budget::new(self.config.max_steps);
        let mut total = Valuation::worthless();
        for holding in holdings {
            let valuation =
                self.resolve(&holding.asset, holding.amount, quote, regime, 0, &mut budget)?;
            total = total
                .checked_combine(&valuation)
                .ok_or_else(|| ValuationError::Overflow(holding.asset.clone()))?;
        }

        debug!(value = %total.value, is_valid = total.is_valid, steps = budget.used(), "resolved total");
        Ok(total)
    }
}
