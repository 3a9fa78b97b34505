//! Recursive resolution.
//!
//! Every node spends one step; every derivative leg goes one level deeper. Values are
//! floored per hop and summed per leg, so a tree's value is the sum of independently
//! truncated leaves, never a single combined-rate product. All legs are visited even
//! after one turns invalid.

use super::core::ValuationEngine;
use super::results::ValuationError;
use crate::decomposer::DerivativeDecomposer;
use crate::fixed_point::{mul_div_floor, pow10};
use crate::rate_source::RateSource;
use crate::registry::{AssetRegistry, Classification};
use crate::types::{Amount, AssetId, Regime, Valuation};
use tracing::{debug, trace};

/// Step counter shared by every node of one call.
#[derive(Debug)]
pub(super) struct Budget {
    remaining: usize,
    used: usize,
}

impl Budget {
    pub(super) fn new(max_steps: usize) -> Self {
        Self {
            remaining: max_steps,
            used: 0,
        }
    }

    pub(super) fn used(&self) -> usize {
        self.used
    }

    fn spend(&mut self, asset: &AssetId, max_steps: usize) -> Result<(), ValuationError> {
        if self.remaining == 0 {
            debug!(%asset, max_steps, "step budget exhausted");
            return Err(ValuationError::StepBudgetExhausted {
                asset: asset.clone(),
                max_steps,
            });
        }
        self.remaining -= 1;
        self.used += 1;
        Ok(())
    }
}

impl<R: AssetRegistry, S: RateSource> ValuationEngine<R, S> {
    pub(super) fn resolve(
        &self,
        base: &AssetId,
        amount: Amount,
        quote: &AssetId,
        regime: Regime,
        depth: usize,
        budget: &mut Budget,
    ) -> Result<Valuation, ValuationError> {
        if depth > self.config.max_depth {
            debug!(asset = %base, depth, "max depth exceeded");
            return Err(ValuationError::DepthExceeded {
                asset: base.clone(),
                max_depth: self.config.max_depth,
            });
        }
        budget.spend(base, self.config.max_steps)?;

        match self.registry.classify(base) {
            Classification::Unregistered => {
                debug!(asset = %base, depth, "unregistered asset");
                Ok(Valuation::invalid())
            }
            // identity, once we know the base is real
            _ if base == quote => Ok(Valuation::valid(amount)),
            Classification::Primitive { decimals } => {
                self.value_primitive(base, decimals, amount, quote, regime)
            }
            Classification::Derivative(decomposer) => {
                self.value_derivative(decomposer, base, amount, quote, regime, depth, budget)
            }
        }
    }

    fn value_primitive(
        &self,
        base: &AssetId,
        decimals: u8,
        amount: Amount,
        quote: &AssetId,
        regime: Regime,
    ) -> Result<Valuation, ValuationError> {
        let quoted = self.rates.rate(regime, base, quote);
        if !quoted.is_valid {
            debug!(%base, %quote, %regime, "invalid rate");
            return Ok(Valuation::invalid());
        }

        let unit = pow10(decimals).ok_or_else(|| ValuationError::InvalidDecimals {
            asset: base.clone(),
            decimals,
        })?;
        let value = mul_div_floor(amount.raw(), quoted.rate.raw(), unit)
            .ok_or_else(|| ValuationError::Overflow(base.clone()))?;

        trace!(%base, %amount, rate = %quoted.rate, %value, "primitive");
        Ok(Valuation::valid(Amount::new(value)))
    }

    #[allow(clippy::too_many_arguments)]
    fn value_derivative(
        &self,
        decomposer: &dyn DerivativeDecomposer,
        base: &AssetId,
        amount: Amount,
        quote: &AssetId,
        regime: Regime,
        depth: usize,
        budget: &mut Budget,
    ) -> Result<Valuation, ValuationError> {
        let legs = decomposer
            .underlying_amounts(base, amount)
            .map_err(|source| ValuationError::Decomposition {
                derivative: base.clone(),
                family: decomposer.family().to_string(),
                source,
            })?;

        if legs.iter().any(|leg| &leg.asset == base) {
            return Err(ValuationError::SelfReferential(base.clone()));
        }

        trace!(%base, %amount, family = decomposer.family(), legs = legs.len(), "decomposed");

        let mut total = Valuation::worthless();
        for leg in &legs {
            let leg_value = self.resolve(&leg.asset, leg.amount, quote, regime, depth + 1, budget)?;
            total = total
                .checked_combine(&leg_value)
                .ok_or_else(|| ValuationError::Overflow(base.clone()))?;
        }

        Ok(total)
    }
}
