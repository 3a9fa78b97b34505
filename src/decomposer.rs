// 5.0: derivative decomposition. a decomposer expresses an amount of a derivative as
// amounts of its underlyings. one implementation per derivative family, each serving
// every derivative of that family keyed by asset id.
// 5.1 ExchangeRateDecomposer: single underlying at a stored rate (wrapped/interest bearing)
// 5.2 BasketDecomposer: fixed units of several underlyings (index tokens)
// 5.3 PoolShareDecomposer: pro rata claim on pool reserves (LP shares)

use crate::fixed_point::mul_div_floor;
use crate::types::{Amount, Asset, AssetId, Rate};
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecompositionLeg {
    pub asset: AssetId,
    pub amount: Amount,
}

impl DecompositionLeg {
    pub fn new(asset: impl Into<String>, amount: Amount) -> Self {
        Self {
            asset: AssetId::new(asset),
            amount,
        }
    }
}

/// Malformed input or state inside a decomposer. Always fatal to the valuation call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecomposeError {
    #[error("{0} is not handled by this decomposer")]
    UnknownDerivative(AssetId),

    #[error("pool {0} has no supply")]
    EmptyPool(AssetId),

    #[error("amount {amount} of {derivative} exceeds total supply {total_supply}")]
    SupplyExceeded {
        derivative: AssetId,
        amount: Amount,
        total_supply: Amount,
    },

    #[error("arithmetic overflow decomposing {0}")]
    Overflow(AssetId),

    #[error("malformed decomposition of {derivative}: {reason}")]
    Malformed { derivative: AssetId, reason: String },
}

/// Per-family decomposition logic.
///
/// `Ok(vec![])` is a legitimate answer ("currently worth nothing"). `Err` means the input
/// or the decomposer's own state is broken and the caller must abort.
pub trait DerivativeDecomposer: Send + Sync {
    /// Family name for diagnostics.
    fn family(&self) -> &str;

    fn underlying_amounts(
        &self,
        derivative: &AssetId,
        amount: Amount,
    ) -> Result<Vec<DecompositionLeg>, DecomposeError>;

    /// Decimals the decomposer scales `derivative` by, for families that keep their own
    /// copy. Must agree with the registry; `InMemoryRegistry` checks it on registration.
    fn derivative_decimals(&self, _derivative: &AssetId) -> Option<u8> {
        None
    }
}

// floor(amount * per_unit / unit), shared by the rate-based families
fn scale_leg(
    derivative: &AssetId,
    amount: Amount,
    per_unit: Rate,
    unit: U256,
) -> Result<Amount, DecomposeError> {
    mul_div_floor(amount.raw(), per_unit.raw(), unit)
        .map(Amount::new)
        .ok_or_else(|| DecomposeError::Overflow(derivative.clone()))
}

fn unit_of(derivative: &Asset) -> Result<U256, DecomposeError> {
    derivative.unit().ok_or_else(|| DecomposeError::Malformed {
        derivative: derivative.id.clone(),
        reason: format!("decimals {} out of range", derivative.decimals),
    })
}

// 5.1: wrapped or interest bearing tokens. rate = underlying units per whole derivative.
#[derive(Debug, Clone)]
struct ExchangeRateEntry {
    derivative: Asset,
    underlying: AssetId,
    rate: Rate,
}

#[derive(Debug, Clone, Default)]
pub struct ExchangeRateDecomposer {
    entries: HashMap<AssetId, ExchangeRateEntry>,
}

impl ExchangeRateDecomposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, derivative: Asset, underlying: impl Into<String>, rate: Rate) -> Self {
        self.insert(derivative, AssetId::new(underlying), rate);
        self
    }

    pub fn insert(&mut self, derivative: Asset, underlying: AssetId, rate: Rate) {
        self.entries.insert(
            derivative.id.clone(),
            ExchangeRateEntry {
                derivative,
                underlying,
                rate,
            },
        );
    }

    /// Accrue or rebase: returns false if the derivative is unknown.
    pub fn set_rate(&mut self, derivative: &AssetId, rate: Rate) -> bool {
        match self.entries.get_mut(derivative) {
            Some(entry) => {
                entry.rate = rate;
                true
            }
            None => false,
        }
    }
}

impl DerivativeDecomposer for ExchangeRateDecomposer {
    fn family(&self) -> &str {
        "exchange_rate"
    }

    fn underlying_amounts(
        &self,
        derivative: &AssetId,
        amount: Amount,
    ) -> Result<Vec<DecompositionLeg>, DecomposeError> {
        let entry = self
            .entries
            .get(derivative)
            .ok_or_else(|| DecomposeError::UnknownDerivative(derivative.clone()))?;

        let unit = unit_of(&entry.derivative)?;
        let underlying_amount = scale_leg(derivative, amount, entry.rate, unit)?;

        Ok(vec![DecompositionLeg {
            asset: entry.underlying.clone(),
            amount: underlying_amount,
        }])
    }

    fn derivative_decimals(&self, derivative: &AssetId) -> Option<u8> {
        self.entries.get(derivative).map(|entry| entry.derivative.decimals)
    }
}

// 5.2: index baskets. each component holds fixed underlying units per whole derivative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasketComponent {
    pub asset: AssetId,
    pub units: Rate,
}

impl BasketComponent {
    pub fn new(asset: impl Into<String>, units: Rate) -> Self {
        Self {
            asset: AssetId::new(asset),
            units,
        }
    }
}

#[derive(Debug, Clone)]
struct Basket {
    derivative: Asset,
    components: Vec<BasketComponent>,
}

#[derive(Debug, Clone, Default)]
pub struct BasketDecomposer {
    baskets: HashMap<AssetId, Basket>,
}

impl BasketDecomposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, derivative: Asset, components: Vec<BasketComponent>) -> Self {
        self.insert(derivative, components);
        self
    }

    pub fn insert(&mut self, derivative: Asset, components: Vec<BasketComponent>) {
        self.baskets.insert(
            derivative.id.clone(),
            Basket {
                derivative,
                components,
            },
        );
    }
}

impl DerivativeDecomposer for BasketDecomposer {
    fn family(&self) -> &str {
        "basket"
    }

    fn underlying_amounts(
        &self,
        derivative: &AssetId,
        amount: Amount,
    ) -> Result<Vec<DecompositionLeg>, DecomposeError> {
        let basket = self
            .baskets
            .get(derivative)
            .ok_or_else(|| DecomposeError::UnknownDerivative(derivative.clone()))?;

        let unit = unit_of(&basket.derivative)?;
        basket
            .components
            .iter()
            .map(|component| {
                Ok(DecompositionLeg {
                    asset: component.asset.clone(),
                    amount: scale_leg(derivative, amount, component.units, unit)?,
                })
            })
            .collect()
    }

    fn derivative_decimals(&self, derivative: &AssetId) -> Option<u8> {
        self.baskets.get(derivative).map(|basket| basket.derivative.decimals)
    }
}

// 5.3: pool shares. holding `amount` of `total_supply` claims that fraction of every reserve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolState {
    pub total_supply: Amount,
    pub reserves: Vec<DecompositionLeg>,
}

#[derive(Debug, Clone, Default)]
pub struct PoolShareDecomposer {
    pools: HashMap<AssetId, PoolState>,
}

impl PoolShareDecomposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, share: impl Into<String>, state: PoolState) -> Self {
        self.set_pool(AssetId::new(share), state);
        self
    }

    pub fn set_pool(&mut self, share: AssetId, state: PoolState) {
        self.pools.insert(share, state);
    }
}

impl DerivativeDecomposer for PoolShareDecomposer {
    fn family(&self) -> &str {
        "pool_share"
    }

    fn underlying_amounts(
        &self,
        derivative: &AssetId,
        amount: Amount,
    ) -> Result<Vec<DecompositionLeg>, DecomposeError> {
        let pool = self
            .pools
            .get(derivative)
            .ok_or_else(|| DecomposeError::UnknownDerivative(derivative.clone()))?;

        if pool.total_supply.is_zero() {
            if amount.is_zero() {
                return Ok(Vec::new());
            }
            return Err(DecomposeError::EmptyPool(derivative.clone()));
        }

        if amount > pool.total_supply {
            return Err(DecomposeError::SupplyExceeded {
                derivative: derivative.clone(),
                amount,
                total_supply: pool.total_supply,
            });
        }

        pool.reserves
            .iter()
            .map(|reserve| {
                let share = mul_div_floor(
                    amount.raw(),
                    reserve.amount.raw(),
                    pool.total_supply.raw(),
                )
                .ok_or_else(|| DecomposeError::Overflow(derivative.clone()))?;
                Ok(DecompositionLeg {
                    asset: reserve.asset.clone(),
                    amount: Amount::new(share),
                })
            })
            .collect()
    }
}
