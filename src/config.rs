// 7.0 config.rs: a whole valuation snapshot in one serde document. engine budgets, rate
// table settings, primitives, rates and derivatives by family.
// 7.1 human rates and units are decimals, scaled exactly to the target asset's decimals.

use primitive_types::U256;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::decomposer::{
    BasketComponent, BasketDecomposer, DecompositionLeg, ExchangeRateDecomposer, PoolShareDecomposer,
    PoolState,
};
use crate::engine::{EngineConfig, ValuationEngine};
use crate::fixed_point::decimal_to_scaled;
use crate::rate_source::RateTable;
use crate::registry::{DecomposerId, InMemoryRegistry, RegistryError};
use crate::types::{Amount, Asset, AssetId, Rate, Timestamp};

pub const EXCHANGE_RATE_FAMILY: &str = "exchange_rate";
pub const BASKET_FAMILY: &str = "basket";
pub const POOL_SHARE_FAMILY: &str = "pool_share";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid snapshot json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("registry rejected snapshot: {0}")]
    Registry(#[from] RegistryError),

    #[error("{0} is referenced but not declared")]
    UnknownAsset(AssetId),

    #[error("{value} is not representable at {decimals} decimals (for {asset})")]
    Unrepresentable {
        asset: AssetId,
        value: Decimal,
        decimals: u8,
    },
}

// A directly priced asset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrimitiveConfig {
    pub id: AssetId,
    pub decimals: u8,
}

// Rate of one whole `base` in whole `quote` units
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateConfig {
    pub base: AssetId,
    pub quote: AssetId,
    pub canonical: Decimal,
    // Falls back to the canonical rate when absent
    #[serde(default)]
    pub live: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentConfig {
    pub asset: AssetId,
    // Whole underlying units per whole derivative
    pub units: Decimal,
}

// One derivative, tagged by family
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum DerivativeConfig {
    ExchangeRate {
        id: AssetId,
        decimals: u8,
        underlying: AssetId,
        // Whole underlying per whole derivative
        rate: Decimal,
    },
    Basket {
        id: AssetId,
        decimals: u8,
        components: Vec<ComponentConfig>,
    },
    PoolShare {
        id: AssetId,
        decimals: u8,
        // Raw share supply and raw reserves, in smallest units
        total_supply: Amount,
        reserves: Vec<DecompositionLeg>,
    },
}

impl DerivativeConfig {
    pub fn asset(&self) -> Asset {
        match self {
            DerivativeConfig::ExchangeRate { id, decimals, .. }
            | DerivativeConfig::Basket { id, decimals, .. }
            | DerivativeConfig::PoolShare { id, decimals, .. } => Asset {
                id: id.clone(),
                decimals: *decimals,
            },
        }
    }

    pub fn family(&self) -> &'static str {
        match self {
            DerivativeConfig::ExchangeRate { .. } => EXCHANGE_RATE_FAMILY,
            DerivativeConfig::Basket { .. } => BASKET_FAMILY,
            DerivativeConfig::PoolShare { .. } => POOL_SHARE_FAMILY,
        }
    }
}

// Rate table settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RateTableConfig {
    // Rates older than this read invalid
    #[serde(default)]
    pub max_age_ms: Option<i64>,
    // Time the rates were posted; wall clock when absent
    #[serde(default)]
    pub as_of_ms: Option<i64>,
}

// The complete snapshot configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub rate_table: RateTableConfig,
    pub primitives: Vec<PrimitiveConfig>,
    #[serde(default)]
    pub rates: Vec<RateConfig>,
    #[serde(default)]
    pub derivatives: Vec<DerivativeConfig>,
}

impl SnapshotConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded snapshot");
        Self::from_json_str(&json)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn build_engine(&self) -> Result<ValuationEngine<InMemoryRegistry, RateTable>, ConfigError> {
        let registry = self.build_registry()?;
        let rates = self.build_rate_table()?;
        Ok(ValuationEngine::new(registry, rates, self.engine))
    }

    pub fn build_registry(&self) -> Result<InMemoryRegistry, ConfigError> {
        let decimals = self.decimals_by_asset();
        let mut exchange_rate = ExchangeRateDecomposer::new();
        let mut basket = BasketDecomposer::new();
        let mut pool_share = PoolShareDecomposer::new();

        for derivative in &self.derivatives {
            match derivative {
                DerivativeConfig::ExchangeRate {
                    underlying, rate, ..
                } => {
                    let rate = scale_to(&decimals, underlying, *rate)?;
                    exchange_rate.insert(derivative.asset(), underlying.clone(), Rate::from_raw(rate));
                }
                DerivativeConfig::Basket { components, .. } => {
                    let components = components
                        .iter()
                        .map(|component| {
                            let units = scale_to(&decimals, &component.asset, component.units)?;
                            Ok(BasketComponent {
                                asset: component.asset.clone(),
                                units: Rate::from_raw(units),
                            })
                        })
                        .collect::<Result<Vec<_>, ConfigError>>()?;
                    basket.insert(derivative.asset(), components);
                }
                DerivativeConfig::PoolShare {
                    id,
                    total_supply,
                    reserves,
                    ..
                } => {
                    pool_share.set_pool(
                        id.clone(),
                        PoolState {
                            total_supply: *total_supply,
                            reserves: reserves.clone(),
                        },
                    );
                }
            }
        }

        let mut registry = InMemoryRegistry::new();
        registry.add_decomposer(DecomposerId::new(EXCHANGE_RATE_FAMILY), exchange_rate)?;
        registry.add_decomposer(DecomposerId::new(BASKET_FAMILY), basket)?;
        registry.add_decomposer(DecomposerId::new(POOL_SHARE_FAMILY), pool_share)?;

        for primitive in &self.primitives {
            registry.add_primitive(Asset {
                id: primitive.id.clone(),
                decimals: primitive.decimals,
            })?;
        }
        for derivative in &self.derivatives {
            registry.add_derivative(derivative.asset(), DecomposerId::new(derivative.family()))?;
        }

        debug!(assets = registry.len(), "built registry");
        Ok(registry)
    }

    pub fn build_rate_table(&self) -> Result<RateTable, ConfigError> {
        let decimals = self.decimals_by_asset();
        let mut table = RateTable::new();
        if let Some(max_age_ms) = self.rate_table.max_age_ms {
            table = table.with_max_age(max_age_ms);
        }
        let as_of = self
            .rate_table
            .as_of_ms
            .map(Timestamp::from_millis)
            .unwrap_or_else(Timestamp::now);
        table.set_time(as_of);

        for rate in &self.rates {
            // rates land in the quote's smallest unit per whole base
            let canonical = scale_to(&decimals, &rate.quote, rate.canonical)?;
            let live = match rate.live {
                Some(live) => scale_to(&decimals, &rate.quote, live)?,
                None => canonical,
            };
            table.set_canonical_rate(rate.base.clone(), rate.quote.clone(), Rate::from_raw(canonical));
            table.set_live_rate(rate.base.clone(), rate.quote.clone(), Rate::from_raw(live));
        }

        Ok(table)
    }

    fn decimals_by_asset(&self) -> HashMap<AssetId, u8> {
        self.primitives
            .iter()
            .map(|p| (p.id.clone(), p.decimals))
            .chain(self.derivatives.iter().map(|d| {
                let asset = d.asset();
                (asset.id, asset.decimals)
            }))
            .collect()
    }

    // Demo preset: a USD denominated book with wrapped tokens, an index, an LP and a vault.
    pub fn demo() -> Self {
        let dec = |mantissa: i64, scale: u32| Decimal::new(mantissa, scale);
        let id = |s: &str| AssetId::from(s);

        Self {
            engine: EngineConfig::default(),
            rate_table: RateTableConfig::default(),
            primitives: vec![
                PrimitiveConfig { id: id("USD"), decimals: 18 },
                PrimitiveConfig { id: id("WETH"), decimals: 18 },
                PrimitiveConfig { id: id("USDC"), decimals: 6 },
                PrimitiveConfig { id: id("WBTC"), decimals: 8 },
            ],
            rates: vec![
                RateConfig { base: id("WETH"), quote: id("USD"), canonical: dec(2000, 0), live: Some(dec(20125, 1)) },
                RateConfig { base: id("USDC"), quote: id("USD"), canonical: dec(1, 0), live: Some(dec(9998, 4)) },
                RateConfig { base: id("WBTC"), quote: id("USD"), canonical: dec(60000, 0), live: Some(dec(60150, 0)) },
            ],
            derivatives: vec![
                DerivativeConfig::ExchangeRate {
                    id: id("cWETH"),
                    decimals: 8,
                    underlying: id("WETH"),
                    rate: dec(2, 2), // 0.02
                },
                DerivativeConfig::ExchangeRate {
                    id: id("cUSDC"),
                    decimals: 8,
                    underlying: id("USDC"),
                    rate: dec(231, 4), // 0.0231
                },
                DerivativeConfig::Basket {
                    id: id("DEFI-IDX"),
                    decimals: 18,
                    components: vec![
                        ComponentConfig { asset: id("WETH"), units: dec(5, 1) },
                        ComponentConfig { asset: id("WBTC"), units: dec(1, 2) },
                        ComponentConfig { asset: id("cUSDC"), units: dec(1000, 0) },
                    ],
                },
                DerivativeConfig::PoolShare {
                    id: id("WETH-USDC-LP"),
                    decimals: 18,
                    total_supply: Amount::from_u128(1_000 * 10u128.pow(18)),
                    reserves: vec![
                        DecompositionLeg::new("WETH", Amount::from_u128(500 * 10u128.pow(18))),
                        DecompositionLeg::new("USDC", Amount::from_u128(1_000_000 * 10u128.pow(6))),
                    ],
                },
                DerivativeConfig::ExchangeRate {
                    id: id("LP-VAULT"),
                    decimals: 18,
                    underlying: id("WETH-USDC-LP"),
                    rate: dec(105, 2), // 1.05
                },
            ],
        }
    }

    // Tight budgets for fail fast environments
    pub fn with_budget(mut self, max_depth: usize, max_steps: usize) -> Self {
        self.engine = EngineConfig {
            max_depth,
            max_steps,
        };
        self
    }
}

fn scale_to(
    decimals: &HashMap<AssetId, u8>,
    asset: &AssetId,
    value: Decimal,
) -> Result<U256, ConfigError> {
    let decimals = *decimals
        .get(asset)
        .ok_or_else(|| ConfigError::UnknownAsset(asset.clone()))?;
    decimal_to_scaled(value, decimals).ok_or_else(|| ConfigError::Unrepresentable {
        asset: asset.clone(),
        value,
        decimals,
    })
}
