// valuation-core: asset valuation engine.
// values an amount of a base asset in a quote asset, recursing through derivatives
// into primitives. fixed point integers only; deterministic with no external I/O.
//
// file map (search X.0 for structs, X.1+ for logic):
//   1.x  types.rs: primitives: AssetId, Asset, Amount, Rate, Regime, Valuation
//   2.x  fixed_point.rs: pow10, mul_div_floor, exact decimal scaling
//   3.x  registry.rs: classification, AssetRegistry trait, in-memory registry
//   4.x  rate_source.rs: RateSource trait, in-memory rate table
//   5.x  decomposer.rs: DerivativeDecomposer trait and the three families
//   6.x  engine/: valuation engine, recursion, budgets, hard failures
//   7.x  config.rs: snapshot config, presets, builders
//   10.x log.rs: tracing subscriber for binaries

pub mod decomposer;
pub mod engine;
pub mod fixed_point;
pub mod rate_source;
pub mod registry;
pub mod types;

pub mod config;
pub mod log;

// re exports for convenience
pub use decomposer::*;
pub use engine::*;
pub use rate_source::*;
pub use registry::*;
pub use types::*;
pub use config::{ConfigError, SnapshotConfig};
pub use fixed_point::{RATE_DECIMALS, MAX_DECIMALS};
