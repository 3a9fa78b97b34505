// 6.0: valuation engine. classifies the base asset, prices primitives off the rate source
// and recurses through decomposers for derivatives, summing per leg.
// synchronous and side effect free; collaborators are read-only handles.

mod config;
mod core;
mod resolve;
mod results;

pub use config::EngineConfig;
pub use core::ValuationEngine;
pub use results::ValuationError;
