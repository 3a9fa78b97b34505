// 6.0.2: hard failures. soft invalidity is data (Valuation::is_valid), these abort the call.

use crate::decomposer::DecomposeError;
use crate::types::AssetId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValuationError {
    #[error("{family} decomposer failed on {derivative}: {source}")]
    Decomposition {
        derivative: AssetId,
        family: String,
        #[source]
        source: DecomposeError,
    },

    #[error("{0} decomposes into itself")]
    SelfReferential(AssetId),

    #[error("max derivative depth {max_depth} exceeded at {asset}")]
    DepthExceeded { asset: AssetId, max_depth: usize },

    #[error("step budget of {max_steps} exhausted at {asset}")]
    StepBudgetExhausted { asset: AssetId, max_steps: usize },

    #[error("arithmetic overflow valuing {0}")]
    Overflow(AssetId),

    #[error("{asset} has unsupported decimals {decimals}")]
    InvalidDecimals { asset: AssetId, decimals: u8 },

    #[error("quote asset {0} is not a registered primitive")]
    UnsupportedQuoteAsset(AssetId),
}
