//! Asset classification.
//!
//! The registry answers one question for the engine: what is this asset? Unregistered,
//! a primitive priced straight off a rate source, or a derivative handed to the
//! decomposer its entry points at. Registration itself is governance and lives outside
//! the engine; `InMemoryRegistry` is the snapshot the engine reads.

use crate::decomposer::DerivativeDecomposer;
use crate::fixed_point::MAX_DECIMALS;
use crate::types::{Asset, AssetId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Key of a registered decomposer family.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DecomposerId(pub String);

impl DecomposerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for DecomposerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// Role of an asset in the valuation graph.
pub enum Classification<'a> {
    Unregistered,
    Primitive { decimals: u8 },
    Derivative(&'a dyn DerivativeDecomposer),
}

impl fmt::Debug for Classification<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Unregistered => f.write_str("Unregistered"),
            Classification::Primitive { decimals } => f
                .debug_struct("Primitive")
                .field("decimals", decimals)
                .finish(),
            Classification::Derivative(decomposer) => f
                .debug_tuple("Derivative")
                .field(&decomposer.family())
                .finish(),
        }
    }
}

/// Read-only lookup of asset roles.
pub trait AssetRegistry {
    fn classify(&self, asset: &AssetId) -> Classification<'_>;
}

impl<T: AssetRegistry + ?Sized> AssetRegistry for &T {
    fn classify(&self, asset: &AssetId) -> Classification<'_> {
        (**self).classify(asset)
    }
}

impl<T: AssetRegistry + ?Sized> AssetRegistry for Arc<T> {
    fn classify(&self, asset: &AssetId) -> Classification<'_> {
        (**self).classify(asset)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("asset {0} is already registered")]
    AlreadyRegistered(AssetId),

    #[error("decomposer {0} is already registered")]
    DuplicateDecomposer(DecomposerId),

    #[error("decomposer {0} is not registered")]
    UnknownDecomposer(DecomposerId),

    #[error("asset {asset} has {decimals} decimals, max is {max}")]
    DecimalsOutOfRange { asset: AssetId, decimals: u8, max: u8 },

    #[error("asset {asset} registered with {registered} decimals but its decomposer scales by {decomposer}")]
    DecimalsMismatch {
        asset: AssetId,
        registered: u8,
        decomposer: u8,
    },
}

#[derive(Debug, Clone)]
enum Entry {
    Primitive(Asset),
    Derivative {
        asset: Asset,
        decomposer: DecomposerId,
    },
}

impl Entry {
    fn asset(&self) -> &Asset {
        match self {
            Entry::Primitive(asset) => asset,
            Entry::Derivative { asset, .. } => asset,
        }
    }
}

/// In-memory registry snapshot. Each derivative stores the id of its family's decomposer.
#[derive(Default)]
pub struct InMemoryRegistry {
    assets: HashMap<AssetId, Entry>,
    decomposers: HashMap<DecomposerId, Box<dyn DerivativeDecomposer>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_decomposer(
        &mut self,
        id: DecomposerId,
        decomposer: impl DerivativeDecomposer + 'static,
    ) -> Result<(), RegistryError> {
        if self.decomposers.contains_key(&id) {
            return Err(RegistryError::DuplicateDecomposer(id));
        }
        self.decomposers.insert(id, Box::new(decomposer));
        Ok(())
    }

    pub fn add_primitive(&mut self, asset: Asset) -> Result<(), RegistryError> {
        self.check_new(&asset)?;
        self.assets.insert(asset.id.clone(), Entry::Primitive(asset));
        Ok(())
    }

    pub fn add_derivative(
        &mut self,
        asset: Asset,
        decomposer: DecomposerId,
    ) -> Result<(), RegistryError> {
        self.check_new(&asset)?;
        let Some(family) = self.decomposers.get(&decomposer) else {
            return Err(RegistryError::UnknownDecomposer(decomposer));
        };
        // the decomposer floors at its own scale; it has to be the one we report
        if let Some(scaled_at) = family.derivative_decimals(&asset.id) {
            if scaled_at != asset.decimals {
                return Err(RegistryError::DecimalsMismatch {
                    asset: asset.id.clone(),
                    registered: asset.decimals,
                    decomposer: scaled_at,
                });
            }
        }
        self.assets
            .insert(asset.id.clone(), Entry::Derivative { asset, decomposer });
        Ok(())
    }

    /// Deregister an asset. Anything still decomposing into it turns invalid.
    pub fn remove_asset(&mut self, id: &AssetId) -> bool {
        self.assets.remove(id).is_some()
    }

    pub fn asset(&self, id: &AssetId) -> Option<&Asset> {
        self.assets.get(id).map(Entry::asset)
    }

    pub fn contains(&self, id: &AssetId) -> bool {
        self.assets.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    fn check_new(&self, asset: &Asset) -> Result<(), RegistryError> {
        if asset.decimals > MAX_DECIMALS {
            return Err(RegistryError::DecimalsOutOfRange {
                asset: asset.id.clone(),
                decimals: asset.decimals,
                max: MAX_DECIMALS,
            });
        }
        if self.assets.contains_key(&asset.id) {
            return Err(RegistryError::AlreadyRegistered(asset.id.clone()));
        }
        Ok(())
    }
}

impl fmt::Debug for InMemoryRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryRegistry")
            .field("assets", &self.assets)
            .field("decomposers", &self.decomposers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl AssetRegistry for InMemoryRegistry {
    fn classify(&self, asset: &AssetId) -> Classification<'_> {
        match self.assets.get(asset) {
            None => Classification::Unregistered,
            Some(Entry::Primitive(asset)) => Classification::Primitive {
                decimals: asset.decimals,
            },
            // registration guarantees the decomposer exists
            Some(Entry::Derivative { decomposer, .. }) => match self.decomposers.get(decomposer) {
                Some(decomposer) => Classification::Derivative(decomposer.as_ref()),
                None => Classification::Unregistered,
            },
        }
    }
}
