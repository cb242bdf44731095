//! Per-marketplace ideal targets
//!
//! Each supported marketplace carries a compiled-in set of anchors used to
//! normalize raw observations into proportional points. Unknown marketplace
//! ids fall back to the global default set (the `us` anchors).

use serde::{Deserialize, Serialize};

/// Marketplace whose anchors double as the global default
pub const GLOBAL_DEFAULT_MARKETPLACE: &str = "us";

/// Anchor values for the four continuous inputs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdealTargets {
    pub search_volume: f64,
    pub competitors: f64,
    pub price: f64,
    pub royalties: f64,
}

impl IdealTargets {
    pub const fn new(search_volume: f64, competitors: f64, price: f64, royalties: f64) -> Self {
        Self {
            search_volume,
            competitors,
            price,
            royalties,
        }
    }

    /// Validate that every anchor is a finite, non-negative number
    pub fn validate(&self) -> Result<(), String> {
        let fields = [
            ("searchVolume", self.search_volume),
            ("competitors", self.competitors),
            ("price", self.price),
            ("royalties", self.royalties),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(format!("{name} must be a finite number"));
            }
            if value < 0.0 {
                return Err(format!("{name} must not be negative (got {value})"));
            }
        }
        Ok(())
    }
}

const MARKETPLACE_DEFAULTS: &[(&str, IdealTargets)] = &[
    ("us", IdealTargets::new(600.0, 3000.0, 12.0, 4.0)),
    ("uk", IdealTargets::new(300.0, 1500.0, 10.0, 3.5)),
    ("de", IdealTargets::new(300.0, 1500.0, 11.0, 3.8)),
    ("fr", IdealTargets::new(200.0, 1000.0, 10.0, 3.5)),
    ("es", IdealTargets::new(150.0, 800.0, 10.0, 3.0)),
    ("it", IdealTargets::new(150.0, 800.0, 10.0, 3.0)),
    ("ca", IdealTargets::new(200.0, 1200.0, 13.0, 4.0)),
    ("au", IdealTargets::new(150.0, 800.0, 15.0, 5.0)),
];

/// Normalize a marketplace id for lookup (`" US "` -> `"us"`)
pub fn normalize_marketplace_id(id: &str) -> String {
    id.trim().to_lowercase()
}

/// Ids that have compiled-in anchors
pub fn supported_marketplaces() -> impl Iterator<Item = &'static str> {
    MARKETPLACE_DEFAULTS.iter().map(|(id, _)| *id)
}

pub fn is_supported_marketplace(id: &str) -> bool {
    let normalized = normalize_marketplace_id(id);
    supported_marketplaces().any(|known| known == normalized)
}

/// Compiled-in anchors for a marketplace (global default for unknown ids)
pub fn default_targets(id: &str) -> IdealTargets {
    let normalized = normalize_marketplace_id(id);
    MARKETPLACE_DEFAULTS
        .iter()
        .find(|(known, _)| *known == normalized)
        .or_else(|| {
            MARKETPLACE_DEFAULTS
                .iter()
                .find(|(known, _)| *known == GLOBAL_DEFAULT_MARKETPLACE)
        })
        .map(|(_, targets)| *targets)
        .unwrap_or(IdealTargets::new(600.0, 3000.0, 12.0, 4.0))
}
