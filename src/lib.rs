//! Marketscore - keyword market opportunity scoring
//!
//! Converts raw market observations for a book keyword (search volume,
//! competing listings, price, royalties) plus a qualitative structure
//! checklist into a bounded 0-100 score, a per-factor breakdown and a
//! quality tier.
//!
//! ```no_run
//! use marketscore::config::ConfigStore;
//! use marketscore::models::MarketObservation;
//! use marketscore::scoring::MarketScorer;
//!
//! let store = ConfigStore::in_memory();
//! let scorer = MarketScorer::new(&store);
//! let observation = MarketObservation {
//!     search_volume: 600,
//!     competitors: 3000,
//!     price: 12.0,
//!     royalties: 4.0,
//!     ..Default::default()
//! };
//! let breakdown = scorer.calculate(&observation, Some("us"), None);
//! assert_eq!(breakdown.total, 85);
//! ```

pub mod compat;
pub mod config;
pub mod models;
pub mod scoring;
