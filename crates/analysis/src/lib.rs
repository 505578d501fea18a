//! `ledgerlens-analysis` - two-period balance-sheet derivation engine.
//!
//! Pure engine crate: receives raw rows from a tabular loader, returns growth
//! rates, composition weights, liquidity ratios and a text snapshot for AI
//! grounding. No IO or network dependencies.

pub mod cache;
pub mod coerce;
pub mod context;
pub mod derive;
pub mod error;
pub mod labels;
pub mod model;
pub mod ratios;

pub use cache::DerivationCache;
pub use context::{serialize_context, summary_payload, ContextSnapshot};
pub use derive::{derive_analysis, EPSILON};
pub use error::AnalysisError;
pub use labels::LabelSet;
pub use model::{AnalysisResult, CellInput, CoercionFallback, EnrichedRow, Period, RawRow};
pub use ratios::{extract_liquidity_ratios, RatioPair, RatioUnavailable, RatioValue};
