//! Ferret Extractor
//!
//! Turns article text into persisted indicators of compromise and category
//! assignments.
//!
//! # Overview
//!
//! Two engines implement [`FeatureExtractor`]:
//!
//! - [`IndicatorEngine`]: normalizes HTML, finds indicator candidates with an
//!   [`IndicatorMatcher`](ferret_domain::traits::IndicatorMatcher), drops
//!   duplicates and filtered values, then persists the survivors
//! - [`CategoryEngine`]: assigns the lowest-ranked matching category rule
//!
//! Neither engine ever fails an article. Storage calls go through
//! [`resilient`], which retries and then gives up with an empty result;
//! every other error is logged and yields an empty [`ExtractionReport`].
//!
//! # Architecture
//!
//! ```text
//! content → strip_html → matcher → dedup → global/source filters → insert + link
//!                                              ↑
//!                     SharedComputation<FilterSet> (global)
//!                     RecencyCache<source_id, SharedComputation<FilterSet>>
//! ```
//!
//! Filter sets and category rules are loaded once per process through
//! [`SharedComputation`], which starts its query as soon as it is created and
//! replays the single result to every caller.
//!
//! # Example Usage
//!
//! ```no_run
//! use ferret_extractor::{ExtractorConfig, FeatureExtractor, IndicatorEngine, RegexMatcher};
//! use ferret_domain::{ArticleContent, ArticleReference};
//! use ferret_store::MemoryStore;
//! use std::sync::Arc;
//! use uuid::Uuid;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(MemoryStore::new());
//! let matcher = Arc::new(RegexMatcher::new()?);
//! let engine = IndicatorEngine::new(store, matcher, &ExtractorConfig::default())?;
//!
//! let reference = ArticleReference::new(Uuid::new_v4(), 1);
//! let article = ArticleContent::for_reference(&reference, "C2 at hxxp://evil[.]test/gate");
//! let report = engine.extract_features(&article).await;
//!
//! println!("{}", report);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod cache;
mod category;
mod config;
mod error;
mod indicator;
mod matcher;
mod normalize;
mod retry;
mod shared;
mod types;

#[cfg(test)]
mod tests;

pub use cache::RecencyCache;
pub use category::CategoryEngine;
pub use config::ExtractorConfig;
pub use error::ExtractorError;
pub use indicator::IndicatorEngine;
pub use matcher::{rearm, RegexMatcher};
pub use normalize::strip_html;
pub use retry::resilient;
pub use shared::SharedComputation;
pub use types::{ExtractionReport, FeatureExtractor};
