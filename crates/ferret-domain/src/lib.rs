//! Ferret Domain Layer
//!
//! This crate contains the value types and trait seams shared by every other
//! Ferret crate. It defines what an article, an indicator candidate, a filter
//! and a category rule are, and the interfaces through which the extraction
//! pipeline talks to storage and to the indicator pattern matcher.
//!
//! ## Key Concepts
//!
//! - **Article reference**: an unprocessed article id plus the id of the source it came from
//! - **Indicator (IOC)**: a typed string value (URL, hash, address...) found in article text
//! - **Filter**: a regular expression that suppresses matching indicators of one type,
//!   either globally or for a single source
//! - **Category rule**: a ranked, case-insensitive pattern; the lowest-ranked match wins
//!
//! ## Architecture
//!
//! - Pure data and pattern predicates only
//! - Infrastructure implementations (Postgres, in-memory) live in `ferret-store`
//! - Trait definitions for all external interactions live in [`traits`]

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod article;
pub mod category;
pub mod error;
pub mod filter;
pub mod indicator;
pub mod traits;

// Re-exports for convenience
pub use article::{ArticleContent, ArticleReference};
pub use category::CategoryRule;
pub use error::{MatchError, StoreError};
pub use filter::{FilterPattern, FilterSet};
pub use indicator::{
    IndicatorCandidate, IndicatorKind, IndicatorTypeTable, RawIndicator, UNKNOWN_INDICATOR_TYPE,
};
