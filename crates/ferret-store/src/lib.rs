//! Ferret Storage Layer
//!
//! Implements the [`ContentStore`] and [`RelationalStore`] traits from
//! `ferret-domain`.
//!
//! # Architecture
//!
//! - [`PgStore`]: PostgreSQL relational store (articles, indicators, filters, categories)
//! - [`PgContentStore`]: PostgreSQL table of scraped article text
//! - [`MemoryStore`]: in-process store implementing both traits, recording every
//!   call and able to script failures; used by the test suites
//!
//! Connections are never shared between workers: every worker connects its
//! own pools from a [`StoreConfig`].
//!
//! # Examples
//!
//! ```no_run
//! use ferret_store::{PgStore, StoreConfig};
//!
//! # async fn demo() -> Result<(), ferret_domain::StoreError> {
//! let config = StoreConfig::new("postgres://ferret@localhost/ferret");
//! let store = PgStore::connect(&config).await?;
//! store.initialize_schema().await?;
//! store.close().await;
//! # Ok(())
//! # }
//! ```
//!
//! [`ContentStore`]: ferret_domain::traits::ContentStore
//! [`RelationalStore`]: ferret_domain::traits::RelationalStore

#![warn(missing_docs)]

pub mod config;
pub mod content;
pub mod memory;
pub mod pg;

pub use config::StoreConfig;
pub use content::PgContentStore;
pub use memory::{MemoryStore, StoreCall, StoreOp};
pub use pg::PgStore;

use ferret_domain::StoreError;

/// Map a driver error onto the domain error taxonomy
pub(crate) fn map_sqlx(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => StoreError::Connection(err.to_string()),
        sqlx::Error::RowNotFound => StoreError::NotFound(err.to_string()),
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            StoreError::InvalidData(err.to_string())
        }
        other => StoreError::Query(other.to_string()),
    }
}
