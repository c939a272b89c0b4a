//! Init-schema command implementation.

use crate::config::Config;
use crate::error::Result;
use ferret_store::PgStore;

/// Create the pipeline's tables if they do not exist.
pub async fn execute_init_schema(config: &Config) -> Result<()> {
    let store = PgStore::connect(&config.store_config()?).await?;
    let result = store.initialize_schema().await;
    store.close().await;
    Ok(result?)
}
