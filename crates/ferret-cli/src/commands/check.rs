//! Check-config command implementation.

use crate::config::Config;
use crate::error::Result;

/// Validate the configuration and print it.
pub fn execute_check_config(config: &Config) -> Result<()> {
    config.validate()?;
    if let Err(e) = config.store_config() {
        eprintln!("Warning: {}", e);
    }

    print!("{}", config.to_redacted_toml()?);
    Ok(())
}
