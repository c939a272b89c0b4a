//! Command implementations.

pub mod check;
pub mod run;
pub mod schema;

pub use self::check::execute_check_config;
pub use self::run::execute_run;
pub use self::schema::execute_init_schema;
