pub use self::parser::{Config, DatabaseConfig, DbType, LoggingConfig, QuotesConfig};
pub use self::validator::ConfigError;

mod parser;
mod validator;
