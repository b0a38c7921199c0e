mod config_error;
mod parse_error;
mod run_error;
mod store_error;
mod transport_error;

pub use config_error::ConfigError;
pub use parse_error::ParseError;
pub use run_error::{RunError, TransitionError};
pub use store_error::StoreError;
pub use transport_error::TransportError;
