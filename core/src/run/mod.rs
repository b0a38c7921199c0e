mod command;
mod controller;
mod driver;
pub mod state;

pub use command::AbortToken;
pub use controller::{RunController, RunOptions};
pub use state::{GenerationRun, RunStatus, Step};
