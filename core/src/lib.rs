pub mod api;
pub mod config;
pub mod error;
pub mod presentation;
pub mod protocol;
pub mod result;
pub mod run;
pub mod settings;
pub mod transport;
