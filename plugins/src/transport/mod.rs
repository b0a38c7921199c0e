pub mod http;
pub mod replay;

pub use http::HttpGenerationTransport;
pub use replay::ReplayGenerationTransport;
