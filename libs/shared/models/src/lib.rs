pub mod auth;
pub mod error;
pub mod terms;

pub use error::SniperError;
