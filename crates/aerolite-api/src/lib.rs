// aerolite-api: Async Rust client for the Aerolite air-quality cloud

pub mod client;
pub mod error;
pub mod models;
pub mod oauth;
pub mod transport;

pub use client::AeroliteClient;
pub use error::Error;
pub use models::{DeviceReading, DeviceStatus, Metric, Sample};
pub use oauth::{OAuthConfig, PkcePair, TokenSession, TokenSet};
pub use transport::TransportConfig;
