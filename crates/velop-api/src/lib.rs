// velop-api: Async Rust client for the Linksys Velop JNAP API

pub mod client;
pub mod error;
pub mod jnap;
pub mod models;
pub mod transport;

pub use client::{JnapClient, MeshDetails};
pub use error::Error;
pub use jnap::Action;
pub use transport::TransportConfig;
