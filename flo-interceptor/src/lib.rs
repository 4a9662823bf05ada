#![deny(missing_docs)]
//! Process-wide request interceptor.
//!
//! Owns every outbound provider credential and routes `/api/<provider>/...`
//! requests either to a connected hub or directly to the provider, injecting
//! auth along the way. No component above this crate — not the loop, not
//! any adapter, not a worker — ever holds an API key; this is the one place
//! [`credential::ApiKey::with_bytes`] is called.
//!
//! A secondary, interface-level responsibility ([`assets`]) caches static
//! shell assets; it is orthogonal to request routing and shares nothing
//! with the credential store.

pub mod assets;
pub mod config;
pub mod credential;
pub mod error;
pub mod transport;

pub use assets::{AssetCache, AssetCacheMessage, AssetCacheSnapshot, AssetCacheStore, MemoryAssetCacheStore};
pub use config::{ConfigSnapshot, ConfigStore, InterceptorConfig, MemoryConfigStore, MessageSource};
pub use credential::ApiKey;
pub use error::InterceptorError;
pub use transport::InterceptingTransport;
