//! SmartMix client core
//!
//! Session state with write-through persistence, the durable key-value
//! storage it persists to, and client configuration.

pub mod config;
pub mod error;
pub mod session;
pub mod storage;

pub use config::{ApiConfig, ClientConfig, StorageConfig};
pub use error::{CoreError, CoreResult};
pub use session::{Profile, Session, SessionEvent, SessionStore};
pub use storage::{FileStore, KeyValueStore, MemoryStore};

#[cfg(target_arch = "wasm32")]
pub use storage::LocalStore;
