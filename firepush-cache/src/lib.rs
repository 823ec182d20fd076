//! Cache stores for firepush.
//!
//! The FCM client keeps its OAuth2 access tokens in a [`CacheStore`] so that
//! consecutive sends reuse one token until it is close to expiring. The store
//! is always injected, which lets a host application share its own backend
//! and lets tests substitute a fresh [`InMemoryCache`].
//!
//! # Examples
//!
//! ```no_run
//! use firepush_cache::*;
//! use std::time::Duration;
//!
//! # async fn example() -> CacheResult<()> {
//! let cache = InMemoryCache::new();
//!
//! let token: String = remember(&cache, "fcm-http-v1-oauth-token-demo", Duration::from_secs(3500), || async {
//!     Ok("ya29.minted".to_string())
//! })
//! .await?;
//!
//! assert_eq!(token, "ya29.minted");
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod helpers;
pub mod memory;
pub mod traits;

pub use error::{CacheError, CacheResult};
pub use helpers::*;
pub use memory::InMemoryCache;
pub use traits::CacheStore;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{CacheError, CacheResult};
    pub use crate::helpers::{get, remember, remember_for, set};
    pub use crate::memory::InMemoryCache;
    pub use crate::traits::CacheStore;
}
