//! Process-local response cache.

pub mod envelope;
pub mod key;
pub mod memory;

pub use key::generate_key;
#[cfg(feature = "http")]
pub use key::request_key;
pub use memory::MemoryCache;
