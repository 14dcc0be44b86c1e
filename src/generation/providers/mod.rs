//! Image generation providers.

#[cfg(feature = "pollinations")]
mod pollinations;

#[cfg(feature = "pollinations")]
pub use pollinations::{PollinationsProvider, PollinationsProviderBuilder, DEFAULT_BASE_URL};
