//! Application initialization.
//!
//! Logger setup and the rustls crypto provider; everything else the run
//! needs is plain configuration passed by value.

mod logger;

use rustls::crypto::{ring::default_provider, CryptoProvider};

pub use logger::init_logger_with;

/// Initializes the crypto provider for TLS operations.
///
/// Configures the global crypto provider for `rustls`. This must be called
/// before any TLS connections are established.
pub fn init_crypto_provider() {
    // Reinstalling the provider is harmless, so the result is ignored
    let _ = CryptoProvider::install_default(default_provider());
}
