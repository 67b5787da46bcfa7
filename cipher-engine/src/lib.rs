//! # Cipher Engine
//!
//! Generic block cipher modes of operation over any fixed-size block
//! primitive.
//!
//! ## Supported Modes
//!
//! - **ECB** (Electronic Code Book) - Simple but insecure mode
//! - **CBC** (Cipher Block Chaining) - Widely used, requires IV
//! - **CFB** (Cipher Feedback) - Self-synchronizing stream mode, requires IV
//! - **OFB** (Output Feedback) - Stream cipher mode, requires IV
//! - **CTR** (Counter Mode) - Stream cipher mode, requires a counter
//! - **CMAC** (Cipher-based MAC) - Message authentication, no confidentiality
//!
//! ## Primitives
//!
//! - [`Blowfish`] - 64-bit block, 4 to 56 byte key
//! - [`Present`] - 64-bit block, 80 or 128-bit key, configurable rounds
//!
//! Any type implementing [`BlockCipher`] plugs into every mode.
//!
//! ## Usage
//!
//! ```rust
//! use cipher_engine::{Blowfish, Cipher, KeyInit};
//!
//! let key = b"my-secret-key-16";
//! let iv = b"unique!!";
//!
//! let mut encryptor = Cipher::cbc(Blowfish::new(key)?, iv)?;
//! let mut ciphertext = encryptor.encrypt(b"Hello, ")?;
//! ciphertext.extend(encryptor.encrypt(b"World!")?);
//! ciphertext.extend(encryptor.finish()?);
//!
//! let mut decryptor = Cipher::cbc(Blowfish::new(key)?, iv)?;
//! let mut plaintext = decryptor.decrypt(&ciphertext)?;
//! plaintext.extend(decryptor.finish()?);
//! assert_eq!(plaintext, b"Hello, World!");
//! # Ok::<(), cipher_engine::CipherModeError>(())
//! ```
//!
//! Use a separate [`Cipher`] for encryption and decryption: chain state and
//! counters advance with every call.

// Public modules
pub mod cipher;
pub mod counter;
pub mod error;
pub mod facade;
pub mod modes;
pub mod padding;
pub mod primitives;
pub mod utils;

// Re-exports for easy access
pub use cipher::{BlockCipher, KeyInit};
pub use counter::{BlockCounter, Counter, SharedCounter};
pub use error::{CipherModeError, Result};
pub use facade::{Cipher, Feedback};
pub use modes::{CipherModes, Cmac, Direction, Mode};
pub use padding::Padding;
pub use primitives::{Blowfish, Present, PresentParams};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Convenience functions for common operations
impl CipherModes {
    /// Get version information
    pub fn version() -> &'static str {
        VERSION
    }

    /// List all supported cipher modes
    pub fn supported_modes() -> Vec<&'static str> {
        Mode::ALL.iter().map(Mode::name).collect()
    }
}
