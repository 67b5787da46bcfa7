//! Cipher modes implementation

pub mod cbc;
pub mod cfb;
pub mod cmac;
pub mod ctr;
pub mod ecb;
pub mod ofb;

use std::fmt;

pub use cbc::CbcState;
pub use cfb::CfbState;
pub use cmac::{Cmac, CmacState, Subkeys};
pub use ctr::CtrState;
pub use ofb::OfbState;

/// Mode of operation selected for a [`Cipher`](crate::Cipher).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Ecb,
    Cbc,
    Cfb,
    Ofb,
    Ctr,
    Cmac,
}

impl Mode {
    pub const ALL: [Mode; 6] = [
        Mode::Ecb,
        Mode::Cbc,
        Mode::Cfb,
        Mode::Ofb,
        Mode::Ctr,
        Mode::Cmac,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Mode::Ecb => "ECB",
            Mode::Cbc => "CBC",
            Mode::Cfb => "CFB",
            Mode::Ofb => "OFB",
            Mode::Ctr => "CTR",
            Mode::Cmac => "CMAC",
        }
    }

    /// Whether the mode is constructed from an IV.
    pub fn requires_iv(&self) -> bool {
        matches!(self, Mode::Cbc | Mode::Cfb | Mode::Ofb)
    }

    /// Whether the final block is padded (ECB and CBC).
    pub fn is_padded(&self) -> bool {
        matches!(self, Mode::Ecb | Mode::Cbc)
    }

    /// Whether ciphertext length always equals plaintext length.
    pub fn is_stream(&self) -> bool {
        matches!(self, Mode::Cfb | Mode::Ofb | Mode::Ctr)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Direction a [`Cipher`](crate::Cipher) is bound to after first use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Encrypt,
    Decrypt,
    Authenticate,
}

/// One-shot helpers operating on a complete message.
///
/// Each call starts from fresh state, so the same primitive can be reused
/// freely. For streaming use [`Cipher`](crate::Cipher).
pub struct CipherModes;
