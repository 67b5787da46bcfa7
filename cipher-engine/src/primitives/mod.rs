//! Concrete block cipher primitives

pub mod blowfish;
pub mod present;

pub use self::blowfish::Blowfish;
pub use self::present::{Present, PresentParams};
