//! Error taxonomy for this crate, grounded on the manual `enum Error` style used by
//! other Game Boy cores in the wild rather than a derive-macro error crate: there's no
//! `core`-level crate in the retrieval pack reaching for `thiserror`.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The supplied ROM image failed a basic sanity check: too short to contain a
    /// header, or its length didn't match the bank count declared in that header.
    BadImage(String),
    /// The cartridge header names a mapper (MBC) byte this crate doesn't implement.
    UnsupportedMapper(u8),
    /// A read or write landed on an address with no mapped component. Not fatal;
    /// logged once and answered with the documented filler value.
    UnmappedAccess(u16),
    /// The CPU decoded a byte with no defined instruction meaning on the LR35902.
    /// Not fatal: the CPU sets its stop flag and the caller may keep driving the
    /// decoded-so-far registers for test/diagnostic purposes.
    UnimplementedOpcode(u8),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BadImage(reason) => write!(f, "bad cartridge image: {}", reason),
            Error::UnsupportedMapper(byte) => write!(f, "unsupported mapper byte: 0x{:02X}", byte),
            Error::UnmappedAccess(address) => write!(f, "access to unmapped address: 0x{:04X}", address),
            Error::UnimplementedOpcode(opcode) => write!(f, "unimplemented opcode: 0x{:02X}", opcode),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
