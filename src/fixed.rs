use std::fmt;

use crate::error::{Error, Result};

/// An 8.8 big-endian fixed-point value (e.g. `tkhd` volume).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Fixed16(pub u16);

impl Fixed16 {
    /// Build from exactly 2 big-endian bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let raw: [u8; 2] = bytes.try_into().map_err(|_| Error::LengthMismatch {
            expected: 2,
            got: bytes.len(),
        })?;
        Ok(Fixed16(u16::from_be_bytes(raw)))
    }

    pub fn integer(self) -> u16 {
        self.0 >> 8
    }
}

impl fmt::Display for Fixed16 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0 >> 8)
    }
}

/// A 16.16 big-endian fixed-point value (e.g. `mvhd` rate, track width).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Fixed32(pub u32);

impl Fixed32 {
    /// Build from exactly 4 big-endian bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let raw: [u8; 4] = bytes.try_into().map_err(|_| Error::LengthMismatch {
            expected: 4,
            got: bytes.len(),
        })?;
        Ok(Fixed32(u32::from_be_bytes(raw)))
    }

    pub fn integer(self) -> u32 {
        self.0 >> 16
    }
}

impl fmt::Display for Fixed32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0 >> 16)
    }
}
