//! The tagged payload of a leaf [`Constant`](crate::node::Constant).

use crate::error::{Result, SubstrateError};

/// Surrogate codepoints are never valid content; nothing in this crate
/// produces a [`Seed::UnicodeCodepoint`] inside this range.
pub const SURROGATE_RANGE: core::ops::RangeInclusive<u32> = 0xD800..=0xDFFF;

/// The largest valid Unicode scalar value.
pub const MAX_CODEPOINT: u32 = 0x10FFFF;

/// Discriminant stored in `constant.seed_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SeedType {
    UnicodeCodepoint = 0,
    Byte = 1,
    Integer64 = 2,
    Float32Bits = 3,
    Float64Bits = 4,
}

impl SeedType {
    /// Recovers a [`SeedType`] from its on-disk discriminant.
    #[must_use]
    pub fn from_u8(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::UnicodeCodepoint),
            1 => Some(Self::Byte),
            2 => Some(Self::Integer64),
            3 => Some(Self::Float32Bits),
            4 => Some(Self::Float64Bits),
            _ => None,
        }
    }
}

/// The tagged payload of a constant. `seed_value` always carries the
/// 64-bit wire representation: zero-extended for codepoints and bytes,
/// two's-complement for signed integers, the verbatim IEEE-754 bit
/// pattern for floats (zero-extended for `f32`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Seed {
    UnicodeCodepoint(u32),
    Byte(u8),
    Integer64(i64),
    Float32Bits(u32),
    Float64Bits(u64),
}

impl Seed {
    /// Validates and constructs a codepoint seed, rejecting surrogates
    /// and out-of-range scalar values.
    pub fn codepoint(cp: u32) -> Result<Self> {
        if cp > MAX_CODEPOINT {
            return Err(SubstrateError::InvalidInput(format!(
                "codepoint U+{cp:06X} exceeds U+10FFFF"
            )));
        }
        if SURROGATE_RANGE.contains(&cp) {
            return Err(SubstrateError::InvalidInput(format!(
                "U+{cp:04X} is a surrogate codepoint and cannot be a seed"
            )));
        }
        Ok(Self::UnicodeCodepoint(cp))
    }

    /// The `seed_type` discriminant for this seed.
    #[must_use]
    pub fn seed_type(&self) -> SeedType {
        match self {
            Self::UnicodeCodepoint(_) => SeedType::UnicodeCodepoint,
            Self::Byte(_) => SeedType::Byte,
            Self::Integer64(_) => SeedType::Integer64,
            Self::Float32Bits(_) => SeedType::Float32Bits,
            Self::Float64Bits(_) => SeedType::Float64Bits,
        }
    }

    /// The 64-bit `seed_value` payload, as stored verbatim in the row.
    #[must_use]
    pub fn seed_value(&self) -> u64 {
        match *self {
            Self::UnicodeCodepoint(cp) => u64::from(cp),
            Self::Byte(b) => u64::from(b),
            Self::Integer64(v) => v as u64,
            Self::Float32Bits(bits) => u64::from(bits),
            Self::Float64Bits(bits) => bits,
        }
    }

    /// Reconstructs a seed from its stored `(seed_type, seed_value)` pair.
    pub fn from_parts(seed_type: SeedType, seed_value: u64) -> Result<Self> {
        Ok(match seed_type {
            SeedType::UnicodeCodepoint => {
                let cp = u32::try_from(seed_value).map_err(|_| {
                    SubstrateError::Invariant(format!(
                        "codepoint seed_value {seed_value} overflows u32"
                    ))
                })?;
                Self::codepoint(cp)?
            }
            SeedType::Byte => {
                let b = u8::try_from(seed_value).map_err(|_| {
                    SubstrateError::Invariant(format!(
                        "byte seed_value {seed_value} overflows u8"
                    ))
                })?;
                Self::Byte(b)
            }
            SeedType::Integer64 => Self::Integer64(seed_value as i64),
            SeedType::Float32Bits => {
                let bits = u32::try_from(seed_value).map_err(|_| {
                    SubstrateError::Invariant(format!(
                        "f32 seed_value {seed_value} overflows u32"
                    ))
                })?;
                Self::Float32Bits(bits)
            }
            SeedType::Float64Bits => Self::Float64Bits(seed_value),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_surrogates() {
        assert!(Seed::codepoint(0xD800).is_err());
        assert!(Seed::codepoint(0xDFFF).is_err());
        assert!(Seed::codepoint(0xD9AB).is_err());
    }

    #[test]
    fn accepts_boundary_codepoints() {
        assert!(Seed::codepoint(0).is_ok());
        assert!(Seed::codepoint(MAX_CODEPOINT).is_ok());
        assert!(Seed::codepoint(MAX_CODEPOINT + 1).is_err());
    }

    #[test]
    fn round_trips_through_parts() {
        let seeds = [
            Seed::UnicodeCodepoint(0x1F600),
            Seed::Byte(255),
            Seed::Integer64(-42),
            Seed::Float32Bits(f32::to_bits(-0.0)),
            Seed::Float64Bits(f64::to_bits(f64::NAN)),
        ];
        for seed in seeds {
            let round_tripped = Seed::from_parts(seed.seed_type(), seed.seed_value()).unwrap();
            assert_eq!(seed, round_tripped);
        }
    }
}
