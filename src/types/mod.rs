//! # Value Types
//!
//! Native representations of the fixed-width HybridRow types that have no
//! direct Rust primitive, plus the [`FixedValue`] codec shared by every
//! fixed-width type.
//!
//! | Type | Width | Wire layout |
//! |------|-------|-------------|
//! | [`Float128`] | 16 | low u64 LE, high i64 LE |
//! | [`Decimal`] | 16 | flags, hi, lo, mid as u32 LE |
//! | [`DateTime`] | 8 | ticks as i64 LE |
//! | [`UnixDateTime`] | 8 | milliseconds since the Unix epoch, i64 LE |
//! | [`Guid`] | 16 | raw bytes |
//! | [`MongoDbObjectId`] | 12 | raw bytes |
//!
//! The structs are zerocopy types whose fields already hold the wire
//! encoding, so reading one out of a row is a single unaligned copy.

use std::fmt;

use zerocopy::little_endian::{I64, U32, U64};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::row::{RowError, RowResult};

/// A value with a fixed little-endian encoding.
pub trait FixedValue: Copy {
    const SIZE: usize;

    /// Writes the value into the first [`FixedValue::SIZE`] bytes of `buf`.
    fn write_to(self, buf: &mut [u8]);

    /// Reads a value from the front of `buf`, failing if `buf` is too short.
    fn read_from(buf: &[u8]) -> RowResult<Self>;
}

macro_rules! fixed_primitive {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FixedValue for $ty {
                const SIZE: usize = std::mem::size_of::<$ty>();

                #[inline]
                fn write_to(self, buf: &mut [u8]) {
                    buf[..Self::SIZE].copy_from_slice(&self.to_le_bytes());
                }

                #[inline]
                fn read_from(buf: &[u8]) -> RowResult<Self> {
                    let bytes = buf.get(..Self::SIZE).ok_or(RowError::InvalidRow)?;
                    let mut raw = [0u8; std::mem::size_of::<$ty>()];
                    raw.copy_from_slice(bytes);
                    Ok(<$ty>::from_le_bytes(raw))
                }
            }
        )*
    };
}

fixed_primitive!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64);

macro_rules! fixed_zerocopy {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FixedValue for $ty {
                const SIZE: usize = std::mem::size_of::<$ty>();

                #[inline]
                fn write_to(self, buf: &mut [u8]) {
                    buf[..Self::SIZE].copy_from_slice(self.as_bytes());
                }

                #[inline]
                fn read_from(buf: &[u8]) -> RowResult<Self> {
                    <$ty>::read_from_prefix(buf)
                        .map(|(value, _)| value)
                        .map_err(|_| RowError::InvalidRow)
                }
            }
        )*
    };
}

fixed_zerocopy!(Float128, Decimal, DateTime, UnixDateTime, Guid, MongoDbObjectId);

/// Marker value read from and written to `null` typed fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NullValue;

/// IEEE 754 quadruple precision value, kept as its two 64-bit halves.
#[repr(C)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned,
)]
pub struct Float128 {
    low: U64,
    high: I64,
}

impl Float128 {
    pub fn new(high: i64, low: u64) -> Self {
        Self {
            low: U64::new(low),
            high: I64::new(high),
        }
    }

    zerocopy_accessors! {
        low: u64,
        high: i64,
    }
}

/// 96-bit scaled decimal in the .NET `System.Decimal` memory layout.
#[repr(C)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned,
)]
pub struct Decimal {
    flags: U32,
    hi: U32,
    lo: U32,
    mid: U32,
}

impl Decimal {
    const SIGN_MASK: u32 = 0x8000_0000;
    const SCALE_SHIFT: u32 = 16;

    /// Builds a decimal from a 96-bit magnitude, a sign and a base-10 scale.
    pub fn new(lo: u32, mid: u32, hi: u32, negative: bool, scale: u8) -> Self {
        let mut flags = (scale as u32) << Self::SCALE_SHIFT;
        if negative {
            flags |= Self::SIGN_MASK;
        }
        Self {
            flags: U32::new(flags),
            hi: U32::new(hi),
            lo: U32::new(lo),
            mid: U32::new(mid),
        }
    }

    zerocopy_accessors! {
        flags: u32,
        hi: u32,
        lo: u32,
        mid: u32,
    }

    pub fn is_negative(&self) -> bool {
        self.flags() & Self::SIGN_MASK != 0
    }

    pub fn scale(&self) -> u8 {
        ((self.flags() >> Self::SCALE_SHIFT) & 0xFF) as u8
    }
}

/// Point in time as 100ns ticks since 0001-01-01.
#[repr(C)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned,
)]
pub struct DateTime {
    ticks: I64,
}

impl DateTime {
    pub fn from_ticks(ticks: i64) -> Self {
        Self {
            ticks: I64::new(ticks),
        }
    }

    zerocopy_accessors! {
        ticks: i64,
    }
}

/// Point in time as milliseconds since the Unix epoch.
#[repr(C)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned,
)]
pub struct UnixDateTime {
    milliseconds: I64,
}

impl UnixDateTime {
    pub fn from_milliseconds(milliseconds: i64) -> Self {
        Self {
            milliseconds: I64::new(milliseconds),
        }
    }

    zerocopy_accessors! {
        milliseconds: i64,
    }
}

#[repr(transparent)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned,
)]
pub struct Guid(pub [u8; 16]);

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, b) in self.0.iter().enumerate() {
            if matches!(i, 4 | 6 | 8 | 10) {
                f.write_str("-")?;
            }
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

#[repr(transparent)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned,
)]
pub struct MongoDbObjectId(pub [u8; 12]);
