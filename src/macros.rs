//! # Internal Macros
//!
//! ## zerocopy_accessors!
//!
//! Generates getter and setter methods for zerocopy struct fields that use
//! little-endian wrapper types. The value types in [`crate::types`] store their
//! wire representation directly, so these accessors are the only way the
//! native integers are exposed.
//!
//! ```ignore
//! use zerocopy::little_endian::{I64, U64};
//!
//! #[repr(C)]
//! struct Float128 {
//!     low: U64,
//!     high: I64,
//! }
//!
//! impl Float128 {
//!     zerocopy_accessors! {
//!         low: u64,
//!         high: i64,
//!     }
//! }
//!
//! // Generates:
//! // pub fn low(&self) -> u64 { self.low.get() }
//! // pub fn set_low(&mut self, val: u64) { self.low = U64::new(val); }
//! // pub fn high(&self) -> i64 { self.high.get() }
//! // pub fn set_high(&mut self, val: i64) { self.high = I64::new(val); }
//! ```

/// Generates getter and setter methods for zerocopy little-endian fields.
#[macro_export]
macro_rules! zerocopy_accessors {
    (@impl $field:ident, $native:ident, $wrapper:ident) => {
        ::paste::paste! {
            #[inline]
            pub fn $field(&self) -> $native {
                self.$field.get()
            }

            #[inline]
            pub fn [<set_ $field>](&mut self, val: $native) {
                self.$field = ::zerocopy::little_endian::$wrapper::new(val);
            }
        }
    };
    (@impl $field:ident, u32) => {
        $crate::zerocopy_accessors!(@impl $field, u32, U32);
    };
    (@impl $field:ident, u64) => {
        $crate::zerocopy_accessors!(@impl $field, u64, U64);
    };
    (@impl $field:ident, i64) => {
        $crate::zerocopy_accessors!(@impl $field, i64, I64);
    };
    ($($field:ident : $ty:tt),* $(,)?) => {
        $(
            $crate::zerocopy_accessors!(@impl $field, $ty);
        )*
    };
}
