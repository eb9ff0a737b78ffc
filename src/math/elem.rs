//! Ring elements of Z_{2^32} and Z_{2^64}
//!
//! LWE ciphertexts, the matrix A, the hint and the database all live in a
//! wrapping ring whose width doubles as the security level of a secret.
//! [`Elem`] lets the engine be written once for both widths.

use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::Serialize;
use zeroize::Zeroize;

use crate::params::SecurityLevel;

/// Element of the wrapping ring Z_{2^BITS}
pub trait Elem:
    Copy + Default + Debug + Eq + Send + Sync + Serialize + DeserializeOwned + Zeroize + 'static
{
    /// Bit width of the ring
    const BITS: u32;

    /// Security level tag for this width
    const LEVEL: SecurityLevel;

    /// Additive identity
    const ZERO: Self;

    /// Reduce a u64 modulo 2^BITS (truncation)
    fn from_u64(v: u64) -> Self;

    /// Reduce a u128 modulo 2^BITS (truncation)
    fn from_u128(v: u128) -> Self;

    /// Map a signed value into the ring
    fn from_i64(v: i64) -> Self;

    /// Canonical representative in [0, 2^BITS)
    fn to_u64(self) -> u64;

    /// Centered representative in [-2^(BITS-1), 2^(BITS-1))
    fn to_i64(self) -> i64;

    fn wrapping_add(self, rhs: Self) -> Self;

    fn wrapping_sub(self, rhs: Self) -> Self;

    fn wrapping_mul(self, rhs: Self) -> Self;
}

macro_rules! impl_elem {
    ($ty:ty, $signed:ty, $level:expr) => {
        impl Elem for $ty {
            const BITS: u32 = <$ty>::BITS;
            const LEVEL: SecurityLevel = $level;
            const ZERO: Self = 0;

            #[inline]
            fn from_u64(v: u64) -> Self {
                v as $ty
            }

            #[inline]
            fn from_u128(v: u128) -> Self {
                v as $ty
            }

            #[inline]
            fn from_i64(v: i64) -> Self {
                v as $ty
            }

            #[inline]
            fn to_u64(self) -> u64 {
                self as u64
            }

            #[inline]
            fn to_i64(self) -> i64 {
                self as $signed as i64
            }

            #[inline]
            fn wrapping_add(self, rhs: Self) -> Self {
                <$ty>::wrapping_add(self, rhs)
            }

            #[inline]
            fn wrapping_sub(self, rhs: Self) -> Self {
                <$ty>::wrapping_sub(self, rhs)
            }

            #[inline]
            fn wrapping_mul(self, rhs: Self) -> Self {
                <$ty>::wrapping_mul(self, rhs)
            }
        }
    };
}

impl_elem!(u32, i32, SecurityLevel::Lwe32);
impl_elem!(u64, i64, SecurityLevel::Lwe64);

/// Inner product of two slices in the wrapping ring
#[inline]
pub fn dot<T: Elem>(a: &[T], b: &[T]) -> T {
    a.iter()
        .zip(b)
        .fold(T::ZERO, |acc, (&x, &y)| acc.wrapping_add(x.wrapping_mul(y)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_roundtrip() {
        assert_eq!(u32::from_i64(-1), u32::MAX);
        assert_eq!(u32::from_i64(-1).to_i64(), -1);
        assert_eq!(u64::from_i64(-5).to_i64(), -5);
        assert_eq!(u32::from_i64(1 << 31).to_i64(), i32::MIN as i64);
    }

    #[test]
    fn test_truncation() {
        assert_eq!(u32::from_u64(0x1_0000_0005), 5);
        assert_eq!(u64::from_u64(0x1_0000_0005), 0x1_0000_0005);
        assert_eq!(u32::from_u128(1u128 << 32), 0);
    }

    #[test]
    fn test_dot_wraps() {
        let a = [u32::MAX, 2];
        let b = [2u32, 3];
        // (2^32 - 1) * 2 + 6 = 4 mod 2^32
        assert_eq!(dot(&a, &b), 4);
    }

    #[test]
    fn test_levels() {
        assert_eq!(<u32 as Elem>::LEVEL, SecurityLevel::Lwe32);
        assert_eq!(<u64 as Elem>::LEVEL, SecurityLevel::Lwe64);
        assert_eq!(<u64 as Elem>::BITS, 64);
    }
}
