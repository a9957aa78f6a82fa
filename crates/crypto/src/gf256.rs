// Copyright (c), Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Arithmetic over the Galois field GF(2⁸) with the reduction polynomial
//! <i>x⁸ + x⁴ + x³ + x + 1</i>. This is the field used for the byte-wise secret
//! sharing, so the encoding of a field element is exactly one byte.

use fastcrypto::error::{FastCryptoError::InvalidInput, FastCryptoResult};
use fastcrypto::traits::AllowedRng;
use std::iter::{Product, Sum};
use std::ops::{Add, Div, Mul, Neg, Sub};

/// The modulus of the field as the lower eight bits of the reduction polynomial.
const MODULUS: u8 = 0x1b;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GF256(pub u8);

impl GF256 {
    pub fn zero() -> Self {
        Self(0)
    }

    pub fn one() -> Self {
        Self(1)
    }

    pub fn rand<R: AllowedRng>(rng: &mut R) -> Self {
        let mut byte = [0u8; 1];
        rng.fill_bytes(&mut byte);
        Self(byte[0])
    }

    /// The multiplicative inverse, computed as <i>x<sup>254</sup> = x<sup>-1</sup></i>.
    /// Fails for the zero element.
    fn inverse(&self) -> FastCryptoResult<GF256> {
        if self.0 == 0 {
            return Err(InvalidInput);
        }
        let mut result = GF256::one();
        let mut base = *self;
        let mut exponent = 254u8;
        while exponent > 0 {
            if exponent & 1 == 1 {
                result = &result * &base;
            }
            base = &base * &base;
            exponent >>= 1;
        }
        Ok(result)
    }
}

impl From<u8> for GF256 {
    fn from(byte: u8) -> Self {
        Self(byte)
    }
}

impl From<&u8> for GF256 {
    fn from(byte: &u8) -> Self {
        Self(*byte)
    }
}

impl From<GF256> for u8 {
    fn from(element: GF256) -> Self {
        element.0
    }
}

impl Add for &GF256 {
    type Output = GF256;

    fn add(self, other: &GF256) -> Self::Output {
        GF256(self.0 ^ other.0)
    }
}

impl Sub for &GF256 {
    type Output = GF256;

    fn sub(self, other: &GF256) -> Self::Output {
        // The field has characteristic 2, so subtraction and addition coincide.
        self + other
    }
}

impl Neg for &GF256 {
    type Output = GF256;

    fn neg(self) -> Self::Output {
        *self
    }
}

impl Mul for &GF256 {
    type Output = GF256;

    fn mul(self, other: &GF256) -> Self::Output {
        // Carry-less "Russian peasant" multiplication with modular reduction.
        let mut a = self.0;
        let mut b = other.0;
        let mut accumulator = 0u8;
        for _ in 0..u8::BITS {
            if b & 1 == 1 {
                accumulator ^= a;
            }
            let overflow = a & 0x80 != 0;
            a <<= 1;
            if overflow {
                a ^= MODULUS;
            }
            b >>= 1;
        }
        GF256(accumulator)
    }
}

impl Div for &GF256 {
    type Output = FastCryptoResult<GF256>;

    fn div(self, divisor: &GF256) -> Self::Output {
        Ok(self * &divisor.inverse()?)
    }
}

impl Sum for GF256 {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(GF256::zero(), |sum, term| &sum + &term)
    }
}

impl Product for GF256 {
    fn product<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(GF256::one(), |product, factor| &product * &factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::thread_rng;

    #[test]
    fn test_addition_is_xor() {
        assert_eq!(&GF256(0b1010) + &GF256(0b0110), GF256(0b1100));
        assert_eq!(&GF256(0x53) - &GF256(0x53), GF256::zero());
    }

    #[test]
    fn test_multiplication() {
        // Worked example from the AES specification: {53} · {ca} = {01}.
        assert_eq!(&GF256(0x53) * &GF256(0xca), GF256::one());
        assert_eq!(&GF256(0x57) * &GF256(0x13), GF256(0xfe));
        assert_eq!(&GF256(0xff) * &GF256::zero(), GF256::zero());
    }

    #[test]
    fn test_inverse() {
        let mut rng = thread_rng();
        for _ in 0..100 {
            let x = GF256::rand(&mut rng);
            if x == GF256::zero() {
                continue;
            }
            assert_eq!(&x * &x.inverse().unwrap(), GF256::one());
        }
        assert!(GF256::zero().inverse().is_err());
        assert!((&GF256::one() / &GF256::zero()).is_err());
    }

    #[test]
    fn test_sum_and_product() {
        let elements = [GF256(1), GF256(2), GF256(3)];
        assert_eq!(elements.into_iter().sum::<GF256>(), GF256::zero());
        assert_eq!(elements.into_iter().product::<GF256>(), GF256(6));
    }
}
