// Copyright (c), Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Polynomials over [GF256], represented by their coefficients in ascending
//! order of degree. Used by the secret-sharing module.

use crate::gf256::GF256;
use fastcrypto::error::FastCryptoResult;
use itertools::Itertools;
use std::iter::{Product, Sum};
use std::ops::{Add, Div, Mul};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Polynomial(pub(crate) Vec<GF256>);

impl Polynomial {
    pub fn degree(&self) -> usize {
        self.0.len().saturating_sub(1)
    }

    /// Evaluate this polynomial at <i>x</i> using Horner's rule.
    pub fn evaluate(&self, x: &GF256) -> GF256 {
        self.0
            .iter()
            .rev()
            .fold(GF256::zero(), |acc, coefficient| &(&acc * x) + coefficient)
    }

    pub fn zero() -> Self {
        Self(vec![])
    }

    pub fn one() -> Self {
        Self(vec![GF256::one()])
    }

    /// Remove trailing zero coefficients so equal polynomials have equal representations.
    fn normalize(mut self) -> Self {
        while self.0.last() == Some(&GF256::zero()) {
            self.0.pop();
        }
        self
    }

    /// The polynomial <i>x + constant</i>.
    fn monic_linear(constant: GF256) -> Self {
        Self(vec![constant, GF256::one()])
    }

    /// Lagrange interpolation: the unique polynomial of degree < |points| with
    /// `p(x) = y` for all `(x, y)` in `points`. The x-values must be distinct,
    /// otherwise this panics.
    pub fn interpolate(points: &[(GF256, GF256)]) -> Self {
        points
            .iter()
            .enumerate()
            .map(|(j, (x_j, y_j))| {
                points
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != j)
                    .map(|(_, (x_i, _))| {
                        (Self::monic_linear(-x_i) / &(x_j - x_i))
                            .expect("x-values are distinct, so the divisor is nonzero")
                    })
                    .product::<Polynomial>()
                    * y_j
            })
            .sum()
    }
}

impl Add for &Polynomial {
    type Output = Polynomial;

    fn add(self, other: &Polynomial) -> Self::Output {
        Polynomial(
            self.0
                .iter()
                .zip_longest(other.0.iter())
                .map(|pair| match pair.left_and_right() {
                    (Some(a), Some(b)) => a + b,
                    (Some(a), None) => *a,
                    (None, Some(b)) => *b,
                    (None, None) => unreachable!(),
                })
                .collect(),
        )
        .normalize()
    }
}

impl Sum for Polynomial {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Polynomial::zero(), |sum, term| &sum + &term)
    }
}

impl Mul<&GF256> for Polynomial {
    type Output = Polynomial;

    fn mul(self, scalar: &GF256) -> Self::Output {
        Polynomial(self.0.into_iter().map(|c| &c * scalar).collect()).normalize()
    }
}

#[allow(clippy::suspicious_arithmetic_impl)]
impl Mul for &Polynomial {
    type Output = Polynomial;

    fn mul(self, other: &Polynomial) -> Self::Output {
        if self.0.is_empty() || other.0.is_empty() {
            return Polynomial::zero();
        }
        let degree = self.degree() + other.degree();
        Polynomial(
            (0..=degree)
                .map(|i| {
                    (0..=i)
                        .filter(|j| j <= &self.degree() && i - j <= other.degree())
                        .map(|j| &self.0[j] * &other.0[i - j])
                        .sum()
                })
                .collect(),
        )
    }
}

#[allow(clippy::suspicious_arithmetic_impl)]
impl Div<&GF256> for Polynomial {
    type Output = FastCryptoResult<Polynomial>;

    fn div(self, divisor: &GF256) -> Self::Output {
        let inverse = (&GF256::one() / divisor)?;
        Ok(Polynomial(self.0.iter().map(|c| c * &inverse).collect()).normalize())
    }
}

impl Product for Polynomial {
    fn product<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Polynomial::one(), |product, factor| &product * &factor)
    }
}
