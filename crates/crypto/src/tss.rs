// Copyright (c), Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Threshold secret sharing of 32-byte secrets based on Shamir's scheme,
//! applied byte-by-byte over [GF256](crate::gf256::GF256).
//! See <https://dl.acm.org/doi/10.1145/359168.359176>.

use crate::gf256::GF256;
use crate::polynomial::Polynomial;
use crate::utils::transpose;
use fastcrypto::error::FastCryptoError::InvalidInput;
use fastcrypto::error::FastCryptoResult;
use fastcrypto::traits::AllowedRng;
use itertools::Itertools;
use std::iter::repeat_with;

pub struct SecretSharing<const N: usize> {
    pub(crate) secret: [u8; N],
    pub(crate) indices: Vec<u8>,
    pub(crate) shares: Vec<[u8; N]>,
}

impl<const N: usize> SecretSharing<N> {
    pub fn shares(&self) -> &[[u8; N]] {
        &self.shares
    }

    pub fn indices(&self) -> &[u8] {
        &self.indices
    }

    pub fn secret(&self) -> &[u8; N] {
        &self.secret
    }
}

/// Split `secret` into `number_of_shares` shares such that any `threshold` of
/// them reconstruct it. Shares get the indices 1, ..., `number_of_shares` as
/// x-coordinates. For `threshold` 1 all share values equal the secret (a
/// degree-0 polynomial), distinguished only by their index.
///
/// Fails if `threshold` is zero or larger than `number_of_shares`.
pub fn split<R: AllowedRng, const N: usize>(
    rng: &mut R,
    secret: [u8; N],
    threshold: u8,
    number_of_shares: u8,
) -> FastCryptoResult<SecretSharing<N>> {
    if threshold > number_of_shares || threshold == 0 {
        return Err(InvalidInput);
    }

    let indices = (1..=number_of_shares).collect_vec();

    // Each byte of the secret is shared with an independent polynomial.
    let byte_shares = secret
        .iter()
        .map(|byte| split_byte(rng, *byte, threshold, &indices))
        .collect::<FastCryptoResult<Vec<_>>>()?;

    let shares = transpose(&byte_shares)?;

    Ok(SecretSharing {
        secret,
        indices,
        shares,
    })
}

/// Reconstruct the secret from a set of shares.
/// If fewer than `threshold` shares are given or some shares are corrupted, the
/// result will be wrong but _no_ error is returned. An [InvalidInput] error is
/// only returned if the share set is empty or the indices are invalid.
pub fn combine<const N: usize>(shares: &[(u8, [u8; N])]) -> FastCryptoResult<[u8; N]> {
    Ok((0..N)
        .map(|i| combine_byte(&shares.iter().map(|(index, share)| (*index, share[i])).collect_vec()))
        .collect::<FastCryptoResult<Vec<_>>>()?
        .try_into()
        .expect("fixed length"))
}

/// Interpolate the sharing polynomials through the given shares and return a
/// closure that evaluates them at a given point. Note that evaluating at 0
/// yields the secret. Fails if the share set is empty or the indices are not
/// unique and nonzero.
pub fn interpolate<const N: usize>(
    shares: &[(u8, [u8; N])],
) -> FastCryptoResult<impl Fn(u8) -> [u8; N]> {
    if shares.is_empty()
        || shares.iter().any(|(index, _)| *index == 0)
        || !shares.iter().map(|(index, _)| index).all_unique()
    {
        return Err(InvalidInput);
    }

    let polynomials: Vec<Polynomial> = (0..N)
        .map(|i| {
            Polynomial::interpolate(
                &shares
                    .iter()
                    .map(|(index, share)| (GF256(*index), GF256(share[i])))
                    .collect_vec(),
            )
        })
        .collect();

    Ok(move |x: u8| {
        polynomials
            .iter()
            .map(|p| p.evaluate(&GF256(x)).into())
            .collect_vec()
            .try_into()
            .expect("fixed length")
    })
}

/// Share a single byte: sample a random polynomial of degree `threshold - 1`
/// with the secret as constant term and evaluate it at the given indices.
fn split_byte<R: AllowedRng>(
    rng: &mut R,
    secret: u8,
    threshold: u8,
    indices: &[u8],
) -> FastCryptoResult<Vec<u8>> {
    let number_of_shares = indices.len() as u8;
    if threshold == 0
        || number_of_shares == 0
        || threshold > number_of_shares
        || indices.iter().any(|index| *index == 0)
        || !indices.iter().all_unique()
    {
        return Err(InvalidInput);
    }

    let mut coefficients = Vec::with_capacity(threshold as usize);
    coefficients.push(GF256::from(secret));
    coefficients.extend(repeat_with(|| GF256::rand(rng)).take((threshold - 1) as usize));
    let polynomial = Polynomial(coefficients);

    Ok(indices
        .iter()
        .map(|index| polynomial.evaluate(&index.into()).into())
        .collect())
}

/// Reconstruct a single byte by Lagrange interpolation at x = 0.
fn combine_byte(shares: &[(u8, u8)]) -> FastCryptoResult<u8> {
    if shares.is_empty()
        || !shares.iter().map(|(index, _)| index).all_unique()
        || shares.iter().any(|(index, _)| *index == 0)
    {
        return Err(InvalidInput);
    }
    let product: GF256 = shares.iter().map(|(index, _)| GF256::from(index)).product();
    let quotient: GF256 = shares
        .iter()
        .map(|(i, share)| {
            let denominator = &GF256::from(i)
                * &shares
                    .iter()
                    .map(|(j, _)| j)
                    .filter(|j| j != &i)
                    .map(|j| &GF256::from(j) - &GF256::from(i))
                    .product();
            (&GF256::from(share) / &denominator).expect("nonzero by the checks above")
        })
        .sum();
    Ok((&product * &quotient).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::thread_rng;

    #[test]
    fn test_combine_byte() {
        let shares = vec![(1, 2), (2, 3), (3, 4), (4, 5)];
        assert_eq!(combine_byte(&shares).unwrap(), 202);
    }

    #[test]
    fn test_split_and_combine() {
        let secret = *b"For sale: baby shoes, never worn";

        let SecretSharing {
            indices, shares, ..
        } = split(&mut thread_rng(), secret, 3, 5).unwrap();

        // Any three shares reconstruct the secret.
        for range in [0..3, 1..4, 2..5] {
            assert_eq!(
                secret,
                combine(&range.map(|i| (indices[i], shares[i])).collect_vec()).unwrap()
            );
        }
        // More than three also work.
        assert_eq!(
            secret,
            combine(&(0..5).map(|i| (indices[i], shares[i])).collect_vec()).unwrap()
        );

        // Two shares reconstruct garbage, silently.
        assert_ne!(
            secret,
            combine(&(0..2).map(|i| (indices[i], shares[i])).collect_vec()).unwrap()
        );
    }

    #[test]
    fn test_degenerate_threshold() {
        let secret = [42u8; 32];
        let SecretSharing {
            indices, shares, ..
        } = split(&mut thread_rng(), secret, 1, 3).unwrap();

        // With threshold 1 every share value is the secret itself, under distinct indices.
        assert_eq!(indices, vec![1, 2, 3]);
        assert!(shares.iter().all(|share| share == &secret));
        for i in 0..3 {
            assert_eq!(secret, combine(&[(indices[i], shares[i])]).unwrap());
        }
    }

    #[test]
    fn test_invalid_inputs() {
        let mut rng = thread_rng();
        assert!(split(&mut rng, [0u8; 32], 0, 3).is_err());
        assert!(split(&mut rng, [0u8; 32], 4, 3).is_err());

        let share1 = [1u8; 32];
        let share2 = [2u8; 32];
        // Duplicate indices.
        assert!(combine(&[(1u8, share1), (1u8, share2)]).is_err());
        // Index zero would leak the secret position.
        assert!(combine(&[(0u8, share1)]).is_err());
        // Empty share set.
        assert!(combine::<32>(&[]).is_err());
        assert!(interpolate::<32>(&[]).is_err());
    }

    #[test]
    fn test_interpolate_matches_shares() {
        let secret = [7u8; 32];
        let SecretSharing {
            indices, shares, ..
        } = split(&mut thread_rng(), secret, 2, 4).unwrap();

        let polynomial = interpolate(&[(indices[0], shares[0]), (indices[1], shares[1])]).unwrap();
        assert_eq!(polynomial(0), secret);
        for i in 0..4 {
            assert_eq!(polynomial(indices[i]), shares[i]);
        }
    }
}
