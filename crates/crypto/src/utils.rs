// Copyright (c), Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use fastcrypto::error::{FastCryptoError::InvalidInput, FastCryptoResult};
use fastcrypto::traits::AllowedRng;
use itertools::Itertools;

/// XOR two byte arrays of the same fixed length.
pub(crate) fn xor<const N: usize>(a: &[u8; N], b: &[u8; N]) -> [u8; N] {
    let mut result = [0u8; N];
    for (i, byte) in result.iter_mut().enumerate() {
        *byte = a[i] ^ b[i];
    }
    result
}

/// XOR two byte slices. The result is truncated to the shorter of the two inputs.
pub(crate) fn xor_unchecked(a: &[u8], b: &[u8]) -> Vec<u8> {
    a.iter().zip(b).map(|(x, y)| x ^ y).collect()
}

pub(crate) fn generate_random_bytes<R: AllowedRng, const N: usize>(rng: &mut R) -> [u8; N] {
    let mut bytes = [0u8; N];
    rng.fill_bytes(&mut bytes);
    bytes
}

/// Turn N rows of length M into M columns of length N, so
/// `transpose(rows)[j][i] == rows[i][j]`. Fails if there are not exactly N rows
/// or the rows do not all have the same length.
pub(crate) fn transpose<const N: usize>(rows: &[Vec<u8>]) -> FastCryptoResult<Vec<[u8; N]>> {
    if rows.len() != N || rows.is_empty() {
        return Err(InvalidInput);
    }
    let columns = rows
        .iter()
        .map(Vec::len)
        .all_equal_value()
        .map_err(|_| InvalidInput)?;

    Ok((0..columns)
        .map(|j| {
            rows.iter()
                .map(|row| row[j])
                .collect_vec()
                .try_into()
                .expect("there are exactly N rows")
        })
        .collect())
}
