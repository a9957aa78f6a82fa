// Copyright (c), Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! ElGamal encryption over a generic group. Used to wrap user secret keys for
//! transfer: key servers encrypt the derived key under a fresh per-request
//! public key so only the requester can read it.

use fastcrypto::groups::{GroupElement, Scalar};
use fastcrypto::traits::AllowedRng;
use serde::{Deserialize, Serialize};

#[derive(Clone, Serialize, Deserialize)]
pub struct SecretKey<G: GroupElement>(G::ScalarType);

#[derive(Clone, Serialize, Deserialize)]
pub struct PublicKey<G: GroupElement>(G);

/// The secret key lifted into a second group, letting a receiver bind the
/// encryption key to that group's domain if it wishes.
#[derive(Clone, Serialize, Deserialize)]
pub struct VerificationKey<G: GroupElement>(G);

#[derive(Clone, Serialize, Deserialize)]
pub struct Encryption<G: GroupElement>(pub G, pub G);

/// Generate a key triple: the secret key, the public key in `G` and the
/// verification key in `VG`.
pub fn genkey<G: GroupElement, VG: GroupElement<ScalarType = G::ScalarType>, R: AllowedRng>(
    rng: &mut R,
) -> (SecretKey<G>, PublicKey<G>, VerificationKey<VG>) {
    let sk = G::ScalarType::rand(rng);
    (
        SecretKey(sk),
        PublicKey(G::generator() * sk),
        VerificationKey(VG::generator() * sk),
    )
}

pub fn encrypt<G: GroupElement, R: AllowedRng>(
    rng: &mut R,
    msg: &G,
    pk: &PublicKey<G>,
) -> Encryption<G> {
    let r = G::ScalarType::rand(rng);
    Encryption(G::generator() * r, pk.0 * r + msg)
}

pub fn decrypt<G: GroupElement>(sk: &SecretKey<G>, encryption: &Encryption<G>) -> G {
    encryption.1 - encryption.0 * sk.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use fastcrypto::groups::bls12381::{G1Element, G2Element};
    use fastcrypto::groups::GroupElement;
    use rand::thread_rng;

    #[test]
    fn test_encryption_round_trip() {
        let mut rng = thread_rng();
        let (sk, pk, _) = genkey::<G1Element, G2Element, _>(&mut rng);
        let msg = G1Element::generator() * fastcrypto::groups::bls12381::Scalar::rand(&mut rng);
        let encryption = encrypt(&mut rng, &msg, &pk);
        assert_eq!(msg, decrypt(&sk, &encryption));

        // Decryption under another key yields a different point.
        let (other_sk, _, _) = genkey::<G1Element, G2Element, _>(&mut rng);
        assert_ne!(msg, decrypt(&other_sk, &encryption));
    }
}
