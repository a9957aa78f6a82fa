// Copyright (c), Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Boneh-Franklin identity-based encryption (<https://eprint.iacr.org/2001/090>)
//! over the BLS12-381 curve construction. A batch of fixed-size messages (the
//! key shares) is encrypted for one identity under many public keys, all
//! sharing a single encryption randomness.

use crate::utils::xor;
use crate::{DST_POP, KEY_SIZE};
use fastcrypto::error::FastCryptoError::{GeneralError, InvalidInput};
use fastcrypto::error::FastCryptoResult;
use fastcrypto::groups::bls12381::{G1Element, G2Element, GTElement, Scalar};
use fastcrypto::groups::{GroupElement, HashToGroupElement, Pairing, Scalar as GenericScalar};
use fastcrypto::hmac::{hkdf_sha3_256, HkdfIkm};
use fastcrypto::serde_helpers::ToFromByteArray;
use fastcrypto::traits::AllowedRng;
use fastcrypto::traits::ToFromBytes;

pub type MasterKey = Scalar;
pub type PublicKey = G2Element;
pub type UserSecretKey = G1Element;
pub type Nonce = G2Element;
pub type Plaintext = [u8; KEY_SIZE];
pub type Ciphertext = [u8; KEY_SIZE];
pub type Randomness = Scalar;

const GT_ELEMENT_BYTE_LENGTH: usize = 576;

/// Generate a key pair consisting of a master key and a public key.
pub fn generate_key_pair<R: AllowedRng>(rng: &mut R) -> (MasterKey, PublicKey) {
    let sk = Scalar::rand(rng);
    (sk, public_key_from_master_key(&sk))
}

/// Derive a public key from a master key.
pub fn public_key_from_master_key(master_key: &MasterKey) -> PublicKey {
    G2Element::generator() * master_key
}

/// Extract a user secret key from a master key and an id.
pub fn extract(master_key: &MasterKey, id: &[u8]) -> UserSecretKey {
    G1Element::hash_to_group_element(id) * master_key
}

/// Verify that a user secret key is valid for a given public key and id by
/// checking the pairing relation <i>e(usk, g₂) = e(H(id), pk)</i>.
pub fn verify_user_secret_key(
    user_secret_key: &UserSecretKey,
    id: &[u8],
    public_key: &PublicKey,
) -> FastCryptoResult<()> {
    if user_secret_key.pairing(&G2Element::generator())
        == G1Element::hash_to_group_element(id).pairing(public_key)
    {
        Ok(())
    } else {
        Err(InvalidInput)
    }
}

/// Encrypt a batch of messages for the same identity under different public
/// keys, all using the given randomness. The share index of each message is
/// the info used for its key derivation, so the same identity and public key
/// can carry multiple shares.
pub fn encrypt_batched_deterministic(
    randomness: &Randomness,
    plaintexts: &[Plaintext],
    public_keys: &[PublicKey],
    id: &[u8],
    indices: &[u8],
) -> FastCryptoResult<(Nonce, Vec<Ciphertext>)> {
    let batch_size = plaintexts.len();
    if batch_size != public_keys.len() || batch_size != indices.len() {
        return Err(InvalidInput);
    }

    let gid_r = G1Element::hash_to_group_element(id) * randomness;
    let nonce = G2Element::generator() * randomness;
    Ok((
        nonce,
        (0..batch_size)
            .map(|i| {
                xor(
                    &plaintexts[i],
                    &kdf(&gid_r.pairing(&public_keys[i]), &[indices[i]]),
                )
            })
            .collect(),
    ))
}

/// Decrypt a single message with a user secret key and the encapsulation.
/// The index must be the share index used for the encryption.
pub fn decrypt(
    nonce: &Nonce,
    ciphertext: &Ciphertext,
    secret_key: &UserSecretKey,
    index: u8,
) -> Plaintext {
    xor(ciphertext, &kdf(&secret_key.pairing(nonce), &[index]))
}

/// Decrypt a single message using the encryption randomness instead of a user
/// secret key. Used to recompute all shares for the consistency check.
pub fn decrypt_deterministic(
    randomness: &Randomness,
    ciphertext: &Ciphertext,
    public_key: &PublicKey,
    id: &[u8],
    index: u8,
) -> FastCryptoResult<Plaintext> {
    let gid_r = G1Element::hash_to_group_element(id) * randomness;
    Ok(xor(
        ciphertext,
        &kdf(&gid_r.pairing(public_key), &[index]),
    ))
}

/// Verify that the given randomness was used to create the nonce.
fn verify_nonce(randomness: &Randomness, nonce: &Nonce) -> FastCryptoResult<()> {
    if G2Element::generator() * randomness != *nonce {
        return Err(GeneralError("Invalid randomness".to_string()));
    }
    Ok(())
}

/// Derive a symmetric key from a pairing output.
///
/// The serialized GT element consists of six coefficient blocks of 96 bytes
/// which are reordered to the layout the on-chain verifier uses before being
/// fed into HKDF-SHA3-256.
fn kdf(input: &GTElement, info: &[u8]) -> [u8; KEY_SIZE] {
    const BLOCK_SIZE: usize = GT_ELEMENT_BYTE_LENGTH / 6;
    const LAYOUT: [usize; 6] = [0, 2, 4, 1, 3, 5];

    let bytes = input.to_byte_array();
    let mut reordered = [0u8; GT_ELEMENT_BYTE_LENGTH];
    for (position, block) in LAYOUT.iter().enumerate() {
        reordered[position * BLOCK_SIZE..(position + 1) * BLOCK_SIZE]
            .copy_from_slice(&bytes[block * BLOCK_SIZE..(block + 1) * BLOCK_SIZE]);
    }

    hkdf_sha3_256(
        &HkdfIkm::from_bytes(&reordered).expect("not fixed length"),
        &[], // no salt
        info,
        KEY_SIZE,
    )
    .expect("valid output length")
    .try_into()
    .expect("same length")
}

/// Mask the encryption randomness with a key derived from the base key.
pub fn encrypt_randomness(randomness: &Randomness, key: &[u8; KEY_SIZE]) -> [u8; KEY_SIZE] {
    xor(key, &randomness.to_byte_array())
}

/// Unmask the encryption randomness and verify that it was used to create the
/// given nonce.
pub fn decrypt_and_verify_nonce(
    encrypted_randomness: &[u8; KEY_SIZE],
    derived_key: &[u8; KEY_SIZE],
    nonce: &Nonce,
) -> FastCryptoResult<Randomness> {
    let randomness = Scalar::from_byte_array(&xor(derived_key, encrypted_randomness))?;
    verify_nonce(&randomness, nonce).map(|()| randomness)
}

pub type ProofOfPossession = G1Element;

/// The message signed by a proof-of-possession: the domain separation tag, the
/// raw 96-byte public key, and the binding message.
fn proof_of_possession_message(public_key: &PublicKey, message: &[u8]) -> Vec<u8> {
    let mut full_message = DST_POP.to_vec();
    full_message.extend_from_slice(&public_key.to_byte_array());
    full_message.extend_from_slice(message);
    full_message
}

/// Create a proof-of-possession of the master key, binding it to the given
/// message. It is a BLS signature over the public key and the message.
pub fn create_proof_of_possession(master_key: &MasterKey, message: &[u8]) -> ProofOfPossession {
    let public_key = public_key_from_master_key(master_key);
    G1Element::hash_to_group_element(&proof_of_possession_message(&public_key, message))
        * master_key
}

/// Verify a proof-of-possession of the master key behind `public_key`.
pub fn verify_proof_of_possession(
    proof: &ProofOfPossession,
    public_key: &PublicKey,
    message: &[u8],
) -> FastCryptoResult<()> {
    let full_message = proof_of_possession_message(public_key, message);
    if proof.pairing(&G2Element::generator())
        == G1Element::hash_to_group_element(&full_message).pairing(public_key)
    {
        Ok(())
    } else {
        Err(InvalidInput)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::thread_rng;

    #[test]
    fn test_kdf_regression() {
        let x = G1Element::generator().pairing(&(G2Element::generator() * Scalar::from(12345u128)));
        let derived_key = kdf(&x, &[]);
        let expected =
            hex::decode("55e99a131b254f1687727bbf1f255e73bb80fcfac8901c371e53df32f45c1fb3")
                .unwrap();
        assert_eq!(expected, derived_key);
    }

    #[test]
    fn test_encrypt_decrypt_round_trip() {
        let mut rng = thread_rng();
        let id = b"some identity";
        let keypairs = (0..3).map(|_| generate_key_pair(&mut rng)).collect::<Vec<_>>();
        let public_keys = keypairs.iter().map(|(_, pk)| *pk).collect::<Vec<_>>();
        let plaintexts: Vec<Plaintext> = (1..=3u8).map(|i| [i; KEY_SIZE]).collect();
        let indices = [1u8, 2, 3];

        let randomness = Randomness::rand(&mut rng);
        let (nonce, ciphertexts) =
            encrypt_batched_deterministic(&randomness, &plaintexts, &public_keys, id, &indices)
                .unwrap();

        for i in 0..3 {
            let usk = extract(&keypairs[i].0, id);
            assert_eq!(
                plaintexts[i],
                decrypt(&nonce, &ciphertexts[i], &usk, indices[i])
            );
            // Decryption with the randomness gives the same result.
            assert_eq!(
                plaintexts[i],
                decrypt_deterministic(&randomness, &ciphertexts[i], &public_keys[i], id, indices[i])
                    .unwrap()
            );
        }
    }

    #[test]
    fn test_verify_user_secret_key() {
        let mut rng = thread_rng();
        let id = b"some identity";
        let (master_key, public_key) = generate_key_pair(&mut rng);
        let usk = extract(&master_key, id);
        assert!(verify_user_secret_key(&usk, id, &public_key).is_ok());

        // A key for a different identity does not verify.
        assert!(verify_user_secret_key(&usk, b"other identity", &public_key).is_err());

        // Neither does a key for a different master key.
        let (_, other_public_key) = generate_key_pair(&mut rng);
        assert!(verify_user_secret_key(&usk, id, &other_public_key).is_err());
    }

    #[test]
    fn test_encrypted_randomness_round_trip() {
        let mut rng = thread_rng();
        let randomness = Randomness::rand(&mut rng);
        let nonce = G2Element::generator() * randomness;
        let key = [7u8; KEY_SIZE];

        let encrypted = encrypt_randomness(&randomness, &key);
        assert_eq!(
            randomness,
            decrypt_and_verify_nonce(&encrypted, &key, &nonce).unwrap()
        );

        // A wrong key either fails to parse as a scalar or fails the nonce check.
        let wrong_key = [8u8; KEY_SIZE];
        assert!(decrypt_and_verify_nonce(&encrypted, &wrong_key, &nonce).is_err());
    }

    #[test]
    fn test_proof_of_possession() {
        let mut rng = thread_rng();
        let (master_key, public_key) = generate_key_pair(&mut rng);
        let message = [1u8, 2, 3];

        let proof = create_proof_of_possession(&master_key, &message);
        assert!(verify_proof_of_possession(&proof, &public_key, &message).is_ok());
        assert!(verify_proof_of_possession(&proof, &public_key, &[4u8, 5, 6]).is_err());

        let (_, other_public_key) = generate_key_pair(&mut rng);
        assert!(verify_proof_of_possession(&proof, &other_public_key, &message).is_err());
    }
}
