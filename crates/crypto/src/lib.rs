// Copyright (c), Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Cryptographic core for identity-based threshold encryption: a payload is
//! encrypted under a fresh symmetric key, the key is secret-shared, and each
//! share is IBE-encrypted to one key server. At least `threshold` shares are
//! needed to reconstruct the key and decrypt the payload.

use crate::dem::Hmac256Ctr;
use crate::ibe::{decrypt_deterministic, encrypt_batched_deterministic};
use crate::tss::{combine, interpolate, SecretSharing};
use dem::Aes256Gcm;
use fastcrypto::error::FastCryptoError::{GeneralError, InvalidInput};
use fastcrypto::error::FastCryptoResult;
use fastcrypto::groups::Scalar;
use fastcrypto::hmac::{hmac_sha3_256, HmacKey};
use fastcrypto::traits::ToFromBytes;
use itertools::Itertools;
use rand::thread_rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tss::split;

pub mod dem;
pub mod elgamal;
pub mod gf256;
pub mod ibe;
mod polynomial;
pub mod prefixed_hex;
pub mod tss;
mod utils;

pub use sui_sdk_types::ObjectId;

/// The domain separation tag for the hash-to-group function.
pub const DST: &[u8] = b"SUI-SEAL-IBE-BLS12381-00";

/// The domain separation tag for proofs-of-possession of master keys.
pub const DST_POP: &[u8] = b"SUI-SEAL-IBE-BLS12381-POP-00";

pub const KEY_SIZE: usize = 32;

/// An encrypted object: the envelope holding the payload ciphertext and the
/// per-server encrypted key shares. The BCS serialization of this struct is
/// the wire and storage format, so any layout change requires a version bump.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EncryptedObject {
    pub version: u8,
    pub package_id: ObjectId,
    pub id: Vec<u8>,
    // The address of a key server + the index of the share held by this server.
    // A server may appear multiple times and then holds multiple shares.
    pub services: Vec<(ObjectId, u8)>,
    pub threshold: u8,
    pub encrypted_shares: IBEEncryptions,
    pub ciphertext: Ciphertext,
}

impl EncryptedObject {
    /// Serialize to the canonical wire format.
    pub fn to_bytes(&self) -> Vec<u8> {
        bcs::to_bytes(self).expect("serialization never fails")
    }

    /// Parse the canonical wire format. Fails with [InvalidInput] on unknown
    /// versions or discriminators, truncated input, non-canonical curve
    /// points, a threshold outside `[1, |services|]`, or a share count that
    /// does not match the service count.
    pub fn from_bytes(bytes: &[u8]) -> FastCryptoResult<Self> {
        let object: Self = bcs::from_bytes(bytes).map_err(|_| InvalidInput)?;
        object.validate()?;
        Ok(object)
    }

    fn validate(&self) -> FastCryptoResult<()> {
        if self.version != 0 {
            return Err(InvalidInput);
        }
        let number_of_services = self.services.len();
        if number_of_services == 0 || number_of_services > u8::MAX as usize {
            return Err(InvalidInput);
        }
        if self.threshold == 0 || self.threshold as usize > number_of_services {
            return Err(InvalidInput);
        }
        match &self.encrypted_shares {
            IBEEncryptions::BonehFranklinBLS12381 {
                encrypted_shares, ..
            } => {
                if encrypted_shares.len() != number_of_services {
                    return Err(InvalidInput);
                }
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Ciphertext {
    Aes256Gcm {
        blob: Vec<u8>,
        aad: Option<Vec<u8>>,
    },
    Hmac256Ctr {
        blob: Vec<u8>,
        aad: Option<Vec<u8>>,
        mac: [u8; KEY_SIZE],
    },
    Plain,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum IBEEncryptions {
    BonehFranklinBLS12381 {
        nonce: ibe::Nonce,
        encrypted_shares: Vec<[u8; KEY_SIZE]>,
        encrypted_randomness: [u8; KEY_SIZE],
    },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum IBEPublicKeys {
    BonehFranklinBLS12381(Vec<ibe::PublicKey>),
}

pub enum IBEUserSecretKeys {
    BonehFranklinBLS12381(HashMap<ObjectId, ibe::UserSecretKey>),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum EncryptionInput {
    Aes256Gcm { data: Vec<u8>, aad: Option<Vec<u8>> },
    Hmac256Ctr { data: Vec<u8>, aad: Option<Vec<u8>> },
    Plain,
}

/// Encrypt the given plaintext. This is done as follows:
///  - Generate a random base key and derive the DEM key from it,
///  - Encrypt the message under the DEM key,
///  - Secret share the base key with one share per key server,
///  - For each key server, encrypt the share using IBE,
///  - Mask the encryption randomness with a second key derived from the base key.
///
/// @param package_id The package id.
/// @param id The inner id.
/// @param key_servers The key servers to use for the encryption.
/// @param public_keys The public keys of the key servers, in the same order.
/// @param threshold The threshold for the secret sharing.
/// @param encryption_input The payload and the DEM mode to use.
/// @return The encrypted object and the derived symmetric key. The latter may
/// be kept by the caller as a backup but must not be shared.
pub fn seal_encrypt(
    package_id: ObjectId,
    id: Vec<u8>,
    key_servers: Vec<ObjectId>,
    public_keys: &IBEPublicKeys,
    threshold: u8,
    encryption_input: EncryptionInput,
) -> FastCryptoResult<(EncryptedObject, [u8; KEY_SIZE])> {
    let number_of_shares = u8::try_from(key_servers.len()).map_err(|_| InvalidInput)?;
    if threshold > number_of_shares || threshold == 0 {
        return Err(InvalidInput);
    }

    let mut rng = thread_rng();
    let full_id = create_full_id(package_id.inner(), &id);

    let base_key = dem::generate_key(&mut rng);

    // Derive the key used by the DEM.
    let dem_key = derive_key(KeyPurpose::DEM, &base_key);
    let ciphertext = match encryption_input {
        EncryptionInput::Aes256Gcm { data, aad } => Ciphertext::Aes256Gcm {
            blob: Aes256Gcm::encrypt(&data, aad.as_deref().unwrap_or(&[]), &dem_key),
            aad,
        },
        EncryptionInput::Hmac256Ctr { data, aad } => {
            let (blob, mac) = Hmac256Ctr::encrypt(&data, aad.as_deref().unwrap_or(&[]), &dem_key);
            Ciphertext::Hmac256Ctr { blob, mac, aad }
        }
        EncryptionInput::Plain => Ciphertext::Plain,
    };

    // Secret share the base key.
    let SecretSharing {
        indices, shares, ..
    } = split(&mut rng, base_key, threshold, number_of_shares)?;

    let services: Vec<_> = key_servers.into_iter().zip(indices.iter().copied()).collect();

    let encrypted_shares = match public_keys {
        IBEPublicKeys::BonehFranklinBLS12381(public_keys) => {
            if public_keys.len() != number_of_shares as usize {
                return Err(InvalidInput);
            }
            let randomness = ibe::Randomness::rand(&mut rng);

            // Encrypt the shares using the IBE keys. The share index binds a
            // share to its position, so shares for the same identity may be
            // encrypted to the same public key.
            let (nonce, encrypted_shares) = encrypt_batched_deterministic(
                &randomness,
                &shares,
                public_keys,
                &full_id,
                &indices,
            )?;

            let encrypted_randomness = ibe::encrypt_randomness(
                &randomness,
                &derive_key(KeyPurpose::EncryptedRandomness, &base_key),
            );
            IBEEncryptions::BonehFranklinBLS12381 {
                nonce,
                encrypted_shares,
                encrypted_randomness,
            }
        }
    };

    Ok((
        EncryptedObject {
            version: 0,
            package_id,
            id,
            services,
            threshold,
            encrypted_shares,
            ciphertext,
        },
        dem_key,
    ))
}

/// Decrypt the given encrypted object:
///  - Decapsulate the IBE keys for the given nonce and user secret keys,
///  - Decrypt the shares,
///  - Reconstruct the base key from at least `threshold` shares,
///  - Derive the DEM key and decrypt the payload.
///
/// @param encrypted_object The encrypted object. See [seal_encrypt].
/// @param user_secret_keys The user secret keys, assumed to be verified by the
/// caller. With unverified keys the decryption fails, or, for `Plain` mode,
/// yields a wrong key.
/// @param public_keys The public keys of the key servers. If given, all shares
/// are decrypted and checked for consistency.
/// @return The plaintext, or the derived key if `Plain` mode was used.
pub fn seal_decrypt(
    encrypted_object: &EncryptedObject,
    user_secret_keys: &IBEUserSecretKeys,
    public_keys: Option<&IBEPublicKeys>,
) -> FastCryptoResult<Vec<u8>> {
    encrypted_object.validate()?;
    let EncryptedObject {
        package_id,
        id,
        encrypted_shares,
        services,
        threshold,
        ciphertext,
        ..
    } = encrypted_object;

    let full_id = create_full_id(package_id.inner(), id);

    // Decapsulate the IBE keys and decrypt the shares for which a user secret
    // key is available.
    let shares = match (&encrypted_shares, user_secret_keys) {
        (
            IBEEncryptions::BonehFranklinBLS12381 {
                nonce,
                encrypted_shares,
                ..
            },
            IBEUserSecretKeys::BonehFranklinBLS12381(user_secret_keys),
        ) => {
            let usable: Vec<usize> = services
                .iter()
                .enumerate()
                .filter(|(_, (object_id, _))| user_secret_keys.contains_key(object_id))
                .map(|(i, _)| i)
                .collect();
            if usable.len() < *threshold as usize {
                return Err(InvalidInput);
            }

            usable
                .into_iter()
                .map(|i| {
                    let (object_id, index) = services[i];
                    let user_secret_key = user_secret_keys
                        .get(&object_id)
                        .expect("filtered by key availability above");
                    (
                        index,
                        ibe::decrypt(nonce, &encrypted_shares[i], user_secret_key, index),
                    )
                })
                .collect_vec()
        }
    };

    let base_key = combine(&shares)?;

    // If the public keys are given, decrypt all shares and check consistency.
    if let Some(public_keys) = public_keys {
        encrypted_shares.check_share_consistency(&shares, &full_id, services, public_keys, &base_key)?;
    }

    let dem_key = derive_key(KeyPurpose::DEM, &base_key);
    match ciphertext {
        Ciphertext::Aes256Gcm { blob, aad } => {
            Aes256Gcm::decrypt(blob, aad.as_deref().unwrap_or(&[]), &dem_key)
        }
        Ciphertext::Hmac256Ctr { blob, aad, mac } => {
            Hmac256Ctr::decrypt(blob, mac, aad.as_deref().unwrap_or(&[]), &dem_key)
        }
        Ciphertext::Plain => Ok(dem_key.to_vec()),
    }
}

/// Create a full id from the [DST], a package id and an inner id. The result
/// has the format `[len(DST)][DST][package_id][id]`, and the leading length
/// byte is part of the contract with the on-chain verifier.
pub fn create_full_id(package_id: &[u8; 32], id: &[u8]) -> Vec<u8> {
    assert!(DST.len() < 256);
    let mut full_id = vec![DST.len() as u8];
    full_id.extend_from_slice(DST);
    full_id.extend_from_slice(package_id);
    full_id.extend_from_slice(id);
    full_id
}

/// The different purposes of keys derived from the base key.
pub enum KeyPurpose {
    /// The key used to mask the encryption randomness.
    EncryptedRandomness,
    /// The key used by the DEM.
    DEM,
}

/// Derive a key for a specific purpose from the base key.
pub fn derive_key(purpose: KeyPurpose, base_key: &[u8; KEY_SIZE]) -> [u8; KEY_SIZE] {
    let hmac_key = HmacKey::from_bytes(base_key).expect("fixed length");
    match purpose {
        KeyPurpose::EncryptedRandomness => hmac_sha3_256(&hmac_key, &[0]).digest,
        KeyPurpose::DEM => hmac_sha3_256(&hmac_key, &[1]).digest,
    }
}

impl IBEEncryptions {
    /// Given the decrypted shares and the reconstructed base key, check that
    /// all shares in this object are consistent, i.e., that every subset of
    /// `threshold` shares reconstructs the same polynomial.
    fn check_share_consistency(
        &self,
        shares: &[(u8, [u8; KEY_SIZE])],
        full_id: &[u8],
        services: &[(ObjectId, u8)],
        public_keys: &IBEPublicKeys,
        base_key: &[u8; KEY_SIZE],
    ) -> FastCryptoResult<()> {
        // Compute the entire polynomial from the given shares. Note that
        // polynomial(0) = base_key.
        let polynomial = interpolate(shares)?;

        let all_shares = self.decrypt_all_shares(full_id, services, public_keys, base_key)?;

        if all_shares
            .into_iter()
            .any(|(index, share)| polynomial(index) != share)
        {
            return Err(GeneralError("Inconsistent shares".to_string()));
        }
        Ok(())
    }

    /// Given the base key, unmask the randomness and decrypt all shares.
    fn decrypt_all_shares(
        &self,
        full_id: &[u8],
        services: &[(ObjectId, u8)],
        public_keys: &IBEPublicKeys,
        base_key: &[u8; KEY_SIZE],
    ) -> FastCryptoResult<Vec<(u8, [u8; KEY_SIZE])>> {
        match self {
            IBEEncryptions::BonehFranklinBLS12381 {
                encrypted_randomness,
                encrypted_shares,
                nonce,
            } => {
                let randomness = ibe::decrypt_and_verify_nonce(
                    encrypted_randomness,
                    &derive_key(KeyPurpose::EncryptedRandomness, base_key),
                    nonce,
                )?;

                match public_keys {
                    IBEPublicKeys::BonehFranklinBLS12381(public_keys) => {
                        if public_keys.len() != encrypted_shares.len() {
                            return Err(InvalidInput);
                        }
                        public_keys
                            .iter()
                            .zip(encrypted_shares)
                            .zip(services)
                            .map(|((public_key, share), (_, index))| {
                                decrypt_deterministic(
                                    &randomness,
                                    share,
                                    public_key,
                                    full_id,
                                    *index,
                                )
                                .map(|share| (*index, share))
                            })
                            .collect::<FastCryptoResult<_>>()
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::generate_random_bytes;
    use fastcrypto::groups::bls12381::G1Element;
    use fastcrypto::groups::HashToGroupElement;
    use fastcrypto::serde_helpers::ToFromByteArray;
    use rand::rngs::ThreadRng;

    fn random_object_id(rng: &mut ThreadRng) -> ObjectId {
        ObjectId::new(generate_random_bytes(rng))
    }

    fn test_setup(
        number_of_servers: usize,
    ) -> (
        Vec<(ibe::MasterKey, ibe::PublicKey)>,
        Vec<ObjectId>,
        IBEPublicKeys,
    ) {
        let mut rng = thread_rng();
        let keypairs = (0..number_of_servers)
            .map(|_| ibe::generate_key_pair(&mut rng))
            .collect_vec();
        let services = (0..number_of_servers)
            .map(|_| random_object_id(&mut rng))
            .collect_vec();
        let public_keys =
            IBEPublicKeys::BonehFranklinBLS12381(keypairs.iter().map(|(_, pk)| *pk).collect_vec());
        (keypairs, services, public_keys)
    }

    fn extract_all(
        keypairs: &[(ibe::MasterKey, ibe::PublicKey)],
        services: &[ObjectId],
        full_id: &[u8],
    ) -> HashMap<ObjectId, ibe::UserSecretKey> {
        services
            .iter()
            .zip(keypairs)
            .map(|(service, (master_key, _))| (*service, ibe::extract(master_key, full_id)))
            .collect()
    }

    #[test]
    fn test_hash_with_prefix_regression() {
        let hash = G1Element::hash_to_group_element(&create_full_id(&[0u8; 32], &[1, 2, 3, 4]));
        assert_eq!(
            hex::encode(hash.to_byte_array()),
            "b32685b6ffd1f373faf3abb10c05772e033f75da8af729c3611d81aea845670db48ceadd0132d3a667dbbaa36acefac7"
        );
    }

    #[test]
    fn test_encryption_round_trip_aes() {
        let data = b"My super secret message";
        let package_id = ObjectId::new([0u8; 32]);
        let id = vec![1, 2, 3, 4];
        let full_id = create_full_id(package_id.inner(), &id);

        let (keypairs, services, public_keys) = test_setup(3);

        let encrypted = seal_encrypt(
            package_id,
            id,
            services.clone(),
            &public_keys,
            2,
            EncryptionInput::Aes256Gcm {
                data: data.to_vec(),
                aad: Some(b"something".to_vec()),
            },
        )
        .unwrap()
        .0;

        // The envelope round-trips through the codec.
        let parsed = EncryptedObject::from_bytes(&encrypted.to_bytes()).unwrap();
        assert_eq!(parsed, encrypted);

        let user_secret_keys =
            IBEUserSecretKeys::BonehFranklinBLS12381(extract_all(&keypairs, &services, &full_id));
        let decrypted = seal_decrypt(&encrypted, &user_secret_keys, Some(&public_keys)).unwrap();
        assert_eq!(data, decrypted.as_slice());

        // Decryption fails with a different aad.
        let mut modified = encrypted.clone();
        match modified.ciphertext {
            Ciphertext::Aes256Gcm { ref mut aad, .. } => {
                aad.as_mut().unwrap().push(0);
            }
            _ => panic!(),
        }
        assert!(seal_decrypt(&modified, &user_secret_keys, Some(&public_keys)).is_err());
    }

    #[test]
    fn test_encryption_round_trip_hmac() {
        let data = b"My super secret message";
        let mut rng = thread_rng();
        let package_id = random_object_id(&mut rng);
        let id = vec![1, 2, 3, 4];
        let full_id = create_full_id(package_id.inner(), &id);

        let (keypairs, services, public_keys) = test_setup(3);

        let encrypted = seal_encrypt(
            package_id,
            id,
            services.clone(),
            &public_keys,
            2,
            EncryptionInput::Hmac256Ctr {
                data: data.to_vec(),
                aad: Some(b"something".to_vec()),
            },
        )
        .unwrap()
        .0;

        let user_secret_keys =
            IBEUserSecretKeys::BonehFranklinBLS12381(extract_all(&keypairs, &services, &full_id));
        let decrypted = seal_decrypt(&encrypted, &user_secret_keys, Some(&public_keys)).unwrap();
        assert_eq!(data, decrypted.as_slice());

        let mut modified = encrypted.clone();
        match modified.ciphertext {
            Ciphertext::Hmac256Ctr { ref mut aad, .. } => {
                aad.as_mut().unwrap().push(0);
            }
            _ => panic!(),
        }
        assert!(seal_decrypt(&modified, &user_secret_keys, Some(&public_keys)).is_err());
    }

    #[test]
    fn test_plain_round_trip() {
        let mut rng = thread_rng();
        let package_id = random_object_id(&mut rng);
        let id = vec![1, 2, 3, 4];
        let full_id = create_full_id(package_id.inner(), &id);

        let (keypairs, services, public_keys) = test_setup(3);

        let (encrypted, key) = seal_encrypt(
            package_id,
            id,
            services.clone(),
            &public_keys,
            2,
            EncryptionInput::Plain,
        )
        .unwrap();

        let user_secret_keys =
            IBEUserSecretKeys::BonehFranklinBLS12381(extract_all(&keypairs, &services, &full_id));
        assert_eq!(
            key.to_vec(),
            seal_decrypt(&encrypted, &user_secret_keys, Some(&public_keys)).unwrap()
        );
    }

    #[test]
    fn test_threshold_subsets() {
        let data = b"My super secret message";
        let package_id = ObjectId::new([0u8; 32]);
        let id = vec![1, 2, 3, 4];
        let full_id = create_full_id(package_id.inner(), &id);

        let (keypairs, services, public_keys) = test_setup(3);

        let encrypted = seal_encrypt(
            package_id,
            id,
            services.clone(),
            &public_keys,
            2,
            EncryptionInput::Aes256Gcm {
                data: data.to_vec(),
                aad: None,
            },
        )
        .unwrap()
        .0;

        let all_keys = extract_all(&keypairs, &services, &full_id);

        // Any two of the three keys suffice.
        for (i, j) in [(0, 1), (0, 2), (1, 2)] {
            let subset = IBEUserSecretKeys::BonehFranklinBLS12381(HashMap::from([
                (services[i], all_keys[&services[i]]),
                (services[j], all_keys[&services[j]]),
            ]));
            assert_eq!(data, seal_decrypt(&encrypted, &subset, None).unwrap().as_slice());
        }

        // A single key does not.
        let single = IBEUserSecretKeys::BonehFranklinBLS12381(HashMap::from([(
            services[0],
            all_keys[&services[0]],
        )]));
        assert!(seal_decrypt(&encrypted, &single, None).is_err());
    }

    #[test]
    fn test_threshold_one_degenerate() {
        let data = b"My super secret message";
        let package_id = ObjectId::new([0u8; 32]);
        let id = vec![1, 2, 3, 4];
        let full_id = create_full_id(package_id.inner(), &id);

        let (keypairs, services, public_keys) = test_setup(3);

        let encrypted = seal_encrypt(
            package_id,
            id,
            services.clone(),
            &public_keys,
            1,
            EncryptionInput::Aes256Gcm {
                data: data.to_vec(),
                aad: None,
            },
        )
        .unwrap()
        .0;

        // Positional share indices are distinct even though the share values coincide.
        assert_eq!(
            encrypted.services.iter().map(|(_, index)| *index).collect_vec(),
            vec![1, 2, 3]
        );

        // Any single key suffices.
        let all_keys = extract_all(&keypairs, &services, &full_id);
        for service in &services {
            let single = IBEUserSecretKeys::BonehFranklinBLS12381(HashMap::from([(
                *service,
                all_keys[service],
            )]));
            assert_eq!(data, seal_decrypt(&encrypted, &single, None).unwrap().as_slice());
        }
    }

    #[test]
    fn test_share_consistency() {
        let data = b"Hello, World!";
        let mut rng = thread_rng();
        let package_id = random_object_id(&mut rng);
        let id = vec![1, 2, 3, 4];
        let full_id = create_full_id(package_id.inner(), &id);

        let (keypairs, services, public_keys) = test_setup(3);

        let mut encrypted = seal_encrypt(
            package_id,
            id,
            services.clone(),
            &public_keys,
            2,
            EncryptionInput::Hmac256Ctr {
                data: data.to_vec(),
                aad: Some(b"something".to_vec()),
            },
        )
        .unwrap()
        .0;

        let all_keys = extract_all(&keypairs, &services, &full_id);

        // Corrupt the last share.
        match encrypted.encrypted_shares {
            IBEEncryptions::BonehFranklinBLS12381 {
                ref mut encrypted_shares,
                ..
            } => encrypted_shares[2][0] = encrypted_shares[2][0].wrapping_add(1),
        };

        // Decryption with all shares fails on the MAC.
        assert!(seal_decrypt(
            &encrypted,
            &IBEUserSecretKeys::BonehFranklinBLS12381(all_keys.clone()),
            None,
        )
        .is_err_and(|e| e == GeneralError("Invalid MAC".to_string())));

        // The two valid shares alone decrypt fine,
        let two_valid = IBEUserSecretKeys::BonehFranklinBLS12381(HashMap::from([
            (services[0], all_keys[&services[0]]),
            (services[1], all_keys[&services[1]]),
        ]));
        assert_eq!(seal_decrypt(&encrypted, &two_valid, None).unwrap(), data);

        // but not when the share consistency is also checked.
        assert!(seal_decrypt(&encrypted, &two_valid, Some(&public_keys))
            .is_err_and(|e| e == GeneralError("Inconsistent shares".to_string())));
    }

    #[test]
    fn test_parse_rejects_invalid_envelopes() {
        let data = b"payload";
        let package_id = ObjectId::new([0u8; 32]);
        let id = vec![1, 2, 3, 4];
        let (_, services, public_keys) = test_setup(3);

        let encrypted = seal_encrypt(
            package_id,
            id.clone(),
            services,
            &public_keys,
            2,
            EncryptionInput::Aes256Gcm {
                data: data.to_vec(),
                aad: None,
            },
        )
        .unwrap()
        .0;
        let bytes = encrypted.to_bytes();

        // Unknown version.
        let mut modified = bytes.clone();
        modified[0] = 1;
        assert!(EncryptedObject::from_bytes(&modified).is_err());

        // Truncated input and trailing garbage.
        assert!(EncryptedObject::from_bytes(&bytes[..bytes.len() - 1]).is_err());
        assert!(EncryptedObject::from_bytes(&[bytes.clone(), vec![0]].concat()).is_err());

        // Thresholds outside [1, |services|].
        let threshold_offset = 1 + 32 + (1 + id.len()) + (1 + 3 * 33);
        for threshold in [0u8, 4] {
            let mut modified = bytes.clone();
            modified[threshold_offset] = threshold;
            assert!(EncryptedObject::from_bytes(&modified).is_err());
        }

        // Non-canonical nonce bytes. The nonce follows the encrypted shares
        // discriminator right after the threshold.
        let nonce_offset = threshold_offset + 2;
        let mut modified = bytes.clone();
        modified[nonce_offset..nonce_offset + 96].fill(0xff);
        assert!(EncryptedObject::from_bytes(&modified).is_err());

        // A share count that does not match the service count.
        let mut too_few_shares = encrypted.clone();
        match too_few_shares.encrypted_shares {
            IBEEncryptions::BonehFranklinBLS12381 {
                ref mut encrypted_shares,
                ..
            } => {
                encrypted_shares.pop();
            }
        }
        assert!(EncryptedObject::from_bytes(&too_few_shares.to_bytes()).is_err());
    }

    #[test]
    fn test_encrypt_rejects_invalid_thresholds() {
        let (_, services, public_keys) = test_setup(3);
        let package_id = ObjectId::new([0u8; 32]);
        for threshold in [0u8, 4] {
            assert!(seal_encrypt(
                package_id,
                vec![1, 2, 3, 4],
                services.clone(),
                &public_keys,
                threshold,
                EncryptionInput::Plain,
            )
            .is_err());
        }
    }
}
