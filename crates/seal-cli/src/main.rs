// Copyright (c), Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Offline command line tool for the crypto core: key generation, user key
//! extraction and verification, encryption, decryption, and envelope parsing.
//! Binary values are passed and printed as hex-encoded BCS with a `0x` prefix.

use clap::{Parser, Subcommand};
use crypto::dem::{Aes256Gcm, Hmac256Ctr};
use crypto::prefixed_hex::PrefixedHex;
use crypto::{
    create_full_id, ibe, seal_decrypt, seal_encrypt, Ciphertext, EncryptedObject, EncryptionInput,
    IBEEncryptions, IBEPublicKeys, IBEUserSecretKeys, ObjectId, KEY_SIZE,
};
use fastcrypto::encoding::Encoding;
use fastcrypto::error::{FastCryptoError, FastCryptoResult};
use fastcrypto::groups::bls12381::{G1Element, G2Element, Scalar};
use rand::thread_rng;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Default encoding for serializing and deserializing values.
type DefaultEncoding = PrefixedHex;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Arguments {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
#[allow(clippy::large_enum_variant)]
enum Command {
    /// Generate a new master key and public key.
    Genkey,
    /// Extract a user secret key for an id from a master key.
    Extract {
        /// The address of the package that handles the access policy for this key.
        #[arg(long)]
        package_id: ObjectId,
        /// The inner id of the key that should be derived.
        #[arg(long)]
        id: EncodedBytes,
        /// Master key. Hex encoding of a BLS12-381 scalar.
        #[arg(long, value_parser = parse_serializable::<Scalar, DefaultEncoding>)]
        master_key: Scalar,
    },
    /// Verify a user secret key against a public key.
    Verify {
        /// The address of the package that handles the access policy for this key.
        #[arg(long)]
        package_id: ObjectId,
        /// The inner id of the key.
        #[arg(long)]
        id: EncodedBytes,
        /// User secret key. Hex encoding of a compressed BLS12-381 G1Element.
        #[arg(long, value_parser = parse_serializable::<G1Element, DefaultEncoding>)]
        user_secret_key: G1Element,
        /// Public key. Hex encoding of a compressed BLS12-381 G2Element.
        #[arg(long, value_parser = parse_serializable::<G2Element, DefaultEncoding>)]
        public_key: G2Element,
    },
    /// Derive a key without encrypting a payload.
    /// This outputs both the encrypted object, which can be shared publicly,
    /// and the derived symmetric key, which should be kept private.
    Plain {
        /// The address of the package that handles the access policy.
        #[arg(long)]
        package_id: ObjectId,
        /// The inner id for this encryption.
        #[arg(long)]
        id: EncodedBytes,
        /// The number of key servers that must be present for decryption.
        #[arg(long)]
        threshold: u8,
        /// The hex-encoded public keys of the key servers.
        #[arg(value_parser = parse_serializable::<G2Element, DefaultEncoding>, num_args = 1..)]
        public_keys: Vec<G2Element>,
        /// The addresses of the objects representing the key servers.
        #[arg(num_args = 1.., last = true)]
        object_ids: Vec<ObjectId>,
    },
    /// Encrypt a message with AES-256-GCM, with the key derived from the id.
    EncryptAes {
        /// The message to encrypt as hex-encoded bytes.
        #[arg(long)]
        message: EncodedBytes,
        /// Optional additional authenticated data as hex-encoded bytes.
        #[arg(long)]
        aad: Option<EncodedBytes>,
        /// The address of the package that handles the access policy.
        #[arg(long)]
        package_id: ObjectId,
        /// The inner id for this encryption.
        #[arg(long)]
        id: EncodedBytes,
        /// The number of key servers that must be present for decryption.
        #[arg(long)]
        threshold: u8,
        /// The hex-encoded public keys of the key servers.
        #[arg(value_parser = parse_serializable::<G2Element, DefaultEncoding>, num_args = 1..)]
        public_keys: Vec<G2Element>,
        /// The addresses of the objects representing the key servers.
        #[arg(num_args = 1.., last = true)]
        object_ids: Vec<ObjectId>,
    },
    /// Encrypt a message with counter-mode HMAC-SHA3-256, with the key derived from the id.
    EncryptHmac {
        /// The message to encrypt as hex-encoded bytes.
        #[arg(long)]
        message: EncodedBytes,
        /// Optional additional authenticated data as hex-encoded bytes.
        #[arg(long)]
        aad: Option<EncodedBytes>,
        /// The address of the package that handles the access policy.
        #[arg(long)]
        package_id: ObjectId,
        /// The inner id for this encryption.
        #[arg(long)]
        id: EncodedBytes,
        /// The number of key servers that must be present for decryption.
        #[arg(long)]
        threshold: u8,
        /// The hex-encoded public keys of the key servers.
        #[arg(value_parser = parse_serializable::<G2Element, DefaultEncoding>, num_args = 1..)]
        public_keys: Vec<G2Element>,
        /// The addresses of the objects representing the key servers.
        #[arg(num_args = 1.., last = true)]
        object_ids: Vec<ObjectId>,
    },
    /// Decrypt an encrypted object with the given user secret keys.
    /// If Plain mode was used, the derived key is returned instead.
    Decrypt {
        /// The encrypted object as hex-encoded bytes.
        #[arg(value_parser = parse_encrypted_object)]
        encrypted_object: EncryptedObject,
        /// The user secret keys. The order must match the order of the object ids.
        #[arg(value_parser = parse_serializable::<G1Element, DefaultEncoding>, num_args = 1..)]
        secret_keys: Vec<G1Element>,
        /// The addresses of the key server objects the secret keys came from.
        #[arg(num_args = 1.., last = true)]
        object_ids: Vec<ObjectId>,
    },
    /// Parse an encrypted object and print its parts.
    Parse {
        /// The encrypted object as hex-encoded bytes.
        #[arg(value_parser = parse_encrypted_object)]
        encrypted_object: EncryptedObject,
    },
    /// Decrypt the payload of an encrypted object with the derived symmetric key.
    SymmetricDecrypt {
        /// The encrypted object as hex-encoded bytes.
        #[arg(value_parser = parse_encrypted_object)]
        encrypted_object: EncryptedObject,
        /// The symmetric key derived during encryption.
        #[arg(long)]
        key: EncodedByteArray<KEY_SIZE>,
    },
}

struct GenkeyOutput((Scalar, G2Element));
struct ExtractOutput(G1Element);
struct VerifyOutput(FastCryptoResult<()>);
struct EncryptionOutput((EncryptedObject, [u8; KEY_SIZE]));
struct DecryptionOutput(Vec<u8>);
struct ParseOutput(EncryptedObject);
struct SymmetricDecryptOutput(Vec<u8>);

fn main() -> FastCryptoResult<()> {
    let args = Arguments::parse();

    let output = match args.command {
        Command::Genkey => GenkeyOutput(ibe::generate_key_pair(&mut thread_rng())).to_string(),
        Command::Extract {
            package_id,
            id,
            master_key,
        } => ExtractOutput(ibe::extract(
            &master_key,
            &create_full_id(package_id.inner(), &id.0),
        ))
        .to_string(),
        Command::Verify {
            package_id,
            id,
            user_secret_key,
            public_key,
        } => VerifyOutput(ibe::verify_user_secret_key(
            &user_secret_key,
            &create_full_id(package_id.inner(), &id.0),
            &public_key,
        ))
        .to_string(),
        Command::Plain {
            package_id,
            id,
            threshold,
            public_keys,
            object_ids,
        } => EncryptionOutput(seal_encrypt(
            package_id,
            id.0,
            object_ids,
            &IBEPublicKeys::BonehFranklinBLS12381(public_keys),
            threshold,
            EncryptionInput::Plain,
        )?)
        .to_string(),
        Command::EncryptAes {
            message,
            aad,
            package_id,
            id,
            threshold,
            public_keys,
            object_ids,
        } => EncryptionOutput(seal_encrypt(
            package_id,
            id.0,
            object_ids,
            &IBEPublicKeys::BonehFranklinBLS12381(public_keys),
            threshold,
            EncryptionInput::Aes256Gcm {
                data: message.0,
                aad: aad.map(|a| a.0),
            },
        )?)
        .to_string(),
        Command::EncryptHmac {
            message,
            aad,
            package_id,
            id,
            threshold,
            public_keys,
            object_ids,
        } => EncryptionOutput(seal_encrypt(
            package_id,
            id.0,
            object_ids,
            &IBEPublicKeys::BonehFranklinBLS12381(public_keys),
            threshold,
            EncryptionInput::Hmac256Ctr {
                data: message.0,
                aad: aad.map(|a| a.0),
            },
        )?)
        .to_string(),
        Command::Decrypt {
            encrypted_object,
            secret_keys,
            object_ids,
        } => {
            if secret_keys.len() != object_ids.len() {
                return Err(FastCryptoError::InvalidInput);
            }
            DecryptionOutput(seal_decrypt(
                &encrypted_object,
                &IBEUserSecretKeys::BonehFranklinBLS12381(
                    object_ids.into_iter().zip(secret_keys).collect(),
                ),
                None,
            )?)
            .to_string()
        }
        Command::Parse { encrypted_object } => ParseOutput(encrypted_object).to_string(),
        Command::SymmetricDecrypt {
            encrypted_object,
            key,
        } => match encrypted_object.ciphertext {
            Ciphertext::Aes256Gcm { blob, aad } => {
                Aes256Gcm::decrypt(&blob, aad.as_deref().unwrap_or(&[]), &key.0)
            }
            Ciphertext::Hmac256Ctr { blob, aad, mac } => {
                Hmac256Ctr::decrypt(&blob, &mac, aad.as_deref().unwrap_or(&[]), &key.0)
            }
            Ciphertext::Plain => Err(FastCryptoError::InvalidInput),
        }
        .map(SymmetricDecryptOutput)?
        .to_string(),
    };
    println!("{}", output);
    Ok(())
}

/// Type used for binary inputs to the CLI.
#[derive(Debug, Clone)]
struct EncodedBytes(Vec<u8>);

impl FromStr for EncodedBytes {
    type Err = FastCryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DefaultEncoding::decode(s).map(EncodedBytes)
    }
}

#[derive(Debug, Clone)]
struct EncodedByteArray<const N: usize>([u8; N]);

impl<const N: usize> FromStr for EncodedByteArray<N> {
    type Err = FastCryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DefaultEncoding::decode(s)
            .map_err(|_| FastCryptoError::InvalidInput)
            .and_then(|bytes| {
                bytes
                    .try_into()
                    .map_err(|_| FastCryptoError::InputLengthWrong(N))
            })
            .map(EncodedByteArray)
    }
}

//
// Input parsing and output formatting
//
fn serializable_to_string<T: Serialize>(t: &T) -> String {
    DefaultEncoding::encode(bcs::to_bytes(t).expect("serialization failed"))
}

fn parse_serializable<T: for<'a> Deserialize<'a>, E: Encoding>(s: &str) -> Result<T, String> {
    let bytes = E::decode(s).map_err(|e| format!("{}", e))?;
    bcs::from_bytes(&bytes).map_err(|e| format!("{}", e))
}

/// Parse an encrypted object, including the envelope validity checks.
fn parse_encrypted_object(s: &str) -> Result<EncryptedObject, String> {
    let bytes = DefaultEncoding::decode(s).map_err(|e| format!("{}", e))?;
    EncryptedObject::from_bytes(&bytes).map_err(|e| format!("{}", e))
}

impl Display for GenkeyOutput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Master key: {}\nPublic key: {}",
            serializable_to_string(&self.0 .0),
            serializable_to_string(&self.0 .1),
        )
    }
}

impl Display for ExtractOutput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "User secret key: {}", serializable_to_string(&self.0))
    }
}

impl Display for VerifyOutput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            if self.0.is_ok() {
                "Verification successful"
            } else {
                "Verification failed"
            }
        )
    }
}

impl Display for EncryptionOutput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Encrypted object (bcs): {}\nSymmetric key: {}",
            DefaultEncoding::encode(self.0 .0.to_bytes()),
            DefaultEncoding::encode(self.0 .1)
        )
    }
}

impl Display for DecryptionOutput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Decrypted message: {}", DefaultEncoding::encode(&self.0))
    }
}

impl Display for ParseOutput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Version: {}", self.0.version)?;
        writeln!(f, "Package ID: {}", self.0.package_id)?;
        writeln!(f, "ID: {}", DefaultEncoding::encode(&self.0.id))?;
        writeln!(f, "Services: share index:")?;
        for (id, index) in &self.0.services {
            writeln!(f, "  {}: {}", id, index)?;
        }
        writeln!(f, "Threshold: {}", self.0.threshold)?;
        writeln!(f, "Ciphertext:")?;
        match &self.0.ciphertext {
            Ciphertext::Aes256Gcm { blob, aad } => {
                writeln!(f, "  Type: AES-256-GCM")?;
                writeln!(f, "  Blob: {}", DefaultEncoding::encode(blob))?;
                writeln!(
                    f,
                    "  AAD: {}",
                    aad.as_ref()
                        .map_or("None".to_string(), DefaultEncoding::encode)
                )?;
            }
            Ciphertext::Hmac256Ctr { blob, aad, mac } => {
                writeln!(f, "  Type: HMAC-256-CTR")?;
                writeln!(f, "  Blob: {}", DefaultEncoding::encode(blob))?;
                writeln!(
                    f,
                    "  AAD: {}",
                    aad.as_ref()
                        .map_or("None".to_string(), DefaultEncoding::encode)
                )?;
                writeln!(f, "  MAC: {}", DefaultEncoding::encode(mac))?;
            }
            Ciphertext::Plain => {
                writeln!(f, "  Type: Plain")?;
            }
        }
        writeln!(f, "Encrypted shares:")?;
        match &self.0.encrypted_shares {
            IBEEncryptions::BonehFranklinBLS12381 {
                nonce,
                encrypted_shares,
                encrypted_randomness,
            } => {
                writeln!(f, "  Type: Boneh-Franklin BLS12-381")?;
                writeln!(f, "  Shares:")?;
                for share in encrypted_shares.iter() {
                    writeln!(f, "    {}", DefaultEncoding::encode(share))?;
                }
                writeln!(f, "  Nonce: {}", serializable_to_string(nonce))?;
                write!(
                    f,
                    "  Encrypted randomness: {}",
                    DefaultEncoding::encode(encrypted_randomness)
                )?;
            }
        };
        Ok(())
    }
}

impl Display for SymmetricDecryptOutput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Decrypted message: {}", DefaultEncoding::encode(&self.0))
    }
}
