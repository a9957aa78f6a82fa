// Copyright (c), Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Wire types shared with the key-server HTTP interface. The request and
//! response bodies are JSON; byte-valued fields serialize as base64 strings.

use crypto::{elgamal, ibe};
use fastcrypto::ed25519::{Ed25519PublicKey, Ed25519Signature};
use serde::{Deserialize, Serialize};
use sui_sdk_types::Address;

type IbeDerivedKey = ibe::UserSecretKey;
type IbePublicKey = ibe::PublicKey;

pub type ElGamalSecretKey = elgamal::SecretKey<IbeDerivedKey>;
pub type ElGamalPublicKey = elgamal::PublicKey<IbeDerivedKey>;
pub type ElgamalEncryption = elgamal::Encryption<IbeDerivedKey>;
pub type ElgamalVerificationKey = elgamal::VerificationKey<IbePublicKey>;

/// The session certificate: a structured witness, signed by the user's wallet,
/// that the ephemeral session signing key is authorized to request keys of the
/// session's package.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Certificate {
    pub user: Address,
    pub session_vk: Ed25519PublicKey,
    pub creation_time: u64,
    pub ttl_min: u16,
    /// The wallet's personal-message signature, base64. Opaque to the client;
    /// only the key server and the injected verifier interpret it.
    pub signature: String,
}

#[derive(Serialize, Deserialize)]
pub struct FetchKeyRequest {
    // Next fields must be signed by the session key to prevent others from
    // sending requests on behalf of the user and being able to fetch keys.
    pub ptb: String,
    // We don't want to rely on https alone for restricting the response to
    // this user, since in the case of multiple services, one service could
    // replay the request to get the keys from the other services.
    pub enc_key: ElGamalPublicKey,
    pub enc_verification_key: ElgamalVerificationKey,
    pub request_signature: Ed25519Signature,

    pub certificate: Certificate,
}

pub type KeyId = Vec<u8>;

#[derive(Serialize, Deserialize)]
pub struct DecryptionKey {
    pub id: KeyId,
    pub encrypted_key: ElgamalEncryption,
}

#[derive(Serialize, Deserialize)]
pub struct FetchKeyResponse {
    pub decryption_keys: Vec<DecryptionKey>,
}
