// Copyright (c), Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! The per-application session: an ephemeral Ed25519 signing key authorized by
//! a single wallet signature over a human-readable personal message. Once
//! authorized, the session key signs individual fetch requests without further
//! wallet round-trips until it expires.

use crate::error::SealError;
use crate::externals::{PersonalMessageVerifier, Signer};
use crate::time::{current_epoch_time, from_mins};
use crate::types::{Certificate, ElGamalPublicKey, ElGamalSecretKey, ElgamalVerificationKey};
use chrono::{DateTime, Utc};
use fastcrypto::ed25519::{Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};
use fastcrypto::groups::bls12381::{G1Element, G2Element};
use fastcrypto::traits::KeyPair;
use fastcrypto::traits::Signer as _;
use rand::thread_rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use sui_sdk_types::{Address, ObjectId};
use tokio::sync::OnceCell;
use tracing::debug;

/// The maximum time to live for a session key, in minutes.
pub const SESSION_KEY_TTL_MAX: u16 = 10;

/// Tolerated clock skew: a session key is considered expired this long before
/// its nominal expiry.
const ALLOWED_CLOCK_SKEW_MS: u64 = 10_000;

/// The parameters of a single fetch request: a fresh ElGamal decryption key
/// and the session signature binding the request to it.
pub struct RequestParams {
    pub decryption_key: ElGamalSecretKey,
    pub enc_key: ElGamalPublicKey,
    pub enc_verification_key: ElgamalVerificationKey,
    pub request_signature: Ed25519Signature,
}

pub struct SessionKey {
    address: Address,
    package_id: ObjectId,
    creation_time: u64,
    ttl_min: u16,
    keypair: Ed25519KeyPair,
    personal_message_signature: OnceCell<String>,
    signer: Option<Arc<dyn Signer>>,
    verifier: Arc<dyn PersonalMessageVerifier>,
}

impl SessionKey {
    /// Create a fresh, unauthorized session key for the given user address and
    /// package. `ttl_min` must be in `[1, SESSION_KEY_TTL_MAX]`. If a `signer`
    /// is given, [SessionKey::certificate] may use it to obtain the personal
    /// message signature; otherwise the application must call
    /// [SessionKey::set_personal_message_signature] first.
    pub fn new(
        address: Address,
        package_id: ObjectId,
        ttl_min: u16,
        signer: Option<Arc<dyn Signer>>,
        verifier: Arc<dyn PersonalMessageVerifier>,
    ) -> Result<Self, SealError> {
        if ttl_min == 0 || ttl_min > SESSION_KEY_TTL_MAX {
            return Err(SealError::InvalidParameter(format!(
                "ttl_min must be between 1 and {}",
                SESSION_KEY_TTL_MAX
            )));
        }
        if package_id == ObjectId::new([0u8; 32]) {
            return Err(SealError::InvalidPackage);
        }
        Ok(Self {
            address,
            package_id,
            creation_time: current_epoch_time(),
            ttl_min,
            keypair: Ed25519KeyPair::generate(&mut thread_rng()),
            personal_message_signature: OnceCell::new(),
            signer,
            verifier,
        })
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn package_id(&self) -> &ObjectId {
        &self.package_id
    }

    /// Whether this session key is past its allowed lifetime. Expiry is
    /// terminal; a new session key must be constructed to re-authorize.
    pub fn is_expired(&self) -> bool {
        current_epoch_time() + ALLOWED_CLOCK_SKEW_MS
            > self.creation_time + from_mins(self.ttl_min).as_millis() as u64
    }

    /// The personal message shown to the user by the wallet. The exact text is
    /// part of the wire contract with wallets and key servers.
    pub fn personal_message(&self) -> String {
        signed_message(
            &self.package_id,
            self.keypair.public(),
            self.creation_time,
            self.ttl_min,
        )
    }

    /// Set the wallet's signature over the personal message, after verifying
    /// it through the injected verifier. This is the only mutation of a
    /// session key; it can happen at most once.
    pub async fn set_personal_message_signature(&self, signature: &str) -> Result<(), SealError> {
        self.verifier
            .verify_personal_message(
                self.personal_message().as_bytes(),
                signature,
                &self.address,
            )
            .await
            .map_err(|_| SealError::InvalidPersonalMessageSignature)?;
        self.personal_message_signature
            .set(signature.to_string())
            .map_err(|_| {
                SealError::InvalidParameter("personal message signature already set".to_string())
            })
    }

    /// The certificate sent along with fetch requests. If no personal message
    /// signature has been set and a signer was provided at construction, the
    /// signer is invoked once (possibly blocking on a wallet round-trip);
    /// afterwards this is idempotent.
    pub async fn certificate(&self) -> Result<Certificate, SealError> {
        let signature = match (self.personal_message_signature.get(), &self.signer) {
            (Some(signature), _) => signature.clone(),
            (None, Some(signer)) => {
                let message = self.personal_message();
                self.personal_message_signature
                    .get_or_try_init(|| async move {
                        signer.sign_personal_message(message.as_bytes()).await
                    })
                    .await?
                    .clone()
            }
            (None, None) => return Err(SealError::MissingPersonalMessageSignature),
        };
        Ok(Certificate {
            user: self.address,
            session_vk: self.keypair.public().clone(),
            creation_time: self.creation_time,
            ttl_min: self.ttl_min,
            signature,
        })
    }

    /// Generate the parameters for a single fetch request: a fresh ElGamal key
    /// triple and the session signature over the request. Fails if the session
    /// key has expired.
    ///
    /// The first byte of `tx_bytes` is the intent tag, which is stripped from
    /// the signed payload.
    pub fn create_request_params(&self, tx_bytes: &[u8]) -> Result<RequestParams, SealError> {
        if self.is_expired() {
            return Err(SealError::ExpiredSessionKey);
        }
        if tx_bytes.is_empty() {
            return Err(SealError::InvalidParameter(
                "transaction bytes must not be empty".to_string(),
            ));
        }
        let (decryption_key, enc_key, enc_verification_key) =
            crypto::elgamal::genkey::<G1Element, G2Element, _>(&mut thread_rng());
        let message = signed_request(&tx_bytes[1..], &enc_key, &enc_verification_key);
        let request_signature = self.keypair.sign(&message);
        Ok(RequestParams {
            decryption_key,
            enc_key,
            enc_verification_key,
            request_signature,
        })
    }

    #[cfg(test)]
    pub(crate) fn set_creation_time(&mut self, creation_time: u64) {
        self.creation_time = creation_time;
    }
}

/// The format of the personal message shown to the user. Byte-for-byte part of
/// the contract with wallets and key servers.
pub(crate) fn signed_message(
    package_id: &ObjectId,
    vk: &Ed25519PublicKey,
    creation_time: u64,
    ttl_min: u16,
) -> String {
    let message = format!(
        "Accessing keys of package {} for {} mins from {}, session key {}",
        package_id, // padded hex with 0x prefix
        ttl_min,
        DateTime::<Utc>::from_timestamp((creation_time / 1000) as i64, 0) // convert to seconds
            .expect("session creation times are valid timestamps"),
        vk,
    );
    debug!("Personal message: {}", message);
    message
}

#[derive(Serialize, Deserialize)]
struct RequestFormat {
    ptb: Vec<u8>,
    enc_key: Vec<u8>,
    enc_verification_key: Vec<u8>,
}

/// The canonical byte message signed by the session key for a fetch request.
pub(crate) fn signed_request(
    ptb: &[u8],
    enc_key: &ElGamalPublicKey,
    enc_verification_key: &ElgamalVerificationKey,
) -> Vec<u8> {
    let request = RequestFormat {
        ptb: ptb.to_vec(),
        enc_key: bcs::to_bytes(enc_key).expect("should serialize"),
        enc_verification_key: bcs::to_bytes(enc_verification_key).expect("should serialize"),
    };
    bcs::to_bytes(&request).expect("should serialize")
}
