// Copyright (c), Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Client library for identity-based threshold encryption with policy-gated
//! key retrieval. A payload is encrypted under a composite identity (package
//! id plus an application-chosen inner id); decrypting requires satisfying an
//! on-ledger access policy and collecting identity-based partial keys from at
//! least `threshold` independent key servers. No key server alone can
//! decrypt, and the encryptor never sees user keys.
//!
//! The ledger reader, wallet signer, and wallet-signature verifier are
//! injected collaborators, see [externals].

use crate::cache::KeyCache;
use crate::key_server::{retrieve_key_server, verify_key_server};
use crypto::{
    create_full_id, seal_decrypt, seal_encrypt, EncryptionInput, IBEPublicKeys, IBEUserSecretKeys,
};
use duration_str::deserialize_duration;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::debug;

mod cache;
pub mod error;
pub mod externals;
mod fetch;
pub mod key_server;
pub mod session;
mod time;
pub mod types;

#[cfg(test)]
mod tests;

pub use crypto::{EncryptedObject, ObjectId, KEY_SIZE};
pub use error::{SealError, ServerErrorKind};
pub use externals::{LedgerClient, PersonalMessageVerifier, Signer};
pub use key_server::{allowlisted_key_servers, KeyServer, KeyType, Network};
pub use session::{RequestParams, SessionKey, SESSION_KEY_TTL_MAX};
pub use types::Certificate;

/// The number of verified user secret keys the client caches.
const KEY_CACHE_SIZE: usize = 10_000;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SealClientOptions {
    /// Whether to verify each key server's proof-of-possession when resolving
    /// it.
    pub verify_key_servers: bool,

    /// The timeout for individual key server requests.
    #[serde(deserialize_with = "deserialize_duration")]
    pub timeout: Duration,
}

impl Default for SealClientOptions {
    fn default() -> Self {
        Self {
            verify_key_servers: true,
            timeout: Duration::from_secs(10),
        }
    }
}

/// The key-encapsulation mechanisms supported by [SealClient::encrypt].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum KemType {
    #[default]
    BonehFranklinBLS12381DemCCA,
}

/// The data-encapsulation mechanisms supported by [SealClient::encrypt].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DemType {
    #[default]
    AesGcm256,
    Hmac256Ctr,
    /// Don't encrypt a payload; the derived key itself is the secret.
    Plain,
}

pub struct EncryptOptions {
    pub kem_type: KemType,
    pub dem_type: DemType,
    pub threshold: u8,
    pub package_id: ObjectId,
    pub id: Vec<u8>,
    pub data: Vec<u8>,
    pub aad: Option<Vec<u8>>,
}

pub struct SealClient {
    pub(crate) ledger: Arc<dyn LedgerClient>,
    pub(crate) server_object_ids: Vec<ObjectId>,
    pub(crate) options: SealClientOptions,
    pub(crate) http: reqwest::Client,
    /// Lazily resolved key servers; concurrent callers share the same
    /// in-flight resolution.
    pub(crate) key_servers: OnceCell<Vec<KeyServer>>,
    pub(crate) cache: Arc<KeyCache>,
}

impl SealClient {
    /// Create a client bound to the given key servers. The server list may
    /// contain duplicates; a server listed k times holds k shares of every
    /// encryption made through this client.
    pub fn new(
        ledger: Arc<dyn LedgerClient>,
        server_object_ids: Vec<ObjectId>,
        options: SealClientOptions,
    ) -> Result<Self, SealError> {
        if server_object_ids.is_empty() {
            return Err(SealError::InvalidParameter(
                "at least one key server must be configured".to_string(),
            ));
        }
        Ok(Self {
            ledger,
            server_object_ids,
            options,
            http: reqwest::Client::new(),
            key_servers: OnceCell::new(),
            cache: Arc::new(KeyCache::new(KEY_CACHE_SIZE)),
        })
    }

    /// The resolved key servers, one entry per configured object id, in
    /// configuration order. Resolution and the optional proof-of-possession
    /// verification happen once per client.
    pub(crate) async fn key_servers(&self) -> Result<&Vec<KeyServer>, SealError> {
        self.key_servers
            .get_or_try_init(|| async {
                let mut resolved: HashMap<ObjectId, KeyServer> = HashMap::new();
                let mut servers = Vec::with_capacity(self.server_object_ids.len());
                for object_id in &self.server_object_ids {
                    let server = match resolved.get(object_id) {
                        Some(server) => server.clone(),
                        None => {
                            let server =
                                retrieve_key_server(self.ledger.as_ref(), object_id).await?;
                            if self.options.verify_key_servers {
                                verify_key_server(&self.http, &server, self.options.timeout)
                                    .await?;
                            }
                            resolved.insert(*object_id, server.clone());
                            server
                        }
                    };
                    servers.push(server);
                }
                debug!("Resolved {} key servers", servers.len());
                Ok(servers)
            })
            .await
    }

    /// Encrypt a payload under the composite identity `(package_id, id)` for
    /// the client's key servers. Returns the serialized encrypted object and
    /// the derived symmetric key; the latter may be cached or backed up by the
    /// caller but must not be shared with untrusted parties.
    pub async fn encrypt(
        &self,
        options: EncryptOptions,
    ) -> Result<(Vec<u8>, [u8; KEY_SIZE]), SealError> {
        let EncryptOptions {
            kem_type: _, // there is a single KEM; the envelope records it
            dem_type,
            threshold,
            package_id,
            id,
            data,
            aad,
        } = options;

        if package_id == ObjectId::new([0u8; 32]) {
            return Err(SealError::InvalidPackage);
        }
        let servers = self.key_servers().await?;
        if threshold == 0 || threshold as usize > servers.len() || servers.len() > u8::MAX as usize
        {
            return Err(SealError::InvalidThreshold {
                threshold,
                number_of_servers: servers.len(),
            });
        }

        let encryption_input = match dem_type {
            DemType::AesGcm256 => EncryptionInput::Aes256Gcm { data, aad },
            DemType::Hmac256Ctr => EncryptionInput::Hmac256Ctr { data, aad },
            DemType::Plain => {
                if !data.is_empty() || aad.is_some() {
                    return Err(SealError::InvalidParameter(
                        "plain mode takes no payload".to_string(),
                    ));
                }
                EncryptionInput::Plain
            }
        };

        let public_keys =
            IBEPublicKeys::BonehFranklinBLS12381(servers.iter().map(|s| s.pk).collect());
        let (encrypted_object, key) = seal_encrypt(
            package_id,
            id,
            servers.iter().map(|s| s.object_id).collect(),
            &public_keys,
            threshold,
            encryption_input,
        )
        .map_err(|e| SealError::InvalidParameter(e.to_string()))?;

        Ok((encrypted_object.to_bytes(), key))
    }

    /// Decrypt a serialized encrypted object: parse it, reconcile its key
    /// servers with the client's, fetch the partial keys for its identity
    /// (with cache), decapsulate at least `threshold` shares, and decrypt the
    /// payload. For `Plain` mode the derived key is returned.
    pub async fn decrypt(
        &self,
        data: &[u8],
        session_key: &SessionKey,
        tx_bytes: &[u8],
    ) -> Result<Vec<u8>, SealError> {
        let encrypted_object = EncryptedObject::from_bytes(data)
            .map_err(|e| SealError::InvalidCiphertext(e.to_string()))?;

        let servers = self.key_servers().await?;
        reconcile_key_servers(&encrypted_object, servers)?;

        self.fetch_keys(
            &[encrypted_object.id.clone()],
            tx_bytes,
            session_key,
            encrypted_object.threshold,
        )
        .await?;

        let full_id = create_full_id(encrypted_object.package_id.inner(), &encrypted_object.id);
        let mut user_secret_keys = HashMap::new();
        for (object_id, _) in &encrypted_object.services {
            if let Some(key) = self.cache.get(&full_id, object_id) {
                user_secret_keys.insert(*object_id, key);
            }
        }

        // With duplicate servers one key may unlock multiple shares, so count
        // usable service entries rather than keys.
        let usable_shares = encrypted_object
            .services
            .iter()
            .filter(|(object_id, _)| user_secret_keys.contains_key(object_id))
            .count();
        if usable_shares < encrypted_object.threshold as usize {
            return Err(SealError::InsufficientShares);
        }

        // If all of the envelope's servers are known, their public keys enable
        // the share-consistency check.
        let pk_by_id: HashMap<ObjectId, crypto::ibe::PublicKey> = servers
            .iter()
            .map(|server| (server.object_id, server.pk))
            .collect();
        let public_keys = encrypted_object
            .services
            .iter()
            .map(|(object_id, _)| pk_by_id.get(object_id).copied())
            .collect::<Option<Vec<_>>>()
            .map(IBEPublicKeys::BonehFranklinBLS12381);

        seal_decrypt(
            &encrypted_object,
            &IBEUserSecretKeys::BonehFranklinBLS12381(user_secret_keys),
            public_keys.as_ref(),
        )
        .map_err(|e| SealError::InvalidCiphertext(e.to_string()))
    }
}

/// Check that the envelope's key servers can be served by this client: every
/// configured server must appear in the envelope's services exactly as often
/// as it is configured, and the envelope threshold must be reachable.
fn reconcile_key_servers(
    encrypted_object: &EncryptedObject,
    servers: &[KeyServer],
) -> Result<(), SealError> {
    if encrypted_object.threshold as usize > servers.len() {
        return Err(SealError::InvalidThreshold {
            threshold: encrypted_object.threshold,
            number_of_servers: servers.len(),
        });
    }

    let mut envelope_counts: HashMap<&ObjectId, usize> = HashMap::new();
    for (object_id, _) in &encrypted_object.services {
        *envelope_counts.entry(object_id).or_default() += 1;
    }
    let mut client_counts: HashMap<&ObjectId, usize> = HashMap::new();
    for server in servers {
        *client_counts.entry(&server.object_id).or_default() += 1;
    }

    if client_counts.iter().any(|(object_id, count)| {
        envelope_counts.get(*object_id).copied().unwrap_or(0) != *count
    }) {
        return Err(SealError::InconsistentKeyServers);
    }
    Ok(())
}
