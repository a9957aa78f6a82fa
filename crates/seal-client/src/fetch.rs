// Copyright (c), Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! The partial-key fetch orchestrator: one concurrent request per configured
//! key server, early exit once the threshold is met, and an error-budget exit
//! once success has become infeasible.

use crate::cache::KeyCache;
use crate::error::{majority_error, SealError, ServerErrorKind};
use crate::key_server::{KeyServer, KeyType};
use crate::session::SessionKey;
use crate::types::{ElGamalSecretKey, FetchKeyRequest, FetchKeyResponse};
use crate::SealClient;
use crypto::{create_full_id, elgamal, ibe};
use fastcrypto::encoding::{Base64, Encoding};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

const CLIENT_SDK_TYPE_HEADER: &str = "Client-Sdk-Type";
const CLIENT_SDK_VERSION_HEADER: &str = "Client-Sdk-Version";
const REQUEST_ID_HEADER: &str = "Request-Id";

const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Progress of one fetch call, shared between the per-server tasks.
struct FetchState {
    /// Servers holding verified keys for all requested ids.
    completed: usize,
    /// Dispatched requests that have not settled yet.
    pending: usize,
    /// Errors from settled requests. Cancelled requests record nothing.
    errors: Vec<SealError>,
}

impl SealClient {
    /// Fetch the user secret keys for the given inner ids from the configured
    /// key servers and populate the key cache, returning once at least
    /// `threshold` servers hold verified keys for every id. Requests to the
    /// servers are dispatched in parallel; once the threshold is met or can no
    /// longer be met, outstanding requests are aborted.
    ///
    /// If the threshold cannot be reached, the most frequently observed error
    /// is returned.
    ///
    /// Calling this before [SealClient::decrypt], e.g., while a user is
    /// composing a message, hides the fetch latency.
    pub async fn fetch_keys(
        &self,
        ids: &[Vec<u8>],
        tx_bytes: &[u8],
        session_key: &SessionKey,
        threshold: u8,
    ) -> Result<(), SealError> {
        let servers = self.key_servers().await?;
        if threshold == 0 || threshold as usize > servers.len() {
            return Err(SealError::InvalidThreshold {
                threshold,
                number_of_servers: servers.len(),
            });
        }
        let threshold = threshold as usize;

        let full_ids: Vec<Vec<u8>> = ids
            .iter()
            .map(|id| create_full_id(session_key.package_id().inner(), id))
            .collect();

        // Short-circuit on servers whose keys are all cached already.
        let (cached, remaining): (Vec<&KeyServer>, Vec<&KeyServer>) =
            servers.iter().partition(|server| {
                full_ids
                    .iter()
                    .all(|full_id| self.cache.contains(full_id, &server.object_id))
            });
        if cached.len() >= threshold {
            debug!("All requested keys are already cached");
            return Ok(());
        }

        for server in &remaining {
            if server.key_type != KeyType::BonehFranklinBLS12381 {
                return Err(SealError::InvalidKeyServer {
                    object_id: server.object_id,
                    reason: "unsupported key type".to_string(),
                });
            }
        }

        // May block on a wallet round-trip the first time.
        let certificate = session_key.certificate().await?;
        let params = session_key.create_request_params(tx_bytes)?;
        let request = Arc::new(FetchKeyRequest {
            ptb: Base64::encode(&tx_bytes[1..]),
            enc_key: params.enc_key,
            enc_verification_key: params.enc_verification_key,
            request_signature: params.request_signature,
            certificate,
        });
        let decryption_key = Arc::new(params.decryption_key);

        let token = CancellationToken::new();
        let state = Arc::new(Mutex::new(FetchState {
            completed: cached.len(),
            pending: remaining.len(),
            errors: Vec::new(),
        }));

        let mut tasks = JoinSet::new();
        for server in remaining.into_iter().cloned() {
            let http = self.http.clone();
            let cache = self.cache.clone();
            let request = request.clone();
            let decryption_key = decryption_key.clone();
            let full_ids = full_ids.clone();
            let token = token.clone();
            let state = state.clone();
            let timeout = self.options.timeout;

            tasks.spawn(async move {
                tokio::select! {
                    _ = token.cancelled() => {
                        debug!("Request to key server {} aborted", server.object_id);
                    }
                    result = fetch_from_server(
                        &http,
                        &server,
                        &request,
                        &decryption_key,
                        &full_ids,
                        &cache,
                        timeout,
                    ) => {
                        let mut state = state.lock();
                        state.pending -= 1;
                        match result {
                            Ok(true) => {
                                state.completed += 1;
                                if state.completed >= threshold {
                                    // Threshold met; abort the outstanding requests.
                                    token.cancel();
                                }
                            }
                            Ok(false) => {
                                debug!(
                                    "Key server {} returned keys for a subset of the requested ids only",
                                    server.object_id
                                );
                                if state.completed + state.pending < threshold {
                                    token.cancel();
                                }
                            }
                            Err(error) => {
                                warn!("Request to key server {} failed: {}", server.object_id, error);
                                state.errors.push(error);
                                if state.completed + state.pending < threshold {
                                    // Even if all outstanding requests succeed the
                                    // threshold cannot be met anymore.
                                    token.cancel();
                                }
                            }
                        }
                    }
                }
            });
        }
        while tasks.join_next().await.is_some() {}

        let state = Arc::into_inner(state)
            .expect("all tasks have settled")
            .into_inner();
        if state.completed >= threshold {
            Ok(())
        } else {
            Err(majority_error(state.errors).unwrap_or(SealError::InsufficientShares))
        }
    }
}

/// Fetch keys from a single server, verify them, and insert the valid ones
/// into the cache. Returns whether the server now holds verified keys for all
/// requested ids. Invalid keys are dropped with a warning but are not fatal;
/// other servers can still meet the threshold.
async fn fetch_from_server(
    http: &reqwest::Client,
    server: &KeyServer,
    request: &FetchKeyRequest,
    decryption_key: &ElGamalSecretKey,
    full_ids: &[Vec<u8>],
    cache: &KeyCache,
    timeout: Duration,
) -> Result<bool, SealError> {
    let request_id = Uuid::new_v4().to_string();
    debug!(
        "Fetching keys from {} ({}/v1/fetch_key, request id: {})",
        server.name, server.url, request_id
    );

    let response = http
        .post(format!("{}/v1/fetch_key", server.url))
        .header(REQUEST_ID_HEADER, &request_id)
        .header(CLIENT_SDK_TYPE_HEADER, "rust")
        .header(CLIENT_SDK_VERSION_HEADER, SDK_VERSION)
        .json(request)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                SealError::Timeout {
                    request_id: request_id.clone(),
                }
            } else {
                SealError::Transport {
                    message: e.to_string(),
                    request_id: request_id.clone(),
                }
            }
        })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(parse_server_error(&body, status.as_u16(), request_id));
    }

    let response: FetchKeyResponse = response.json().await.map_err(|e| SealError::Transport {
        message: format!("malformed response body: {e}"),
        request_id: request_id.clone(),
    })?;

    for key in response.decryption_keys {
        let user_secret_key = elgamal::decrypt(decryption_key, &key.encrypted_key);
        match ibe::verify_user_secret_key(&user_secret_key, &key.id, &server.pk) {
            Ok(()) => cache.insert(&key.id, server.object_id, user_secret_key),
            Err(_) => warn!(
                "Dropping invalid key for id {} from server {} (request id: {})",
                hex::encode(&key.id),
                server.object_id,
                request_id
            ),
        }
    }

    Ok(full_ids
        .iter()
        .all(|full_id| cache.contains(full_id, &server.object_id)))
}

/// Map a non-2xx response body to a typed error. The body is expected to be
/// JSON with an `error` tag, either a plain string or an object whose single
/// key is the tag.
fn parse_server_error(body: &str, status: u16, request_id: String) -> SealError {
    let (kind, message) = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .map(|value| {
            let kind = match value.get("error") {
                Some(serde_json::Value::String(tag)) => ServerErrorKind::from_error_field(tag),
                Some(serde_json::Value::Object(tagged)) => tagged
                    .keys()
                    .next()
                    .map(|tag| ServerErrorKind::from_error_field(tag))
                    .unwrap_or(ServerErrorKind::GeneralError),
                _ => ServerErrorKind::GeneralError,
            };
            let message = value
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or_default()
                .to_string();
            (kind, message)
        })
        .unwrap_or_else(|| (ServerErrorKind::GeneralError, body.to_string()));
    SealError::Server {
        kind,
        message,
        request_id,
        status,
    }
}
