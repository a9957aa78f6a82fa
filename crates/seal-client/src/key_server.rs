// Copyright (c), Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Key server descriptors: resolution of the on-ledger record, optional
//! verification of the server's proof-of-possession, and the allowlist of
//! well-known servers per network.

use crate::error::SealError;
use crate::externals::LedgerClient;
use crypto::ibe;
use fastcrypto::serde_helpers::ToFromByteArray;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use sui_sdk_types::ObjectId;
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyType {
    BonehFranklinBLS12381,
}

/// A resolved key server. Cached per client for the client's lifetime.
#[derive(Clone, Debug)]
pub struct KeyServer {
    pub object_id: ObjectId,
    pub name: String,
    pub url: String,
    pub key_type: KeyType,
    pub pk: ibe::PublicKey,
}

/// The BCS layout of the on-ledger key server record.
#[derive(Serialize, Deserialize)]
pub(crate) struct KeyServerRecord {
    pub id: ObjectId,
    pub name: String,
    pub url: String,
    pub key_type: u8,
    pub pk: Vec<u8>,
}

/// Resolve a key server from its on-ledger record.
pub(crate) async fn retrieve_key_server(
    ledger: &dyn LedgerClient,
    object_id: &ObjectId,
) -> Result<KeyServer, SealError> {
    let invalid = |reason: &str| SealError::InvalidKeyServer {
        object_id: *object_id,
        reason: reason.to_string(),
    };

    let bytes = ledger.get_object(object_id).await?;
    let record: KeyServerRecord =
        bcs::from_bytes(&bytes).map_err(|_| invalid("malformed on-ledger record"))?;
    if record.id != *object_id {
        return Err(invalid("record id does not match the object id"));
    }
    if record.key_type != 0 {
        return Err(invalid("unsupported key type"));
    }
    let pk_bytes: [u8; 96] = record
        .pk
        .try_into()
        .map_err(|_| invalid("public key must be 96 bytes"))?;
    let pk = ibe::PublicKey::from_byte_array(&pk_bytes)
        .map_err(|_| invalid("public key is not a valid curve point"))?;

    debug!("Resolved key server {} at {}", record.name, record.url);
    Ok(KeyServer {
        object_id: *object_id,
        name: record.name,
        url: record.url,
        key_type: KeyType::BonehFranklinBLS12381,
        pk,
    })
}

/// Response of a key server's `/v1/service` endpoint.
#[derive(Serialize, Deserialize)]
pub(crate) struct ServiceResponse {
    pub service_id: ObjectId,
    pub pop: ibe::ProofOfPossession,
}

/// Fetch the server's proof-of-possession and verify it against the resolved
/// public key, confirming the server controls the published key.
pub(crate) async fn verify_key_server(
    http: &reqwest::Client,
    server: &KeyServer,
    timeout: Duration,
) -> Result<(), SealError> {
    let invalid = |reason: String| SealError::InvalidKeyServer {
        object_id: server.object_id,
        reason,
    };

    let response = http
        .get(format!("{}/v1/service", server.url))
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| invalid(format!("service endpoint unreachable: {e}")))?;
    if !response.status().is_success() {
        return Err(invalid(format!(
            "service endpoint returned status {}",
            response.status()
        )));
    }
    let service: ServiceResponse = response
        .json()
        .await
        .map_err(|e| invalid(format!("malformed service response: {e}")))?;

    if service.service_id != server.object_id {
        return Err(invalid("service id does not match the object id".to_string()));
    }
    ibe::verify_proof_of_possession(&service.pop, &server.pk, &server.object_id.into_inner())
        .map_err(|_| invalid("proof-of-possession does not verify".to_string()))
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Network {
    Devnet,
    Testnet,
    Mainnet,
    Custom { node_url: String },
}

/// The object ids of the well-known key servers on a network. Fails with
/// [SealError::UnsupportedNetwork] for networks without a published allowlist.
pub fn allowlisted_key_servers(network: &Network) -> Result<Vec<ObjectId>, SealError> {
    match network {
        Network::Testnet => Ok(vec![ObjectId::from_str(
            "0x73d05d62c18d9374e3ea529e8e0ed6161da1a141a94d3f76ae3fe4e99356db75",
        )
        .expect("valid object id")]),
        _ => Err(SealError::UnsupportedNetwork(format!("{:?}", network))),
    }
}
