// Copyright (c), Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! The collaborators the client depends on but does not implement: a ledger
//! reader, a wallet signing capability, and a wallet-signature verifier. All
//! three are injected so the library stays network-agnostic.

use crate::error::SealError;
use async_trait::async_trait;
use sui_sdk_types::{Address, ObjectId};

/// Read access to the ledger, used to resolve key server records.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Return the BCS bytes of the object with the given id.
    async fn get_object(&self, object_id: &ObjectId) -> Result<Vec<u8>, SealError>;
}

/// A capability to sign a personal message with the user's wallet, e.g.,
/// through a wallet UI. May suspend for as long as the user takes to approve.
/// The returned signature is the base64 serialization the wallet produces.
#[async_trait]
pub trait Signer: Send + Sync {
    async fn sign_personal_message(&self, message: &[u8]) -> Result<String, SealError>;
}

/// Verifies that a personal-message signature was produced by the wallet
/// behind the given address.
#[async_trait]
pub trait PersonalMessageVerifier: Send + Sync {
    async fn verify_personal_message(
        &self,
        message: &[u8],
        signature: &str,
        address: &Address,
    ) -> Result<(), SealError>;
}
