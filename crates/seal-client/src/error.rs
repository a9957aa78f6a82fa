// Copyright (c), Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::fmt::{Display, Formatter};
use std::mem::discriminant;
use sui_sdk_types::ObjectId;
use thiserror::Error;

/// Errors surfaced by the client. The first group are caller faults that are
/// not retryable without a change, the second group are key-server responses
/// (carrying the request id and HTTP status for cross-system correlation),
/// and the last group are transport failures.
#[derive(Debug, Error)]
pub enum SealError {
    #[error("Invalid package id")]
    InvalidPackage,

    #[error("Invalid threshold {threshold} for {number_of_servers} key servers")]
    InvalidThreshold {
        threshold: u8,
        number_of_servers: usize,
    },

    #[error("Invalid ciphertext: {0}")]
    InvalidCiphertext(String),

    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(String),

    #[error("Unsupported network: {0}")]
    UnsupportedNetwork(String),

    #[error("Invalid key server {object_id}: {reason}")]
    InvalidKeyServer { object_id: ObjectId, reason: String },

    #[error("The encrypted object's key servers do not match the client's key servers")]
    InconsistentKeyServers,

    #[error("Invalid personal message signature")]
    InvalidPersonalMessageSignature,

    #[error("Session key has expired")]
    ExpiredSessionKey,

    #[error("Session key has no personal message signature and no signer was provided")]
    MissingPersonalMessageSignature,

    #[error("Fewer than threshold many usable key shares are available")]
    InsufficientShares,

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Key server returned {kind}: {message} (request id: {request_id}, status: {status})")]
    Server {
        kind: ServerErrorKind,
        message: String,
        request_id: String,
        status: u16,
    },

    #[error("Request to key server timed out (request id: {request_id})")]
    Timeout { request_id: String },

    #[error("Request to key server failed: {message} (request id: {request_id})")]
    Transport { message: String, request_id: String },
}

/// The error kinds a key server reports in the `error` field of a non-2xx
/// response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerErrorKind {
    InvalidPTB,
    InvalidPackage,
    OldPackageVersion,
    InvalidSignature,
    InvalidSessionSignature,
    NoAccess,
    /// Treated as an expired session by callers.
    InvalidCertificate,
    /// The server asks to try again later.
    InternalError,
    /// Catch-all for unrecognized error tags.
    GeneralError,
}

impl ServerErrorKind {
    pub(crate) fn from_error_field(tag: &str) -> Self {
        match tag {
            "InvalidPTB" => Self::InvalidPTB,
            "InvalidPackage" => Self::InvalidPackage,
            "OldPackageVersion" => Self::OldPackageVersion,
            "InvalidSignature" => Self::InvalidSignature,
            "InvalidSessionSignature" => Self::InvalidSessionSignature,
            "NoAccess" => Self::NoAccess,
            "InvalidCertificate" => Self::InvalidCertificate,
            "Failure" => Self::InternalError,
            _ => Self::GeneralError,
        }
    }
}

impl Display for ServerErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let tag = match self {
            Self::InvalidPTB => "InvalidPTB",
            Self::InvalidPackage => "InvalidPackage",
            Self::OldPackageVersion => "OldPackageVersion",
            Self::InvalidSignature => "InvalidSignature",
            Self::InvalidSessionSignature => "InvalidSessionSignature",
            Self::NoAccess => "NoAccess",
            Self::InvalidCertificate => "InvalidCertificate",
            Self::InternalError => "InternalError",
            Self::GeneralError => "GeneralError",
        };
        write!(f, "{}", tag)
    }
}

impl SealError {
    /// Two errors are of the same kind if they only differ in their payload,
    /// except for server errors which are distinguished by the reported kind.
    fn same_kind(&self, other: &SealError) -> bool {
        match (self, other) {
            (Self::Server { kind: a, .. }, Self::Server { kind: b, .. }) => a == b,
            _ => discriminant(self) == discriminant(other),
        }
    }
}

/// Pick the most frequently observed error kind; ties are broken by the first
/// seen. Returns `None` for an empty error set.
pub(crate) fn majority_error(errors: Vec<SealError>) -> Option<SealError> {
    let mut best: Option<(usize, usize)> = None; // (index of first of kind, count)
    for (i, error) in errors.iter().enumerate() {
        if errors[..i].iter().any(|earlier| earlier.same_kind(error)) {
            continue;
        }
        let count = errors.iter().filter(|e| e.same_kind(error)).count();
        match best {
            Some((_, best_count)) if best_count >= count => {}
            _ => best = Some((i, count)),
        }
    }
    let (index, _) = best?;
    errors.into_iter().nth(index)
}
