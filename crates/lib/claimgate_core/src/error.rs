//! Error types for claim normalization, checkpoints and the user aggregate.

use serde_json::Value;
use thiserror::Error;

/// Claim normalization and validity errors.
///
/// Field type variants carry the offending raw value so callers can report
/// exactly what the identity provider sent.
#[derive(Debug, Error)]
pub enum ClaimsError {
    #[error("invalid user data type")]
    InvalidUserDataType,

    #[error("malformed user data: {0}")]
    MalformedUserData(#[from] serde_json::Error),

    #[error("invalid audience type: {0}")]
    InvalidAudienceType(Value),

    #[error("invalid audience: {0}")]
    InvalidAudience(Value),

    #[error("invalid exp claim type: {0}")]
    InvalidClaimExpiresAt(Value),

    #[error("invalid iat claim type: {0}")]
    InvalidClaimIssuedAt(Value),

    #[error("invalid nbf claim type: {0}")]
    InvalidClaimNotBefore(Value),

    #[error("invalid jti claim type: {0}")]
    InvalidIdClaimType(Value),

    #[error("invalid iss claim type: {0}")]
    InvalidIssuerClaimType(Value),

    #[error("invalid sub claim type: {0}")]
    InvalidSubjectClaimType(Value),

    #[error("invalid {key} claim type: {value}")]
    InvalidEmailClaimType { key: String, value: Value },

    #[error("invalid name claim type: {0}")]
    InvalidNameClaimType(Value),

    #[error("invalid {key} claim type: {value}")]
    InvalidRoleType { key: String, value: Value },

    #[error("invalid role: {0}")]
    InvalidRole(Value),

    #[error("invalid {key} claim type: {value}")]
    InvalidScopeType { key: String, value: Value },

    #[error("invalid scope: {0}")]
    InvalidScope(Value),

    #[error("invalid {key} claim type: {value}")]
    InvalidAccessListType { key: String, value: Value },

    #[error("invalid access list path: {0}")]
    InvalidAccessListPath(Value),

    #[error("invalid origin claim type: {0}")]
    InvalidOriginClaimType(Value),

    #[error("invalid org claim type: {0}")]
    InvalidOrgType(Value),

    #[error("invalid org: {0}")]
    InvalidOrg(Value),

    #[error("invalid addr claim type: {0}")]
    InvalidAddrType(Value),

    #[error("invalid picture claim type: {0}")]
    InvalidPictureClaimType(Value),

    #[error("invalid metadata claim type: {0}")]
    InvalidMetadataClaimType(Value),

    #[error("invalid username claim type: {0}")]
    InvalidUsernameClaimType(Value),

    #[error("token expired")]
    ExpiredToken,
}

impl ClaimsError {
    /// Whether the error is structural (outer payload shape) rather than
    /// tied to a specific claim.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            ClaimsError::InvalidUserDataType | ClaimsError::MalformedUserData(_)
        )
    }
}

/// Failure to parse a single checkpoint directive.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectiveError {
    #[error("empty directive")]
    EmptyDirective,

    #[error("unbalanced quotes in {0:?}")]
    UnbalancedQuotes(String),

    #[error("unsupported keyword: {0}")]
    UnsupportedKeyword(String),

    #[error("{keyword} directive must contain {expected} keywords, got {actual}")]
    ArgumentCount {
        keyword: String,
        expected: usize,
        actual: usize,
    },

    #[error("unsupported require keyword: {0}")]
    UnsupportedRequirement(String),
}

/// Checkpoint construction errors.
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("checkpoint input has invalid type: {0}")]
    InvalidType(Value),

    #[error("checkpoint input {directive:?} is invalid: {source}")]
    InvalidInput {
        directive: String,
        #[source]
        source: DirectiveError,
    },

    #[error("no checkpoints found")]
    Empty,
}

/// Errors raised by the user aggregate.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("frontend link input has invalid type: {0}")]
    FrontendLinkInvalidType(Value),
}
