//! The authorization subject.
//!
//! A [`User`] owns the normalized claims, the two claim projections and the
//! role index, all computed once at construction. Checkpoints, frontend
//! links and the status flags are mutated afterwards by the authorization
//! flow; a `User` is meant to live for a single request and is not shared
//! across threads while being mutated.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::checkpoint::Checkpoint;
use crate::claims::{Claims, UserData};
use crate::error::{ClaimsError, UserError};
use crate::roles::RoleIndex;
use crate::shape::Entries;

/// The backend that authenticated a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authenticator {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub realm: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub method: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub temp_secret: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub temp_session_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
}

impl Authenticator {
    fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A user with claims and authorization status.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    claims: Claims,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub token: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub token_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub token_source: String,
    #[serde(skip_serializing_if = "Authenticator::is_empty")]
    pub authenticator: Authenticator,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub checkpoints: Vec<Checkpoint>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub authorized: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    frontend_links: Vec<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub locked: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub cached: bool,
    #[serde(skip)]
    request_headers: HashMap<String, String>,
    #[serde(skip)]
    request_identity: Map<String, Value>,
    #[serde(skip)]
    full: Map<String, Value>,
    #[serde(skip)]
    reduced: Map<String, Value>,
    #[serde(skip)]
    roles: RoleIndex,
}

impl User {
    /// Build a user from a raw identity payload.
    pub fn new(data: impl Into<UserData>) -> Result<Self, ClaimsError> {
        let normalized = Claims::normalize(data)?;
        let roles = RoleIndex::new(normalized.claims.roles.iter().cloned());
        debug!(
            sub = %normalized.claims.subject,
            roles = normalized.claims.roles.len(),
            "built user from claims"
        );
        Ok(Self {
            claims: normalized.claims,
            token: String::new(),
            token_name: String::new(),
            token_source: String::new(),
            authenticator: Authenticator::default(),
            checkpoints: Vec::new(),
            authorized: false,
            frontend_links: Vec::new(),
            locked: false,
            cached: false,
            request_headers: HashMap::new(),
            request_identity: Map::new(),
            full: normalized.full,
            reduced: normalized.reduced,
            roles,
        })
    }

    pub fn from_json_str(s: &str) -> Result<Self, ClaimsError> {
        Self::new(s)
    }

    pub fn from_json_slice(b: &[u8]) -> Result<Self, ClaimsError> {
        Self::new(b)
    }

    pub fn from_map(m: Map<String, Value>) -> Result<Self, ClaimsError> {
        Self::new(m)
    }

    /// The normalized claims. Fixed at construction.
    pub fn claims(&self) -> &Claims {
        &self.claims
    }

    /// All recognized claims keyed by wire name.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.full
    }

    /// Claims read by access-control evaluation.
    pub fn data(&self) -> &Map<String, Value> {
        &self.reduced
    }

    pub fn role_index(&self) -> &RoleIndex {
        &self.roles
    }

    /// True if the user has any of `roles`.
    pub fn has_role<S: AsRef<str>>(&self, roles: &[S]) -> bool {
        self.roles.has_any(roles)
    }

    /// True if the user has all of `roles`.
    pub fn has_roles<S: AsRef<str>>(&self, roles: &[S]) -> bool {
        self.roles.has_all(roles)
    }

    /// Check the claims have not expired.
    pub fn validate(&self) -> Result<(), ClaimsError> {
        self.claims.validate()
    }

    pub fn set_request_headers(&mut self, headers: HashMap<String, String>) {
        self.request_headers = headers;
    }

    pub fn request_headers(&self) -> &HashMap<String, String> {
        &self.request_headers
    }

    pub fn set_request_identity(&mut self, identity: Map<String, Value>) {
        self.request_identity = identity;
    }

    pub fn request_identity(&self) -> &Map<String, Value> {
        &self.request_identity
    }

    pub fn frontend_links(&self) -> &[String] {
        &self.frontend_links
    }

    /// Merge links into the frontend link list.
    ///
    /// Existing links keep their position. New links are appended in input
    /// order, each at most once.
    pub fn add_frontend_links(&mut self, links: impl Into<Entries>) -> Result<(), UserError> {
        let entries = links
            .into()
            .into_strings()
            .map_err(UserError::FrontendLinkInvalidType)?;

        let mut seen: HashSet<String> = self.frontend_links.iter().cloned().collect();
        let before = self.frontend_links.len();
        for entry in entries {
            if seen.insert(entry.clone()) {
                self.frontend_links.push(entry);
            }
        }
        debug!(
            added = self.frontend_links.len() - before,
            total = self.frontend_links.len(),
            "merged frontend links"
        );
        Ok(())
    }

    /// Render a claim from the full projection as a string.
    ///
    /// Strings pass through, lists of strings are space-joined, other values
    /// use their JSON text. Unknown fields yield an empty string.
    pub fn claim_value_by_field(&self, field: &str) -> String {
        match self.full.get(field) {
            None => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(Value::Array(items)) if items.iter().all(Value::is_string) => items
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(" "),
            Some(other) => other.to_string(),
        }
    }

    /// Index of the first checkpoint not yet passed.
    pub fn pending_checkpoint(&self) -> Option<usize> {
        self.checkpoints.iter().position(|c| !c.passed)
    }
}
