//! Claim normalization.
//!
//! Turns a decoded identity payload into a canonical [`Claims`] record plus
//! two projections keyed by wire name:
//!
//! - the *full* projection holds every recognized claim and is used for
//!   display and claim lookups;
//! - the *reduced* projection holds the subset read by access-control
//!   evaluation.
//!
//! Normalization is all-or-nothing. The first field with an unaccepted shape
//! aborts with a field-specific [`ClaimsError`]. The only exception are the
//! supplementary role sources (`app_metadata.authorization.roles` and
//! `realm_access.roles`), where malformed entries are skipped.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::error::ClaimsError;
use crate::shape::{FieldShape, lenient_string_elements, string_elements};

/// Roles assigned when the payload carries none.
pub const DEFAULT_ROLES: [&str; 2] = ["anonymous", "guest"];

/// Keys read, in order, for the role claim.
const ROLE_KEYS: [&str; 4] = ["roles", "role", "groups", "group"];

/// Keys read, in order, for the scope claim.
const SCOPE_KEYS: [&str; 2] = ["scopes", "scope"];

/// Keys read, in order, for the email claim. A later key overwrites an
/// earlier one.
const EMAIL_KEYS: [&str; 2] = ["email", "mail"];

/// Nested locations of supplementary roles.
const APP_METADATA_ROLES: &[&str] = &["app_metadata", "authorization", "roles"];
const REALM_ACCESS_ROLES: &[&str] = &["realm_access", "roles"];

/// Opaque per-path attributes of an access list entry.
pub type PathAttributes = Map<String, Value>;

/// Access list claim: the set of resource paths granted to the subject.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccessListClaim {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub paths: BTreeMap<String, PathAttributes>,
}

impl AccessListClaim {
    /// Add a path. Re-adding an existing path is a no-op.
    pub fn insert(&mut self, path: impl Into<String>) {
        self.paths.entry(path.into()).or_default();
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains_key(path)
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    fn to_value(&self) -> Value {
        let paths: Map<String, Value> = self
            .paths
            .iter()
            .map(|(path, attrs)| (path.clone(), Value::Object(attrs.clone())))
            .collect();
        let mut acl = Map::new();
        acl.insert("paths".to_string(), Value::Object(paths));
        Value::Object(acl)
    }
}

/// Canonical claims of an authenticated subject.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "aud", default, skip_serializing_if = "Vec::is_empty")]
    pub audience: Vec<String>,
    #[serde(rename = "exp", default, skip_serializing_if = "is_zero")]
    pub expires_at: i64,
    #[serde(rename = "jti", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(rename = "iat", default, skip_serializing_if = "is_zero")]
    pub issued_at: i64,
    #[serde(rename = "iss", default, skip_serializing_if = "String::is_empty")]
    pub issuer: String,
    #[serde(rename = "nbf", default, skip_serializing_if = "is_zero")]
    pub not_before: i64,
    #[serde(rename = "sub", default, skip_serializing_if = "String::is_empty")]
    pub subject: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(rename = "mail", alias = "email", default, skip_serializing_if = "String::is_empty")]
    pub email: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub origin: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<String>,
    #[serde(rename = "org", default, skip_serializing_if = "Vec::is_empty")]
    pub organizations: Vec<String>,
    #[serde(rename = "acl", default, skip_serializing_if = "Option::is_none")]
    pub access_list: Option<AccessListClaim>,
    #[serde(rename = "addr", default, skip_serializing_if = "String::is_empty")]
    pub address: String,
    #[serde(rename = "picture", default, skip_serializing_if = "String::is_empty")]
    pub picture_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub username: String,
}

fn is_zero(n: &i64) -> bool {
    *n == 0
}

impl Claims {
    /// Normalize a raw payload. See [`Normalized`].
    pub fn normalize(data: impl Into<UserData>) -> Result<Normalized, ClaimsError> {
        let raw = data.into().into_map()?;
        Normalizer::new(&raw).run()
    }

    /// Check the expiration against the current time.
    pub fn validate(&self) -> Result<(), ClaimsError> {
        self.validate_at(Utc::now().timestamp())
    }

    /// Check the expiration against `now` (seconds since epoch).
    ///
    /// Claims are valid while `now` is at or before the expiration. An unset
    /// (zero) expiration never expires.
    pub fn validate_at(&self, now: i64) -> Result<(), ClaimsError> {
        if self.expires_at != 0 && self.expires_at < now {
            return Err(ClaimsError::ExpiredToken);
        }
        Ok(())
    }
}

/// Raw identity payload accepted by the normalizer.
#[derive(Debug, Clone, PartialEq)]
pub enum UserData {
    /// JSON-encoded object.
    Text(String),
    /// JSON-encoded object as bytes.
    Bytes(Vec<u8>),
    /// Already decoded object.
    Map(Map<String, Value>),
    /// Anything else. Always rejected.
    Unsupported(Value),
}

impl UserData {
    fn into_map(self) -> Result<Map<String, Value>, ClaimsError> {
        let value = match self {
            UserData::Text(s) => serde_json::from_str::<Value>(&s)?,
            UserData::Bytes(b) => serde_json::from_slice::<Value>(&b)?,
            UserData::Map(m) => Value::Object(m),
            UserData::Unsupported(_) => return Err(ClaimsError::InvalidUserDataType),
        };
        match value {
            Value::Object(m) if !m.is_empty() => Ok(m),
            _ => Err(ClaimsError::InvalidUserDataType),
        }
    }
}

impl From<&str> for UserData {
    fn from(s: &str) -> Self {
        UserData::Text(s.to_string())
    }
}

impl From<String> for UserData {
    fn from(s: String) -> Self {
        UserData::Text(s)
    }
}

impl From<&[u8]> for UserData {
    fn from(b: &[u8]) -> Self {
        UserData::Bytes(b.to_vec())
    }
}

impl From<Vec<u8>> for UserData {
    fn from(b: Vec<u8>) -> Self {
        UserData::Bytes(b)
    }
}

impl From<Map<String, Value>> for UserData {
    fn from(m: Map<String, Value>) -> Self {
        UserData::Map(m)
    }
}

impl From<Value> for UserData {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(m) => UserData::Map(m),
            other => UserData::Unsupported(other),
        }
    }
}

/// Result of a successful normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub claims: Claims,
    /// Every recognized claim keyed by wire name.
    pub full: Map<String, Value>,
    /// Claims relevant to access-control evaluation.
    pub reduced: Map<String, Value>,
}

/// Why a list-or-string field was rejected.
enum ListFault<'v> {
    /// The container shape is not accepted.
    Shape,
    /// A list element is not a string.
    Element(&'v Value),
}

/// Accept a space-delimited string or a list of strings.
fn string_list(value: &Value) -> Result<Vec<String>, ListFault<'_>> {
    match FieldShape::classify(value) {
        FieldShape::Scalar(s) => Ok(s.split(' ').map(str::to_string).collect()),
        FieldShape::Sequence(items) => string_elements(items).map_err(ListFault::Element),
        _ => Err(ListFault::Shape),
    }
}

/// Accept a numeric timestamp, or its decimal text form.
fn coerce_timestamp(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|u| i64::try_from(u).unwrap_or(i64::MAX)))
            .or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f as i64)
            })
        }
        _ => None,
    }
}

fn string_array(items: &[String]) -> Value {
    Value::Array(items.iter().cloned().map(Value::String).collect())
}

struct Normalizer<'a> {
    raw: &'a Map<String, Value>,
    claims: Claims,
    full: Map<String, Value>,
    reduced: Map<String, Value>,
}

impl<'a> Normalizer<'a> {
    fn new(raw: &'a Map<String, Value>) -> Self {
        Self {
            raw,
            claims: Claims::default(),
            full: Map::new(),
            reduced: Map::new(),
        }
    }

    fn run(mut self) -> Result<Normalized, ClaimsError> {
        self.audience()?;
        self.claims.expires_at = self.timestamp("exp", ClaimsError::InvalidClaimExpiresAt)?;
        self.claims.id = self.plain("jti", true, ClaimsError::InvalidIdClaimType)?;
        self.claims.issued_at = self.timestamp("iat", ClaimsError::InvalidClaimIssuedAt)?;
        self.claims.issuer = self.plain("iss", true, ClaimsError::InvalidIssuerClaimType)?;
        self.claims.not_before = self.timestamp("nbf", ClaimsError::InvalidClaimNotBefore)?;
        self.claims.subject = self.plain("sub", true, ClaimsError::InvalidSubjectClaimType)?;
        self.email()?;
        self.name()?;
        self.roles()?;
        self.supplementary_roles();
        self.scopes()?;
        self.access_list()?;
        self.claims.origin = self.plain("origin", true, ClaimsError::InvalidOriginClaimType)?;
        self.organizations()?;
        self.claims.address = self.plain("addr", true, ClaimsError::InvalidAddrType)?;
        self.claims.picture_url =
            self.plain("picture", false, ClaimsError::InvalidPictureClaimType)?;
        self.metadata()?;
        self.claims.username =
            self.plain("username", false, ClaimsError::InvalidUsernameClaimType)?;
        self.finish_roles();

        Ok(Normalized {
            claims: self.claims,
            full: self.full,
            reduced: self.reduced,
        })
    }

    fn emit(&mut self, key: &str, full: Value, reduced: Option<Value>) {
        self.full.insert(key.to_string(), full);
        if let Some(v) = reduced {
            self.reduced.insert(key.to_string(), v);
        }
    }

    fn audience(&mut self) -> Result<(), ClaimsError> {
        let Some(value) = self.raw.get("aud") else {
            return Ok(());
        };
        let audience = match FieldShape::classify(value) {
            FieldShape::Scalar(s) => vec![s.to_string()],
            FieldShape::Sequence(items) => {
                string_elements(items).map_err(|v| ClaimsError::InvalidAudience(v.clone()))?
            }
            _ => return Err(ClaimsError::InvalidAudienceType(value.clone())),
        };
        match audience.as_slice() {
            [] => {}
            [single] => {
                let full = Value::String(single.clone());
                self.emit("aud", full, Some(string_array(&audience)));
            }
            many => {
                let list = string_array(many);
                self.emit("aud", list.clone(), Some(list));
            }
        }
        self.claims.audience = audience;
        Ok(())
    }

    fn timestamp(
        &mut self,
        key: &str,
        err: fn(Value) -> ClaimsError,
    ) -> Result<i64, ClaimsError> {
        let Some(value) = self.raw.get(key) else {
            return Ok(0);
        };
        let ts = coerce_timestamp(value).ok_or_else(|| err(value.clone()))?;
        self.emit(key, Value::from(ts), None);
        Ok(ts)
    }

    /// A claim accepted only as a plain string.
    fn plain(
        &mut self,
        key: &str,
        reduced: bool,
        err: fn(Value) -> ClaimsError,
    ) -> Result<String, ClaimsError> {
        let Some(value) = self.raw.get(key) else {
            return Ok(String::new());
        };
        let s = value.as_str().ok_or_else(|| err(value.clone()))?.to_string();
        let v = Value::String(s.clone());
        self.emit(key, v.clone(), reduced.then_some(v));
        Ok(s)
    }

    fn email(&mut self) -> Result<(), ClaimsError> {
        for key in EMAIL_KEYS {
            match FieldShape::of(self.raw, key) {
                FieldShape::Absent => {}
                FieldShape::Scalar(s) => self.claims.email = s.to_string(),
                _ => {
                    return Err(ClaimsError::InvalidEmailClaimType {
                        key: key.to_string(),
                        value: self.raw[key].clone(),
                    });
                }
            }
        }
        if !self.claims.email.is_empty() {
            let v = Value::String(self.claims.email.clone());
            self.emit("mail", v.clone(), Some(v));
        }
        Ok(())
    }

    /// A name list drops entries equal to the email and joins the rest.
    fn name(&mut self) -> Result<(), ClaimsError> {
        let Some(value) = self.raw.get("name") else {
            return Ok(());
        };
        let invalid = || ClaimsError::InvalidNameClaimType(value.clone());
        let name = match FieldShape::classify(value) {
            FieldShape::Scalar(s) => s.to_string(),
            FieldShape::Sequence(items) => {
                let mut parts = Vec::with_capacity(items.len());
                for item in items {
                    let part = item.as_str().ok_or_else(invalid)?;
                    if part != self.claims.email {
                        parts.push(part);
                    }
                }
                parts.join(" ")
            }
            _ => return Err(invalid()),
        };
        let v = Value::String(name.clone());
        self.emit("name", v.clone(), Some(v));
        self.claims.name = name;
        Ok(())
    }

    fn roles(&mut self) -> Result<(), ClaimsError> {
        for key in ROLE_KEYS {
            let Some(value) = self.raw.get(key) else {
                continue;
            };
            let roles = string_list(value).map_err(|fault| match fault {
                ListFault::Element(v) => ClaimsError::InvalidRole(v.clone()),
                ListFault::Shape => ClaimsError::InvalidRoleType {
                    key: key.to_string(),
                    value: value.clone(),
                },
            })?;
            self.claims.roles.extend(roles);
        }
        Ok(())
    }

    /// Roles from provider-specific nested objects. Best effort: entries
    /// of the wrong type are dropped.
    fn supplementary_roles(&mut self) {
        for path in [APP_METADATA_ROLES, REALM_ACCESS_ROLES] {
            let Some(value) = lookup(self.raw, path) else {
                continue;
            };
            let (roles, discarded) = match FieldShape::classify(value) {
                FieldShape::Sequence(items) => lenient_string_elements(items),
                _ => (Vec::new(), 1),
            };
            if discarded > 0 {
                debug!(source = %path.join("."), discarded, "ignored malformed supplementary roles");
            }
            self.claims.roles.extend(roles);
        }
    }

    fn scopes(&mut self) -> Result<(), ClaimsError> {
        for key in SCOPE_KEYS {
            let Some(value) = self.raw.get(key) else {
                continue;
            };
            let scopes = string_list(value).map_err(|fault| match fault {
                ListFault::Element(v) => ClaimsError::InvalidScope(v.clone()),
                ListFault::Shape => ClaimsError::InvalidScopeType {
                    key: key.to_string(),
                    value: value.clone(),
                },
            })?;
            self.claims.scopes.extend(scopes);
        }
        if !self.claims.scopes.is_empty() {
            let full = Value::String(self.claims.scopes.join(" "));
            let reduced = string_array(&self.claims.scopes);
            self.emit("scopes", full, Some(reduced));
        }
        Ok(())
    }

    /// Paths come from top-level `paths` and from `acl.paths`; both feed
    /// the same set.
    fn access_list(&mut self) -> Result<(), ClaimsError> {
        let mut acl = AccessListClaim::default();

        match FieldShape::of(self.raw, "paths") {
            FieldShape::Absent => {}
            FieldShape::Sequence(items) => insert_paths(&mut acl, items)?,
            _ => return Err(access_list_type("paths", &self.raw["paths"])),
        }

        match FieldShape::of(self.raw, "acl") {
            FieldShape::Absent => {}
            FieldShape::Mapping(nested) => match FieldShape::of(nested, "paths") {
                FieldShape::Absent => {}
                FieldShape::Mapping(paths) => {
                    for path in paths.keys() {
                        acl.insert(path.as_str());
                    }
                }
                FieldShape::Sequence(items) => insert_paths(&mut acl, items)?,
                _ => return Err(access_list_type("acl.paths", &nested["paths"])),
            },
            _ => return Err(access_list_type("acl", &self.raw["acl"])),
        }

        if !acl.is_empty() {
            let v = acl.to_value();
            self.emit("acl", v.clone(), Some(v));
            self.claims.access_list = Some(acl);
        }
        Ok(())
    }

    fn organizations(&mut self) -> Result<(), ClaimsError> {
        let Some(value) = self.raw.get("org") else {
            return Ok(());
        };
        let orgs = string_list(value).map_err(|fault| match fault {
            ListFault::Element(v) => ClaimsError::InvalidOrg(v.clone()),
            ListFault::Shape => ClaimsError::InvalidOrgType(value.clone()),
        })?;
        let full = Value::String(orgs.join(" "));
        let reduced = string_array(&orgs);
        self.emit("org", full, Some(reduced));
        self.claims.organizations = orgs;
        Ok(())
    }

    fn metadata(&mut self) -> Result<(), ClaimsError> {
        match FieldShape::of(self.raw, "metadata") {
            FieldShape::Absent => Ok(()),
            FieldShape::Mapping(m) => {
                self.emit("metadata", Value::Object(m.clone()), None);
                self.claims.metadata = Some(m.clone());
                Ok(())
            }
            _ => Err(ClaimsError::InvalidMetadataClaimType(
                self.raw["metadata"].clone(),
            )),
        }
    }

    fn finish_roles(&mut self) {
        if self.claims.roles.is_empty() {
            trace!("no roles in payload, assigning defaults");
            self.claims.roles = DEFAULT_ROLES.iter().map(|r| r.to_string()).collect();
        }
        let roles = string_array(&self.claims.roles);
        self.emit("roles", roles.clone(), Some(roles));
    }
}

fn insert_paths(acl: &mut AccessListClaim, items: &[Value]) -> Result<(), ClaimsError> {
    for item in items {
        let path = item
            .as_str()
            .ok_or_else(|| ClaimsError::InvalidAccessListPath(item.clone()))?;
        acl.insert(path);
    }
    Ok(())
}

fn access_list_type(key: &str, value: &Value) -> ClaimsError {
    ClaimsError::InvalidAccessListType {
        key: key.to_string(),
        value: value.clone(),
    }
}

/// Walk nested objects along `path`.
fn lookup<'v>(map: &'v Map<String, Value>, path: &[&str]) -> Option<&'v Value> {
    let (last, parents) = path.split_last()?;
    let mut current = map;
    for key in parents {
        current = current.get(*key)?.as_object()?;
    }
    current.get(*last)
}
