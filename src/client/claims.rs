//! Access token claims as seen by the dashboard
//!
//! The dashboard never verifies signatures; it only reads the payload segment
//! to recover a degraded identity when no server-supplied user is cached.

use data_encoding::BASE64URL_NOPAD;
use serde_json::{Map, Value};

use crate::models::PublicUser;

/// Decoded JWT payload
pub type Claims = Map<String, Value>;

/// Decode the payload segment of a JWT without checking its signature.
///
/// Returns `None` for anything that is not `header.payload[.signature]` with a
/// base64url JSON object in the middle.
pub fn decode_claims(token: &str) -> Option<Claims> {
    let payload = token.split('.').nth(1)?;
    let bytes = BASE64URL_NOPAD
        .decode(payload.trim_end_matches('=').as_bytes())
        .ok()?;

    match serde_json::from_slice::<Value>(&bytes).ok()? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

/// Normalize a claim into a list of strings.
///
/// Arrays keep every element (non-string scalars are stringified); strings are
/// split on whitespace and commas. Anything else yields `None`.
pub fn to_string_list(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) => Some(
            items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
        ),
        Value::String(s) => Some(
            s.split(|c: char| c.is_whitespace() || c == ',')
                .filter(|part| !part.is_empty())
                .map(str::to_string)
                .collect(),
        ),
        _ => None,
    }
}

/// List from the first claim among `names` that is a string or an array.
/// An empty list still ends the search.
fn first_list(claims: &Claims, names: &[&str]) -> Vec<String> {
    names
        .iter()
        .find_map(|name| claims.get(*name).and_then(to_string_list))
        .unwrap_or_default()
}

fn string_claim(claims: &Claims, name: &str) -> Option<String> {
    claims.get(name).and_then(Value::as_str).map(str::to_string)
}

/// Build a user from token claims.
///
/// `sub` becomes the id; roles come from `roles` or `role`; permissions from
/// `permissions`, `perms`, `scopes` or `scope`.
pub fn claims_to_user(claims: &Claims) -> PublicUser {
    PublicUser {
        id: string_claim(claims, "sub").unwrap_or_default(),
        email: string_claim(claims, "email"),
        name: string_claim(claims, "name"),
        roles: first_list(claims, &["roles", "role"]),
        permissions: first_list(claims, &["permissions", "perms", "scopes", "scope"]),
    }
}

#[cfg(test)]
pub(crate) fn encode_test_token(payload: &Value) -> String {
    let header = BASE64URL_NOPAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let body = BASE64URL_NOPAD.encode(payload.to_string().as_bytes());
    format!("{}.{}.signature", header, body)
}
