//! Validation and normalization of registration submissions.
//!
//! A submission passes through: API key check, lenient JSON parse, email
//! validation, role code mapping, default substitution, and finally a single
//! upsert into the registrant store.

use crate::error::IntakeError;
use axum::http::HeaderMap;
use registrant_store::{CapstoneFlag, RegistrantStore, Registration, Role};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use sha2::{Digest, Sha256};
use tracing::{debug, error, info, warn};

/// Header carrying the shared secret.
pub const API_KEY_HEADER: &str = "api-key";

/// First name stored when the submission has none.
pub const DEFAULT_FIRST_NAME: &str = "Brutus";

/// Last name stored when the submission has none.
pub const DEFAULT_LAST_NAME: &str = "Buckeye";

/// Role codes sent by the survey workflow.
const ROLE_CODES: [(&str, Role); 2] = [("1", Role::Judge), ("2", Role::Mentor)];

/// Map a single role code to its role. Unknown codes map to `None`.
pub fn role_for_code(code: &str) -> Option<Role> {
    ROLE_CODES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, role)| *role)
}

/// Parse a comma-separated list of role codes.
///
/// Codes are trimmed, unknown codes dropped and duplicates removed, keeping
/// first-seen order. The result may be empty.
pub fn parse_roles(input: &str) -> Vec<Role> {
    let mut roles = Vec::new();
    for code in input.split(',').map(str::trim) {
        match role_for_code(code) {
            Some(role) if !roles.contains(&role) => roles.push(role),
            Some(_) => {}
            None if code.is_empty() => {}
            None => debug!(code, "Ignoring unknown role code"),
        }
    }
    roles
}

/// Shared secret checked against the `api-key` header.
///
/// Only the SHA-256 digest of the secret is kept, and presented keys are
/// compared digest to digest in constant time.
#[derive(Clone)]
pub struct ApiKey {
    digest: [u8; 32],
}

impl ApiKey {
    pub fn new(secret: &SecretString) -> Self {
        Self {
            digest: digest(secret.expose_secret()),
        }
    }

    /// Check a presented key. A missing key never matches.
    pub fn verify(&self, presented: Option<&str>) -> bool {
        let Some(presented) = presented else {
            return false;
        };

        let candidate = digest(presented);
        let mut diff = 0u8;
        for (a, b) in self.digest.iter().zip(candidate.iter()) {
            diff |= a ^ b;
        }
        diff == 0
    }

    /// Check the `api-key` header. Non-ASCII header values never match.
    pub fn verify_headers(&self, headers: &HeaderMap) -> bool {
        let presented = headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok());
        self.verify(presented)
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKey").finish_non_exhaustive()
    }
}

fn digest(value: &str) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Sha256::digest(value.as_bytes()));
    out
}

/// A registration submission as received.
///
/// Every field is optional. A field with the wrong JSON type, or `null`,
/// counts as absent.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegistrationRequest {
    #[serde(deserialize_with = "lenient")]
    pub email: Option<String>,

    #[serde(deserialize_with = "lenient")]
    pub first_name: Option<String>,

    #[serde(deserialize_with = "lenient")]
    pub last_name: Option<String>,

    #[serde(deserialize_with = "lenient")]
    pub is_capstone: Option<CapstoneFlag>,

    /// Comma-separated role codes, e.g. `"1,2"`
    #[serde(deserialize_with = "lenient")]
    pub roles: Option<String>,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).ok())
}

impl RegistrationRequest {
    /// Parse a request body. Bodies that are not a JSON object parse as an
    /// empty request.
    pub fn from_body(body: &[u8]) -> Self {
        match serde_json::from_slice::<serde_json::Value>(body) {
            Ok(value @ serde_json::Value::Object(_)) => {
                serde_json::from_value(value).unwrap_or_default()
            }
            Ok(_) => {
                warn!("Request body is not a JSON object, treating all fields as absent");
                Self::default()
            }
            Err(e) => {
                warn!(error = %e, "Request body is not valid JSON, treating all fields as absent");
                Self::default()
            }
        }
    }

    /// Validate and normalize into a registration.
    pub fn normalize(self) -> Result<Registration, IntakeError> {
        let email = self.email.as_deref().map(str::trim).unwrap_or_default();
        if email.is_empty() {
            return Err(IntakeError::MissingEmail);
        }

        let roles = self.roles.as_deref().map(parse_roles).unwrap_or_default();

        Ok(Registration::new(
            email,
            self.first_name.unwrap_or_else(|| DEFAULT_FIRST_NAME.to_string()),
            self.last_name.unwrap_or_else(|| DEFAULT_LAST_NAME.to_string()),
            self.is_capstone.unwrap_or_default(),
            roles,
        ))
    }
}

/// Authenticate, normalize and store one registration submission.
///
/// Returns the normalized registration on success. Storage is touched only
/// after the key and email checks pass, and exactly once.
pub async fn handle_registration(
    api_key: &ApiKey,
    store: &dyn RegistrantStore,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<Registration, IntakeError> {
    if !api_key.verify_headers(headers) {
        error!("Api-Key is not correct.");
        return Err(IntakeError::Unauthorized);
    }

    let registration = match RegistrationRequest::from_body(body).normalize() {
        Ok(registration) => registration,
        Err(e) => {
            error!("{}", e);
            return Err(e);
        }
    };

    if let Err(e) = store.add_registration(&registration).await {
        error!(
            email = %registration.email,
            error = ?e,
            "An unexpected error occurred while adding registrant to the database"
        );
        return Err(e.into());
    }

    info!(
        email = %registration.email,
        roles = ?registration.roles,
        capstone = registration.is_capstone.is_set(),
        "User registered successfully"
    );
    Ok(registration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::http::HeaderValue;
    use mockall::mock;
    use registrant_store::{Registrant, StoreError};

    mock! {
        pub Store {}

        #[async_trait]
        impl RegistrantStore for Store {
            async fn add_registration(&self, registration: &Registration) -> Result<Registrant, StoreError>;
            async fn get(&self, email: &str) -> Result<Option<Registrant>, StoreError>;
            async fn count(&self) -> Result<usize, StoreError>;
        }
    }

    fn key() -> ApiKey {
        ApiKey::new(&SecretString::new("secret123".to_string()))
    }

    fn headers(api_key: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(k) = api_key {
            headers.insert(API_KEY_HEADER, HeaderValue::from_str(k).unwrap());
        }
        headers
    }

    #[test]
    fn test_role_for_code() {
        assert_eq!(role_for_code("1"), Some(Role::Judge));
        assert_eq!(role_for_code("2"), Some(Role::Mentor));
        assert_eq!(role_for_code("3"), None);
        assert_eq!(role_for_code(""), None);
    }

    #[test]
    fn test_parse_roles_dedupes_in_order() {
        assert_eq!(parse_roles("1,2,1"), vec![Role::Judge, Role::Mentor]);
        assert_eq!(parse_roles("2, 1"), vec![Role::Mentor, Role::Judge]);
        assert_eq!(parse_roles(" 2 ,,9,2"), vec![Role::Mentor]);
        assert!(parse_roles("").is_empty());
        assert!(parse_roles("judge,7").is_empty());
    }

    #[test]
    fn test_api_key_verify() {
        let key = key();
        assert!(key.verify(Some("secret123")));
        assert!(!key.verify(Some("secret1234")));
        assert!(!key.verify(Some("")));
        assert!(!key.verify(None));
    }

    #[test]
    fn test_api_key_debug_hides_secret() {
        let debug = format!("{:?}", key());
        assert!(!debug.contains("secret123"));
        assert_eq!(debug, "ApiKey { .. }");
    }

    #[test]
    fn test_api_key_verify_headers() {
        let key = key();
        assert!(key.verify_headers(&headers(Some("secret123"))));
        assert!(!key.verify_headers(&headers(Some("wrong"))));
        assert!(!key.verify_headers(&headers(None)));

        let mut opaque = HeaderMap::new();
        opaque.insert(API_KEY_HEADER, HeaderValue::from_bytes(b"secret\xff").unwrap());
        assert!(!key.verify_headers(&opaque));
    }

    #[test]
    fn test_normalize_applies_defaults() {
        let reg = RegistrationRequest::from_body(br#"{"email":"A@B.com","roles":"2"}"#)
            .normalize()
            .unwrap();

        assert_eq!(reg.email, "a@b.com");
        assert_eq!(reg.first_name, "Brutus");
        assert_eq!(reg.last_name, "Buckeye");
        assert_eq!(reg.is_capstone, CapstoneFlag::Int(0));
        assert_eq!(reg.roles, vec![Role::Mentor]);

        let reg = RegistrationRequest::from_body(br#"{"email":" A@B.com "}"#)
            .normalize()
            .unwrap();
        assert_eq!(reg.email, "a@b.com");
    }

    #[test]
    fn test_normalize_keeps_supplied_fields() {
        let reg = RegistrationRequest::from_body(
            br#"{"email":"x@y.org","first_name":"Ada","last_name":"Lovelace","is_capstone":true,"roles":"1"}"#,
        )
        .normalize()
        .unwrap();

        assert_eq!(reg.first_name, "Ada");
        assert_eq!(reg.last_name, "Lovelace");
        assert_eq!(reg.is_capstone, CapstoneFlag::Bool(true));
        assert_eq!(reg.roles, vec![Role::Judge]);
    }

    #[test]
    fn test_normalize_without_roles_is_participant() {
        for body in [
            r#"{"email":"a@b.com"}"#,
            r#"{"email":"a@b.com","roles":""}"#,
            r#"{"email":"a@b.com","roles":"5,6"}"#,
            r#"{"email":"a@b.com","roles":null}"#,
        ] {
            let reg = RegistrationRequest::from_body(body.as_bytes()).normalize().unwrap();
            assert_eq!(reg.roles, vec![Role::Participant]);
        }
    }

    #[test]
    fn test_normalize_requires_email() {
        for body in [
            r#"{}"#,
            r#"{"email":""}"#,
            r#"{"email":"   "}"#,
            r#"{"email":42}"#,
            r#"["a@b.com"]"#,
            "not json",
            "",
        ] {
            let result = RegistrationRequest::from_body(body.as_bytes()).normalize();
            assert!(matches!(result, Err(IntakeError::MissingEmail)));
        }
    }

    #[test]
    fn test_wrong_typed_fields_are_absent() {
        let reg = RegistrationRequest::from_body(
            br#"{"email":"a@b.com","first_name":7,"is_capstone":"yes","roles":["1"]}"#,
        )
        .normalize()
        .unwrap();

        assert_eq!(reg.first_name, "Brutus");
        assert_eq!(reg.is_capstone, CapstoneFlag::Int(0));
        assert_eq!(reg.roles, vec![Role::Participant]);
    }

    #[tokio::test]
    async fn test_handle_stores_normalized_registration() {
        let mut store = MockStore::new();
        store
            .expect_add_registration()
            .withf(|reg| reg.email == "foo@bar.com" && reg.roles == vec![Role::Judge, Role::Mentor])
            .times(1)
            .returning(|reg| Ok(Registrant::new(reg.clone())));

        let reg = handle_registration(
            &key(),
            &store,
            &headers(Some("secret123")),
            br#"{"email":"Foo@Bar.com","roles":"1,2,1"}"#,
        )
        .await
        .unwrap();

        assert_eq!(reg.email, "foo@bar.com");
    }

    #[tokio::test]
    async fn test_handle_rejects_bad_key_without_storing() {
        let mut store = MockStore::new();
        store.expect_add_registration().times(0);

        for api_key in [None, Some("wrong")] {
            let result = handle_registration(
                &key(),
                &store,
                &headers(api_key),
                br#"{"email":"a@b.com"}"#,
            )
            .await;
            assert!(matches!(result, Err(IntakeError::Unauthorized)));
        }
    }

    #[tokio::test]
    async fn test_handle_rejects_missing_email_without_storing() {
        let mut store = MockStore::new();
        store.expect_add_registration().times(0);

        let result =
            handle_registration(&key(), &store, &headers(Some("secret123")), b"{}").await;
        assert!(matches!(result, Err(IntakeError::MissingEmail)));
    }

    #[tokio::test]
    async fn test_handle_maps_store_failure() {
        let mut store = MockStore::new();
        store.expect_add_registration().times(1).returning(|_| {
            Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "connection reset",
            )))
        });

        let result = handle_registration(
            &key(),
            &store,
            &headers(Some("secret123")),
            br#"{"email":"a@b.com"}"#,
        )
        .await;

        assert!(matches!(result, Err(IntakeError::Storage(_))));
    }
}
