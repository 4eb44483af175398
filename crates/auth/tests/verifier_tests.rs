use chrono::Duration;
use hearth_auth::{issue_token, AuthError, CredentialVerifier};

const SECRET: &str = "test-secret";

#[test]
fn valid_credential_resolves_identity() {
    let token = issue_token(SECRET, 42, Duration::minutes(5)).expect("token should mint");
    let verifier = CredentialVerifier::new(SECRET);

    let identity = verifier.verify(&token).expect("credential should verify");
    assert_eq!(identity.user_id, 42);
}

#[test]
fn expired_credential_is_refused() {
    let token = issue_token(SECRET, 42, Duration::minutes(-5)).expect("token should mint");
    let verifier = CredentialVerifier::new(SECRET);

    let err = verifier.verify(&token).expect_err("should refuse");
    assert!(matches!(err, AuthError::Expired));
}

#[test]
fn wrong_signature_is_refused() {
    let token = issue_token("other-secret", 42, Duration::minutes(5)).expect("token should mint");
    let verifier = CredentialVerifier::new(SECRET);

    let err = verifier.verify(&token).expect_err("should refuse");
    assert!(matches!(err, AuthError::Invalid));
}

#[test]
fn garbage_credential_is_refused() {
    let verifier = CredentialVerifier::new(SECRET);
    let err = verifier.verify("not-a-jwt").expect_err("should refuse");
    assert!(matches!(err, AuthError::Invalid));
}

#[test]
fn non_numeric_subject_is_refused() {
    use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
    use serde::Serialize;

    #[derive(Serialize)]
    struct Claims {
        sub: String,
        exp: i64,
    }

    let claims = Claims {
        sub: "broker-abc".to_string(),
        exp: (chrono::Utc::now() + Duration::minutes(5)).timestamp(),
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .expect("token should mint");

    let verifier = CredentialVerifier::new(SECRET);
    let err = verifier.verify(&token).expect_err("should refuse");
    assert!(matches!(err, AuthError::BadSubject));
}
