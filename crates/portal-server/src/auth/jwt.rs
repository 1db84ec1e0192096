use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::{Error as JwtError, ErrorKind};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Token type discriminator; a refresh token is never accepted as an access token.
const TOKEN_TYPE_ACCESS: &str = "access";
const TOKEN_TYPE_REFRESH: &str = "refresh";

/// JWT claims stored in access and refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Identity id (UUID string).
    pub sub: String,
    pub email: String,
    /// Role resolved at login.
    pub role: String,
    /// Session id; keys the server-side session cache.
    pub sid: String,
    pub exp: i64,
    pub iat: i64,
    /// Unique token identifier, so two tokens issued in the same second differ.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    /// Token type: "access" or "refresh".
    #[serde(default)]
    pub typ: String,
}

impl Claims {
    /// The identity id as a UUID, if well formed.
    pub fn user_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.sub).ok()
    }
}

/// Compute the SHA-256 hash of a raw JWT string, returned as a hex-encoded string.
/// Only the hash of a refresh token is persisted.
pub fn hash_token(raw_token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw_token.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn jwt_secret() -> Result<String, JwtError> {
    std::env::var("JWT_SECRET")
        .ok()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ErrorKind::InvalidKeyFormat.into())
}

pub fn access_token_expiry_minutes() -> i64 {
    std::env::var("JWT_ACCESS_TOKEN_EXPIRY_MINUTES")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(15)
}

pub fn refresh_token_expiry_days() -> i64 {
    std::env::var("JWT_REFRESH_TOKEN_EXPIRY_DAYS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(7)
}

fn sign(
    user_id: Uuid,
    email: &str,
    role: &str,
    sid: &str,
    expires_at: DateTime<Utc>,
    typ: &str,
) -> Result<String, JwtError> {
    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        role: role.to_string(),
        sid: sid.to_string(),
        iat: Utc::now().timestamp(),
        exp: expires_at.timestamp(),
        jti: Some(Uuid::new_v4().to_string()),
        typ: typ.to_string(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret()?.as_bytes()),
    )
}

pub fn create_access_token(
    user_id: Uuid,
    email: &str,
    role: &str,
    sid: &str,
) -> Result<String, JwtError> {
    let expires_at = Utc::now() + Duration::minutes(access_token_expiry_minutes());
    sign(user_id, email, role, sid, expires_at, TOKEN_TYPE_ACCESS)
}

pub fn create_refresh_token(
    user_id: Uuid,
    email: &str,
    role: &str,
    sid: &str,
) -> Result<(String, DateTime<Utc>), JwtError> {
    let expires_at = Utc::now() + Duration::days(refresh_token_expiry_days());
    let token = sign(user_id, email, role, sid, expires_at, TOKEN_TYPE_REFRESH)?;
    Ok((token, expires_at))
}

fn decode_claims(token: &str) -> Result<Claims, JwtError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret()?.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

/// Validate an access token. Rejects refresh tokens.
pub fn validate_access_token(token: &str) -> Result<Claims, JwtError> {
    let claims = decode_claims(token)?;
    if claims.typ != TOKEN_TYPE_ACCESS {
        return Err(ErrorKind::InvalidToken.into());
    }
    Ok(claims)
}

/// Validate a refresh token. Rejects access tokens.
pub fn validate_refresh_token(token: &str) -> Result<Claims, JwtError> {
    let claims = decode_claims(token)?;
    if claims.typ != TOKEN_TYPE_REFRESH {
        return Err(ErrorKind::InvalidToken.into());
    }
    Ok(claims)
}
