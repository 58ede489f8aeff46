//! Google service-account authentication (OAuth2 JWT bearer grant).

use crate::utils::error::{Result, VoteCheckError};
use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const SHEETS_SCOPES: &str =
    "https://www.googleapis.com/auth/spreadsheets https://www.googleapis.com/auth/drive.readonly";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const TOKEN_LIFETIME_SECS: i64 = 3600;

/// 服務帳號憑證檔（Google Cloud 下載的 JSON）
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    pub token_uri: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
}

impl ServiceAccountKey {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Bearer token plus the moment Google stops accepting it.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub secret: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// Lifetimes outside `0..=3600` s are clamped.
    pub fn new(secret: impl Into<String>, expires_in_secs: i64) -> Self {
        let lifetime = TimeDelta::seconds(expires_in_secs.clamp(0, TOKEN_LIFETIME_SECS));
        Self {
            secret: secret.into(),
            expires_at: Utc::now() + lifetime,
        }
    }

    pub fn expires_within(&self, margin: TimeDelta) -> bool {
        Utc::now() + margin >= self.expires_at
    }
}

pub fn signed_assertion(key: &ServiceAccountKey, scopes: &str) -> Result<String> {
    let iat = Utc::now().timestamp();
    let claims = Claims {
        iss: key.client_email.clone(),
        scope: scopes.to_string(),
        aud: key.token_uri.clone(),
        iat,
        exp: iat + TOKEN_LIFETIME_SECS,
    };

    let mut header = Header::new(Algorithm::RS256);
    header.kid = key.private_key_id.clone();

    let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())?;
    Ok(jsonwebtoken::encode(&header, &claims, &encoding_key)?)
}

/// Exchanges the service-account key for a bearer token.
pub async fn fetch_access_token(client: &Client, key: &ServiceAccountKey) -> Result<AccessToken> {
    let assertion = signed_assertion(key, SHEETS_SCOPES)?;

    tracing::debug!("Requesting access token for {}", key.client_email);
    let response = client
        .post(&key.token_uri)
        .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(VoteCheckError::SheetsApiError {
            status: status.as_u16(),
            message,
        });
    }

    let token: TokenResponse = response.json().await?;
    let expires_in = token.expires_in.unwrap_or(TOKEN_LIFETIME_SECS);
    tracing::debug!("🔑 Access token acquired, valid for {}s", expires_in);
    Ok(AccessToken::new(token.access_token, expires_in))
}
