use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    pub sub: String,
    pub role: u8, // role id
    pub exp: usize,
    pub jti: String,

    pub token_type: TokenType,
    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub enum TokenType {
    Access,
    Refresh,
}

fn now() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize
}

/// Signs access/refresh token pairs for one configured secret.
pub struct TokenIssuer<'a> {
    secret: &'a str,
    access_ttl: usize,
    refresh_ttl: usize,
}

impl<'a> TokenIssuer<'a> {
    pub fn from_config(config: &'a Config) -> Self {
        Self {
            secret: &config.jwt_secret,
            access_ttl: config.access_token_ttl,
            refresh_ttl: config.refresh_token_ttl,
        }
    }

    pub fn access_token(
        &self,
        user_id: u64,
        username: String,
        role: u8,
        employee_id: Option<u64>,
    ) -> String {
        let claims = self.claims(user_id, username, role, employee_id, TokenType::Access);
        self.sign(&claims)
    }

    pub fn refresh_token(
        &self,
        user_id: u64,
        username: String,
        role: u8,
        employee_id: Option<u64>,
    ) -> (String, Claims) {
        let claims = self.claims(user_id, username, role, employee_id, TokenType::Refresh);
        let token = self.sign(&claims);
        (token, claims)
    }

    fn claims(
        &self,
        user_id: u64,
        username: String,
        role: u8,
        employee_id: Option<u64>,
        token_type: TokenType,
    ) -> Claims {
        let ttl = match token_type {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => self.refresh_ttl,
        };
        Claims {
            user_id,
            sub: username,
            role,
            exp: now() + ttl,
            jti: Uuid::new_v4().to_string(),
            token_type,
            employee_id,
        }
    }

    fn sign(&self, claims: &Claims) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .unwrap()
    }
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}
