use bcrypt::{hash, verify};
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use diesel::prelude::*;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::{debug, error, info};
use rand::{thread_rng, Rng};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::db::{self, DbPool};
use crate::errors::ApiError;
use crate::models::{Claims, NewInvalidatedToken, UserType};

pub struct AuthService;

impl AuthService {
    pub fn hash_pin(pin: &str, cost: u32) -> Result<String, ApiError> {
        hash(pin, cost).map_err(|e| {
            error!("Failed to hash PIN: {}", e);
            ApiError::InternalError("Failed to hash PIN".to_string())
        })
    }

    pub fn verify_pin(pin: &str, pin_hash: &str) -> Result<bool, ApiError> {
        verify(pin, pin_hash).map_err(|e| {
            error!("Failed to verify PIN: {}", e);
            ApiError::InternalError("Failed to verify PIN".to_string())
        })
    }

    /// Random 6-digit code, zero padded.
    pub fn generate_verification_code() -> String {
        format!("{:06}", thread_rng().gen_range(0..1_000_000))
    }

    /// Returns the signed token and its expiry (UTC).
    pub fn generate_token(
        user_id: i32,
        email: &str,
        user_type: UserType,
        config: &AppConfig,
    ) -> Result<(String, NaiveDateTime), ApiError> {
        let now = Utc::now();
        let expires = Duration::try_minutes(config.jwt_expiry_minutes)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| {
                error!("Token expiry of {} minutes is out of range", config.jwt_expiry_minutes);
                ApiError::InternalError("Token expiry is out of range".to_string())
            })?;

        let claims = Claims {
            sub: user_id.to_string(),
            exp: expires.timestamp() as usize,
            iat: now.timestamp() as usize,
            jti: Uuid::new_v4().to_string(),
            user_id,
            email: email.to_string(),
            user_type,
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        )
        .map_err(|e| {
            error!("Failed to generate token: {}", e);
            ApiError::InternalError("Failed to generate token".to_string())
        })?;

        Ok((token, expires.naive_utc()))
    }

    /// Checks signature and expiry.
    pub fn decode_token(token: &str, config: &AppConfig) -> Result<Claims, ApiError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map(|data| data.claims)
        .map_err(|e| {
            debug!("Rejected token: {}", e);
            ApiError::AuthError("Invalid or expired token".to_string())
        })
    }

    pub fn claims_expiry(claims: &Claims) -> NaiveDateTime {
        DateTime::<Utc>::from_timestamp(claims.exp as i64, 0)
            .map(|dt| dt.naive_utc())
            .unwrap_or_else(|| Utc::now().naive_utc())
    }

    pub async fn is_token_revoked(raw_token: &str, pool: &DbPool) -> Result<bool, ApiError> {
        let raw_token = raw_token.to_string();
        db::run(pool, move |conn| {
            use crate::schema::invalidated_token::dsl::*;
            let hit = invalidated_token
                .filter(token.eq(raw_token))
                .select(token_id)
                .first::<i32>(conn)
                .optional()?;
            Ok(hit.is_some())
        })
        .await
    }

    /// Blacklists `raw_token` until it would have expired anyway.
    pub async fn invalidate_token(
        raw_token: &str,
        claims: &Claims,
        pool: &DbPool,
    ) -> Result<(), ApiError> {
        let entry = NewInvalidatedToken {
            token: raw_token.to_string(),
            expires_at: Self::claims_expiry(claims),
            user_id: claims.user_id,
        };
        let owner = claims.user_id;

        db::run(pool, move |conn| {
            use crate::schema::invalidated_token::dsl::*;
            diesel::insert_into(invalidated_token)
                .values(&entry)
                .on_conflict(token)
                .do_nothing()
                .execute(conn)?;
            Ok(())
        })
        .await?;

        info!("Token invalidated for user {}", owner);
        Ok(())
    }

    pub async fn purge_expired_tokens(pool: &DbPool) -> Result<usize, ApiError> {
        let now = Utc::now().naive_utc();
        let removed = db::run(pool, move |conn| {
            use crate::schema::invalidated_token::dsl::*;
            Ok(diesel::delete(invalidated_token.filter(expires_at.lt(now))).execute(conn)?)
        })
        .await?;

        if removed > 0 {
            info!("Purged {} expired blacklisted tokens", removed);
        }
        Ok(removed)
    }
}
