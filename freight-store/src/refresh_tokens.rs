use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Duration, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use freight_core::config::TokenConfig;
use freight_core::refresh_token::{NewRefreshTokenRecord, RefreshTokenRecord};
use freight_core::schema::refresh_tokens;
use freight_core::{RefreshToken, StoreError};
use tracing;
use uuid::Uuid;

use crate::users;

const TOKEN_BYTES: usize = 32;

/// Opaque token material: 32 random bytes, URL-safe base64 without padding.
pub fn generate_token() -> String {
    let bytes: [u8; TOKEN_BYTES] = rand::random();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Issue a refresh token for `user_id`, paired with the access token `jwt_id`.
pub async fn issue(
    conn: &mut AsyncPgConnection,
    user_id: Uuid,
    jwt_id: &str,
    lifetime: Duration,
) -> Result<RefreshToken, StoreError> {
    let record = NewRefreshTokenRecord::new(user_id, generate_token(), jwt_id, Utc::now(), lifetime);

    let row = diesel::insert_into(refresh_tokens::table)
        .values(&record)
        .returning(RefreshTokenRecord::as_returning())
        .get_result(conn)
        .await?;

    tracing::debug!("Issued refresh token {} for user {}", row.id, user_id);
    Ok(RefreshToken::from(row))
}

/// Issue a refresh token with the configured lifetime.
pub async fn issue_configured(
    conn: &mut AsyncPgConnection,
    tokens: &TokenConfig,
    user_id: Uuid,
    jwt_id: &str,
) -> Result<RefreshToken, StoreError> {
    issue(conn, user_id, jwt_id, tokens.refresh_token_lifetime()).await
}

pub async fn find_by_token(
    conn: &mut AsyncPgConnection,
    token: &str,
) -> Result<Option<RefreshToken>, StoreError> {
    let row = refresh_tokens::table
        .filter(refresh_tokens::token.eq(token))
        .select(RefreshTokenRecord::as_select())
        .first(conn)
        .await
        .optional()?;

    Ok(row.map(RefreshToken::from))
}

/// Load a token together with its owner. The owner stays `None` when no user
/// row matches `user_id`; the reference is not enforced.
pub async fn find_with_user(
    conn: &mut AsyncPgConnection,
    token: &str,
) -> Result<Option<RefreshToken>, StoreError> {
    let Some(refresh_token) = find_by_token(conn, token).await? else {
        return Ok(None);
    };

    let user = users::find_by_id(conn, refresh_token.user_id).await?;
    if user.is_none() {
        tracing::debug!(
            "Refresh token {} references missing user {}",
            refresh_token.id,
            refresh_token.user_id
        );
    }

    Ok(Some(refresh_token.with_user(user)))
}

/// Atomically mark a still-valid token as used and return it. Returns `None`
/// when the token is unknown, already used, revoked or expired at `now`.
pub async fn consume(
    conn: &mut AsyncPgConnection,
    token: &str,
    now: DateTime<Utc>,
) -> Result<Option<RefreshToken>, StoreError> {
    let row = diesel::update(
        refresh_tokens::table
            .filter(refresh_tokens::token.eq(token))
            .filter(refresh_tokens::is_used.eq(false))
            .filter(refresh_tokens::is_revoked.eq(false))
            .filter(refresh_tokens::expiry_date.gt(now)),
    )
    .set(refresh_tokens::is_used.eq(true))
    .returning(RefreshTokenRecord::as_returning())
    .get_result(conn)
    .await
    .optional()?;

    match &row {
        Some(r) => tracing::debug!("Consumed refresh token {}", r.id),
        None => tracing::debug!("Refresh token rejected"),
    }

    Ok(row.map(RefreshToken::from))
}

pub async fn revoke(conn: &mut AsyncPgConnection, id: Uuid) -> Result<RefreshToken, StoreError> {
    let row = diesel::update(refresh_tokens::table.find(id))
        .set(refresh_tokens::is_revoked.eq(true))
        .returning(RefreshTokenRecord::as_returning())
        .get_result(conn)
        .await
        .optional()?
        .ok_or_else(|| StoreError::not_found("refresh token", id))?;

    tracing::info!("Revoked refresh token {}", id);
    Ok(RefreshToken::from(row))
}

/// Revoke every token issued alongside the access token `jwt_id`.
pub async fn revoke_family(conn: &mut AsyncPgConnection, jwt_id: &str) -> Result<usize, StoreError> {
    let revoked = diesel::update(
        refresh_tokens::table
            .filter(refresh_tokens::jwt_id.eq(jwt_id))
            .filter(refresh_tokens::is_revoked.eq(false)),
    )
    .set(refresh_tokens::is_revoked.eq(true))
    .execute(conn)
    .await?;

    tracing::info!("Revoked {} refresh token(s) for jwt {}", revoked, jwt_id);
    Ok(revoked)
}

pub async fn revoke_all_for_user(conn: &mut AsyncPgConnection, user_id: Uuid) -> Result<usize, StoreError> {
    let revoked = diesel::update(
        refresh_tokens::table
            .filter(refresh_tokens::user_id.eq(user_id))
            .filter(refresh_tokens::is_revoked.eq(false)),
    )
    .set(refresh_tokens::is_revoked.eq(true))
    .execute(conn)
    .await?;

    tracing::info!("Revoked {} refresh token(s) for user {}", revoked, user_id);
    Ok(revoked)
}

/// Delete tokens that expired before `before`.
pub async fn delete_expired(conn: &mut AsyncPgConnection, before: DateTime<Utc>) -> Result<usize, StoreError> {
    let deleted = diesel::delete(refresh_tokens::table.filter(refresh_tokens::expiry_date.lt(before)))
        .execute(conn)
        .await?;

    Ok(deleted)
}
