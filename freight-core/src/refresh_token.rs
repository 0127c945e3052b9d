use chrono::{DateTime, Duration, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::schema::refresh_tokens;
use crate::user::ApplicationUser;

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = refresh_tokens)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RefreshTokenRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token: String,
    pub jwt_id: String,
    pub is_used: bool,
    pub is_revoked: bool,
    pub added_date: DateTime<Utc>,
    pub expiry_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = refresh_tokens)]
pub struct NewRefreshTokenRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token: String,
    pub jwt_id: String,
    pub added_date: DateTime<Utc>,
    pub expiry_date: DateTime<Utc>,
}

impl NewRefreshTokenRecord {
    /// `jwt_id` ties the refresh token to the access token issued with it.
    pub fn new(
        user_id: Uuid,
        token: String,
        jwt_id: impl Into<String>,
        issued_at: DateTime<Utc>,
        lifetime: Duration,
    ) -> Self {
        NewRefreshTokenRecord {
            id: Uuid::new_v4(),
            user_id,
            token,
            jwt_id: jwt_id.into(),
            added_date: issued_at,
            expiry_date: issued_at + lifetime,
        }
    }
}

/// Session-renewal credential.
///
/// `is_used` and `is_revoked` only ever move from `false` to `true`; there is
/// no way to clear them once set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(skip_serializing)]
    pub token: String,
    pub jwt_id: String,
    is_used: bool,
    is_revoked: bool,
    pub added_date: DateTime<Utc>,
    pub expiry_date: DateTime<Utc>,
    /// Owning user, only present when explicitly loaded.
    pub user: Option<Box<ApplicationUser>>,
}

impl RefreshToken {
    pub fn is_used(&self) -> bool {
        self.is_used
    }

    pub fn is_revoked(&self) -> bool {
        self.is_revoked
    }

    pub fn mark_used(&mut self) {
        self.is_used = true;
    }

    pub fn revoke(&mut self) {
        self.is_revoked = true;
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expiry_date
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_used && !self.is_revoked && !self.is_expired_at(now)
    }

    pub fn with_user(mut self, user: Option<ApplicationUser>) -> Self {
        self.user = user.map(Box::new);
        self
    }
}

impl From<RefreshTokenRecord> for RefreshToken {
    fn from(record: RefreshTokenRecord) -> Self {
        RefreshToken {
            id: record.id,
            user_id: record.user_id,
            token: record.token,
            jwt_id: record.jwt_id,
            is_used: record.is_used,
            is_revoked: record.is_revoked,
            added_date: record.added_date,
            expiry_date: record.expiry_date,
            user: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issued(now: DateTime<Utc>) -> RefreshToken {
        let new = NewRefreshTokenRecord::new(
            Uuid::new_v4(),
            "opaque".to_string(),
            "jti-1",
            now,
            Duration::days(7),
        );
        RefreshToken::from(RefreshTokenRecord {
            id: new.id,
            user_id: new.user_id,
            token: new.token,
            jwt_id: new.jwt_id,
            is_used: false,
            is_revoked: false,
            added_date: new.added_date,
            expiry_date: new.expiry_date,
        })
    }

    #[test]
    fn test_new_token_expiry() {
        let now = Utc::now();
        let token = issued(now);
        assert_eq!(token.expiry_date - token.added_date, Duration::days(7));
        assert!(token.user.is_none());
    }

    #[test]
    fn test_valid_only_before_expiry_with_flags_clear() {
        let now = Utc::now();
        let token = issued(now);
        assert!(token.is_valid_at(now));
        assert!(token.is_valid_at(now + Duration::days(7) - Duration::seconds(1)));
        assert!(!token.is_valid_at(now + Duration::days(7)));
    }

    #[test]
    fn test_flags_are_one_way() {
        let now = Utc::now();
        let mut token = issued(now);

        token.mark_used();
        assert!(token.is_used());
        assert!(!token.is_valid_at(now));
        token.mark_used();
        assert!(token.is_used());

        token.revoke();
        token.revoke();
        assert!(token.is_revoked());
        assert!(token.is_used());
    }

    #[test]
    fn test_revoked_token_is_invalid() {
        let now = Utc::now();
        let mut token = issued(now);
        token.revoke();
        assert!(!token.is_used());
        assert!(!token.is_valid_at(now));
    }
}
