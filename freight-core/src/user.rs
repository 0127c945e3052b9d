use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::ValidationError;
use crate::schema::users;
use crate::validation;

pub const USER_NAME_MAX: usize = 256;
pub const EMAIL_MAX: usize = 256;
pub const PREFERRED_LANGUAGE_MAX: usize = 10;
pub const DEFAULT_LANGUAGE: &str = "en";

pub const MIN_RATING_SCORE: f64 = 1.0;
pub const MAX_RATING_SCORE: f64 = 5.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserRole {
    #[default]
    Shipper,
    Carrier,
    Admin,
}

impl UserRole {
    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::Shipper => "Shipper",
            UserRole::Carrier => "Carrier",
            UserRole::Admin => "Admin",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Shipper" => Ok(UserRole::Shipper),
            "Carrier" => Ok(UserRole::Carrier),
            "Admin" => Ok(UserRole::Admin),
            other => Err(ValidationError::UnknownName {
                kind: "user role",
                name: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountStatus {
    Active,
    #[default]
    PendingVerification,
    Suspended,
    Deactivated,
}

impl AccountStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AccountStatus::Active => "Active",
            AccountStatus::PendingVerification => "PendingVerification",
            AccountStatus::Suspended => "Suspended",
            AccountStatus::Deactivated => "Deactivated",
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Active" => Ok(AccountStatus::Active),
            "PendingVerification" => Ok(AccountStatus::PendingVerification),
            "Suspended" => Ok(AccountStatus::Suspended),
            "Deactivated" => Ok(AccountStatus::Deactivated),
            other => Err(ValidationError::UnknownName {
                kind: "account status",
                name: other.to_string(),
            }),
        }
    }
}

/// Aggregate rating. The average is derived, so count, total and average
/// cannot drift apart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    count: u32,
    total: f64,
}

impl RatingSummary {
    pub fn from_columns(count: i32, total: f64) -> Result<Self, ValidationError> {
        let count = u32::try_from(count).map_err(|_| ValidationError::NegativeRatingCount(count))?;
        Ok(RatingSummary { count, total })
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    /// `None` until the first rating arrives.
    pub fn average(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.total / f64::from(self.count))
        }
    }

    pub fn record(&mut self, score: f64) -> Result<(), ValidationError> {
        if !(MIN_RATING_SCORE..=MAX_RATING_SCORE).contains(&score) {
            return Err(ValidationError::RatingOutOfRange(score));
        }
        self.count += 1;
        self.total += score;
        Ok(())
    }
}

/// Per-channel notification opt-ins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, AsChangeset)]
#[diesel(table_name = users)]
pub struct NotificationPreferences {
    #[diesel(column_name = email_notifications_enabled)]
    pub email: bool,
    #[diesel(column_name = sms_notifications_enabled)]
    pub sms: bool,
    #[diesel(column_name = push_notifications_enabled)]
    pub push: bool,
    pub preferred_language: String,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        NotificationPreferences {
            email: true,
            sms: true,
            push: true,
            preferred_language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

impl NotificationPreferences {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::required_text(
            "preferred_language",
            &self.preferred_language,
            PREFERRED_LANGUAGE_MAX,
        )
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRecord {
    pub id: Uuid,
    pub user_name: String,
    pub normalized_user_name: String,
    pub email: Option<String>,
    pub normalized_email: Option<String>,
    pub email_confirmed: bool,
    pub password_hash: Option<String>,
    pub security_stamp: String,
    pub concurrency_stamp: String,
    pub phone_number: Option<String>,
    pub phone_number_confirmed: bool,
    pub lockout_end: Option<DateTime<Utc>>,
    pub lockout_enabled: bool,
    pub access_failed_count: i32,
    pub full_name: String,
    pub role: String,
    pub rating: Option<f64>,
    pub rating_count: i32,
    pub rating_total: f64,
    pub registration_date: DateTime<Utc>,
    pub last_login_date: Option<DateTime<Utc>>,
    pub account_status: String,
    pub profile_picture_url: Option<String>,
    pub has_verified_truck: bool,
    pub last_password_change_date: Option<DateTime<Utc>>,
    pub email_notifications_enabled: bool,
    pub sms_notifications_enabled: bool,
    pub push_notifications_enabled: bool,
    pub preferred_language: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub struct NewUserRecord {
    pub id: Uuid,
    pub user_name: String,
    pub normalized_user_name: String,
    pub email: Option<String>,
    pub normalized_email: Option<String>,
    pub password_hash: Option<String>,
    pub security_stamp: String,
    pub concurrency_stamp: String,
    pub phone_number: Option<String>,
    pub lockout_enabled: bool,
    pub full_name: String,
    pub role: String,
    pub registration_date: DateTime<Utc>,
    pub account_status: String,
    pub profile_picture_url: Option<String>,
    pub email_notifications_enabled: bool,
    pub sms_notifications_enabled: bool,
    pub push_notifications_enabled: bool,
    pub preferred_language: String,
}

/// Identity principal plus the marketplace profile attached to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationUser {
    pub id: Uuid,
    pub user_name: String,
    pub normalized_user_name: String,
    pub email: Option<String>,
    pub normalized_email: Option<String>,
    pub email_confirmed: bool,
    #[serde(default, skip_serializing)]
    pub password_hash: Option<String>,
    #[serde(default, skip_serializing)]
    pub security_stamp: String,
    pub concurrency_stamp: String,
    pub phone_number: Option<String>,
    pub phone_number_confirmed: bool,
    pub lockout_end: Option<DateTime<Utc>>,
    pub lockout_enabled: bool,
    pub access_failed_count: i32,
    pub full_name: String,
    pub role: UserRole,
    pub rating: RatingSummary,
    pub registration_date: DateTime<Utc>,
    pub last_login_date: Option<DateTime<Utc>>,
    pub account_status: AccountStatus,
    pub profile_picture_url: Option<String>,
    pub has_verified_truck: bool,
    pub last_password_change_date: Option<DateTime<Utc>>,
    pub notifications: NotificationPreferences,
}

impl ApplicationUser {
    pub fn is_locked_out(&self, now: DateTime<Utc>) -> bool {
        self.lockout_enabled && self.lockout_end.is_some_and(|end| end > now)
    }
}

impl TryFrom<UserRecord> for ApplicationUser {
    type Error = ValidationError;

    fn try_from(record: UserRecord) -> Result<Self, Self::Error> {
        Ok(ApplicationUser {
            role: record.role.parse()?,
            account_status: record.account_status.parse()?,
            rating: RatingSummary::from_columns(record.rating_count, record.rating_total)?,
            notifications: NotificationPreferences {
                email: record.email_notifications_enabled,
                sms: record.sms_notifications_enabled,
                push: record.push_notifications_enabled,
                preferred_language: record.preferred_language,
            },
            id: record.id,
            user_name: record.user_name,
            normalized_user_name: record.normalized_user_name,
            email: record.email,
            normalized_email: record.normalized_email,
            email_confirmed: record.email_confirmed,
            password_hash: record.password_hash,
            security_stamp: record.security_stamp,
            concurrency_stamp: record.concurrency_stamp,
            phone_number: record.phone_number,
            phone_number_confirmed: record.phone_number_confirmed,
            lockout_end: record.lockout_end,
            lockout_enabled: record.lockout_enabled,
            access_failed_count: record.access_failed_count,
            full_name: record.full_name,
            registration_date: record.registration_date,
            last_login_date: record.last_login_date,
            profile_picture_url: record.profile_picture_url,
            has_verified_truck: record.has_verified_truck,
            last_password_change_date: record.last_password_change_date,
        })
    }
}

/// Input for creating a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub user_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password_hash: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub profile_picture_url: Option<String>,
    #[serde(default)]
    pub notifications: NotificationPreferences,
}

impl NewUser {
    pub fn into_record(self, now: DateTime<Utc>) -> Result<NewUserRecord, ValidationError> {
        let user_name = self.user_name.trim().to_string();
        validation::required_text("user_name", &user_name, USER_NAME_MAX)?;
        if let Some(email) = &self.email {
            validation::required_text("email", email, EMAIL_MAX)?;
        }
        self.notifications.validate()?;

        Ok(NewUserRecord {
            id: Uuid::new_v4(),
            normalized_user_name: normalize(&user_name),
            user_name,
            normalized_email: self.email.as_deref().map(normalize),
            email: self.email,
            password_hash: self.password_hash,
            security_stamp: new_security_stamp(),
            concurrency_stamp: Uuid::new_v4().to_string(),
            phone_number: self.phone_number,
            lockout_enabled: true,
            full_name: self.full_name,
            role: self.role.as_str().to_string(),
            registration_date: now,
            account_status: AccountStatus::default().as_str().to_string(),
            profile_picture_url: self.profile_picture_url,
            email_notifications_enabled: self.notifications.email,
            sms_notifications_enabled: self.notifications.sms,
            push_notifications_enabled: self.notifications.push,
            preferred_language: self.notifications.preferred_language,
        })
    }
}

/// Lookup form of user names and emails.
pub fn normalize(value: &str) -> String {
    value.trim().to_uppercase()
}

pub fn new_security_stamp() -> String {
    Uuid::new_v4().simple().to_string().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_user() -> NewUser {
        NewUser {
            user_name: " dispatch.amina ".to_string(),
            email: Some("Amina@Example.com".to_string()),
            password_hash: Some("hash".to_string()),
            phone_number: None,
            full_name: "Amina Yusuf".to_string(),
            role: UserRole::default(),
            profile_picture_url: None,
            notifications: NotificationPreferences::default(),
        }
    }

    #[test]
    fn test_rating_average_absent_without_ratings() {
        let rating = RatingSummary::default();
        assert_eq!(rating.count(), 0);
        assert_eq!(rating.average(), None);
    }

    #[test]
    fn test_rating_average_tracks_total_and_count() {
        let mut rating = RatingSummary::default();
        rating.record(5.0).unwrap();
        rating.record(4.0).unwrap();
        rating.record(3.0).unwrap();

        assert_eq!(rating.count(), 3);
        assert_eq!(rating.total(), 12.0);
        assert_eq!(rating.average(), Some(4.0));
    }

    #[test]
    fn test_rating_rejects_out_of_range_scores() {
        let mut rating = RatingSummary::default();
        assert_eq!(rating.record(0.5), Err(ValidationError::RatingOutOfRange(0.5)));
        assert!(rating.record(f64::NAN).is_err());
        assert_eq!(rating.count(), 0);
        assert_eq!(rating.average(), None);
    }

    #[test]
    fn test_rating_from_columns_rejects_negative_count() {
        assert!(RatingSummary::from_columns(-1, 0.0).is_err());
        assert_eq!(
            RatingSummary::from_columns(2, 9.0).unwrap().average(),
            Some(4.5)
        );
    }

    #[test]
    fn test_role_and_status_names() {
        for role in [UserRole::Shipper, UserRole::Carrier, UserRole::Admin] {
            assert_eq!(role.as_str().parse::<UserRole>(), Ok(role));
        }
        assert!("Driver".parse::<UserRole>().is_err());
        assert_eq!(UserRole::default(), UserRole::Shipper);

        assert_eq!(AccountStatus::default(), AccountStatus::PendingVerification);
        assert_eq!(
            "Suspended".parse::<AccountStatus>(),
            Ok(AccountStatus::Suspended)
        );
        assert!("suspended".parse::<AccountStatus>().is_err());
    }

    #[test]
    fn test_new_user_defaults() {
        let now = Utc::now();
        let record = new_user().into_record(now).unwrap();

        assert_eq!(record.user_name, "dispatch.amina");
        assert_eq!(record.normalized_user_name, "DISPATCH.AMINA");
        assert_eq!(record.normalized_email.as_deref(), Some("AMINA@EXAMPLE.COM"));
        assert_eq!(record.role, "Shipper");
        assert_eq!(record.account_status, "PendingVerification");
        assert_eq!(record.preferred_language, "en");
        assert!(record.email_notifications_enabled);
        assert!(record.sms_notifications_enabled);
        assert!(record.push_notifications_enabled);
        assert_eq!(record.security_stamp.len(), 32);
        assert_eq!(record.registration_date, now);
    }

    #[test]
    fn test_new_user_rejects_blank_user_name() {
        let mut user = new_user();
        user.user_name = "  ".to_string();
        assert_eq!(
            user.into_record(Utc::now()).unwrap_err(),
            ValidationError::Empty { field: "user_name" }
        );
    }

    fn carrier_record(now: DateTime<Utc>) -> UserRecord {
        UserRecord {
            id: Uuid::new_v4(),
            user_name: "carrier".to_string(),
            normalized_user_name: "CARRIER".to_string(),
            email: None,
            normalized_email: None,
            email_confirmed: false,
            password_hash: None,
            security_stamp: new_security_stamp(),
            concurrency_stamp: Uuid::new_v4().to_string(),
            phone_number: None,
            phone_number_confirmed: false,
            lockout_end: Some(now + Duration::minutes(5)),
            lockout_enabled: true,
            access_failed_count: 5,
            full_name: String::new(),
            role: "Carrier".to_string(),
            rating: None,
            rating_count: 0,
            rating_total: 0.0,
            registration_date: now,
            last_login_date: None,
            account_status: "Active".to_string(),
            profile_picture_url: None,
            has_verified_truck: false,
            last_password_change_date: None,
            email_notifications_enabled: true,
            sms_notifications_enabled: false,
            push_notifications_enabled: true,
            preferred_language: "fr".to_string(),
        }
    }

    #[test]
    fn test_lockout() {
        let now = Utc::now();
        let mut user = ApplicationUser::try_from(carrier_record(now)).unwrap();
        assert_eq!(user.role, UserRole::Carrier);
        assert!(!user.notifications.sms);
        assert!(user.is_locked_out(now));
        assert!(!user.is_locked_out(now + Duration::minutes(6)));

        user.lockout_enabled = false;
        assert!(!user.is_locked_out(now));
    }

    #[test]
    fn test_serialized_user_reads_back_without_secrets() {
        let mut record = carrier_record(Utc::now());
        record.password_hash = Some("hash".to_string());
        let user = ApplicationUser::try_from(record).unwrap();

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert!(json.get("security_stamp").is_none());

        let read_back: ApplicationUser = serde_json::from_value(json).unwrap();
        assert_eq!(read_back.id, user.id);
        assert_eq!(read_back.role, UserRole::Carrier);
        assert_eq!(read_back.notifications, user.notifications);
        assert_eq!(read_back.password_hash, None);
        assert!(read_back.security_stamp.is_empty());
    }
}
