use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use freight_core::schema::users;
use freight_core::user::{self, ApplicationUser, NewUser, UserRecord};
use freight_core::{AccountStatus, NotificationPreferences, RatingSummary, StoreError};
use tracing;
use uuid::Uuid;

fn into_user(record: UserRecord) -> Result<ApplicationUser, StoreError> {
    ApplicationUser::try_from(record).map_err(|source| StoreError::Corrupt {
        entity: "user",
        source,
    })
}

/// Create a user. User names are unique case-insensitively; a clash
/// surfaces as `StoreError::Duplicate`.
pub async fn create(conn: &mut AsyncPgConnection, new_user: NewUser) -> Result<ApplicationUser, StoreError> {
    let record = new_user.into_record(Utc::now())?;

    let row = diesel::insert_into(users::table)
        .values(&record)
        .returning(UserRecord::as_returning())
        .get_result(conn)
        .await?;

    tracing::info!("Created user {} ({})", row.id, row.user_name);
    into_user(row)
}

pub async fn find_by_id(conn: &mut AsyncPgConnection, id: Uuid) -> Result<Option<ApplicationUser>, StoreError> {
    users::table
        .find(id)
        .select(UserRecord::as_select())
        .first(conn)
        .await
        .optional()?
        .map(into_user)
        .transpose()
}

pub async fn find_by_user_name(
    conn: &mut AsyncPgConnection,
    user_name: &str,
) -> Result<Option<ApplicationUser>, StoreError> {
    users::table
        .filter(users::normalized_user_name.eq(user::normalize(user_name)))
        .select(UserRecord::as_select())
        .first(conn)
        .await
        .optional()?
        .map(into_user)
        .transpose()
}

/// Add one rating. The row is locked so concurrent ratings cannot lose
/// updates, and count, total and average are written together.
pub async fn record_rating(
    conn: &mut AsyncPgConnection,
    id: Uuid,
    score: f64,
) -> Result<ApplicationUser, StoreError> {
    let row = conn
        .transaction::<_, StoreError, _>(|conn| {
            async move {
                let (count, total): (i32, f64) = users::table
                    .find(id)
                    .select((users::rating_count, users::rating_total))
                    .for_update()
                    .first(conn)
                    .await
                    .optional()?
                    .ok_or_else(|| StoreError::not_found("user", id))?;

                let mut rating = RatingSummary::from_columns(count, total)
                    .map_err(|source| StoreError::Corrupt { entity: "user", source })?;
                rating.record(score)?;

                let row = diesel::update(users::table.find(id))
                    .set((
                        users::rating_count.eq(rating.count() as i32),
                        users::rating_total.eq(rating.total()),
                        users::rating.eq(rating.average()),
                    ))
                    .returning(UserRecord::as_returning())
                    .get_result(conn)
                    .await?;

                Ok(row)
            }
            .scope_boxed()
        })
        .await?;

    tracing::debug!("Recorded rating {} for user {}", score, id);
    into_user(row)
}

pub async fn record_login(
    conn: &mut AsyncPgConnection,
    id: Uuid,
    at: DateTime<Utc>,
) -> Result<ApplicationUser, StoreError> {
    let row = diesel::update(users::table.find(id))
        .set((
            users::last_login_date.eq(Some(at)),
            users::access_failed_count.eq(0),
        ))
        .returning(UserRecord::as_returning())
        .get_result(conn)
        .await
        .optional()?
        .ok_or_else(|| StoreError::not_found("user", id))?;

    into_user(row)
}

pub async fn set_account_status(
    conn: &mut AsyncPgConnection,
    id: Uuid,
    status: AccountStatus,
) -> Result<ApplicationUser, StoreError> {
    let row = diesel::update(users::table.find(id))
        .set(users::account_status.eq(status.as_str()))
        .returning(UserRecord::as_returning())
        .get_result(conn)
        .await
        .optional()?
        .ok_or_else(|| StoreError::not_found("user", id))?;

    tracing::info!("User {} account status set to {}", id, status);
    into_user(row)
}

pub async fn set_has_verified_truck(
    conn: &mut AsyncPgConnection,
    id: Uuid,
    has_verified_truck: bool,
) -> Result<ApplicationUser, StoreError> {
    let row = diesel::update(users::table.find(id))
        .set(users::has_verified_truck.eq(has_verified_truck))
        .returning(UserRecord::as_returning())
        .get_result(conn)
        .await
        .optional()?
        .ok_or_else(|| StoreError::not_found("user", id))?;

    into_user(row)
}

pub async fn update_notification_preferences(
    conn: &mut AsyncPgConnection,
    id: Uuid,
    preferences: &NotificationPreferences,
) -> Result<ApplicationUser, StoreError> {
    preferences.validate()?;

    let row = diesel::update(users::table.find(id))
        .set(preferences)
        .returning(UserRecord::as_returning())
        .get_result(conn)
        .await
        .optional()?
        .ok_or_else(|| StoreError::not_found("user", id))?;

    tracing::debug!("Updated notification preferences for user {}", id);
    into_user(row)
}

/// Store a new password hash. The security stamp is rotated so anything
/// bound to the old stamp stops validating.
pub async fn change_password_hash(
    conn: &mut AsyncPgConnection,
    id: Uuid,
    password_hash: String,
) -> Result<ApplicationUser, StoreError> {
    let row = diesel::update(users::table.find(id))
        .set((
            users::password_hash.eq(Some(password_hash)),
            users::security_stamp.eq(user::new_security_stamp()),
            users::concurrency_stamp.eq(Uuid::new_v4().to_string()),
            users::last_password_change_date.eq(Some(Utc::now())),
        ))
        .returning(UserRecord::as_returning())
        .get_result(conn)
        .await
        .optional()?
        .ok_or_else(|| StoreError::not_found("user", id))?;

    tracing::info!("Password changed for user {}", id);
    into_user(row)
}
