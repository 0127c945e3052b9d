use chrono::Utc;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use freight_core::schema::trucks;
use freight_core::truck::{NewTruck, Truck, TruckMediaUpdate, TruckRecord, TruckStatus};
use freight_core::{Event, StoreError, TruckStatusChanged, TruckVerificationChanged};
use tracing;
use uuid::Uuid;

fn into_truck(record: TruckRecord) -> Result<Truck, StoreError> {
    Truck::try_from(record).map_err(|source| StoreError::Corrupt {
        entity: "truck",
        source,
    })
}

/// Register a new truck. A second truck with the same registration number is
/// rejected by the unique index and surfaces as `StoreError::Duplicate`.
pub async fn register(conn: &mut AsyncPgConnection, new_truck: NewTruck) -> Result<Truck, StoreError> {
    let record = new_truck.into_record(Utc::now())?;

    let row = diesel::insert_into(trucks::table)
        .values(&record)
        .returning(TruckRecord::as_returning())
        .get_result(conn)
        .await
        .map_err(|e| {
            let err = StoreError::from(e);
            if err.is_duplicate() {
                tracing::warn!(
                    "Registration number {} is already taken",
                    record.registration_number
                );
            }
            err
        })?;

    tracing::info!("Registered truck {} ({})", row.id, row.registration_number);
    into_truck(row)
}

pub async fn find_by_id(conn: &mut AsyncPgConnection, id: Uuid) -> Result<Option<Truck>, StoreError> {
    trucks::table
        .find(id)
        .select(TruckRecord::as_select())
        .first(conn)
        .await
        .optional()?
        .map(into_truck)
        .transpose()
}

pub async fn find_by_registration_number(
    conn: &mut AsyncPgConnection,
    registration_number: &str,
) -> Result<Option<Truck>, StoreError> {
    trucks::table
        .filter(trucks::registration_number.eq(registration_number.trim()))
        .select(TruckRecord::as_select())
        .first(conn)
        .await
        .optional()?
        .map(into_truck)
        .transpose()
}

pub async fn list_by_owner(conn: &mut AsyncPgConnection, owner_id: Uuid) -> Result<Vec<Truck>, StoreError> {
    let rows: Vec<TruckRecord> = trucks::table
        .filter(trucks::owner_id.eq(owner_id))
        .order((trucks::created_at.asc(), trucks::id.asc()))
        .select(TruckRecord::as_select())
        .load(conn)
        .await?;

    rows.into_iter().map(into_truck).collect()
}

/// Move a truck to `status`, returning the updated truck and the event
/// describing the transition.
pub async fn update_status(
    conn: &mut AsyncPgConnection,
    id: Uuid,
    status: TruckStatus,
) -> Result<(Truck, Event<TruckStatusChanged>), StoreError> {
    let (previous, row) = conn
        .transaction::<_, StoreError, _>(|conn| {
            async move {
                let previous: i32 = trucks::table
                    .find(id)
                    .select(trucks::status)
                    .for_update()
                    .first(conn)
                    .await
                    .optional()?
                    .ok_or_else(|| StoreError::not_found("truck", id))?;

                let row = diesel::update(trucks::table.find(id))
                    .set((
                        trucks::status.eq(status.code()),
                        trucks::updated_at.eq(Utc::now()),
                    ))
                    .returning(TruckRecord::as_returning())
                    .get_result(conn)
                    .await?;

                Ok((previous, row))
            }
            .scope_boxed()
        })
        .await?;

    let truck = into_truck(row)?;
    let previous_status = TruckStatus::try_from(previous).map_err(|source| StoreError::Corrupt {
        entity: "truck",
        source,
    })?;

    tracing::info!(
        "Truck {} status {:?} -> {:?}",
        truck.id,
        previous_status,
        truck.status
    );

    let event = Event::new(TruckStatusChanged {
        truck_id: truck.id,
        owner_id: truck.owner_id,
        previous_status,
        status: truck.status,
    });
    Ok((truck, event))
}

pub async fn set_verified(
    conn: &mut AsyncPgConnection,
    id: Uuid,
    is_verified: bool,
) -> Result<(Truck, Event<TruckVerificationChanged>), StoreError> {
    let row = diesel::update(trucks::table.find(id))
        .set((
            trucks::is_verified.eq(is_verified),
            trucks::updated_at.eq(Utc::now()),
        ))
        .returning(TruckRecord::as_returning())
        .get_result(conn)
        .await
        .optional()?
        .ok_or_else(|| StoreError::not_found("truck", id))?;

    let truck = into_truck(row)?;
    tracing::info!("Truck {} verification set to {}", truck.id, is_verified);

    let event = Event::new(TruckVerificationChanged {
        truck_id: truck.id,
        owner_id: truck.owner_id,
        is_verified,
    });
    Ok((truck, event))
}

pub async fn update_media(
    conn: &mut AsyncPgConnection,
    id: Uuid,
    update: TruckMediaUpdate,
) -> Result<Truck, StoreError> {
    let changeset = update.into_changeset(Utc::now())?;

    let row = diesel::update(trucks::table.find(id))
        .set(&changeset)
        .returning(TruckRecord::as_returning())
        .get_result(conn)
        .await
        .optional()?
        .ok_or_else(|| StoreError::not_found("truck", id))?;

    tracing::debug!("Updated media for truck {}", id);
    into_truck(row)
}

pub async fn update_notes(
    conn: &mut AsyncPgConnection,
    id: Uuid,
    notes: Option<String>,
) -> Result<Truck, StoreError> {
    let row = diesel::update(trucks::table.find(id))
        .set((trucks::notes.eq(notes), trucks::updated_at.eq(Utc::now())))
        .returning(TruckRecord::as_returning())
        .get_result(conn)
        .await
        .optional()?
        .ok_or_else(|| StoreError::not_found("truck", id))?;

    tracing::debug!("Updated notes for truck {}", id);
    into_truck(row)
}
