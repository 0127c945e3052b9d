use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::photos;
use crate::schema::trucks;
use crate::validation::{self, CAPACITY, DIMENSION};

pub const REGISTRATION_NUMBER_MAX: usize = 50;
pub const MAKE_MAX: usize = 100;
pub const MODEL_MAX: usize = 100;

/// Vehicle category, stored as an integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TruckType {
    Flatbed,
    BoxTruck,
    Refrigerated,
    Tanker,
    Tipper,
    Container,
    Lowboy,
    Other,
}

impl TruckType {
    pub const ALL: [TruckType; 8] = [
        TruckType::Flatbed,
        TruckType::BoxTruck,
        TruckType::Refrigerated,
        TruckType::Tanker,
        TruckType::Tipper,
        TruckType::Container,
        TruckType::Lowboy,
        TruckType::Other,
    ];

    pub fn code(self) -> i32 {
        match self {
            TruckType::Flatbed => 1,
            TruckType::BoxTruck => 2,
            TruckType::Refrigerated => 3,
            TruckType::Tanker => 4,
            TruckType::Tipper => 5,
            TruckType::Container => 6,
            TruckType::Lowboy => 7,
            TruckType::Other => 99,
        }
    }
}

impl TryFrom<i32> for TruckType {
    type Error = ValidationError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        TruckType::ALL
            .into_iter()
            .find(|t| t.code() == code)
            .ok_or(ValidationError::UnknownCode {
                kind: "truck type",
                code,
            })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TruckStatus {
    Active,
    Inactive,
    UnderMaintenance,
    #[default]
    PendingVerification,
    Rejected,
}

impl TruckStatus {
    pub const ALL: [TruckStatus; 5] = [
        TruckStatus::Active,
        TruckStatus::Inactive,
        TruckStatus::UnderMaintenance,
        TruckStatus::PendingVerification,
        TruckStatus::Rejected,
    ];

    pub fn code(self) -> i32 {
        match self {
            TruckStatus::Active => 1,
            TruckStatus::Inactive => 2,
            TruckStatus::UnderMaintenance => 3,
            TruckStatus::PendingVerification => 4,
            TruckStatus::Rejected => 5,
        }
    }
}

impl TryFrom<i32> for TruckStatus {
    type Error = ValidationError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        TruckStatus::ALL
            .into_iter()
            .find(|s| s.code() == code)
            .ok_or(ValidationError::UnknownCode {
                kind: "truck status",
                code,
            })
    }
}

/// Row as stored in `trucks`.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = trucks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TruckRecord {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub registration_number: String,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub capacity_kg: BigDecimal,
    pub capacity_cubic_meters: BigDecimal,
    pub length: Option<BigDecimal>,
    pub width: Option<BigDecimal>,
    pub height: Option<BigDecimal>,
    pub truck_type: i32,
    pub status: i32,
    pub license_plate_image_url: Option<String>,
    pub registration_document_url: Option<String>,
    pub photos: Option<String>,
    pub is_verified: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = trucks)]
pub struct NewTruckRecord {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub registration_number: String,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub capacity_kg: BigDecimal,
    pub capacity_cubic_meters: BigDecimal,
    pub length: Option<BigDecimal>,
    pub width: Option<BigDecimal>,
    pub height: Option<BigDecimal>,
    pub truck_type: i32,
    pub status: i32,
    pub license_plate_image_url: Option<String>,
    pub registration_document_url: Option<String>,
    pub photos: Option<String>,
    pub is_verified: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A registered cargo vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Truck {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub registration_number: String,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub capacity_kg: BigDecimal,
    pub capacity_cubic_meters: BigDecimal,
    pub length: Option<BigDecimal>,
    pub width: Option<BigDecimal>,
    pub height: Option<BigDecimal>,
    pub truck_type: TruckType,
    pub status: TruckStatus,
    pub license_plate_image_url: Option<String>,
    pub registration_document_url: Option<String>,
    pub photos: Vec<String>,
    pub is_verified: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<TruckRecord> for Truck {
    type Error = ValidationError;

    fn try_from(record: TruckRecord) -> Result<Self, Self::Error> {
        Ok(Truck {
            truck_type: TruckType::try_from(record.truck_type)?,
            status: TruckStatus::try_from(record.status)?,
            photos: photos::decode(record.photos.as_deref()),
            id: record.id,
            owner_id: record.owner_id,
            registration_number: record.registration_number,
            make: record.make,
            model: record.model,
            year: record.year,
            capacity_kg: record.capacity_kg,
            capacity_cubic_meters: record.capacity_cubic_meters,
            length: record.length,
            width: record.width,
            height: record.height,
            license_plate_image_url: record.license_plate_image_url,
            registration_document_url: record.registration_document_url,
            is_verified: record.is_verified,
            notes: record.notes,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }
}

/// Input for registering a truck.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTruck {
    pub owner_id: Uuid,
    pub registration_number: String,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub capacity_kg: BigDecimal,
    pub capacity_cubic_meters: BigDecimal,
    #[serde(default)]
    pub length: Option<BigDecimal>,
    #[serde(default)]
    pub width: Option<BigDecimal>,
    #[serde(default)]
    pub height: Option<BigDecimal>,
    pub truck_type: TruckType,
    #[serde(default)]
    pub license_plate_image_url: Option<String>,
    #[serde(default)]
    pub registration_document_url: Option<String>,
    #[serde(default)]
    pub photos: Option<Vec<String>>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewTruck {
    /// Validate and shape the input into a storable row. New trucks start
    /// unverified and pending verification.
    pub fn into_record(self, now: DateTime<Utc>) -> Result<NewTruckRecord, ValidationError> {
        let registration_number = self.registration_number.trim().to_string();
        validation::required_text("registration_number", &registration_number, REGISTRATION_NUMBER_MAX)?;
        validation::required_text("make", &self.make, MAKE_MAX)?;
        validation::required_text("model", &self.model, MODEL_MAX)?;

        if let Some(list) = &self.photos {
            photos::validate(list)?;
        }

        Ok(NewTruckRecord {
            id: Uuid::new_v4(),
            owner_id: self.owner_id,
            registration_number,
            make: self.make,
            model: self.model,
            year: self.year,
            capacity_kg: validation::fit_numeric("capacity_kg", &self.capacity_kg, CAPACITY)?,
            capacity_cubic_meters: validation::fit_numeric(
                "capacity_cubic_meters",
                &self.capacity_cubic_meters,
                CAPACITY,
            )?,
            length: validation::fit_optional_numeric("length", self.length.as_ref(), DIMENSION)?,
            width: validation::fit_optional_numeric("width", self.width.as_ref(), DIMENSION)?,
            height: validation::fit_optional_numeric("height", self.height.as_ref(), DIMENSION)?,
            truck_type: self.truck_type.code(),
            status: TruckStatus::default().code(),
            license_plate_image_url: self.license_plate_image_url,
            registration_document_url: self.registration_document_url,
            photos: Some(photos::encode(self.photos.as_deref())),
            is_verified: false,
            notes: self.notes,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Replacement media references. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TruckMediaUpdate {
    pub photos: Option<Vec<String>>,
    pub license_plate_image_url: Option<String>,
    pub registration_document_url: Option<String>,
}

#[derive(AsChangeset)]
#[diesel(table_name = trucks)]
pub struct TruckMediaChangeset {
    pub photos: Option<Option<String>>,
    pub license_plate_image_url: Option<Option<String>>,
    pub registration_document_url: Option<Option<String>>,
    pub updated_at: DateTime<Utc>,
}

impl TruckMediaUpdate {
    pub fn into_changeset(self, now: DateTime<Utc>) -> Result<TruckMediaChangeset, ValidationError> {
        if let Some(list) = &self.photos {
            photos::validate(list)?;
        }

        Ok(TruckMediaChangeset {
            photos: self
                .photos
                .map(|list| Some(photos::encode(Some(list.as_slice())))),
            license_plate_image_url: self.license_plate_image_url.map(Some),
            registration_document_url: self.registration_document_url.map(Some),
            updated_at: now,
        })
    }
}
