pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod event;
pub mod photos;
pub mod refresh_token;
pub mod schema;
pub mod truck;
pub mod user;
pub mod validation;

pub use config::Config;
pub use context::FreightContext;
pub use db::{DbConnection, DbPool};
pub use error::{StoreError, ValidationError};
pub use event::{Event, EventMeta, EventPayload, TruckStatusChanged, TruckVerificationChanged};
pub use refresh_token::RefreshToken;
pub use truck::{NewTruck, Truck, TruckMediaUpdate, TruckStatus, TruckType};
pub use user::{AccountStatus, ApplicationUser, NewUser, NotificationPreferences, RatingSummary, UserRole};
