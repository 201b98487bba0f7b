pub mod config;
pub mod error;
pub mod geo;
pub mod telemetry;
pub mod types;

pub use config::Tuning;
pub use error::DriftmapError;
pub use geo::{bucket_key, haversine_km, haversine_m, GeoPoint};
pub use telemetry::init_tracing;
pub use types::*;
