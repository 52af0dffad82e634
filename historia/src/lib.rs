//! Historia core library.
//!
//! Normalizes search API payloads into [`ResultEnvelope`]s with per-year [`Count`]
//! rows, and sanitizes raw GeoJSON feature collections for map layers via
//! [`GeoFeatureSanitizer`].

pub mod config;
pub mod count;
pub mod envelope;
pub mod errors;
pub mod geo;
pub mod normalizers;
pub mod response;

pub use config::HistoriaConfig;
pub use count::{Bucket, Count};
pub use envelope::{CENSUS_CATEGORY, ParseOptions, Record, ResultEnvelope, TotalRowPolicy};
pub use errors::*;
pub use geo::{GeoFeatureSanitizer, MapSource, SanitizeOptions, SanitizeReport};
pub use response::{Response, Status};
