pub mod constants;
pub mod error;
pub mod geopoint;
pub mod id;
pub mod model;

pub use error::{DispatchError, DispatchResult};
pub use geopoint::GeoPoint;
