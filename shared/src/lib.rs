pub mod campground;
pub mod envelope;
pub mod geo;
pub mod query;

pub use campground::*;
pub use envelope::extract_records;
pub use geo::*;
pub use query::*;
