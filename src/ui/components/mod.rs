mod location_bar;

pub use location_bar::{normalize_location, LocationBar, LocationResult};
