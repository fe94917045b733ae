use serde::{Deserialize, Serialize};

/// World-space size (in abstract units) of the whole map at zoom 0.
/// One slippy tile is 256 units; zoom z scales the world by 2^z.
pub const WORLD_SIZE: f64 = 256.0;

/// Web-Mercator latitude limit; beyond this the projection diverges.
pub const MAX_LATITUDE: f64 = 85.051_128_78;

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A WGS84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    /// Default position when device geolocation is unavailable,
    /// centered on the country the campground data covers.
    pub const FALLBACK: Coordinate = Coordinate {
        lat: 36.5,
        lng: 127.5,
    };

    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Great-circle (haversine) distance to `other` in meters.
    pub fn distance_m(&self, other: &Coordinate) -> f64 {
        let phi1 = self.lat.to_radians();
        let phi2 = other.lat.to_radians();
        let d_phi = (other.lat - self.lat).to_radians();
        let d_lambda = (other.lng - self.lng).to_radians();

        let a = (d_phi / 2.0).sin().powi(2)
            + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
    }
}

/// Project a coordinate into Web-Mercator world units (zoom-0 scale).
pub fn project(coord: &Coordinate) -> (f64, f64) {
    let lat = coord.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
    let x = (coord.lng + 180.0) / 360.0 * WORLD_SIZE;
    let sin_lat = lat.to_radians().sin();
    let y = (0.5 - ((1.0 + sin_lat) / (1.0 - sin_lat)).ln() / (4.0 * std::f64::consts::PI))
        * WORLD_SIZE;
    (x, y)
}

/// Inverse of [`project`].
pub fn unproject(x: f64, y: f64) -> Coordinate {
    let lng = x / WORLD_SIZE * 360.0 - 180.0;
    let n = std::f64::consts::PI * (1.0 - 2.0 * y / WORLD_SIZE);
    let lat = n.sinh().atan().to_degrees();
    Coordinate { lat, lng }
}
