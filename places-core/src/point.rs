//! Point model and the locations wire envelope.

use std::hash::{DefaultHasher, Hash, Hasher};

use geo::Coord;
use serde::{Deserialize, Serialize};

/// A named or anonymous geographic location.
///
/// The wire format uses the short field names `lat` and `long`; `name` may be
/// missing or `null`.
///
/// # Examples
/// ```
/// use places_core::Point;
///
/// let point: Point = serde_json::from_str(r#"{"lat": 52.37, "long": 4.89}"#)?;
/// assert_eq!(point.name, None);
/// assert_eq!(point.coord().x, 4.89);
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Optional display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// WGS84 latitude in degrees. Range is not enforced.
    #[serde(rename = "lat")]
    pub latitude: f64,
    /// WGS84 longitude in degrees. Range is not enforced.
    #[serde(rename = "long")]
    pub longitude: f64,
}

impl Point {
    /// Construct a named point.
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: Some(name.into()),
            latitude,
            longitude,
        }
    }

    /// Construct a point without a name.
    #[must_use]
    pub const fn unnamed(latitude: f64, longitude: f64) -> Self {
        Self {
            name: None,
            latitude,
            longitude,
        }
    }

    /// Derived identity for list rendering.
    ///
    /// Hashes the name (empty when absent) together with the bit patterns of
    /// both coordinates. Points with identical fields share an id; lists are
    /// never deduplicated by it.
    #[must_use]
    pub fn id(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.name.as_deref().unwrap_or_default().hash(&mut hasher);
        coordinate_bits(self.latitude).hash(&mut hasher);
        coordinate_bits(self.longitude).hash(&mut hasher);
        hasher.finish()
    }

    /// Position as a `geo` coordinate with `x = longitude` and `y = latitude`.
    #[must_use]
    pub const fn coord(&self) -> Coord<f64> {
        Coord {
            x: self.longitude,
            y: self.latitude,
        }
    }
}

/// Bit pattern of `value` with `-0.0` folded onto `0.0`, so points that
/// compare equal share an id.
const fn coordinate_bits(value: f64) -> u64 {
    if value == 0.0 { 0.0_f64.to_bits() } else { value.to_bits() }
}

/// Envelope returned by the locations endpoint.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LocationsResponse {
    /// Points in payload order.
    pub locations: Vec<Point>,
}
