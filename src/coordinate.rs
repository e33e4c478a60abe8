//! Latitude/longitude values and their unit-sphere vector form.

use std::{fmt, sync::LazyLock};

use regex::Regex;
use thiserror::Error;

// A whole-query latitude,longitude pattern. E.g. "-25.0, 160.0".
// (?:) denotes a non-capturing group. ()? denotes an optional group.
static LATLNG_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(-?\d+(?:\.\d+)?)\s*,\s*(-?\d+(?:\.\d+)?)\s*$")
        .expect("latitude,longitude pattern is valid")
});

/// Latitude and longitude in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Error, PartialEq)]
pub enum CoordinateError {
    #[error("invalid latitude: {0}, must be between -90 and 90")]
    Latitude(f64),
    #[error("invalid longitude: {0}, must be between -180 and 180")]
    Longitude(f64),
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordinateError::Latitude(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinateError::Longitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Parse a query that is nothing but a `lat,lng` pair.
    ///
    /// Returns `None` for anything else, including pairs that are out of
    /// range, so those still reach the geocoder as free text.
    pub fn parse_literal(text: &str) -> Option<Self> {
        let (_, [lat, lng]) = LATLNG_LITERAL.captures(text)?.extract();
        Self::new(lat.parse().ok()?, lng.parse().ok()?).ok()
    }

    /// Project onto the unit sphere.
    pub fn to_unit_vector(self) -> UnitVector {
        let (lat, lng) = (self.latitude.to_radians(), self.longitude.to_radians());
        UnitVector {
            x: lat.cos() * lng.cos(),
            y: lat.cos() * lng.sin(),
            z: lat.sin(),
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

/// Cartesian form of a point on (or, once averaged, inside) the unit sphere.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct UnitVector {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl UnitVector {
    /// Convert back to degrees. The vector does not need to be normalized,
    /// only its direction is used.
    pub fn to_coordinate(self) -> Coordinate {
        let longitude = self.y.atan2(self.x);
        let hypotenuse = (self.x * self.x + self.y * self.y).sqrt();
        let latitude = self.z.atan2(hypotenuse);
        Coordinate {
            latitude: latitude.to_degrees(),
            longitude: longitude.to_degrees(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn assert_close(actual: Coordinate, latitude: f64, longitude: f64) {
        assert!(
            (actual.latitude - latitude).abs() < 1e-9
                && (actual.longitude - longitude).abs() < 1e-9,
            "expected ({latitude}, {longitude}), got {actual}"
        );
    }

    #[rstest]
    #[case(90.5, 0.0, CoordinateError::Latitude(90.5))]
    #[case(-91.0, 0.0, CoordinateError::Latitude(-91.0))]
    #[case(0.0, 180.1, CoordinateError::Longitude(180.1))]
    #[case(0.0, -200.0, CoordinateError::Longitude(-200.0))]
    fn new_rejects_out_of_range_values(
        #[case] latitude: f64,
        #[case] longitude: f64,
        #[case] expected: CoordinateError,
    ) {
        assert_eq!(Coordinate::new(latitude, longitude), Err(expected));
    }

    #[test]
    fn new_accepts_the_bounds() {
        assert!(Coordinate::new(90.0, 180.0).is_ok());
        assert!(Coordinate::new(-90.0, -180.0).is_ok());
    }

    #[rstest]
    #[case("51.8615899,4.3580323", Some((51.8615899, 4.3580323)))]
    #[case("  -33.86 , 151.2 ", Some((-33.86, 151.2)))]
    #[case("10,-20", Some((10.0, -20.0)))]
    #[case("91,0", None)]
    #[case("Paris, France", None)]
    #[case("Route 66, 40", None)]
    #[case("", None)]
    fn parse_literal_only_matches_whole_pairs(
        #[case] text: &str,
        #[case] expected: Option<(f64, f64)>,
    ) {
        let parsed = Coordinate::parse_literal(text).map(|c| (c.latitude, c.longitude));
        assert_eq!(parsed, expected);
    }

    #[rstest]
    #[case(0.0, 0.0)]
    #[case(40.7128, -74.006)]
    #[case(-33.8688, 151.2093)]
    #[case(64.1466, -21.9426)]
    #[case(-0.5, 179.9)]
    fn unit_vector_round_trip_preserves_the_coordinate(
        #[case] latitude: f64,
        #[case] longitude: f64,
    ) {
        let coordinate = Coordinate::new(latitude, longitude).unwrap();
        assert_close(coordinate.to_unit_vector().to_coordinate(), latitude, longitude);
    }

    #[test]
    fn unit_vector_has_unit_length() {
        let v = Coordinate::new(12.5, -77.25).unwrap().to_unit_vector();
        let length = (v.x * v.x + v.y * v.y + v.z * v.z).sqrt();
        assert!((length - 1.0).abs() < 1e-12);
    }

    #[test]
    fn display_uses_a_tuple_form() {
        let coordinate = Coordinate::new(1.5, -2.25).unwrap();
        assert_eq!(coordinate.to_string(), "(1.5, -2.25)");
    }
}
