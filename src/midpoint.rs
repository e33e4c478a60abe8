//! Geographic midpoint of a set of coordinates.

use thiserror::Error;

use crate::coordinate::{Coordinate, UnitVector};

#[derive(Debug, Error, PartialEq, Eq)]
#[error("need at least one coordinate (got {received})")]
pub struct InsufficientInputError {
    pub received: usize,
}

/// Find the middle point of a collection of coordinates.
///
/// Each coordinate is projected onto the unit sphere, the vectors are
/// averaged component-wise and the mean is converted back to latitude and
/// longitude. Unlike averaging raw degrees this behaves across the
/// antimeridian and near the poles. It approximates the spherical centroid
/// and is not exact.
///
/// Near-antipodal sets average to a vector close to the origin and the result
/// is whatever `atan2` makes of the leftover rounding. `(0, 0)` and `(0, 180)`
/// yield `(0, 90)`.
///
/// A single coordinate is returned as is.
pub fn midpoint(coordinates: &[Coordinate]) -> Result<Coordinate, InsufficientInputError> {
    match coordinates {
        [] => Err(InsufficientInputError { received: 0 }),
        [only] => Ok(*only),
        _ => {
            let sum = coordinates
                .iter()
                .map(|coordinate| coordinate.to_unit_vector())
                .fold(UnitVector::default(), |acc, v| UnitVector {
                    x: acc.x + v.x,
                    y: acc.y + v.y,
                    z: acc.z + v.z,
                });
            let n = coordinates.len() as f64;
            let mean = UnitVector {
                x: sum.x / n,
                y: sum.y / n,
                z: sum.z / n,
            };
            Ok(mean.to_coordinate())
        }
    }
}
