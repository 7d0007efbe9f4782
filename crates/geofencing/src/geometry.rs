//! Shape validation and point containment

use crate::{haversine_m, GeoPoint, GeofenceError, Geometry, Result};

/// Minimum distinct vertices for a polygon ring
const MIN_RING_VERTICES: usize = 3;

impl Geometry {
    /// Reject shapes that can never contain a point
    pub fn validate(&self) -> Result<()> {
        match self {
            Geometry::Point { coordinates, radius } => {
                GeoPoint::from_position(*coordinates).validate()?;
                if !radius.is_finite() || *radius <= 0.0 {
                    return Err(GeofenceError::InvalidGeometry(format!(
                        "circle radius must be a positive number of metres, got {}",
                        radius
                    )));
                }
                Ok(())
            }
            Geometry::Polygon { coordinates } => {
                if coordinates.is_empty() {
                    return Err(GeofenceError::InvalidGeometry(
                        "polygon has no rings".to_string(),
                    ));
                }
                for (i, ring) in coordinates.iter().enumerate() {
                    for position in ring {
                        GeoPoint::from_position(*position).validate()?;
                    }
                    let distinct = distinct_vertices(ring);
                    if distinct < MIN_RING_VERTICES {
                        return Err(GeofenceError::InvalidGeometry(format!(
                            "ring {} has {} distinct vertices, need at least {}",
                            i, distinct, MIN_RING_VERTICES
                        )));
                    }
                }
                Ok(())
            }
        }
    }

    /// Whether `point` lies inside the shape (boundary counts as inside for circles)
    pub fn contains(&self, point: GeoPoint) -> bool {
        match self {
            Geometry::Point { coordinates, radius } => {
                let center = GeoPoint::from_position(*coordinates);
                haversine_m(center, point) <= *radius
            }
            Geometry::Polygon { coordinates } => {
                let Some((outer, holes)) = coordinates.split_first() else {
                    return false;
                };
                point_in_ring(point, outer) && !holes.iter().any(|hole| point_in_ring(point, hole))
            }
        }
    }

    /// Representative position used for map markers
    pub fn anchor(&self) -> GeoPoint {
        match self {
            Geometry::Point { coordinates, .. } => GeoPoint::from_position(*coordinates),
            Geometry::Polygon { coordinates } => {
                let ring = coordinates.first().map(Vec::as_slice).unwrap_or(&[]);
                if ring.is_empty() {
                    return GeoPoint::new(0.0, 0.0);
                }
                let n = ring.len() as f64;
                let (sum_lng, sum_lat) = ring
                    .iter()
                    .fold((0.0, 0.0), |(lng, lat), p| (lng + p[0], lat + p[1]));
                GeoPoint::new(sum_lat / n, sum_lng / n)
            }
        }
    }
}

fn distinct_vertices(ring: &[[f64; 2]]) -> usize {
    let mut seen: Vec<[f64; 2]> = Vec::with_capacity(ring.len());
    for position in ring {
        if !seen.contains(position) {
            seen.push(*position);
        }
    }
    seen.len()
}

/// Even-odd ray cast in the lng/lat plane. Works for open and closed rings.
fn point_in_ring(point: GeoPoint, ring: &[[f64; 2]]) -> bool {
    if ring.len() < MIN_RING_VERTICES {
        return false;
    }

    let (x, y) = (point.lng, point.lat);
    let mut inside = false;
    let mut j = ring.len() - 1;

    for i in 0..ring.len() {
        let (xi, yi) = (ring[i][0], ring[i][1]);
        let (xj, yj) = (ring[j][0], ring[j][1]);

        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }

    inside
}
