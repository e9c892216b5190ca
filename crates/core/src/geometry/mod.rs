//! Geometry normalization seam.
//!
//! Geometry algorithms are an external capability: the pipeline only
//! needs "repair and canonicalize one WKT value". The default backend
//! is pure Rust (ring closing plus canonical winding); a GEOS-style
//! backend can be slotted in behind the same trait.

use geo::algorithm::orient::{Direction, Orient};
use geo::{Geometry, LineString, MultiPolygon, Polygon};
use wkt::{ToWkt, Wkt};

/// Per-value geometry normalization.
pub trait GeometryBackend: Send + Sync {
    /// Repairs and canonicalizes one WKT value. Returns `None` when the
    /// value is not parseable as WKT or cannot be repaired; callers keep
    /// the original value in that case.
    fn normalize_wkt(&self, value: &str) -> Option<String>;
}

/// Default WKT backend.
///
/// Parsing closes unclosed polygon rings; degenerate interior rings are
/// dropped; ring winding is canonicalized (exterior counter-clockwise,
/// interiors clockwise). Non-areal geometries only round-trip through
/// the canonical WKT writer.
#[derive(Debug, Default, Clone, Copy)]
pub struct WktBackend;

impl GeometryBackend for WktBackend {
    fn normalize_wkt(&self, value: &str) -> Option<String> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return None;
        }

        let parsed: Wkt<f64> = trimmed.parse().ok()?;
        let geometry = Geometry::try_from(parsed).ok()?;

        let repaired = match geometry {
            Geometry::Polygon(polygon) => {
                Geometry::Polygon(repair_polygon(polygon)?.orient(Direction::Default))
            }
            Geometry::MultiPolygon(multi) => {
                let polygons: Vec<Polygon<f64>> =
                    multi.into_iter().filter_map(repair_polygon).collect();
                if polygons.is_empty() {
                    return None;
                }
                Geometry::MultiPolygon(MultiPolygon::new(polygons).orient(Direction::Default))
            }
            other => other,
        };

        Some(repaired.wkt_string())
    }
}

/// Rebuilds a polygon, which closes its rings, and drops rings that are
/// degenerate even after closing. A degenerate exterior makes the whole
/// polygon unrepairable.
fn repair_polygon(polygon: Polygon<f64>) -> Option<Polygon<f64>> {
    let (exterior, interiors) = polygon.into_inner();

    let exterior = close_ring(exterior)?;
    let interiors: Vec<LineString<f64>> = interiors.into_iter().filter_map(close_ring).collect();

    Some(Polygon::new(exterior, interiors))
}

fn close_ring(ring: LineString<f64>) -> Option<LineString<f64>> {
    let mut ring = ring;
    ring.close();
    // A closed ring needs at least a triangle plus the closing point.
    if ring.0.len() < 4 {
        return None;
    }
    Some(ring)
}
