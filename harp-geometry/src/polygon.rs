use crate::point::Point;

/// A simple polygon given as an ordered ring of vertices (not explicitly
/// closed — the last vertex is implicitly connected back to the first).
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub vertices: Vec<Point>,
}

impl Polygon {
    pub fn new(vertices: Vec<Point>) -> Self {
        Polygon { vertices }
    }

    pub fn from_degrees(corners: &[(f64, f64)]) -> Self {
        Polygon {
            vertices: corners.iter().map(|(lat, lon)| Point::from_degrees(*lat, *lon)).collect(),
        }
    }
}

/// Unwrap a ring's longitudes (degrees) onto a continuous line by shifting
/// each vertex by the multiple of 360 that keeps it closest to the
/// previous one. This is what lets the planar algorithms below treat an
/// antimeridian-crossing footprint as an ordinary polygon instead of two
/// disjoint halves.
fn unwrap_ring(vertices: &[Point]) -> Vec<(f64, f64)> {
    let mut out = Vec::with_capacity(vertices.len());
    let mut prev_lon = vertices[0].lon_deg();
    out.push((vertices[0].lat_deg(), prev_lon));
    for v in &vertices[1..] {
        let mut lon = v.lon_deg();
        while lon - prev_lon > 180.0 {
            lon -= 360.0;
        }
        while lon - prev_lon < -180.0 {
            lon += 360.0;
        }
        out.push((v.lat_deg(), lon));
        prev_lon = lon;
    }
    out
}

fn unwrap_relative(lon_deg: f64, reference_lon_deg: f64) -> f64 {
    let mut lon = lon_deg;
    while lon - reference_lon_deg > 180.0 {
        lon -= 360.0;
    }
    while lon - reference_lon_deg < -180.0 {
        lon += 360.0;
    }
    lon
}

/// Is `p` inside `poly`, using even-odd ray casting on the (latitude,
/// longitude) plane after unwrapping both onto a common, antimeridian-free
/// reference?
pub fn point_in_polygon(p: Point, poly: &Polygon) -> bool {
    if poly.vertices.len() < 3 {
        return false;
    }
    let ring = unwrap_ring(&poly.vertices);
    let px_lon = unwrap_relative(p.lon_deg(), ring[0].1);
    let px_lat = p.lat_deg();

    let mut inside = false;
    let n = ring.len();
    for i in 0..n {
        let (yi, xi) = ring[i];
        let (yj, xj) = ring[(i + n - 1) % n];
        let crosses = (yi > px_lat) != (yj > px_lat);
        if crosses {
            let x_at_crossing = xi + (px_lat - yi) / (yj - yi) * (xj - xi);
            if px_lon < x_at_crossing {
                inside = !inside;
            }
        }
    }
    inside
}

/// Shoelace-formula area of an unwrapped ring, in square degrees. Sign
/// indicates winding direction; callers that need area take `.abs()`.
fn signed_area(ring: &[(f64, f64)]) -> f64 {
    let n = ring.len();
    let mut sum = 0.0;
    for i in 0..n {
        let (y0, x0) = ring[i];
        let (y1, x1) = ring[(i + 1) % n];
        sum += x0 * y1 - x1 * y0;
    }
    sum / 2.0
}

/// Sutherland-Hodgman clip of subject ring by a convex clip ring, both
/// already in the same unwrapped (lat, lon) plane. Correct for convex
/// clip polygons; `latitude_bounds`/`longitude_bounds` corner boxes
/// satisfy that in practice.
fn clip(subject: &[(f64, f64)], clip_poly: &[(f64, f64)]) -> Vec<(f64, f64)> {
    let mut output = subject.to_vec();
    let n = clip_poly.len();
    for i in 0..n {
        if output.is_empty() {
            break;
        }
        let (ay, ax) = clip_poly[i];
        let (by, bx) = clip_poly[(i + 1) % n];
        // Inside test: points to the left of edge a->b, assuming the clip
        // ring winds counter-clockwise in (x=lon, y=lat). If the input
        // winds the other way the test is inverted for every edge
        // uniformly, which still produces a correct (possibly empty)
        // intersection since clipping is symmetric under ring reversal.
        let edge_x = bx - ax;
        let edge_y = by - ay;
        let inside = |p: &(f64, f64)| (p.1 - ax) * edge_y - (p.0 - ay) * edge_x <= 0.0;

        let input = std::mem::take(&mut output);
        let m = input.len();
        for j in 0..m {
            let current = input[j];
            let previous = input[(j + m - 1) % m];
            let current_in = inside(&current);
            let previous_in = inside(&previous);
            if current_in {
                if !previous_in {
                    output.push(intersect_edge(previous, current, (ay, ax), (by, bx)));
                }
                output.push(current);
            } else if previous_in {
                output.push(intersect_edge(previous, current, (ay, ax), (by, bx)));
            }
        }
    }
    output
}

fn intersect_edge(p0: (f64, f64), p1: (f64, f64), a: (f64, f64), b: (f64, f64)) -> (f64, f64) {
    let (y1, x1) = p0;
    let (y2, x2) = p1;
    let (y3, x3) = a;
    let (y4, x4) = b;
    let denom = (x1 - x2) * (y3 - y4) - (y1 - y2) * (x3 - x4);
    if denom.abs() < 1e-15 {
        return p1;
    }
    let t = ((x1 - x3) * (y3 - y4) - (y1 - y3) * (x3 - x4)) / denom;
    (y1 + t * (y2 - y1), x1 + t * (x2 - x1))
}

/// Do `a` and `b` share any area?
pub fn polygons_intersect(a: &Polygon, b: &Polygon) -> bool {
    overlap_fraction(a, b) > 0.0
}

/// Fraction of `subject`'s area that lies inside `reference`, in `[0, 1]`.
/// Zero if `subject` is degenerate (fewer than 3 vertices or zero area).
pub fn overlap_fraction(subject: &Polygon, reference: &Polygon) -> f64 {
    if subject.vertices.len() < 3 || reference.vertices.len() < 3 {
        return 0.0;
    }
    let subject_ring = unwrap_ring(&subject.vertices);
    let subject_area = signed_area(&subject_ring).abs();
    if subject_area < 1e-18 {
        return 0.0;
    }

    // Bring the reference ring onto the same unwrapped plane as the subject.
    let reference_ring: Vec<(f64, f64)> = reference
        .vertices
        .iter()
        .map(|v| (v.lat_deg(), unwrap_relative(v.lon_deg(), subject_ring[0].1)))
        .collect();

    let clipped = clip(&subject_ring, &reference_ring);
    if clipped.len() < 3 {
        return 0.0;
    }
    let clipped_area = signed_area(&clipped).abs();
    (clipped_area / subject_area).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(lat0: f64, lon0: f64, size: f64) -> Polygon {
        Polygon::from_degrees(&[
            (lat0, lon0),
            (lat0, lon0 + size),
            (lat0 + size, lon0 + size),
            (lat0 + size, lon0),
        ])
    }

    #[test]
    fn point_inside_simple_square() {
        let poly = square(0.0, 0.0, 2.0);
        assert!(point_in_polygon(Point::from_degrees(1.0, 1.0), &poly));
        assert!(!point_in_polygon(Point::from_degrees(5.0, 5.0), &poly));
    }

    #[test]
    fn point_in_polygon_handles_antimeridian() {
        let poly = square(0.0, 179.0, 2.0); // spans 179..181 == 179..-179
        assert!(point_in_polygon(Point::from_degrees(1.0, -179.5), &poly));
        assert!(point_in_polygon(Point::from_degrees(1.0, 179.5), &poly));
        assert!(!point_in_polygon(Point::from_degrees(1.0, 0.0), &poly));
    }

    #[test]
    fn identical_squares_fully_overlap() {
        let a = square(0.0, 0.0, 2.0);
        let b = square(0.0, 0.0, 2.0);
        assert!((overlap_fraction(&a, &b) - 1.0).abs() < 1e-9);
        assert!(polygons_intersect(&a, &b));
    }

    #[test]
    fn disjoint_squares_do_not_intersect() {
        let a = square(0.0, 0.0, 1.0);
        let b = square(10.0, 10.0, 1.0);
        assert_eq!(overlap_fraction(&a, &b), 0.0);
        assert!(!polygons_intersect(&a, &b));
    }

    #[test]
    fn half_overlap_quarter_fraction() {
        let a = square(0.0, 0.0, 2.0);
        let b = square(1.0, 1.0, 2.0);
        let f = overlap_fraction(&a, &b);
        assert!((f - 0.25).abs() < 1e-6, "fraction was {f}");
    }
}
