use crate::point::Point;
use crate::EARTH_RADIUS_M;

/// Great-circle distance between two points, in metres, via the haversine
/// formula. Stable for the near-antipodal and near-identical cases that
/// `PointDistanceCriterion`/`PointDistanceFilter` see in practice.
pub fn great_circle_distance_m(a: Point, b: Point) -> f64 {
    let dlat = b.lat_rad - a.lat_rad;
    let dlon = b.lon_rad - a.lon_rad;
    let sin_dlat = (dlat / 2.0).sin();
    let sin_dlon = (dlon / 2.0).sin();
    let h = sin_dlat * sin_dlat + a.lat_rad.cos() * b.lat_rad.cos() * sin_dlon * sin_dlon;
    let c = 2.0 * h.sqrt().asin();
    EARTH_RADIUS_M * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance_between_identical_points() {
        let p = Point::from_degrees(10.0, 20.0);
        assert!(great_circle_distance_m(p, p) < 1e-6);
    }

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let a = Point::from_degrees(0.0, 0.0);
        let b = Point::from_degrees(1.0, 0.0);
        let d = great_circle_distance_m(a, b);
        assert!((d - 111_195.0).abs() < 500.0, "distance was {d}");
    }

    #[test]
    fn s4_scenario_point_distance() {
        // Matches spec scenario S4: ~0.001 degrees of latitude separation.
        let a = Point::from_degrees(0.0, 0.0);
        let b = Point::from_degrees(0.001, 0.0);
        let d = great_circle_distance_m(a, b);
        assert!((d - 111.0).abs() < 5.0, "distance was {d}");
    }

    #[test]
    fn is_symmetric() {
        let a = Point::from_degrees(42.0, -71.0);
        let b = Point::from_degrees(-12.0, 153.0);
        assert!((great_circle_distance_m(a, b) - great_circle_distance_m(b, a)).abs() < 1e-6);
    }
}
