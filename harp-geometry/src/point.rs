/// A point on the sphere, stored as radians internally so repeated
/// distance/containment checks don't keep re-converting degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub lat_rad: f64,
    pub lon_rad: f64,
}

impl Point {
    pub fn from_degrees(lat_deg: f64, lon_deg: f64) -> Self {
        Point {
            lat_rad: lat_deg.to_radians(),
            lon_rad: lon_deg.to_radians(),
        }
    }

    pub fn lat_deg(&self) -> f64 {
        self.lat_rad.to_degrees()
    }

    pub fn lon_deg(&self) -> f64 {
        self.lon_rad.to_degrees()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_degrees() {
        let p = Point::from_degrees(12.5, -98.25);
        assert!((p.lat_deg() - 12.5).abs() < 1e-9);
        assert!((p.lon_deg() - (-98.25)).abs() < 1e-9);
    }
}
