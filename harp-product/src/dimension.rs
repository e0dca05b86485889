use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A semantic label on an array axis.
///
/// `Independent` is the one variant with no shared meaning across
/// variables: it names an unlabeled length-N axis used for tuples such as
/// the two corners of a `latitude_bounds` variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DimensionType {
    Time,
    Vertical,
    Latitude,
    Longitude,
    Spectral,
    Independent,
}

impl DimensionType {
    pub fn name(&self) -> &'static str {
        match self {
            DimensionType::Time => "time",
            DimensionType::Vertical => "vertical",
            DimensionType::Latitude => "latitude",
            DimensionType::Longitude => "longitude",
            DimensionType::Spectral => "spectral",
            DimensionType::Independent => "independent",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "time" => DimensionType::Time,
            "vertical" => DimensionType::Vertical,
            "latitude" => DimensionType::Latitude,
            "longitude" => DimensionType::Longitude,
            "spectral" => DimensionType::Spectral,
            "independent" => DimensionType::Independent,
            _ => return None,
        })
    }
}

impl fmt::Display for DimensionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_name() {
        for d in [
            DimensionType::Time,
            DimensionType::Vertical,
            DimensionType::Latitude,
            DimensionType::Longitude,
            DimensionType::Spectral,
            DimensionType::Independent,
        ] {
            assert_eq!(DimensionType::from_name(d.name()), Some(d));
        }
    }

    #[test]
    fn unknown_name_is_none() {
        assert_eq!(DimensionType::from_name("bogus"), None);
    }
}
