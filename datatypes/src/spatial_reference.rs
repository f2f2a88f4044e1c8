use crate::error::Error;
use crate::Result;
use serde::de::Visitor;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

/// A spatial reference authority that is part of a spatial reference definition
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING-KEBAB-CASE")]
pub enum SpatialReferenceAuthority {
    Epsg,
    SrOrg,
    Iau2000,
    Esri,
}

impl FromStr for SpatialReferenceAuthority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "EPSG" => SpatialReferenceAuthority::Epsg,
            "SR-ORG" => SpatialReferenceAuthority::SrOrg,
            "IAU2000" => SpatialReferenceAuthority::Iau2000,
            "ESRI" => SpatialReferenceAuthority::Esri,
            _ => {
                return Err(Error::InvalidSpatialReferenceString {
                    spatial_reference_string: s.into(),
                })
            }
        })
    }
}

impl std::fmt::Display for SpatialReferenceAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                SpatialReferenceAuthority::Epsg => "EPSG",
                SpatialReferenceAuthority::SrOrg => "SR-ORG",
                SpatialReferenceAuthority::Iau2000 => "IAU2000",
                SpatialReferenceAuthority::Esri => "ESRI",
            }
        )
    }
}

/// The family of projection parameters behind an authority code. Distinct
/// authority strings can resolve to the same parameters, e.g. the web
/// mercator aliases.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ProjectionParameters {
    /// Plate carrée on a named datum
    Geographic { datum: &'static str },
    /// Spherical mercator on a given radius in meters (stored as millimeters
    /// to stay `Eq`)
    SphericalMercator { radius_mm: u64 },
}

/// A spatial reference consists of an authority and a code
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct SpatialReference {
    authority: SpatialReferenceAuthority,
    code: u32,
}

impl SpatialReference {
    pub fn new(authority: SpatialReferenceAuthority, code: u32) -> Self {
        Self { authority, code }
    }

    pub fn epsg_4326() -> Self {
        Self::new(SpatialReferenceAuthority::Epsg, 4326)
    }

    pub fn epsg_3857() -> Self {
        Self::new(SpatialReferenceAuthority::Epsg, 3857)
    }

    pub fn authority(&self) -> SpatialReferenceAuthority {
        self.authority
    }

    pub fn code(&self) -> u32 {
        self.code
    }

    /// The underlying projection parameters, if the code is known to the
    /// built-in registry
    pub fn projection_parameters(&self) -> Option<ProjectionParameters> {
        const WGS84_SEMI_MAJOR_MM: u64 = 6_378_137_000;
        match (self.authority, self.code) {
            (SpatialReferenceAuthority::Epsg, 4326) => Some(ProjectionParameters::Geographic {
                datum: "WGS84",
            }),
            (SpatialReferenceAuthority::Epsg, 4267) => Some(ProjectionParameters::Geographic {
                datum: "NAD27",
            }),
            (SpatialReferenceAuthority::Epsg, 3857 | 900_913)
            | (SpatialReferenceAuthority::SrOrg, 6 | 900_913)
            | (SpatialReferenceAuthority::Esri, 102_100) => {
                Some(ProjectionParameters::SphericalMercator {
                    radius_mm: WGS84_SEMI_MAJOR_MM,
                })
            }
            _ => None,
        }
    }

    /// Two references are equivalent iff their authority strings match or
    /// their projection parameters compare equal. This tolerates different
    /// providers of the same reference system.
    pub fn is_equivalent(&self, other: &Self) -> bool {
        if self == other {
            return true;
        }
        match (self.projection_parameters(), other.projection_parameters()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

impl std::fmt::Display for SpatialReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.authority, self.code)
    }
}

/// Parses a spatial reference from an `authority:code` string
impl FromStr for SpatialReference {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut split = s.split(':');
        match (split.next(), split.next(), split.next()) {
            (Some(authority), Some(code), None) => Ok(Self::new(
                authority.parse()?,
                code.parse::<u32>().map_err(|_| {
                    Error::InvalidSpatialReferenceString {
                        spatial_reference_string: s.into(),
                    }
                })?,
            )),
            _ => Err(Error::InvalidSpatialReferenceString {
                spatial_reference_string: s.into(),
            }),
        }
    }
}

impl Serialize for SpatialReference {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

struct SpatialReferenceDeserializeVisitor;

impl<'de> Visitor<'de> for SpatialReferenceDeserializeVisitor {
    type Value = SpatialReference;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("a spatial reference in the form authority:code")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        v.parse().map_err(serde::de::Error::custom)
    }
}

impl<'de> Deserialize<'de> for SpatialReference {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_str(SpatialReferenceDeserializeVisitor)
    }
}

/// A spatial reference or none, for data without a spatial dimension
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum SpatialReferenceOption {
    SpatialReference(SpatialReference),
    Unreferenced,
}

impl From<SpatialReference> for SpatialReferenceOption {
    fn from(spatial_reference: SpatialReference) -> Self {
        Self::SpatialReference(spatial_reference)
    }
}

impl From<SpatialReferenceOption> for Option<SpatialReference> {
    fn from(option: SpatialReferenceOption) -> Self {
        match option {
            SpatialReferenceOption::SpatialReference(s) => Some(s),
            SpatialReferenceOption::Unreferenced => None,
        }
    }
}

impl std::fmt::Display for SpatialReferenceOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpatialReferenceOption::SpatialReference(p) => write!(f, "{}", p),
            SpatialReferenceOption::Unreferenced => Ok(()),
        }
    }
}

impl Serialize for SpatialReferenceOption {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

struct SpatialReferenceOptionDeserializeVisitor;

impl<'de> Visitor<'de> for SpatialReferenceOptionDeserializeVisitor {
    type Value = SpatialReferenceOption;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("a spatial reference in the form authority:code or an empty string")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        if v.is_empty() {
            return Ok(SpatialReferenceOption::Unreferenced);
        }
        let spatial_reference: SpatialReference =
            v.parse().map_err(serde::de::Error::custom)?;
        Ok(spatial_reference.into())
    }
}

impl<'de> Deserialize<'de> for SpatialReferenceOption {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_str(SpatialReferenceOptionDeserializeVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display() {
        let sref: SpatialReference = "EPSG:4326".parse().unwrap();
        assert_eq!(sref, SpatialReference::epsg_4326());
        assert_eq!(sref.to_string(), "EPSG:4326");

        assert!("EPSG".parse::<SpatialReference>().is_err());
        assert!("EPSG:foo".parse::<SpatialReference>().is_err());
        assert!("EPSG:4326:extra".parse::<SpatialReference>().is_err());
    }

    #[test]
    fn serde_as_string() {
        let sref = SpatialReference::new(SpatialReferenceAuthority::SrOrg, 900_913);
        let json = serde_json::to_string(&sref).unwrap();
        assert_eq!(json, "\"SR-ORG:900913\"");
        let back: SpatialReference = serde_json::from_str(&json).unwrap();
        assert_eq!(sref, back);
    }

    #[test]
    fn equivalence_is_looser_than_equality() {
        let web_mercator = SpatialReference::epsg_3857();
        let google = SpatialReference::new(SpatialReferenceAuthority::SrOrg, 900_913);
        let esri = SpatialReference::new(SpatialReferenceAuthority::Esri, 102_100);

        assert_ne!(web_mercator, google);
        assert!(web_mercator.is_equivalent(&google));
        assert!(web_mercator.is_equivalent(&esri));

        assert!(!web_mercator.is_equivalent(&SpatialReference::epsg_4326()));
        // unknown codes only compare equal on the authority string
        let unknown = SpatialReference::new(SpatialReferenceAuthority::Epsg, 31_467);
        assert!(unknown.is_equivalent(&unknown));
        assert!(!unknown.is_equivalent(&web_mercator));
    }
}
