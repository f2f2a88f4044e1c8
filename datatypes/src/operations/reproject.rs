use crate::error;
use crate::primitives::{BoundingBox2D, Coordinate2D, SpatialResolution};
use crate::spatial_reference::{ProjectionParameters, SpatialReference};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

/// WGS84 semi-major axis in meters
const EARTH_RADIUS: f64 = 6_378_137.;
/// Web mercator degenerates towards the poles; this is the usual cut-off
const WEB_MERCATOR_MAX_LAT: f64 = 85.051_128_78;

/// A reference system, classified by the kind of transform it supports.
///
/// `Projected` and `Geographic` systems describe 2D space; `AxisEnum` and
/// `Instant` describe 1-D axes (band enumerations, time axes) whose
/// "transforms" are at most linear unit changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum Projection {
    #[serde(rename_all = "camelCase")]
    Projected { spatial_reference: SpatialReference },
    #[serde(rename_all = "camelCase")]
    Geographic { spatial_reference: SpatialReference },
    #[serde(rename_all = "camelCase")]
    AxisEnum { unit: String },
    #[serde(rename_all = "camelCase")]
    Instant { unit: String },
}

impl Projection {
    /// Classifies a spatial reference by its known projection parameters
    pub fn from_spatial_reference(spatial_reference: SpatialReference) -> Result<Self> {
        match spatial_reference.projection_parameters() {
            Some(ProjectionParameters::Geographic { .. }) => {
                Ok(Self::Geographic { spatial_reference })
            }
            Some(ProjectionParameters::SphericalMercator { .. }) => {
                Ok(Self::Projected { spatial_reference })
            }
            None => Err(error::Error::InvalidSpatialReferenceString {
                spatial_reference_string: spatial_reference.to_string(),
            }),
        }
    }

    /// Equality in the sense of §`SpatialReference::is_equivalent`: authority
    /// match or equal projection parameters; 1-D systems compare by unit
    pub fn is_equivalent(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::Projected { spatial_reference: a } | Self::Geographic { spatial_reference: a },
                Self::Projected { spatial_reference: b } | Self::Geographic { spatial_reference: b },
            ) => a.is_equivalent(b),
            (Self::AxisEnum { unit: a }, Self::AxisEnum { unit: b })
            | (Self::Instant { unit: a }, Self::Instant { unit: b }) => a == b,
            _ => false,
        }
    }

    /// The transform into `other`, if one is defined
    pub fn to(&self, other: &Self) -> Result<Transform> {
        if self.is_equivalent(other) {
            return Ok(Transform::Identity);
        }
        match (self, other) {
            (Self::Geographic { .. }, Self::Projected { .. }) => {
                Ok(Transform::GeographicToWebMercator)
            }
            (Self::Projected { .. }, Self::Geographic { .. }) => {
                Ok(Transform::WebMercatorToGeographic)
            }
            _ => Err(error::Error::NoTransform {
                from: self.spatial_reference_or_default(),
                to: other.spatial_reference_or_default(),
            }),
        }
    }

    /// Edge length between densification points, in the system's units
    pub fn densification_distance(&self) -> f64 {
        match self {
            // ~100 km in degrees
            Self::Geographic { .. } => 1.,
            // 100 km in meters
            Self::Projected { .. } => 100_000.,
            Self::AxisEnum { .. } | Self::Instant { .. } => f64::INFINITY,
        }
    }

    fn spatial_reference_or_default(&self) -> SpatialReference {
        match self {
            Self::Projected { spatial_reference } | Self::Geographic { spatial_reference } => {
                *spatial_reference
            }
            Self::AxisEnum { .. } | Self::Instant { .. } => SpatialReference::epsg_4326(),
        }
    }
}

/// A coordinate transform between two projections
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transform {
    Identity,
    GeographicToWebMercator,
    WebMercatorToGeographic,
    /// Unit change on a 1-D axis
    Linear { scale: f64, offset: f64 },
}

impl Transform {
    /// Applies the transform; returns `None` for coordinates outside of the
    /// transform's domain
    pub fn apply(&self, coordinate: Coordinate2D) -> Option<Coordinate2D> {
        match self {
            Self::Identity => Some(coordinate),
            Self::GeographicToWebMercator => {
                if coordinate.x.abs() > 180. || coordinate.y.abs() > WEB_MERCATOR_MAX_LAT {
                    return None;
                }
                let x = EARTH_RADIUS * coordinate.x.to_radians();
                let y = EARTH_RADIUS * (FRAC_PI_4 + coordinate.y.to_radians() / 2.).tan().ln();
                Some(Coordinate2D::new(x, y))
            }
            Self::WebMercatorToGeographic => {
                let max_extent = EARTH_RADIUS * PI;
                if coordinate.x.abs() > max_extent || coordinate.y.abs() > max_extent {
                    return None;
                }
                let lon = (coordinate.x / EARTH_RADIUS).to_degrees();
                let lat =
                    (2. * (coordinate.y / EARTH_RADIUS).exp().atan() - FRAC_PI_2).to_degrees();
                Some(Coordinate2D::new(lon, lat))
            }
            Self::Linear { scale, offset } => Some(Coordinate2D::new(
                coordinate.x * scale + offset,
                coordinate.y * scale + offset,
            )),
        }
    }
}

/// A transform between two spatial references, applied coordinate by
/// coordinate
pub trait CoordinateProjection: Send + Sync {
    fn from_spatial_reference(&self) -> SpatialReference;
    fn to_spatial_reference(&self) -> SpatialReference;

    fn project_coordinate(&self, coordinate: Coordinate2D) -> Result<Coordinate2D>;

    /// Projects all coordinates, dropping those outside the transform's
    /// domain
    fn project_coordinates(&self, coordinates: &[Coordinate2D]) -> Vec<Coordinate2D>;

    /// Densification distance in source units
    fn densification_distance(&self) -> f64;
}

/// The `CoordinateProjection` between two known spatial references
#[derive(Debug, Clone)]
pub struct CoordinateProjector {
    pub from: SpatialReference,
    pub to: SpatialReference,
    transform: Transform,
    source_projection: Projection,
}

impl CoordinateProjector {
    pub fn from_known_srs(from: SpatialReference, to: SpatialReference) -> Result<Self> {
        let source_projection = Projection::from_spatial_reference(from)?;
        let target_projection = Projection::from_spatial_reference(to)?;
        let transform = source_projection.to(&target_projection)?;
        Ok(Self {
            from,
            to,
            transform,
            source_projection,
        })
    }
}

impl CoordinateProjection for CoordinateProjector {
    fn from_spatial_reference(&self) -> SpatialReference {
        self.from
    }

    fn to_spatial_reference(&self) -> SpatialReference {
        self.to
    }

    fn project_coordinate(&self, coordinate: Coordinate2D) -> Result<Coordinate2D> {
        self.transform
            .apply(coordinate)
            .ok_or(error::Error::Reproject {
                coordinate,
                from: self.from,
                to: self.to,
            })
    }

    fn project_coordinates(&self, coordinates: &[Coordinate2D]) -> Vec<Coordinate2D> {
        coordinates
            .iter()
            .filter_map(|&c| self.transform.apply(c))
            .collect()
    }

    fn densification_distance(&self) -> f64 {
        self.source_projection.densification_distance()
    }
}

/// Reprojection of geometric primitives
pub trait Reproject<P: CoordinateProjection> {
    type Out;

    fn reproject(&self, projector: &P) -> Result<Self::Out>;
}

impl<P: CoordinateProjection> Reproject<P> for Coordinate2D {
    type Out = Coordinate2D;

    fn reproject(&self, projector: &P) -> Result<Self::Out> {
        projector.project_coordinate(*self)
    }
}

/// A bounding box is reprojected by densifying its boundary, projecting the
/// boundary points and taking the envelope. Boundary points outside of the
/// transform's domain are dropped; if none survive the region is empty and an
/// error is returned.
impl<P: CoordinateProjection> Reproject<P> for BoundingBox2D {
    type Out = BoundingBox2D;

    fn reproject(&self, projector: &P) -> Result<Self::Out> {
        let boundary = self.densified_boundary(projector.densification_distance());
        let projected = projector.project_coordinates(&boundary);
        BoundingBox2D::from_coord_iter(projected).ok_or_else(|| {
            error::Error::EmptyReprojectedRegion {
                region: format!("{self:?}"),
            }
        })
    }
}

impl<P: CoordinateProjection> Reproject<P> for geo::Polygon<f64> {
    type Out = geo::Polygon<f64>;

    fn reproject(&self, projector: &P) -> Result<Self::Out> {
        let project_ring = |ring: &geo::LineString<f64>| -> Result<geo::LineString<f64>> {
            ring.coords()
                .map(|&c| {
                    projector
                        .project_coordinate(c.into())
                        .map(geo::Coordinate::from)
                })
                .collect::<Result<Vec<_>>>()
                .map(geo::LineString::from)
        };

        Ok(geo::Polygon::new(
            project_ring(self.exterior())?,
            self.interiors()
                .iter()
                .map(project_ring)
                .collect::<Result<Vec<_>>>()?,
        ))
    }
}

/// Carries a spatial resolution across a reprojection by comparing the
/// diagonal of the region before and after the transform
pub fn suggest_pixel_size_from_diag_cross<P: CoordinateProjection>(
    bbox: BoundingBox2D,
    spatial_resolution: SpatialResolution,
    projector: &P,
) -> Result<SpatialResolution> {
    let diag_length = bbox
        .upper_left()
        .euclidean_distance(&bbox.lower_right());
    let pixel_diag_length =
        (spatial_resolution.x.powi(2) + spatial_resolution.y.powi(2)).sqrt();
    let pixels_along_diag = diag_length / pixel_diag_length;

    let projected = bbox.reproject(projector)?;
    let projected_diag_length = projected
        .upper_left()
        .euclidean_distance(&projected.lower_right());

    let suggested = projected_diag_length / pixels_along_diag / std::f64::consts::SQRT_2;
    SpatialResolution::new(suggested, suggested)
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    #[test]
    fn web_mercator_round_trip() {
        let fwd = Transform::GeographicToWebMercator;
        let inv = Transform::WebMercatorToGeographic;

        let sydney = Coordinate2D::new(151.2, -33.87);
        let projected = fwd.apply(sydney).unwrap();
        let back = inv.apply(projected).unwrap();

        assert!(approx_eq!(f64, back.x, sydney.x, epsilon = 1e-9));
        assert!(approx_eq!(f64, back.y, sydney.y, epsilon = 1e-9));
    }

    #[test]
    fn known_web_mercator_value() {
        let projected = Transform::GeographicToWebMercator
            .apply(Coordinate2D::new(180., 0.))
            .unwrap();
        assert!(approx_eq!(
            f64,
            projected.x,
            20_037_508.342_789_244,
            epsilon = 1e-6
        ));
        assert!(approx_eq!(f64, projected.y, 0., epsilon = 1e-6));
    }

    #[test]
    fn polar_coordinates_are_outside_the_mercator_domain() {
        assert!(Transform::GeographicToWebMercator
            .apply(Coordinate2D::new(0., 89.))
            .is_none());

        let projector =
            CoordinateProjector::from_known_srs(
                SpatialReference::epsg_4326(),
                SpatialReference::epsg_3857(),
            )
            .unwrap();
        assert!(Coordinate2D::new(0., 89.).reproject(&projector).is_err());
    }

    #[test]
    fn equivalent_references_use_the_identity() {
        let projector = CoordinateProjector::from_known_srs(
            SpatialReference::epsg_3857(),
            SpatialReference::new(crate::spatial_reference::SpatialReferenceAuthority::SrOrg, 900_913),
        )
        .unwrap();
        let c = Coordinate2D::new(1_000_000., 2_000_000.);
        assert_eq!(c.reproject(&projector).unwrap(), c);
    }

    #[test]
    fn bbox_reprojection_takes_the_curved_boundary_into_account() {
        let projector = CoordinateProjector::from_known_srs(
            SpatialReference::epsg_4326(),
            SpatialReference::epsg_3857(),
        )
        .unwrap();

        let bbox = BoundingBox2D::new_unchecked((140., -36.).into(), (150., -30.).into());
        let projected = bbox.reproject(&projector).unwrap();

        // corners survive exactly
        let ll = Coordinate2D::new(140., -36.).reproject(&projector).unwrap();
        let ur = Coordinate2D::new(150., -30.).reproject(&projector).unwrap();
        assert!(approx_eq!(f64, projected.lower_left().x, ll.x, epsilon = 1e-6));
        assert!(approx_eq!(f64, projected.upper_right().y, ur.y, epsilon = 1e-6));
    }

    #[test]
    fn partially_out_of_domain_regions_shrink_to_the_valid_part() {
        let projector = CoordinateProjector::from_known_srs(
            SpatialReference::epsg_4326(),
            SpatialReference::epsg_3857(),
        )
        .unwrap();

        // extends past the mercator latitude cut-off
        let bbox = BoundingBox2D::new_unchecked((0., 80.).into(), (10., 89.).into());
        let projected = bbox.reproject(&projector).unwrap();
        let edge = Coordinate2D::new(0., 80.).reproject(&projector).unwrap();
        assert!(approx_eq!(f64, projected.lower_left().y, edge.y, epsilon = 1e-6));
    }

    #[test]
    fn resolution_suggestion_is_in_target_units() {
        let projector = CoordinateProjector::from_known_srs(
            SpatialReference::epsg_4326(),
            SpatialReference::epsg_3857(),
        )
        .unwrap();

        let bbox = BoundingBox2D::new_unchecked((0., -1.).into(), (1., 0.).into());
        let suggested = suggest_pixel_size_from_diag_cross(
            bbox,
            SpatialResolution::new_unchecked(0.001, 0.001),
            &projector,
        )
        .unwrap();

        // one degree at the equator is ~111 km, so a 0.001 degree pixel is ~111 m
        assert!(suggested.x > 90. && suggested.x < 130.);
    }

    #[test]
    fn one_dimensional_systems_only_transform_between_equal_units() {
        let seconds = Projection::Instant {
            unit: "seconds since 1970-01-01".into(),
        };
        let bands = Projection::AxisEnum {
            unit: "band".into(),
        };

        assert_eq!(seconds.to(&seconds.clone()).unwrap(), Transform::Identity);
        assert!(seconds.to(&bands).is_err());
    }
}
