//! The planner's return value: a lazy expression tree over tile references.
//! Nothing is read until `materialise` or the slice stream demand it.

use crate::context::QueryContext;
use crate::error;
use crate::storage::{read_tile_verified, CoordinateVariable, TileStore};
use crate::typed_grid::{warp_into, TypedGrid};
use crate::Result;
use futures::stream::BoxStream;
use futures::StreamExt;
use geocube_catalogue::schema::{DimensionProperties, MeasurementType, StorageUnitRecord};
use geocube_datatypes::dataset::MeasurementTag;
use geocube_datatypes::primitives::{
    BoundingBox2D, SpatialResolution, TimeInstance,
};
use geocube_datatypes::raster::{GeoTransform, GridShape2D};
use geocube_datatypes::spatial_reference::SpatialReference;
use std::sync::Arc;

/// The aligned output grid a query materialises into
#[derive(Debug, Clone, PartialEq)]
pub struct OutputDescriptor {
    pub spatial_reference: SpatialReference,
    pub geo_transform: GeoTransform,
    pub shape: GridShape2D,
    pub bounds: BoundingBox2D,
    pub resolution: SpatialResolution,
}

impl OutputDescriptor {
    pub fn from_bounds(
        spatial_reference: SpatialReference,
        bounds: BoundingBox2D,
        resolution: SpatialResolution,
    ) -> Self {
        let shape: GridShape2D = [
            (bounds.size_y() / resolution.y).round().max(1.) as usize,
            (bounds.size_x() / resolution.x).round().max(1.) as usize,
        ]
        .into();
        Self {
            spatial_reference,
            geo_transform: GeoTransform::new(bounds.upper_left(), resolution.x, -resolution.y),
            shape,
            bounds,
            resolution,
        }
    }

    /// The sub-grid covering `region`, snapped outwards to pixel boundaries
    pub fn subset(&self, region: BoundingBox2D) -> Result<Self> {
        let clipped = self
            .bounds
            .intersection(&region)
            .ok_or_else(|| error::Error::Query {
                reason: format!("region {region:?} lies outside of the array"),
            })?;

        let origin = self.bounds.lower_left();
        let snap_down = |v: f64, o: f64, step: f64| o + ((v - o) / step).floor() * step;
        let snap_up = |v: f64, o: f64, step: f64| o + ((v - o) / step).ceil() * step;

        let bounds = BoundingBox2D::new_unchecked(
            (
                snap_down(clipped.lower_left().x, origin.x, self.resolution.x),
                snap_down(clipped.lower_left().y, origin.y, self.resolution.y),
            )
                .into(),
            (
                snap_up(clipped.upper_right().x, origin.x, self.resolution.x),
                snap_up(clipped.upper_right().y, origin.y, self.resolution.y),
            )
                .into(),
        );
        Ok(Self::from_bounds(
            self.spatial_reference,
            bounds,
            self.resolution,
        ))
    }
}

/// A tile reference the lazy array will read on demand
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedTile {
    pub record: StorageUnitRecord,
    /// Location after url signing
    pub location: String,
}

/// The tiles contributing to one output timestamp, in overlay order
#[derive(Debug, Clone, PartialEq)]
pub struct TimeGroup {
    pub timestamp: TimeInstance,
    pub tiles: Vec<PlannedTile>,
}

/// One materialised output timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSlice {
    pub time: TimeInstance,
    /// In measurement index order
    pub bands: Vec<(MeasurementTag, TypedGrid)>,
}

impl TimeSlice {
    pub fn band(&self, tag: &str) -> Option<&TypedGrid> {
        self.bands
            .iter()
            .find(|(band_tag, _)| band_tag.0 == tag)
            .map(|(_, grid)| grid)
    }
}

/// CF properties per output axis
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AxisProperties {
    pub time: DimensionProperties,
    pub y: DimensionProperties,
    pub x: DimensionProperties,
}

/// A lazy n-d array over planned tiles, aligned to the requested region,
/// resolution and reference system
pub struct LazyArray {
    output: OutputDescriptor,
    measurements: Vec<MeasurementType>,
    groups: Vec<TimeGroup>,
    axis_properties: AxisProperties,
    tile_store: Arc<dyn TileStore>,
    skip_broken_datasets: bool,
}

impl std::fmt::Debug for LazyArray {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyArray")
            .field("output", &self.output)
            .field("measurements", &self.measurements)
            .field("groups", &self.groups)
            .field("axis_properties", &self.axis_properties)
            .field("skip_broken_datasets", &self.skip_broken_datasets)
            .finish_non_exhaustive()
    }
}

impl LazyArray {
    pub(crate) fn new(
        output: OutputDescriptor,
        measurements: Vec<MeasurementType>,
        groups: Vec<TimeGroup>,
        axis_properties: AxisProperties,
        tile_store: Arc<dyn TileStore>,
        skip_broken_datasets: bool,
    ) -> Self {
        Self {
            output,
            measurements,
            groups,
            axis_properties,
            tile_store,
            skip_broken_datasets,
        }
    }

    pub fn output(&self) -> &OutputDescriptor {
        &self.output
    }

    /// Selected measurements, in `measurement_type_index` order
    pub fn measurements(&self) -> &[MeasurementType] {
        &self.measurements
    }

    pub fn groups(&self) -> &[TimeGroup] {
        &self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Ascending, duplicate-free output timestamps
    pub fn time_coordinates(&self) -> Vec<TimeInstance> {
        self.groups.iter().map(|group| group.timestamp).collect()
    }

    /// Coordinate variables of `descriptor`, values ascending, CF attributes
    /// from the storage-type-dimension property store
    fn coordinates_for(&self, descriptor: &OutputDescriptor) -> Vec<CoordinateVariable> {
        let x_values = (0..descriptor.shape.axis_size_x())
            .map(|i| descriptor.bounds.lower_left().x + (i as f64 + 0.5) * descriptor.resolution.x)
            .collect();
        let y_values = (0..descriptor.shape.axis_size_y())
            .map(|i| descriptor.bounds.lower_left().y + (i as f64 + 0.5) * descriptor.resolution.y)
            .collect();
        let t_values = self
            .groups
            .iter()
            .map(|group| group.timestamp.inner() as f64 / 1000.)
            .collect();

        vec![
            CoordinateVariable {
                name: "time".to_string(),
                values: t_values,
                attributes: self.axis_properties.time.clone(),
            },
            CoordinateVariable {
                name: "y".to_string(),
                values: y_values,
                attributes: self.axis_properties.y.clone(),
            },
            CoordinateVariable {
                name: "x".to_string(),
                values: x_values,
                attributes: self.axis_properties.x.clone(),
            },
        ]
    }

    /// A stream of materialised time slices; suspends on tile reads and
    /// honours cancellation between tiles
    pub fn slices<'a>(&'a self, ctx: &'a QueryContext) -> BoxStream<'a, Result<TimeSlice>> {
        futures::stream::iter(&self.groups)
            .then(move |group| async move {
                ctx.cancellation.ensure_active()?;
                self.materialise_group(group, &self.output, ctx).await
            })
            .boxed()
    }

    /// Materialises the array, optionally restricted to `region` (in the
    /// output reference system)
    pub async fn materialise(
        &self,
        ctx: &QueryContext,
        region: Option<BoundingBox2D>,
    ) -> Result<MaterialisedArray> {
        match ctx.timeout {
            None => self.materialise_inner(ctx, region).await,
            Some(deadline) => {
                tokio::time::timeout(deadline, self.materialise_inner(ctx, region))
                    .await
                    .map_err(|_| error::Error::Timeout {
                        operation: "materialise".to_string(),
                        millis: deadline.as_millis() as u64,
                    })?
            }
        }
    }

    async fn materialise_inner(
        &self,
        ctx: &QueryContext,
        region: Option<BoundingBox2D>,
    ) -> Result<MaterialisedArray> {
        let descriptor = match region {
            None => self.output.clone(),
            Some(region) => self.output.subset(region)?,
        };

        let mut slices = Vec::with_capacity(self.groups.len());
        for group in &self.groups {
            ctx.cancellation.ensure_active()?;
            slices.push(self.materialise_group(group, &descriptor, ctx).await?);
        }

        Ok(MaterialisedArray {
            coordinates: self.coordinates_for(&descriptor),
            times: self.time_coordinates(),
            output: descriptor,
            slices,
        })
    }

    async fn materialise_group(
        &self,
        group: &TimeGroup,
        descriptor: &OutputDescriptor,
        ctx: &QueryContext,
    ) -> Result<TimeSlice> {
        let mut bands: Vec<(MeasurementTag, TypedGrid)> = self
            .measurements
            .iter()
            .map(|measurement| {
                (
                    measurement.tag.clone(),
                    TypedGrid::filled_with_no_data(
                        measurement.data_type,
                        descriptor.shape,
                        measurement.no_data_value,
                    ),
                )
            })
            .collect();

        for tile in &group.tiles {
            ctx.cancellation.ensure_active()?;

            let data = match read_tile_verified(
                self.tile_store.as_ref(),
                &tile.location,
                &tile.record.md5,
            )
            .await
            {
                Ok(data) => data,
                Err(tile_error) if self.skip_broken_datasets => {
                    tracing::warn!(
                        location = %tile.location,
                        %tile_error,
                        "skipping unreadable tile"
                    );
                    continue;
                }
                Err(tile_error) => return Err(tile_error),
            };

            for ((_, target), measurement) in bands.iter_mut().zip(&self.measurements) {
                let Some(source) = data.band(&measurement.tag.0) else {
                    continue;
                };
                warp_into(
                    target,
                    descriptor.geo_transform,
                    descriptor.spatial_reference,
                    source,
                    data.header.geo_transform,
                    data.header.spatial_reference,
                    measurement.resampling_method,
                )?;
            }
        }

        Ok(TimeSlice {
            time: group.timestamp,
            bands,
        })
    }
}

/// A fully realised query result
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialisedArray {
    pub output: OutputDescriptor,
    /// time, y, x; values ascending along each axis
    pub coordinates: Vec<CoordinateVariable>,
    pub times: Vec<TimeInstance>,
    pub slices: Vec<TimeSlice>,
}

impl MaterialisedArray {
    pub fn band(&self, time_index: usize, tag: &str) -> Option<&TypedGrid> {
        self.slices.get(time_index)?.band(tag)
    }

    pub fn spatial_reference(&self) -> SpatialReference {
        self.output.spatial_reference
    }
}
