//! Resolves a `CubeQuery` into a covering set of tile versions and the
//! aligned output grid they will be overlaid into. Tile selection is a
//! single pass over the catalogue's indices.

use super::lazy::{AxisProperties, LazyArray, OutputDescriptor, PlannedTile, TimeGroup};
use super::{CubeQuery, GroupBy, ProductSelector};
use crate::context::CoreContext;
use crate::error;
use crate::ingest::solar_day;
use crate::storage::sign_location;
use crate::Result;
use chrono::Datelike;
use geocube_catalogue::query::StorageUnitQuery;
use geocube_catalogue::schema::{MeasurementType, StorageType, StorageUnitRecord};
use geocube_datatypes::operations::reproject::{
    suggest_pixel_size_from_diag_cross, CoordinateProjector, Reproject,
};
use geocube_datatypes::primitives::{BoundingBox2D, SpatialResolution, TimeInstance};
use itertools::Itertools;
use std::collections::BTreeMap;

pub struct QueryPlanner {
    context: CoreContext,
}

impl QueryPlanner {
    pub fn new(context: CoreContext) -> Self {
        Self { context }
    }

    /// Resolves the query into a lazy aligned array
    pub async fn load(&self, query: CubeQuery) -> Result<LazyArray> {
        let storage_type = self.resolve_product(&query.product).await?;
        let measurements = select_measurements(&storage_type, query.measurements.as_deref())?;

        let native = storage_type.spatial_reference;
        let native_cell = native_cell_size(&storage_type)?;
        let output_spatial_reference = query
            .output
            .as_ref()
            .map_or(native, |output| output.spatial_reference);

        // selectors are expressed in the output reference system; half-pixel
        // tolerance for singleton values comes from the requested resolution
        let half_pixel = query
            .output
            .as_ref()
            .and_then(|output| output.resolution)
            .unwrap_or(native_cell);
        let (x_min, x_max) = query.x.bounds(half_pixel.x / 2.);
        let (y_min, y_max) = query.y.bounds(half_pixel.y / 2.);

        let requested_bounds = match (
            query.output.as_ref().and_then(|output| output.bounds),
            x_min.zip(x_max),
            y_min.zip(y_max),
        ) {
            (Some(bounds), _, _) => Some(bounds),
            (None, Some((x_min, x_max)), Some((y_min, y_max))) => Some(
                BoundingBox2D::new((x_min, y_min).into(), (x_max, y_max).into())?,
            ),
            _ => None,
        };

        // normalise the request into the native reference system for tile
        // selection
        let native_bounds = match requested_bounds {
            Some(bounds) if !output_spatial_reference.is_equivalent(&native) => {
                let projector =
                    CoordinateProjector::from_known_srs(output_spatial_reference, native)
                        .map_err(|source| error::Error::Reproject { source })?;
                Some(
                    bounds
                        .reproject(&projector)
                        .map_err(|source| error::Error::Reproject { source })?,
                )
            }
            Some(bounds) => Some(bounds),
            None => None,
        };

        let time_interval = query.time.to_interval();

        // single pass over the catalogue's tile indices
        let mut units = self
            .context
            .catalogue()
            .find_storage_units(&StorageUnitQuery {
                storage_type: storage_type.tag.clone(),
                tile_indices: None,
                spatial: native_bounds,
                time: Some(time_interval),
                include_archived: false,
                latest_only: true,
            })
            .await?;

        if let Some(predicate) = &query.dataset_predicate {
            let mut filtered = Vec::with_capacity(units.len());
            for unit in units {
                if self.any_source_matches(&unit, predicate.as_ref()).await? {
                    filtered.push(unit);
                }
            }
            units = filtered;
        }

        // the output geometry: requested, or grown from what the units cover
        let native_envelope = native_bounds.or_else(|| {
            units
                .iter()
                .map(|unit| unit.footprint)
                .reduce(|a, b| a.extended(&b))
        });

        let output_bounds = match (requested_bounds, native_envelope) {
            (Some(bounds), _) => bounds,
            (None, Some(envelope)) => {
                if output_spatial_reference.is_equivalent(&native) {
                    envelope
                } else {
                    let projector =
                        CoordinateProjector::from_known_srs(native, output_spatial_reference)
                            .map_err(|source| error::Error::Reproject { source })?;
                    envelope
                        .reproject(&projector)
                        .map_err(|source| error::Error::Reproject { source })?
                }
            }
            (None, None) => BoundingBox2D::new_unchecked((0., 0.).into(), (0., 0.).into()),
        };

        let output_resolution = match query.output.as_ref().and_then(|output| output.resolution) {
            Some(resolution) => resolution,
            None if output_spatial_reference.is_equivalent(&native) => native_cell,
            None => {
                // carry the native cell size across the reprojection
                let projector =
                    CoordinateProjector::from_known_srs(native, output_spatial_reference)
                        .map_err(|source| error::Error::Reproject { source })?;
                let reference = native_envelope.unwrap_or_else(|| {
                    BoundingBox2D::new_unchecked((0., 0.).into(), (1., 1.).into())
                });
                suggest_pixel_size_from_diag_cross(reference, native_cell, &projector)
                    .map_err(|source| error::Error::Reproject { source })?
            }
        };

        let descriptor = OutputDescriptor::from_bounds(
            output_spatial_reference,
            output_bounds,
            output_resolution,
        );

        let groups = group_units(units, query.group_by, query.url_signer.as_ref())?;

        let axis_properties = AxisProperties {
            time: storage_type.time_dimension()?.properties.clone(),
            y: storage_type.y_dimension()?.properties.clone(),
            x: storage_type.x_dimension()?.properties.clone(),
        };

        tracing::debug!(
            storage_type = %storage_type.tag,
            groups = groups.len(),
            tiles = groups.iter().map(|g| g.tiles.len()).sum::<usize>(),
            "planned query"
        );

        Ok(LazyArray::new(
            descriptor,
            measurements,
            groups,
            axis_properties,
            std::sync::Arc::clone(self.context.tile_store()),
            query.skip_broken_datasets,
        ))
    }

    async fn resolve_product(&self, selector: &ProductSelector) -> Result<StorageType> {
        match selector {
            ProductSelector::StorageType(tag) => {
                Ok(self.context.catalogue().storage_type(tag).await?)
            }
            ProductSelector::DatasetTypes(tags) => {
                let mut required: Vec<String> = Vec::new();
                for tag in tags {
                    let dataset_type = self.context.catalogue().dataset_type(&tag.0).await?;
                    required.extend(dataset_type.measurements.iter().map(|m| m.tag.0.clone()));
                }

                let candidates: Vec<StorageType> = self
                    .context
                    .catalogue()
                    .storage_types()
                    .await?
                    .into_iter()
                    .filter(|storage_type| {
                        required
                            .iter()
                            .all(|tag| storage_type.measurement(tag).is_some())
                    })
                    .collect();

                match candidates.len() {
                    1 => Ok(candidates.into_iter().next().expect("len is 1")),
                    0 => Err(error::Error::Query {
                        reason: format!(
                            "no storage type covers the dataset types {}",
                            tags.iter().join(", ")
                        ),
                    }),
                    _ => Err(error::Error::Query {
                        reason: format!(
                            "dataset types {} are ambiguous across storage types {}",
                            tags.iter().join(", "),
                            candidates.iter().map(|c| &c.tag).join(", ")
                        ),
                    }),
                }
            }
        }
    }

    async fn any_source_matches(
        &self,
        unit: &StorageUnitRecord,
        predicate: &(dyn Fn(&geocube_catalogue::schema::DatasetRecord) -> bool + Send + Sync),
    ) -> Result<bool> {
        let sources = self.context.catalogue().unit_sources(unit.id).await?;
        for dataset_id in sources {
            let dataset = self.context.catalogue().dataset(dataset_id).await?;
            if predicate(&dataset) {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// The native cell size of the storage type's spatial dimensions
fn native_cell_size(storage_type: &StorageType) -> Result<SpatialResolution> {
    let x = storage_type.x_dimension()?.cell_size();
    let y = storage_type.y_dimension()?.cell_size();
    match (x, y) {
        (Some(x), Some(y)) => Ok(SpatialResolution::new_unchecked(x, y)),
        _ => Err(error::Error::Query {
            reason: "the storage type's spatial dimensions are not regular".to_string(),
        }),
    }
}

/// Selected measurements in `measurement_type_index` order
fn select_measurements(
    storage_type: &StorageType,
    requested: Option<&[String]>,
) -> Result<Vec<MeasurementType>> {
    match requested {
        None => Ok(storage_type.measurements.clone()),
        Some(tags) => {
            for tag in tags {
                if storage_type.measurement(tag).is_none() {
                    return Err(error::Error::UnknownMeasurement { tag: tag.clone() });
                }
            }
            Ok(storage_type
                .measurements
                .iter()
                .filter(|m| tags.iter().any(|tag| *tag == m.tag.0))
                .cloned()
                .collect())
        }
    }
}

/// The representative timestamp of a unit: the start of its time bucket
fn unit_timestamp(unit: &StorageUnitRecord) -> Result<TimeInstance> {
    let seconds = unit
        .dimensions
        .iter()
        .find(|d| d.dimension == "time")
        .map(|d| d.min_value)
        .ok_or_else(|| error::Error::FusionConflict {
            reason: format!("storage unit {} has no time record", unit.id),
        })?;
    Ok(TimeInstance::from_millis_unchecked((seconds * 1000.) as i64))
}

/// Groups units along the output time axis; group keys are ascending and
/// duplicate timestamps collapse into one group
fn group_units(
    units: Vec<StorageUnitRecord>,
    group_by: GroupBy,
    url_signer: Option<&crate::storage::UrlSigner>,
) -> Result<Vec<TimeGroup>> {
    let mut grouped: BTreeMap<i64, TimeGroup> = BTreeMap::new();

    for unit in units {
        let timestamp = unit_timestamp(&unit)?;
        let key = match group_by {
            GroupBy::Time => timestamp.inner(),
            GroupBy::SolarDay => {
                let centroid = unit.footprint.center();
                i64::from(solar_day(timestamp, centroid.x)?.num_days_from_ce())
            }
        };

        let location = sign_location(url_signer, &unit.location);
        let entry = grouped.entry(key).or_insert_with(|| TimeGroup {
            timestamp,
            tiles: Vec::new(),
        });
        entry.timestamp = entry.timestamp.min(timestamp);
        entry.tiles.push(PlannedTile {
            record: unit,
            location,
        });
    }

    let mut groups: Vec<TimeGroup> = grouped.into_values().collect();
    for group in &mut groups {
        // deterministic overlay order within a group
        group
            .tiles
            .sort_by_key(|tile| (tile.record.tile_index, tile.record.version, tile.record.id));
    }
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{CancellationFlag, QueryContext};
    use crate::ingest::{IngestOptions, IngestTask, Ingestor};
    use crate::query::{CubeQuery, OutputGeometry, RangeSelector, TimeSelector};
    use crate::storage::TileStore;
    use crate::test_support::{test_cube, uniform_scene, TestCube};
    use geocube_catalogue::schema::TileIndex;
    use geocube_catalogue::store::Catalogue;
    use geocube_datatypes::dataset::DatasetId;
    use geocube_datatypes::operations::reproject::Transform;
    use geocube_datatypes::primitives::Coordinate2D;
    use geocube_datatypes::spatial_reference::SpatialReference;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    async fn ingest_tile(
        cube: &TestCube,
        x_index: i64,
        sources: Vec<DatasetId>,
        version: u32,
    ) -> crate::ingest::IngestOutcome {
        Ingestor::new(cube.context.clone(), IngestOptions::default())
            .ingest_task(IngestTask {
                storage_type: "LS5TM".into(),
                tile_index: TileIndex {
                    t: 2010,
                    y: -36,
                    x: x_index,
                },
                source_datasets: sources,
                version,
            })
            .await
            .unwrap()
    }

    fn june_2010_query() -> CubeQuery {
        CubeQuery {
            x: RangeSelector::closed(140.2, 140.8),
            y: RangeSelector::closed(-35.8, -35.2),
            time: TimeSelector::range(
                "2010-06-01".parse().unwrap(),
                "2010-06-30".parse().unwrap(),
            ),
            ..CubeQuery::everything("LS5TM".into())
        }
    }

    /// The value of a band at an output coordinate
    fn value_at(
        array: &crate::query::MaterialisedArray,
        time_index: usize,
        tag: &str,
        coordinate: Coordinate2D,
    ) -> Option<f64> {
        let (y, x) = array.output.geo_transform.coordinate_2d_to_grid_2d(coordinate);
        array.band(time_index, tag)?.sample_f64(y, x)
    }

    #[tokio::test]
    async fn loads_a_native_aligned_array() {
        let cube = test_cube().await;
        let scene = uniform_scene(
            &cube,
            (140.0, 141.0),
            (-36.0, -35.0),
            "2010-06-15T23:10:00Z",
            7,
        )
        .await;
        ingest_tile(&cube, 140, vec![scene], 1).await;

        let array = QueryPlanner::new(cube.context.clone())
            .load(june_2010_query())
            .await
            .unwrap();

        assert_eq!(array.measurements().len(), 2);
        assert_eq!(array.groups().len(), 1);

        let materialised = array
            .materialise(&QueryContext::default(), None)
            .await
            .unwrap();
        assert_eq!(
            materialised.spatial_reference(),
            SpatialReference::epsg_4326()
        );
        assert_eq!(
            value_at(&materialised, 0, "B10", (140.5, -35.5).into()),
            Some(7.)
        );

        // coordinate arrays are ascending along every continuous dimension
        for coordinate in &materialised.coordinates {
            assert!(
                coordinate.values.windows(2).all(|w| w[0] < w[1])
                    || coordinate.values.len() <= 1,
                "{} is not ascending",
                coordinate.name
            );
        }
        // band order follows the measurement index
        assert_eq!(materialised.slices[0].bands[0].0 .0, "B10");
        assert_eq!(materialised.slices[0].bands[1].0 .0, "B20");
    }

    #[tokio::test]
    async fn adjacent_tiles_mosaic_into_one_group() {
        let cube = test_cube().await;
        let west = uniform_scene(
            &cube,
            (140.0, 141.0),
            (-36.0, -35.0),
            "2010-06-15T23:10:00Z",
            1,
        )
        .await;
        let east = uniform_scene(
            &cube,
            (141.0, 142.0),
            (-36.0, -35.0),
            "2010-06-15T23:10:00Z",
            2,
        )
        .await;
        ingest_tile(&cube, 140, vec![west], 1).await;
        ingest_tile(&cube, 141, vec![east], 1).await;

        let array = QueryPlanner::new(cube.context.clone())
            .load(CubeQuery {
                x: RangeSelector::closed(140.2, 141.8),
                y: RangeSelector::closed(-35.8, -35.2),
                ..CubeQuery::everything("LS5TM".into())
            })
            .await
            .unwrap();

        // same time bucket and solar day: duplicate timestamps collapse
        assert_eq!(array.groups().len(), 1);
        assert_eq!(array.groups()[0].tiles.len(), 2);
        assert_eq!(array.time_coordinates().len(), 1);

        let materialised = array
            .materialise(&QueryContext::default(), None)
            .await
            .unwrap();
        assert_eq!(
            value_at(&materialised, 0, "B10", (140.5, -35.5).into()),
            Some(1.)
        );
        assert_eq!(
            value_at(&materialised, 0, "B10", (141.5, -35.5).into()),
            Some(2.)
        );
    }

    #[tokio::test]
    async fn reprojected_queries_carry_the_requested_geometry() {
        let cube = test_cube().await;
        let west = uniform_scene(
            &cube,
            (140.0, 140.5),
            (-36.0, -35.0),
            "2010-06-15T23:10:00Z",
            1,
        )
        .await;
        let east = uniform_scene(
            &cube,
            (140.5, 141.0),
            (-36.0, -35.0),
            "2010-06-15T23:20:00Z",
            2,
        )
        .await;
        ingest_tile(&cube, 140, vec![west, east], 1).await;

        // the same region natively and in web mercator
        let native = QueryPlanner::new(cube.context.clone())
            .load(june_2010_query())
            .await
            .unwrap()
            .materialise(&QueryContext::default(), None)
            .await
            .unwrap();

        let project = |c: Coordinate2D| Transform::GeographicToWebMercator.apply(c).unwrap();
        let lower_left = project((140.2, -35.8).into());
        let upper_right = project((140.8, -35.2).into());
        let resolution = geocube_datatypes::primitives::SpatialResolution::new_unchecked(
            11_131.949_079,
            11_131.949_079,
        );

        let reprojected = QueryPlanner::new(cube.context.clone())
            .load(CubeQuery {
                x: RangeSelector::closed(lower_left.x, upper_right.x),
                y: RangeSelector::closed(lower_left.y, upper_right.y),
                time: TimeSelector::range(
                    "2010-06-01".parse().unwrap(),
                    "2010-06-30".parse().unwrap(),
                ),
                output: Some(OutputGeometry::reprojected(
                    SpatialReference::epsg_3857(),
                    resolution,
                )),
                ..CubeQuery::everything("LS5TM".into())
            })
            .await
            .unwrap()
            .materialise(&QueryContext::default(), None)
            .await
            .unwrap();

        // the array carries the requested reference system and resolution
        assert_eq!(
            reprojected.spatial_reference(),
            SpatialReference::epsg_3857()
        );
        float_cmp::assert_approx_eq!(
            f64,
            reprojected.output.resolution.x,
            resolution.x,
            epsilon = 1e-6
        );

        // values agree with the native load at corresponding coordinates
        for native_coordinate in [
            Coordinate2D::new(140.3, -35.5),
            Coordinate2D::new(140.7, -35.5),
        ] {
            let native_value = value_at(&native, 0, "B10", native_coordinate);
            let reprojected_value =
                value_at(&reprojected, 0, "B10", project(native_coordinate));
            assert_eq!(native_value, reprojected_value);
            assert!(native_value.is_some());
        }
    }

    #[tokio::test]
    async fn queries_resolve_to_the_latest_active_version() {
        let cube = test_cube().await;
        let first = uniform_scene(
            &cube,
            (140.0, 141.0),
            (-36.0, -35.0),
            "2010-06-15T23:10:00Z",
            1,
        )
        .await;
        let v1 = ingest_tile(&cube, 140, vec![first], 1).await;

        cube.catalogue.archive_storage_unit(v1.storage_unit).await.unwrap();
        let second = uniform_scene(
            &cube,
            (140.0, 141.0),
            (-36.0, -35.0),
            "2010-07-02T23:10:00Z",
            2,
        )
        .await;
        let v2 = ingest_tile(&cube, 140, vec![second], 2).await;

        let planner = QueryPlanner::new(cube.context.clone());
        let materialised = planner
            .load(june_2010_query())
            .await
            .unwrap()
            .materialise(&QueryContext::default(), None)
            .await
            .unwrap();
        assert_eq!(
            value_at(&materialised, 0, "B10", (140.5, -35.5).into()),
            Some(2.)
        );

        // archiving v2 and restoring v1 rolls the query back
        cube.catalogue.archive_storage_unit(v2.storage_unit).await.unwrap();
        cube.catalogue.restore_storage_unit(v1.storage_unit).await.unwrap();
        let materialised = planner
            .load(june_2010_query())
            .await
            .unwrap()
            .materialise(&QueryContext::default(), None)
            .await
            .unwrap();
        assert_eq!(
            value_at(&materialised, 0, "B10", (140.5, -35.5).into()),
            Some(1.)
        );

        // no tile file was deleted along the way
        assert!(cube.tile_store.contains(&v1.location));
        assert!(cube.tile_store.contains(&v2.location));
    }

    #[tokio::test]
    async fn empty_regions_load_empty_arrays() {
        let cube = test_cube().await;
        let array = QueryPlanner::new(cube.context.clone())
            .load(june_2010_query())
            .await
            .unwrap();
        assert!(array.is_empty());
        assert!(array.time_coordinates().is_empty());
    }

    #[tokio::test]
    async fn measurement_subsets_keep_the_declared_order() {
        let cube = test_cube().await;
        let scene = uniform_scene(
            &cube,
            (140.0, 141.0),
            (-36.0, -35.0),
            "2010-06-15T23:10:00Z",
            7,
        )
        .await;
        ingest_tile(&cube, 140, vec![scene], 1).await;
        let planner = QueryPlanner::new(cube.context.clone());

        let array = planner
            .load(CubeQuery {
                measurements: Some(vec!["B20".to_string()]),
                ..june_2010_query()
            })
            .await
            .unwrap();
        assert_eq!(array.measurements().len(), 1);
        assert_eq!(array.measurements()[0].tag.0, "B20");

        let unknown = planner
            .load(CubeQuery {
                measurements: Some(vec!["B99".to_string()]),
                ..june_2010_query()
            })
            .await;
        assert!(matches!(
            unknown.unwrap_err(),
            error::Error::UnknownMeasurement { .. }
        ));
    }

    #[tokio::test]
    async fn product_resolution_by_dataset_types() {
        let cube = test_cube().await;
        let planner = QueryPlanner::new(cube.context.clone());

        let resolved = planner
            .resolve_product(&ProductSelector::DatasetTypes(vec!["NBAR".into()]))
            .await
            .unwrap();
        assert_eq!(resolved.tag.0, "LS5TM");

        let unknown = planner
            .resolve_product(&ProductSelector::DatasetTypes(vec!["FC".into()]))
            .await;
        assert!(unknown.is_err());
    }

    #[tokio::test]
    async fn unreadable_tiles_are_skipped_on_request() {
        let cube = test_cube().await;
        let scene = uniform_scene(
            &cube,
            (140.0, 141.0),
            (-36.0, -35.0),
            "2010-06-15T23:10:00Z",
            7,
        )
        .await;
        let outcome = ingest_tile(&cube, 140, vec![scene], 1).await;

        // corrupt the stored object behind the catalogue's back
        cube.tile_store
            .write_bytes(&outcome.location, b"garbage".to_vec())
            .await
            .unwrap();

        let planner = QueryPlanner::new(cube.context.clone());
        let strict = planner
            .load(june_2010_query())
            .await
            .unwrap()
            .materialise(&QueryContext::default(), None)
            .await;
        assert!(matches!(
            strict.unwrap_err(),
            error::Error::ChecksumMismatch { .. }
        ));

        let lenient = planner
            .load(CubeQuery {
                skip_broken_datasets: true,
                ..june_2010_query()
            })
            .await
            .unwrap()
            .materialise(&QueryContext::default(), None)
            .await
            .unwrap();
        assert_eq!(
            value_at(&lenient, 0, "B10", (140.5, -35.5).into()),
            None,
            "the skipped tile contributes nothing"
        );
    }

    #[tokio::test]
    async fn url_signer_is_applied_to_every_location() {
        let cube = test_cube().await;
        let scene = uniform_scene(
            &cube,
            (140.0, 141.0),
            (-36.0, -35.0),
            "2010-06-15T23:10:00Z",
            7,
        )
        .await;
        ingest_tile(&cube, 140, vec![scene], 1).await;

        let invocations = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&invocations);
        let array = QueryPlanner::new(cube.context.clone())
            .load(CubeQuery {
                url_signer: Some(Arc::new(move |location: &str| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    location.to_string()
                })),
                ..june_2010_query()
            })
            .await
            .unwrap();

        assert_eq!(invocations.load(Ordering::SeqCst), 1);
        assert_eq!(array.groups()[0].tiles[0].location, array.groups()[0].tiles[0].record.location);
    }

    #[tokio::test]
    async fn dataset_predicates_filter_units_by_their_sources() {
        let cube = test_cube().await;
        let scene = uniform_scene(
            &cube,
            (140.0, 141.0),
            (-36.0, -35.0),
            "2010-06-15T23:10:00Z",
            7,
        )
        .await;
        ingest_tile(&cube, 140, vec![scene], 1).await;

        let array = QueryPlanner::new(cube.context.clone())
            .load(CubeQuery {
                dataset_predicate: Some(Arc::new(|dataset| {
                    dataset.location.starts_with("s3://")
                })),
                ..june_2010_query()
            })
            .await
            .unwrap();
        assert!(array.is_empty());
    }

    #[tokio::test]
    async fn materialising_a_region_subsets_the_grid() {
        let cube = test_cube().await;
        let scene = uniform_scene(
            &cube,
            (140.0, 141.0),
            (-36.0, -35.0),
            "2010-06-15T23:10:00Z",
            7,
        )
        .await;
        ingest_tile(&cube, 140, vec![scene], 1).await;

        let array = QueryPlanner::new(cube.context.clone())
            .load(june_2010_query())
            .await
            .unwrap();

        let region = geocube_datatypes::primitives::BoundingBox2D::new_unchecked(
            (140.3, -35.7).into(),
            (140.5, -35.5).into(),
        );
        let subset = array
            .materialise(&QueryContext::default(), Some(region))
            .await
            .unwrap();
        assert!(subset.output.shape.number_of_elements() < array.output().shape.number_of_elements());
        assert_eq!(
            value_at(&subset, 0, "B10", (140.4, -35.6).into()),
            Some(7.)
        );

        let outside = geocube_datatypes::primitives::BoundingBox2D::new_unchecked(
            (150., 10.).into(),
            (151., 11.).into(),
        );
        assert!(array
            .materialise(&QueryContext::default(), Some(outside))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn cancellation_aborts_materialisation() {
        let cube = test_cube().await;
        let scene = uniform_scene(
            &cube,
            (140.0, 141.0),
            (-36.0, -35.0),
            "2010-06-15T23:10:00Z",
            7,
        )
        .await;
        ingest_tile(&cube, 140, vec![scene], 1).await;

        let array = QueryPlanner::new(cube.context.clone())
            .load(june_2010_query())
            .await
            .unwrap();

        let ctx = QueryContext {
            cancellation: CancellationFlag::new(),
            ..QueryContext::default()
        };
        ctx.cancellation.cancel();
        assert!(matches!(
            array.materialise(&ctx, None).await.unwrap_err(),
            error::Error::Cancelled
        ));
    }

    #[tokio::test]
    async fn like_queries_reuse_an_existing_geometry() {
        let cube = test_cube().await;
        let scene = uniform_scene(
            &cube,
            (140.0, 141.0),
            (-36.0, -35.0),
            "2010-06-15T23:10:00Z",
            7,
        )
        .await;
        ingest_tile(&cube, 140, vec![scene], 1).await;
        let planner = QueryPlanner::new(cube.context.clone());

        let reference = planner.load(june_2010_query()).await.unwrap();
        let like = planner
            .load(CubeQuery {
                output: Some(OutputGeometry::like(&reference)),
                ..CubeQuery::everything("LS5TM".into())
            })
            .await
            .unwrap();

        assert_eq!(like.output(), reference.output());
    }
}
