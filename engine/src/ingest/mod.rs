//! The tiler/ingestor: executes `(storage type, tile index)` tasks by
//! resampling source bands onto the tile grid, fusing with the existing tile
//! version, writing a new container version and registering it atomically.

mod fusion;

pub use fusion::{fusion_order, solar_day, FusionSource};

use crate::context::{CancellationFlag, CoreContext};
use crate::error;
use crate::source::SourceBand;
use crate::storage::{
    read_tile_verified, write_tile, CoordinateVariable, MeasurementVariable, TileData,
    TileFileHeader,
};
use crate::typed_grid::{warp_into, TypedGrid};
use crate::Result;
use futures::FutureExt;
use geocube_catalogue::provenance::{ProvenanceRecord, SkippedDataset};
use geocube_catalogue::query::StorageUnitQuery;
use geocube_catalogue::schema::{StorageType, StorageUnitDimension, TileIndex};
use geocube_catalogue::store::NewStorageUnit;
use geocube_datatypes::dataset::{DatasetId, StorageTypeTag, StorageUnitId};
use geocube_datatypes::primitives::SpatialBounded;
use geocube_datatypes::raster::TileInformation;
use std::time::Duration;

/// One unit of ingestion work
#[derive(Debug, Clone, PartialEq)]
pub struct IngestTask {
    pub storage_type: StorageTypeTag,
    pub tile_index: TileIndex,
    pub source_datasets: Vec<DatasetId>,
    pub version: u32,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IngestOptions {
    /// Swallow per-source read errors, retaining nodata in the offending
    /// cells and a skip record in the provenance
    pub skip_broken_datasets: bool,
    /// Per-task deadline; expiry surfaces as a retryable timeout error
    pub timeout: Option<Duration>,
}

/// A successfully registered tile
#[derive(Debug, Clone, PartialEq)]
pub struct IngestOutcome {
    pub storage_unit: StorageUnitId,
    pub location: String,
    pub version: u32,
    pub skipped_datasets: Vec<SkippedDataset>,
}

#[derive(Clone)]
pub struct Ingestor {
    context: CoreContext,
    options: IngestOptions,
}

impl Ingestor {
    pub fn new(context: CoreContext, options: IngestOptions) -> Self {
        Self { context, options }
    }

    /// Runs a batch of tile tasks on the context's executor. Tasks are
    /// shared-nothing; results come back in task order. Cancellation is
    /// honoured between tiles, never mid-write.
    pub async fn run(
        &self,
        tasks: Vec<IngestTask>,
        cancellation: &CancellationFlag,
    ) -> Vec<Result<IngestOutcome>> {
        let mut futures = Vec::with_capacity(tasks.len());
        let mut receivers = Vec::with_capacity(tasks.len());

        for task in tasks {
            let (sender, receiver) = tokio::sync::oneshot::channel();
            let ingestor = self.clone();
            let cancellation = cancellation.clone();
            futures.push(
                async move {
                    let result = if cancellation.is_cancelled() {
                        Err(error::Error::Cancelled)
                    } else {
                        ingestor.ingest_task(task).await
                    };
                    let _ = sender.send(result);
                }
                .boxed(),
            );
            receivers.push(receiver);
        }

        self.context.executor().run_all(futures).await;

        let mut outcomes = Vec::with_capacity(receivers.len());
        for receiver in receivers {
            outcomes.push(receiver.await.unwrap_or(Err(error::Error::TaskAborted)));
        }
        outcomes
    }

    /// Executes one tile task: reproject, fuse, write, register
    pub async fn ingest_task(&self, task: IngestTask) -> Result<IngestOutcome> {
        match self.options.timeout {
            None => self.ingest_task_inner(task).await,
            Some(deadline) => tokio::time::timeout(deadline, self.ingest_task_inner(task.clone()))
                .await
                .map_err(|_| error::Error::Timeout {
                    operation: format!("ingest of tile {}", task.tile_index),
                    millis: deadline.as_millis() as u64,
                })?,
        }
    }

    async fn ingest_task_inner(&self, task: IngestTask) -> Result<IngestOutcome> {
        let catalogue = self.context.catalogue();
        let storage_type = catalogue.storage_type(&task.storage_type).await?;
        let tile_information = storage_type.tile_information(&task.tile_index)?;
        let time = storage_type.tile_time_bounds(task.tile_index.t)?;

        tracing::info!(
            storage_type = %task.storage_type,
            tile = %task.tile_index,
            version = task.version,
            "ingesting tile"
        );

        // deterministic fusion order over the task's sources
        let mut sources = Vec::with_capacity(task.source_datasets.len());
        for &dataset_id in &task.source_datasets {
            let dataset = catalogue.dataset(dataset_id).await?;
            let observation = catalogue.observation(dataset.observation).await?;
            sources.push(FusionSource {
                dataset,
                observation,
            });
        }
        let sources = fusion_order(sources)?;

        // the current version, if any, is the fusion base
        let mut bands = match self.existing_tile(&task).await? {
            Some(existing) => storage_type
                .measurements
                .iter()
                .map(|measurement| {
                    existing.band(&measurement.tag.0).cloned().unwrap_or_else(|| {
                        TypedGrid::filled_with_no_data(
                            measurement.data_type,
                            tile_information.tile_size_in_pixels,
                            measurement.no_data_value,
                        )
                    })
                })
                .collect::<Vec<_>>(),
            None => storage_type
                .measurements
                .iter()
                .map(|measurement| {
                    TypedGrid::filled_with_no_data(
                        measurement.data_type,
                        tile_information.tile_size_in_pixels,
                        measurement.no_data_value,
                    )
                })
                .collect(),
        };

        // overlay the sources; a later source wins where it has data
        let mut skipped_datasets = Vec::new();
        let mut contributing = Vec::new();
        for source in &sources {
            match self.read_source_bands(source, &storage_type).await {
                Ok(source_bands) => {
                    for (band, measurement) in bands.iter_mut().zip(&storage_type.measurements) {
                        let Some(source_band) = source_bands
                            .iter()
                            .find(|(tag, _)| tag == &measurement.tag.0)
                            .map(|(_, b)| b)
                        else {
                            continue;
                        };
                        warp_into(
                            band,
                            tile_information.geo_transform,
                            storage_type.spatial_reference,
                            &source_band.grid,
                            source_band.geo_transform,
                            source_band.spatial_reference,
                            measurement.resampling_method,
                        )?;
                    }
                    contributing.push(source.dataset.id);
                }
                Err(read_error @ error::Error::Read { .. }) => {
                    if !self.options.skip_broken_datasets {
                        return Err(read_error);
                    }
                    tracing::warn!(
                        dataset = %source.dataset.id,
                        %read_error,
                        "skipping broken dataset"
                    );
                    skipped_datasets.push(SkippedDataset {
                        dataset: source.dataset.id,
                        reason: read_error.to_string(),
                    });
                }
                Err(other) => return Err(other),
            }
        }

        let provenance = ProvenanceRecord {
            fusion_order: contributing.clone(),
            skipped_datasets: skipped_datasets.clone(),
            resampling: storage_type
                .measurements
                .iter()
                .map(|m| (m.tag.clone(), m.resampling_method))
                .collect(),
            ingestor_version: crate::INGESTOR_VERSION.to_string(),
        };

        let tile = TileData {
            header: tile_header(
                &storage_type,
                &task,
                tile_information,
                time,
                provenance.clone(),
            )?,
            bands: storage_type
                .measurements
                .iter()
                .map(|m| m.tag.clone())
                .zip(bands)
                .collect(),
        };

        let location =
            self.context
                .tile_store()
                .location_for(&task.storage_type, task.tile_index, task.version);
        let written = write_tile(self.context.tile_store().as_ref(), &location, &tile).await?;

        // register atomically; a failed registration must not leave the file
        let transaction = catalogue.begin_transaction().await?;
        let registration = catalogue
            .record_storage_unit(NewStorageUnit {
                storage_type: task.storage_type.clone(),
                tile_index: task.tile_index,
                version: task.version,
                location: location.clone(),
                md5: written.md5,
                bytes: written.bytes,
                footprint: tile_information.spatial_bounds(),
                dimensions: unit_dimensions(&storage_type, &task)?,
                source_datasets: contributing,
                provenance,
            })
            .await;

        match registration {
            Ok(storage_unit) => {
                transaction.commit().await?;
                Ok(IngestOutcome {
                    storage_unit,
                    location,
                    version: task.version,
                    skipped_datasets,
                })
            }
            Err(catalogue_error) => {
                transaction.rollback().await?;
                if let Err(delete_error) =
                    self.context.tile_store().delete(&location).await
                {
                    tracing::error!(%location, %delete_error, "orphaned tile file");
                }
                Err(catalogue_error.into())
            }
        }
    }

    async fn existing_tile(&self, task: &IngestTask) -> Result<Option<TileData>> {
        let existing = self
            .context
            .catalogue()
            .find_storage_units(&StorageUnitQuery {
                storage_type: task.storage_type.clone(),
                tile_indices: Some(vec![task.tile_index]),
                spatial: None,
                time: None,
                include_archived: false,
                latest_only: true,
            })
            .await?;

        let Some(unit) = existing.into_iter().next() else {
            return Ok(None);
        };
        let tile = read_tile_verified(
            self.context.tile_store().as_ref(),
            &unit.location,
            &unit.md5,
        )
        .await?;
        Ok(Some(tile))
    }

    /// All bands of one source, read before any of them is written so a
    /// broken dataset never contributes partially
    async fn read_source_bands(
        &self,
        source: &FusionSource,
        storage_type: &StorageType,
    ) -> Result<Vec<(String, SourceBand)>> {
        let mut bands = Vec::with_capacity(storage_type.measurements.len());
        for measurement in &storage_type.measurements {
            let band = self
                .context
                .source_reader()
                .read_band(&source.dataset, measurement)
                .await?;
            bands.push((measurement.tag.0.clone(), band));
        }
        Ok(bands)
    }
}

fn tile_header(
    storage_type: &StorageType,
    task: &IngestTask,
    tile_information: TileInformation,
    time: geocube_datatypes::primitives::TimeInterval,
    provenance: ProvenanceRecord,
) -> Result<TileFileHeader> {
    let x_dimension = storage_type.x_dimension()?;
    let y_dimension = storage_type.y_dimension()?;
    let t_dimension = storage_type.time_dimension()?;

    let (x_min, _) = x_dimension.tile_range(task.tile_index.x)?;
    let (y_min, _) = y_dimension.tile_range(task.tile_index.y)?;
    let (t_min, _) = t_dimension.tile_range(task.tile_index.t)?;

    let centres = |min: f64, cell_size: f64, elements: usize| -> Vec<f64> {
        (0..elements)
            .map(|i| min + (i as f64 + 0.5) * cell_size)
            .collect()
    };

    let coordinates = vec![
        CoordinateVariable {
            name: t_dimension.dimension.clone(),
            values: vec![t_min],
            attributes: t_dimension.properties.clone(),
        },
        CoordinateVariable {
            name: y_dimension.dimension.clone(),
            values: centres(
                y_min,
                y_dimension.cell_size().unwrap_or(1.),
                y_dimension.elements,
            ),
            attributes: y_dimension.properties.clone(),
        },
        CoordinateVariable {
            name: x_dimension.dimension.clone(),
            values: centres(
                x_min,
                x_dimension.cell_size().unwrap_or(1.),
                x_dimension.elements,
            ),
            attributes: x_dimension.properties.clone(),
        },
    ];

    Ok(TileFileHeader {
        storage_type: storage_type.tag.clone(),
        tile_index: task.tile_index,
        version: task.version,
        spatial_reference: storage_type.spatial_reference,
        geo_transform: tile_information.geo_transform,
        shape: tile_information.tile_size_in_pixels,
        time,
        coordinates,
        measurements: storage_type
            .measurements
            .iter()
            .map(|m| MeasurementVariable {
                tag: m.tag.clone(),
                data_type: m.data_type,
                no_data_value: m.no_data_value,
                chunk_rows: y_dimension.chunk_size,
            })
            .collect(),
        provenance,
        global_attributes: storage_type.global_attributes.clone(),
    })
}

/// Per-dimension rows of the new unit, consistent with its tile index
fn unit_dimensions(
    storage_type: &StorageType,
    task: &IngestTask,
) -> Result<Vec<StorageUnitDimension>> {
    let mut rows = Vec::with_capacity(3);
    for (dimension, index) in [
        (storage_type.time_dimension()?, task.tile_index.t),
        (storage_type.y_dimension()?, task.tile_index.y),
        (storage_type.x_dimension()?, task.tile_index.x),
    ] {
        let (min_value, max_value) = dimension.tile_range(index)?;
        rows.push(StorageUnitDimension {
            dimension: dimension.dimension.clone(),
            index,
            min_value,
            max_value,
        });
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::read_tile;
    use crate::test_support::{test_cube, uniform_scene, TestCube};
    use crate::tiling::TileGridCalculator;
    use geocube_catalogue::store::Catalogue;

    const TILE: TileIndex = TileIndex {
        t: 2010,
        y: -36,
        x: 140,
    };

    fn task_for(sources: Vec<DatasetId>, version: u32) -> IngestTask {
        IngestTask {
            storage_type: "LS5TM".into(),
            tile_index: TILE,
            source_datasets: sources,
            version,
        }
    }

    fn ingestor(cube: &TestCube, options: IngestOptions) -> Ingestor {
        Ingestor::new(cube.context.clone(), options)
    }

    /// The value of band B10 at a coordinate of the tile
    fn b10_at(tile: &crate::storage::TileData, lon: f64, lat: f64) -> Option<f64> {
        let (y, x) = tile
            .header
            .geo_transform
            .coordinate_2d_to_grid_2d((lon, lat).into());
        tile.band("B10").unwrap().sample_f64(y, x)
    }

    #[tokio::test]
    async fn single_scene_becomes_one_tile_with_exact_dimension_rows() {
        let cube = test_cube().await;
        let scene = uniform_scene(
            &cube,
            (140.2, 141.0),
            (-35.9, -35.0),
            "2010-06-15T23:10:00Z",
            7,
        )
        .await;

        // the grid calculator produces exactly one task for the scene
        let calculator = TileGridCalculator::new(
            cube.catalogue.storage_type(&"LS5TM".into()).await.unwrap(),
        );
        let dataset = cube.catalogue.dataset(scene).await.unwrap();
        let specs = calculator.tiles_for_dataset(&dataset).unwrap();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].tile_index, TILE);

        let outcome = ingestor(&cube, IngestOptions::default())
            .ingest_task(task_for(vec![scene], 1))
            .await
            .unwrap();
        assert_eq!(outcome.version, 1);
        assert!(outcome.skipped_datasets.is_empty());
        assert!(cube.tile_store.contains(&outcome.location));

        // per-dimension rows match the declaration exactly
        let unit = cube
            .catalogue
            .storage_unit(outcome.storage_unit)
            .await
            .unwrap();
        let row = |name: &str| {
            unit.dimensions
                .iter()
                .find(|d| d.dimension == name)
                .unwrap()
                .clone()
        };
        assert_eq!(row("longitude").index, 140);
        assert_eq!((row("longitude").min_value, row("longitude").max_value), (140., 141.));
        assert_eq!(row("latitude").index, -36);
        assert_eq!((row("latitude").min_value, row("latitude").max_value), (-36., -35.));
        assert_eq!(row("time").index, 2010);
        assert_eq!(row("time").min_value, 40. * 31_557_600.);

        // pixels inside the scene carry data, pixels outside stay nodata
        let tile = read_tile(cube.tile_store.as_ref(), &outcome.location)
            .await
            .unwrap();
        assert_eq!(b10_at(&tile, 140.25, -35.85), Some(7.));
        assert_eq!(b10_at(&tile, 140.05, -35.05), None);

        // provenance is embedded in the file as well
        assert_eq!(tile.header.provenance.fusion_order, vec![scene]);
        assert_eq!(
            tile.header.provenance.ingestor_version,
            crate::INGESTOR_VERSION
        );
    }

    #[tokio::test]
    async fn overlapping_scenes_fuse_with_the_northern_scene_on_top() {
        let cube = test_cube().await;
        let southern = uniform_scene(
            &cube,
            (140.0, 141.0),
            (-36.0, -35.2),
            "2010-06-15T23:10:00Z",
            1,
        )
        .await;
        let northern = uniform_scene(
            &cube,
            (140.0, 141.0),
            (-35.8, -35.0),
            "2010-06-15T23:30:00Z",
            2,
        )
        .await;

        let outcome = ingestor(&cube, IngestOptions::default())
            .ingest_task(task_for(vec![northern, southern], 1))
            .await
            .unwrap();

        let tile = read_tile(cube.tile_store.as_ref(), &outcome.location)
            .await
            .unwrap();
        // southern-only strip
        assert_eq!(b10_at(&tile, 140.05, -35.95), Some(1.));
        // the overlap belongs to the northern scene
        assert_eq!(b10_at(&tile, 140.05, -35.55), Some(2.));
        // northern-only strip
        assert_eq!(b10_at(&tile, 140.05, -35.15), Some(2.));
    }

    #[tokio::test]
    async fn fusion_is_deterministic_over_input_order() {
        let build = |reversed: bool| async move {
            let cube = test_cube().await;
            let southern = uniform_scene(
                &cube,
                (140.0, 141.0),
                (-36.0, -35.2),
                "2010-06-15T23:10:00Z",
                1,
            )
            .await;
            let northern = uniform_scene(
                &cube,
                (140.0, 141.0),
                (-35.8, -35.0),
                "2010-06-15T23:30:00Z",
                2,
            )
            .await;
            let sources = if reversed {
                vec![southern, northern]
            } else {
                vec![northern, southern]
            };
            let outcome = ingestor(&cube, IngestOptions::default())
                .ingest_task(task_for(sources, 1))
                .await
                .unwrap();
            read_tile(cube.tile_store.as_ref(), &outcome.location)
                .await
                .unwrap()
        };

        let forwards = build(false).await;
        let backwards = build(true).await;
        assert_eq!(forwards.bands, backwards.bands);
    }

    #[tokio::test]
    async fn reingestion_bumps_the_version_and_keeps_old_files() {
        let cube = test_cube().await;
        let first = uniform_scene(
            &cube,
            (140.0, 141.0),
            (-36.0, -35.0),
            "2010-06-15T23:10:00Z",
            1,
        )
        .await;
        let ingestor = ingestor(&cube, IngestOptions::default());

        let v1 = ingestor
            .ingest_task(task_for(vec![first], 1))
            .await
            .unwrap();

        // new data over the same tile: the current version is the fusion base
        let second = uniform_scene(
            &cube,
            (140.0, 140.5),
            (-36.0, -35.0),
            "2010-07-02T23:10:00Z",
            2,
        )
        .await;
        let v2 = ingestor
            .ingest_task(task_for(vec![second], 2))
            .await
            .unwrap();
        assert_eq!(v2.version, 2);

        let tile = read_tile(cube.tile_store.as_ref(), &v2.location).await.unwrap();
        // the western half is overwritten, the eastern half shows the base
        assert_eq!(b10_at(&tile, 140.25, -35.5), Some(2.));
        assert_eq!(b10_at(&tile, 140.75, -35.5), Some(1.));

        // both versions remain on disk
        assert!(cube.tile_store.contains(&v1.location));
        assert!(cube.tile_store.contains(&v2.location));
    }

    #[tokio::test]
    async fn archived_versions_are_not_used_as_fusion_base() {
        let cube = test_cube().await;
        let first = uniform_scene(
            &cube,
            (140.0, 141.0),
            (-36.0, -35.0),
            "2010-06-15T23:10:00Z",
            1,
        )
        .await;
        let ingestor = ingestor(&cube, IngestOptions::default());

        let v1 = ingestor
            .ingest_task(task_for(vec![first], 1))
            .await
            .unwrap();
        cube.catalogue
            .archive_storage_unit(v1.storage_unit)
            .await
            .unwrap();

        let second = uniform_scene(
            &cube,
            (140.0, 140.5),
            (-36.0, -35.0),
            "2010-07-02T23:10:00Z",
            2,
        )
        .await;
        let v2 = ingestor
            .ingest_task(task_for(vec![second], 2))
            .await
            .unwrap();

        let tile = read_tile(cube.tile_store.as_ref(), &v2.location).await.unwrap();
        // the archived version did not leak into the new tile
        assert_eq!(b10_at(&tile, 140.75, -35.5), None);
    }

    #[tokio::test]
    async fn broken_sources_are_skipped_or_fatal() {
        // skip_broken_datasets = true: the readable scene survives, the skip
        // lands in the provenance
        let cube = test_cube().await;
        let readable = uniform_scene(
            &cube,
            (140.0, 140.5),
            (-36.0, -35.0),
            "2010-06-15T23:10:00Z",
            5,
        )
        .await;
        let broken = uniform_scene(
            &cube,
            (140.5, 141.0),
            (-36.0, -35.0),
            "2010-06-15T23:20:00Z",
            9,
        )
        .await;
        cube.source_reader.mark_broken(broken);

        let outcome = ingestor(
            &cube,
            IngestOptions {
                skip_broken_datasets: true,
                timeout: None,
            },
        )
        .ingest_task(task_for(vec![readable, broken], 1))
        .await
        .unwrap();

        assert_eq!(outcome.skipped_datasets.len(), 1);
        assert_eq!(outcome.skipped_datasets[0].dataset, broken);

        let tile = read_tile(cube.tile_store.as_ref(), &outcome.location)
            .await
            .unwrap();
        assert_eq!(b10_at(&tile, 140.25, -35.5), Some(5.));
        assert_eq!(b10_at(&tile, 140.75, -35.5), None);

        let provenance = cube
            .catalogue
            .provenance(outcome.storage_unit)
            .await
            .unwrap();
        assert_eq!(provenance.skipped_datasets.len(), 1);
        assert_eq!(provenance.fusion_order, vec![readable]);

        // skip_broken_datasets = false: the task fails and no file appears
        let cube = test_cube().await;
        let readable = uniform_scene(
            &cube,
            (140.0, 140.5),
            (-36.0, -35.0),
            "2010-06-15T23:10:00Z",
            5,
        )
        .await;
        let broken = uniform_scene(
            &cube,
            (140.5, 141.0),
            (-36.0, -35.0),
            "2010-06-15T23:20:00Z",
            9,
        )
        .await;
        cube.source_reader.mark_broken(broken);

        let result = ingestor(&cube, IngestOptions::default())
            .ingest_task(task_for(vec![readable, broken], 1))
            .await;
        assert!(matches!(result.unwrap_err(), error::Error::Read { .. }));
        assert!(cube.tile_store.is_empty());
    }

    #[tokio::test]
    async fn failed_registration_deletes_the_written_file() {
        let cube = test_cube().await;
        let scene = uniform_scene(
            &cube,
            (140.0, 141.0),
            (-36.0, -35.0),
            "2010-06-15T23:10:00Z",
            1,
        )
        .await;

        // version 5 is not an increment of anything
        let result = ingestor(&cube, IngestOptions::default())
            .ingest_task(task_for(vec![scene], 5))
            .await;

        assert!(matches!(
            result.unwrap_err(),
            error::Error::Catalogue { .. }
        ));
        assert!(cube.tile_store.is_empty());
        assert!(cube
            .catalogue
            .find_storage_units(&StorageUnitQuery::latest_active("LS5TM".into()))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn cancellation_is_honoured_between_tiles() {
        let cube = test_cube().await;
        let scene = uniform_scene(
            &cube,
            (140.0, 141.0),
            (-36.0, -35.0),
            "2010-06-15T23:10:00Z",
            1,
        )
        .await;

        let cancellation = CancellationFlag::new();
        cancellation.cancel();
        let outcomes = ingestor(&cube, IngestOptions::default())
            .run(vec![task_for(vec![scene], 1)], &cancellation)
            .await;

        assert_eq!(outcomes.len(), 1);
        assert!(matches!(
            outcomes[0].as_ref().unwrap_err(),
            error::Error::Cancelled
        ));
        assert!(cube.tile_store.is_empty());
    }

    #[tokio::test]
    async fn batches_run_on_the_executor() {
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

        let tasks = vec![
            task_for(vec![west], 1),
            IngestTask {
                storage_type: "LS5TM".into(),
                tile_index: TileIndex {
                    t: 2010,
                    y: -36,
                    x: 141,
                },
                source_datasets: vec![east],
                version: 1,
            },
        ];

        let outcomes = ingestor(&cube, IngestOptions::default())
            .run(tasks, &CancellationFlag::new())
            .await;
        assert!(outcomes.iter().all(Result::is_ok));
        assert_eq!(cube.tile_store.len(), 2);
    }
}
