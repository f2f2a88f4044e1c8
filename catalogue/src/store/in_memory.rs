use super::{
    AddDatasetOptions, Catalogue, CatalogueTransaction, Clock, NewStorageUnit, SystemClock,
};
use crate::descriptor::SourceDatasetDescriptor;
use crate::error;
use crate::provenance::ProvenanceRecord;
use crate::query::{DatasetQuery, StorageUnitQuery};
use crate::schema::{
    DatasetRecord, DatasetType, Dimension, Domain, ObservationRecord, ReferenceSystem,
    StorageType, StorageUnitRecord, StorageUnitStatus, TileIndex,
};
use crate::util::Validated;
use crate::Result;
use async_trait::async_trait;
use geocube_datatypes::dataset::{DatasetId, ObservationId, StorageTypeTag, StorageUnitId};
use geocube_datatypes::indexing::IndexingType;
use geocube_datatypes::primitives::{BoundingBox2D, TimeInterval};
use geocube_datatypes::util::Identifier;
use rstar::{RTree, RTreeObject, AABB};
use snafu::ensure;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::{Mutex, OwnedMutexGuard};

/// A footprint in the spatial index, pointing back at its row
#[derive(Debug, Clone)]
struct FootprintEntry<Id> {
    id: Id,
    lower: [f64; 2],
    upper: [f64; 2],
}

impl<Id> FootprintEntry<Id> {
    fn new(id: Id, bounds: BoundingBox2D) -> Self {
        Self {
            id,
            lower: [bounds.lower_left().x, bounds.lower_left().y],
            upper: [bounds.upper_right().x, bounds.upper_right().y],
        }
    }
}

impl<Id> RTreeObject for FootprintEntry<Id> {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.lower, self.upper)
    }
}

fn bbox_envelope(bounds: BoundingBox2D) -> AABB<[f64; 2]> {
    AABB::from_corners(
        [bounds.lower_left().x, bounds.lower_left().y],
        [bounds.upper_right().x, bounds.upper_right().y],
    )
}

/// Inclusive intersection with a dimension extent given in seconds
fn time_matches(interval: TimeInterval, min_seconds: f64, max_seconds: f64) -> bool {
    let query_min = interval.start().inner() as f64 / 1000.;
    let query_max = interval.end().inner() as f64 / 1000.;
    max_seconds >= query_min && min_seconds <= query_max
}

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-6 * 1f64.max(a.abs()).max(b.abs())
}

#[derive(Clone, Default)]
struct CatalogueState {
    dimensions: BTreeMap<String, Dimension>,
    domains: BTreeMap<String, Domain>,
    reference_systems: BTreeMap<String, ReferenceSystem>,
    dataset_types: BTreeMap<String, DatasetType>,
    storage_types: BTreeMap<String, StorageType>,
    observations: BTreeMap<ObservationId, ObservationRecord>,
    datasets: BTreeMap<DatasetId, DatasetRecord>,
    storage_units: BTreeMap<StorageUnitId, StorageUnitRecord>,
    /// Version history per logical tile, oldest first
    unit_versions: BTreeMap<(StorageTypeTag, TileIndex), Vec<StorageUnitId>>,
    unit_sources: BTreeMap<StorageUnitId, Vec<DatasetId>>,
    provenance: BTreeMap<StorageUnitId, ProvenanceRecord>,
    locations: BTreeSet<String>,
    dataset_index: RTree<FootprintEntry<DatasetId>>,
    unit_index: RTree<FootprintEntry<StorageUnitId>>,
}

impl CatalogueState {
    /// Seeds the well-known dimensions, domains and reference systems the
    /// default storage types build on
    fn bootstrap() -> Self {
        let mut state = Self::default();

        for (name, tag) in [
            ("longitude", "X"),
            ("latitude", "Y"),
            ("time", "T"),
            ("spectral", "S"),
            ("height", "Z"),
        ] {
            state.dimensions.insert(
                name.to_string(),
                Dimension {
                    name: name.to_string(),
                    tag: tag.to_string(),
                },
            );
        }

        for (name, tag, dimensions) in [
            ("spatial XY", "spatialXY", vec!["longitude", "latitude"]),
            ("temporal", "temporal", vec!["time"]),
            ("spectral", "spectral", vec!["spectral"]),
            ("spatial Z", "spatialZ", vec!["height"]),
            (
                "spatial XYZ",
                "spatialXYZ",
                vec!["longitude", "latitude", "height"],
            ),
        ] {
            state.domains.insert(
                tag.to_string(),
                Domain {
                    name: name.to_string(),
                    tag: tag.to_string(),
                    dimensions: dimensions.into_iter().map(String::from).collect(),
                },
            );
        }

        for (name, unit, definition, tag, index_origin) in [
            ("WGS 84", "degree", "EPSG:4326", "EPSG:4326", 0),
            ("WGS 84 / Pseudo-Mercator", "metre", "EPSG:3857", "EPSG:3857", 0),
            (
                "seconds since epoch",
                "second",
                "seconds since 1970-01-01 00:00:00",
                "secondsSinceEpoch",
                0,
            ),
            ("calendar year", "year", "calendar year CE", "calendarYear", 1970),
            ("whole degrees", "degree", "whole degrees", "wholeDegrees", 0),
            ("band enumeration", "band", "band number", "bandEnumeration", 0),
        ] {
            state.reference_systems.insert(
                tag.to_string(),
                ReferenceSystem {
                    name: name.to_string(),
                    unit: unit.to_string(),
                    definition: definition.to_string(),
                    tag: tag.to_string(),
                    index_origin,
                },
            );
        }

        state
    }

    fn latest_version(&self, storage_type: &StorageTypeTag, tile_index: TileIndex) -> Option<u32> {
        self.unit_versions
            .get(&(storage_type.clone(), tile_index))
            .and_then(|ids| ids.last())
            .and_then(|id| self.storage_units.get(id))
            .map(|unit| unit.version)
    }
}

/// The reference catalogue: all rows in process memory, guarded by a single
/// reader-writer lock. Writes that span multiple tables take the write guard
/// once, which is what makes them atomic with respect to observers.
pub struct InMemoryCatalogue {
    state: Arc<RwLock<CatalogueState>>,
    transaction_lock: Arc<Mutex<()>>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryCatalogue {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCatalogue {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(RwLock::new(CatalogueState::bootstrap())),
            transaction_lock: Arc::new(Mutex::new(())),
            clock,
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, CatalogueState> {
        self.state.read().expect("catalogue lock poisoned")
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, CatalogueState> {
        self.state.write().expect("catalogue lock poisoned")
    }

    fn validate_storage_type_references(
        state: &CatalogueState,
        declaration: &StorageType,
    ) -> Result<()> {
        for dimension in &declaration.dimensions {
            ensure!(
                state.dimensions.contains_key(&dimension.dimension),
                error::Schema {
                    reason: format!("dimension `{}` is not catalogued", dimension.dimension)
                }
            );
            let domain = state.domains.get(&dimension.domain).ok_or_else(|| {
                error::Error::Schema {
                    reason: format!("domain `{}` is not catalogued", dimension.domain),
                }
            })?;
            ensure!(
                domain.dimensions.contains(&dimension.dimension),
                error::Schema {
                    reason: format!(
                        "dimension `{}` does not belong to domain `{}`",
                        dimension.dimension, dimension.domain
                    )
                }
            );
            for reference_system in [
                &dimension.reference_system,
                &dimension.index_reference_system,
            ] {
                ensure!(
                    state.reference_systems.contains_key(reference_system),
                    error::Schema {
                        reason: format!(
                            "reference system `{reference_system}` is not catalogued"
                        )
                    }
                );
            }
        }
        Ok(())
    }

    fn validate_unit_dimensions(
        storage_type: &StorageType,
        unit: &NewStorageUnit,
    ) -> Result<()> {
        for record in &unit.dimensions {
            let Some(dimension) = storage_type.dimension(&record.dimension) else {
                return Err(error::Error::Schema {
                    reason: format!(
                        "storage type `{}` declares no dimension `{}`",
                        storage_type.tag, record.dimension
                    ),
                });
            };

            let (expected_min, expected_max) = match dimension.indexing_type() {
                IndexingType::Regular | IndexingType::Irregular => {
                    dimension.tile_range(record.index)?
                }
                IndexingType::Fixed => (record.index as f64, record.index as f64),
            };

            ensure!(
                approx_eq(record.min_value, expected_min)
                    && approx_eq(record.max_value, expected_max),
                error::InconsistentUnitDimension {
                    dimension: record.dimension.clone(),
                    expected_min,
                    expected_max,
                    min: record.min_value,
                    max: record.max_value,
                }
            );
        }
        Ok(())
    }
}

#[async_trait]
impl Catalogue for InMemoryCatalogue {
    async fn register_dimension(&self, dimension: Dimension) -> Result<()> {
        let mut state = self.write_state();
        ensure!(
            !state.dimensions.contains_key(&dimension.name)
                && state.dimensions.values().all(|d| d.tag != dimension.tag),
            error::Conflict {
                reason: format!("dimension `{}`", dimension.name)
            }
        );
        state.dimensions.insert(dimension.name.clone(), dimension);
        Ok(())
    }

    async fn register_domain(&self, domain: Domain) -> Result<()> {
        let mut state = self.write_state();
        for dimension in &domain.dimensions {
            ensure!(
                state.dimensions.contains_key(dimension),
                error::Schema {
                    reason: format!(
                        "domain `{}` references unknown dimension `{dimension}`",
                        domain.tag
                    )
                }
            );
        }
        ensure!(
            !state.domains.contains_key(&domain.tag),
            error::Conflict {
                reason: format!("domain `{}`", domain.tag)
            }
        );
        state.domains.insert(domain.tag.clone(), domain);
        Ok(())
    }

    async fn register_reference_system(&self, reference_system: ReferenceSystem) -> Result<()> {
        let mut state = self.write_state();
        ensure!(
            !state.reference_systems.contains_key(&reference_system.tag),
            error::Conflict {
                reason: format!("reference system `{}`", reference_system.tag)
            }
        );
        state
            .reference_systems
            .insert(reference_system.tag.clone(), reference_system);
        Ok(())
    }

    async fn register_storage_type(&self, declaration: Validated<StorageType>) -> Result<()> {
        let declaration = declaration.user_input;
        let mut state = self.write_state();

        ensure!(
            !state.storage_types.contains_key(&declaration.tag.0),
            error::Schema {
                reason: format!("storage type tag `{}` is already registered", declaration.tag)
            }
        );
        Self::validate_storage_type_references(&state, &declaration)?;

        tracing::info!(storage_type = %declaration.tag, "registering storage type");
        state
            .storage_types
            .insert(declaration.tag.0.clone(), declaration);
        Ok(())
    }

    async fn storage_type(&self, tag: &StorageTypeTag) -> Result<StorageType> {
        self.read_state()
            .storage_types
            .get(&tag.0)
            .cloned()
            .ok_or_else(|| error::Error::UnknownStorageType { tag: tag.clone() })
    }

    async fn storage_types(&self) -> Result<Vec<StorageType>> {
        Ok(self.read_state().storage_types.values().cloned().collect())
    }

    async fn register_dataset_type(&self, dataset_type: DatasetType) -> Result<()> {
        let mut state = self.write_state();
        ensure!(
            !state.dataset_types.contains_key(&dataset_type.tag.0),
            error::Schema {
                reason: format!(
                    "dataset type tag `{}` is already registered",
                    dataset_type.tag
                )
            }
        );
        state
            .dataset_types
            .insert(dataset_type.tag.0.clone(), dataset_type);
        Ok(())
    }

    async fn dataset_type(&self, tag: &str) -> Result<DatasetType> {
        self.read_state()
            .dataset_types
            .get(tag)
            .cloned()
            .ok_or_else(|| error::Error::UnknownDatasetType { tag: tag.into() })
    }

    async fn add_observation(&self, observation: ObservationRecord) -> Result<ObservationId> {
        let mut state = self.write_state();
        let id = observation.id;
        ensure!(
            !state.observations.contains_key(&id),
            error::Conflict {
                reason: format!("observation {id}")
            }
        );
        state.observations.insert(id, observation);
        Ok(id)
    }

    async fn observation(&self, id: ObservationId) -> Result<ObservationRecord> {
        self.read_state()
            .observations
            .get(&id)
            .cloned()
            .ok_or(error::Error::UnknownObservation { observation: id })
    }

    async fn add_dataset(
        &self,
        descriptor: Validated<SourceDatasetDescriptor>,
        options: AddDatasetOptions,
    ) -> Result<DatasetId> {
        let descriptor = descriptor.user_input;
        let mut state = self.write_state();

        // idempotent by (dataset_type, id)
        if let Some(existing) = state.datasets.get(&descriptor.id) {
            ensure!(
                existing.dataset_type == descriptor.dataset_type,
                error::Conflict {
                    reason: format!(
                        "dataset {} already catalogued with type `{}`",
                        descriptor.id, existing.dataset_type
                    )
                }
            );
            return Ok(descriptor.id);
        }

        ensure!(
            state.dataset_types.contains_key(&descriptor.dataset_type.0),
            error::UnknownDatasetType {
                tag: descriptor.dataset_type.0.clone()
            }
        );

        if !state.observations.contains_key(&descriptor.observation_id) {
            ensure!(
                options.auto_add_lineage,
                error::LineageObservationMissing {
                    observation: descriptor.observation_id
                }
            );
            state.observations.insert(
                descriptor.observation_id,
                ObservationRecord {
                    id: descriptor.observation_id,
                    observation_type: descriptor.observation_type.clone(),
                    start_datetime: descriptor.start_datetime,
                    end_datetime: descriptor.end_datetime,
                    instrument: descriptor.instrument.clone(),
                    platform: descriptor.platform.clone(),
                },
            );
        }

        let record = DatasetRecord {
            id: descriptor.id,
            dataset_type: descriptor.dataset_type,
            observation: descriptor.observation_id,
            location: descriptor.location,
            dimensions: descriptor.dimensions,
            metadata: descriptor.metadata,
        };

        if let Some(bounds) = record.spatial_bounds() {
            state
                .dataset_index
                .insert(FootprintEntry::new(record.id, bounds));
        }
        let id = record.id;
        state.datasets.insert(id, record);
        tracing::debug!(dataset = %id, "catalogued dataset");
        Ok(id)
    }

    async fn dataset(&self, id: DatasetId) -> Result<DatasetRecord> {
        self.read_state()
            .datasets
            .get(&id)
            .cloned()
            .ok_or(error::Error::UnknownDataset { dataset: id })
    }

    async fn find_datasets(&self, query: &DatasetQuery) -> Result<Vec<DatasetRecord>> {
        let state = self.read_state();

        let candidates: Vec<&DatasetRecord> = match query.spatial {
            Some(bounds) => state
                .dataset_index
                .locate_in_envelope_intersecting(&bbox_envelope(bounds))
                .filter_map(|entry| state.datasets.get(&entry.id))
                .collect(),
            None => state.datasets.values().collect(),
        };

        let mut matches: Vec<DatasetRecord> = candidates
            .into_iter()
            .filter(|dataset| {
                query
                    .dataset_types
                    .as_ref()
                    .map_or(true, |types| types.contains(&dataset.dataset_type))
            })
            .filter(|dataset| {
                query
                    .observation
                    .map_or(true, |observation| dataset.observation == observation)
            })
            .filter(|dataset| {
                query.time.map_or(true, |interval| {
                    dataset.dimension("time").map_or(false, |d| {
                        time_matches(interval, d.min_value, d.max_value)
                    })
                })
            })
            .filter(|dataset| {
                query.dimension_ranges.iter().all(|range| {
                    dataset
                        .dimension(&range.dimension)
                        .map_or(false, |d| range.matches(d.min_value, d.max_value))
                })
            })
            .cloned()
            .collect();

        matches.sort_by_key(|dataset| dataset.id);
        Ok(matches)
    }

    async fn find_storage_units(
        &self,
        query: &StorageUnitQuery,
    ) -> Result<Vec<StorageUnitRecord>> {
        let state = self.read_state();

        let candidates: Vec<&StorageUnitRecord> = if let Some(indices) = &query.tile_indices {
            indices
                .iter()
                .filter_map(|index| {
                    state
                        .unit_versions
                        .get(&(query.storage_type.clone(), *index))
                })
                .flatten()
                .filter_map(|id| state.storage_units.get(id))
                .collect()
        } else if let Some(bounds) = query.spatial {
            state
                .unit_index
                .locate_in_envelope_intersecting(&bbox_envelope(bounds))
                .filter_map(|entry| state.storage_units.get(&entry.id))
                .collect()
        } else {
            state.storage_units.values().collect()
        };

        let mut matches: Vec<&StorageUnitRecord> = candidates
            .into_iter()
            .filter(|unit| unit.storage_type == query.storage_type)
            .filter(|unit| match unit.status {
                StorageUnitStatus::Active => true,
                StorageUnitStatus::Archived => query.include_archived,
                StorageUnitStatus::Forgotten => false,
            })
            .filter(|unit| {
                query.time.map_or(true, |interval| {
                    unit.dimensions
                        .iter()
                        .find(|d| d.dimension == "time")
                        .map_or(true, |d| time_matches(interval, d.min_value, d.max_value))
                })
            })
            .collect();

        if query.latest_only {
            let mut latest: BTreeMap<TileIndex, &StorageUnitRecord> = BTreeMap::new();
            for unit in matches {
                match latest.get(&unit.tile_index) {
                    Some(existing) if existing.version >= unit.version => {}
                    _ => {
                        latest.insert(unit.tile_index, unit);
                    }
                }
            }
            matches = latest.into_values().collect();
        }

        matches.sort_by_key(|unit| (unit.tile_index, unit.version));
        Ok(matches.into_iter().cloned().collect())
    }

    async fn storage_unit(&self, id: StorageUnitId) -> Result<StorageUnitRecord> {
        self.read_state()
            .storage_units
            .get(&id)
            .cloned()
            .ok_or(error::Error::UnknownStorageUnit { unit: id })
    }

    async fn record_storage_unit(&self, unit: NewStorageUnit) -> Result<StorageUnitId> {
        let mut state = self.write_state();

        let storage_type = state
            .storage_types
            .get(&unit.storage_type.0)
            .cloned()
            .ok_or_else(|| error::Error::UnknownStorageType {
                tag: unit.storage_type.clone(),
            })?;

        ensure!(!unit.source_datasets.is_empty(), error::LineageEmpty);
        for dataset in &unit.source_datasets {
            ensure!(
                state.datasets.contains_key(dataset),
                error::LineageDatasetMissing { dataset: *dataset }
            );
        }

        ensure!(
            !state.locations.contains(&unit.location),
            error::Conflict {
                reason: format!("storage location `{}`", unit.location)
            }
        );

        let latest = state.latest_version(&unit.storage_type, unit.tile_index);
        let expected = latest.map_or(1, |v| v + 1);
        ensure!(
            unit.version == expected,
            error::VersionNotMonotonic {
                version: unit.version,
                latest: latest.unwrap_or(0)
            }
        );

        Self::validate_unit_dimensions(&storage_type, &unit)?;

        // all checks passed; insert every row under the same write guard
        let id = StorageUnitId::new();
        let record = StorageUnitRecord {
            id,
            storage_type: unit.storage_type.clone(),
            tile_index: unit.tile_index,
            version: unit.version,
            location: unit.location.clone(),
            md5: unit.md5,
            bytes: unit.bytes,
            footprint: unit.footprint,
            dimensions: unit.dimensions,
            status: StorageUnitStatus::Active,
            created: self.clock.now(),
        };

        state.locations.insert(unit.location);
        state
            .unit_versions
            .entry((unit.storage_type, unit.tile_index))
            .or_default()
            .push(id);
        state.unit_sources.insert(id, unit.source_datasets);
        state.provenance.insert(id, unit.provenance);
        state
            .unit_index
            .insert(FootprintEntry::new(id, record.footprint));
        state.storage_units.insert(id, record);

        tracing::info!(unit = %id, "recorded storage unit");
        Ok(id)
    }

    async fn provenance(&self, unit: StorageUnitId) -> Result<ProvenanceRecord> {
        self.read_state()
            .provenance
            .get(&unit)
            .cloned()
            .ok_or(error::Error::UnknownStorageUnit { unit })
    }

    async fn unit_sources(&self, unit: StorageUnitId) -> Result<Vec<DatasetId>> {
        self.read_state()
            .unit_sources
            .get(&unit)
            .cloned()
            .ok_or(error::Error::UnknownStorageUnit { unit })
    }

    async fn archive_storage_unit(&self, unit: StorageUnitId) -> Result<()> {
        let mut state = self.write_state();
        let record = state
            .storage_units
            .get_mut(&unit)
            .ok_or(error::Error::UnknownStorageUnit { unit })?;
        ensure!(
            record.status != StorageUnitStatus::Forgotten,
            error::StorageUnitForgotten { unit }
        );
        record.status = StorageUnitStatus::Archived;
        Ok(())
    }

    async fn restore_storage_unit(&self, unit: StorageUnitId) -> Result<()> {
        let mut state = self.write_state();
        let record = state
            .storage_units
            .get_mut(&unit)
            .ok_or(error::Error::UnknownStorageUnit { unit })?;
        ensure!(
            record.status != StorageUnitStatus::Forgotten,
            error::StorageUnitForgotten { unit }
        );
        record.status = StorageUnitStatus::Active;
        Ok(())
    }

    async fn forget_storage_unit(&self, unit: StorageUnitId) -> Result<()> {
        let mut state = self.write_state();
        let record = state
            .storage_units
            .get_mut(&unit)
            .ok_or(error::Error::UnknownStorageUnit { unit })?;
        record.status = StorageUnitStatus::Forgotten;
        Ok(())
    }

    async fn refresh_spatial_indices(&self) -> Result<()> {
        let mut state = self.write_state();

        let dataset_entries = state
            .datasets
            .values()
            .filter_map(|dataset| {
                dataset
                    .spatial_bounds()
                    .map(|bounds| FootprintEntry::new(dataset.id, bounds))
            })
            .collect();
        state.dataset_index = RTree::bulk_load(dataset_entries);

        let unit_entries = state
            .storage_units
            .values()
            .map(|unit| FootprintEntry::new(unit.id, unit.footprint))
            .collect();
        state.unit_index = RTree::bulk_load(unit_entries);

        Ok(())
    }

    async fn begin_transaction(&self) -> Result<Box<dyn CatalogueTransaction>> {
        let permit = Arc::clone(&self.transaction_lock).lock_owned().await;
        let snapshot = self.read_state().clone();
        Ok(Box::new(InMemoryTransaction {
            state: Arc::clone(&self.state),
            snapshots: vec![snapshot],
            closed: false,
            _permit: permit,
        }))
    }
}

/// Snapshot-based transaction over the in-memory store. Dropping an open
/// transaction rolls it back.
struct InMemoryTransaction {
    state: Arc<RwLock<CatalogueState>>,
    snapshots: Vec<CatalogueState>,
    closed: bool,
    _permit: OwnedMutexGuard<()>,
}

impl InMemoryTransaction {
    fn restore(&self, snapshot: CatalogueState) {
        *self.state.write().expect("catalogue lock poisoned") = snapshot;
    }
}

#[async_trait]
impl CatalogueTransaction for InMemoryTransaction {
    async fn begin_nested(&mut self) -> Result<()> {
        ensure!(!self.closed, error::TransactionClosed);
        let snapshot = self.state.read().expect("catalogue lock poisoned").clone();
        self.snapshots.push(snapshot);
        Ok(())
    }

    async fn commit_nested(&mut self) -> Result<()> {
        ensure!(self.snapshots.len() > 1, error::TransactionClosed);
        // the nested changes stay; they become part of the outer transaction
        self.snapshots.pop();
        Ok(())
    }

    async fn rollback_nested(&mut self) -> Result<()> {
        ensure!(self.snapshots.len() > 1, error::TransactionClosed);
        let snapshot = self.snapshots.pop().expect("len checked above");
        self.restore(snapshot);
        Ok(())
    }

    async fn commit(mut self: Box<Self>) -> Result<()> {
        ensure!(!self.closed, error::TransactionClosed);
        self.closed = true;
        self.snapshots.clear();
        Ok(())
    }

    async fn rollback(mut self: Box<Self>) -> Result<()> {
        ensure!(!self.closed, error::TransactionClosed);
        self.closed = true;
        let snapshot = self.snapshots.swap_remove(0);
        self.restore(snapshot);
        Ok(())
    }
}

impl Drop for InMemoryTransaction {
    fn drop(&mut self) {
        if !self.closed && !self.snapshots.is_empty() {
            let snapshot = self.snapshots.swap_remove(0);
            self.restore(snapshot);
        }
    }
}
