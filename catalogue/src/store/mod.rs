mod in_memory;

pub use in_memory::InMemoryCatalogue;

use crate::descriptor::SourceDatasetDescriptor;
use crate::provenance::ProvenanceRecord;
use crate::query::{DatasetQuery, StorageUnitQuery};
use crate::schema::{
    DatasetRecord, DatasetType, Dimension, Domain, ObservationRecord, ReferenceSystem,
    StorageType, StorageUnitDimension, StorageUnitRecord, TileIndex,
};
use crate::util::Validated;
use crate::Result;
use async_trait::async_trait;
use geocube_datatypes::dataset::{
    DatasetId, ObservationId, StorageTypeTag, StorageUnitId,
};
use geocube_datatypes::primitives::{BoundingBox2D, TimeInstance};

/// Time source, passed explicitly so stores stay deterministic under test
pub trait Clock: Send + Sync {
    fn now(&self) -> TimeInstance;
}

/// Wall-clock time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> TimeInstance {
        TimeInstance::now()
    }
}

/// Options of `Catalogue::add_dataset`
#[derive(Debug, Clone, Copy, Default)]
pub struct AddDatasetOptions {
    /// Create the referenced observation from the descriptor when it is not
    /// catalogued yet, instead of failing with a lineage error
    pub auto_add_lineage: bool,
}

/// A storage unit registration: the tile row, its per-dimension records, its
/// source-dataset linkage and its provenance, committed atomically
#[derive(Debug, Clone)]
pub struct NewStorageUnit {
    pub storage_type: StorageTypeTag,
    pub tile_index: TileIndex,
    pub version: u32,
    pub location: String,
    pub md5: String,
    pub bytes: u64,
    pub footprint: BoundingBox2D,
    pub dimensions: Vec<StorageUnitDimension>,
    pub source_datasets: Vec<DatasetId>,
    pub provenance: ProvenanceRecord,
}

/// An open transaction. Nested transactions compose into the single outer
/// commit; rollbacks restore all rows affected since the corresponding
/// `begin`.
#[async_trait]
pub trait CatalogueTransaction: Send {
    async fn begin_nested(&mut self) -> Result<()>;
    async fn commit_nested(&mut self) -> Result<()>;
    async fn rollback_nested(&mut self) -> Result<()>;

    /// Commits everything since `begin_transaction`
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Restores the state at `begin_transaction`
    async fn rollback(self: Box<Self>) -> Result<()>;
}

/// The single source of truth for all cube entities.
///
/// Implementations are the seam for a database-backed catalogue; the
/// in-memory implementation in this crate is the reference.
#[async_trait]
pub trait Catalogue: Send + Sync {
    // -- schema registries ---------------------------------------------------

    async fn register_dimension(&self, dimension: Dimension) -> Result<()>;
    async fn register_domain(&self, domain: Domain) -> Result<()>;
    async fn register_reference_system(&self, reference_system: ReferenceSystem) -> Result<()>;

    /// Registers a storage type, rejecting declarations that violate the
    /// schema invariants
    async fn register_storage_type(&self, declaration: Validated<StorageType>) -> Result<()>;
    async fn storage_type(&self, tag: &StorageTypeTag) -> Result<StorageType>;
    async fn storage_types(&self) -> Result<Vec<StorageType>>;

    async fn register_dataset_type(&self, dataset_type: DatasetType) -> Result<()>;
    async fn dataset_type(&self, tag: &str) -> Result<DatasetType>;

    // -- observations and datasets ------------------------------------------

    async fn add_observation(&self, observation: ObservationRecord) -> Result<ObservationId>;
    async fn observation(&self, id: ObservationId) -> Result<ObservationRecord>;

    /// Records a dataset descriptor; idempotent by `(dataset_type, id)`.
    /// Fails with a lineage error when the referenced observation is missing,
    /// unless `auto_add_lineage` is set.
    async fn add_dataset(
        &self,
        descriptor: Validated<SourceDatasetDescriptor>,
        options: AddDatasetOptions,
    ) -> Result<DatasetId>;
    async fn dataset(&self, id: DatasetId) -> Result<DatasetRecord>;

    /// All datasets matching the conjunction of the query's constraints, in
    /// a single pass over the spatial index
    async fn find_datasets(&self, query: &DatasetQuery) -> Result<Vec<DatasetRecord>>;

    // -- storage units -------------------------------------------------------

    async fn find_storage_units(
        &self,
        query: &StorageUnitQuery,
    ) -> Result<Vec<StorageUnitRecord>>;
    async fn storage_unit(&self, id: StorageUnitId) -> Result<StorageUnitRecord>;

    /// Registers a storage unit atomically: either the unit row, its
    /// dimension rows, its dataset linkage and its provenance all appear, or
    /// none do
    async fn record_storage_unit(&self, unit: NewStorageUnit) -> Result<StorageUnitId>;

    /// Source datasets and fusion details of a unit, answered from the
    /// relational linkage without opening the tile file
    async fn provenance(&self, unit: StorageUnitId) -> Result<ProvenanceRecord>;
    async fn unit_sources(&self, unit: StorageUnitId) -> Result<Vec<DatasetId>>;

    async fn archive_storage_unit(&self, unit: StorageUnitId) -> Result<()>;
    async fn restore_storage_unit(&self, unit: StorageUnitId) -> Result<()>;
    async fn forget_storage_unit(&self, unit: StorageUnitId) -> Result<()>;

    /// Rebuilds the spatial index tables from the footprint data
    async fn refresh_spatial_indices(&self) -> Result<()>;

    // -- transactions --------------------------------------------------------

    /// Opens a transaction. Transactions are serialisable with respect to
    /// each other.
    async fn begin_transaction(&self) -> Result<Box<dyn CatalogueTransaction>>;
}
