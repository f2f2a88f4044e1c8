pub mod context;
pub mod error;
pub mod executor;
pub mod ingest;
pub mod query;
pub mod source;
pub mod storage;
pub mod tiling;
pub mod typed_grid;

pub use error::Error;

/// Result type of the engine crate
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Version stamp written into every tile's provenance
pub const INGESTOR_VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
pub(crate) mod test_support {
    //! A miniature cube shared by the ingest and query test suites: the
    //! LS5TM layout shrunk to 10x10-pixel tiles and two bands.

    use crate::context::CoreContext;
    use crate::executor::SingleThreadedExecutor;
    use crate::source::{InMemorySourceReader, SourceBand};
    use crate::storage::InMemoryTileStore;
    use crate::typed_grid::TypedGrid;
    use geocube_catalogue::schema::test_support::{
        ls5tm_storage_type, nbar_dataset_type, observation_of, scene_descriptor,
    };
    use geocube_catalogue::schema::StorageType;
    use geocube_catalogue::store::{AddDatasetOptions, Catalogue, InMemoryCatalogue};
    use geocube_catalogue::util::UserInput;
    use geocube_datatypes::dataset::DatasetId;
    use geocube_datatypes::primitives::TimeInstance;
    use geocube_datatypes::raster::{GeoTransform, Grid2D};
    use geocube_datatypes::spatial_reference::SpatialReference;
    use std::sync::Arc;

    /// The LS5TM layout at test size: one-degree tiles of 10x10 pixels,
    /// bands B10 and B20
    pub(crate) fn small_storage_type() -> StorageType {
        let mut storage_type = ls5tm_storage_type();
        for dimension in &mut storage_type.dimensions {
            if dimension.dimension != "time" {
                dimension.elements = 10;
                dimension.chunk_size = 5;
            }
        }
        storage_type.measurements.truncate(2);
        storage_type
    }

    pub(crate) struct TestCube {
        pub context: CoreContext,
        pub catalogue: Arc<InMemoryCatalogue>,
        pub tile_store: Arc<InMemoryTileStore>,
        pub source_reader: Arc<InMemorySourceReader>,
    }

    pub(crate) async fn test_cube() -> TestCube {
        let catalogue = Arc::new(InMemoryCatalogue::new());
        catalogue
            .register_storage_type(small_storage_type().validated().unwrap())
            .await
            .unwrap();
        let mut nbar = nbar_dataset_type();
        nbar.measurements.truncate(2);
        catalogue.register_dataset_type(nbar).await.unwrap();

        let tile_store = Arc::new(InMemoryTileStore::new());
        let source_reader = Arc::new(InMemorySourceReader::new());
        let context = CoreContext::new(
            Arc::clone(&catalogue) as Arc<dyn Catalogue>,
            Arc::clone(&tile_store) as Arc<dyn crate::storage::TileStore>,
            Arc::clone(&source_reader) as Arc<dyn crate::source::SourceBandReader>,
            Arc::new(SingleThreadedExecutor),
        );

        TestCube {
            context,
            catalogue,
            tile_store,
            source_reader,
        }
    }

    /// Catalogues a scene and registers uniform pixel grids for both bands.
    /// The grid covers the scene extent at a tenth-degree resolution.
    pub(crate) async fn uniform_scene(
        cube: &TestCube,
        lon: (f64, f64),
        lat: (f64, f64),
        start: &str,
        value: i16,
    ) -> DatasetId {
        let descriptor = scene_descriptor(
            lon,
            lat,
            start.parse::<TimeInstance>().unwrap(),
            start.parse::<TimeInstance>().unwrap(),
        );
        cube.catalogue
            .add_observation(observation_of(&descriptor))
            .await
            .unwrap();
        let id = cube
            .catalogue
            .add_dataset(
                descriptor.validated().unwrap(),
                AddDatasetOptions::default(),
            )
            .await
            .unwrap();

        let columns = ((lon.1 - lon.0) * 10.).round().max(1.) as usize;
        let rows = ((lat.1 - lat.0) * 10.).round().max(1.) as usize;
        let band = SourceBand {
            grid: TypedGrid::I16(
                Grid2D::new_filled([rows, columns].into(), value, Some(-999)),
            ),
            geo_transform: GeoTransform::new((lon.0, lat.1).into(), 0.1, -0.1),
            spatial_reference: SpatialReference::epsg_4326(),
        };
        cube.source_reader.add_band(id, "B10", band.clone());
        cube.source_reader.add_band(id, "B20", band);
        id
    }
}
