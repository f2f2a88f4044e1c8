use super::TileStore;
use crate::error;
use crate::Result;
use async_trait::async_trait;
use geocube_catalogue::schema::TileIndex;
use geocube_datatypes::dataset::StorageTypeTag;
use std::path::{Path, PathBuf};

/// Tile storage under a local directory, addressed with `file://` URIs
#[derive(Debug, Clone)]
pub struct FileTileStore {
    base_directory: PathBuf,
}

impl FileTileStore {
    pub fn new<P: Into<PathBuf>>(base_directory: P) -> Self {
        Self {
            base_directory: base_directory.into(),
        }
    }

    fn path_of(&self, location: &str) -> Result<PathBuf> {
        let path = location
            .strip_prefix("file://")
            .ok_or_else(|| error::Error::TileUnreadable {
                location: location.to_string(),
                reason: "this store only resolves file:// locations".to_string(),
            })?;
        Ok(Path::new(path).to_path_buf())
    }
}

#[async_trait]
impl TileStore for FileTileStore {
    fn location_for(
        &self,
        storage_type: &StorageTypeTag,
        tile_index: TileIndex,
        version: u32,
    ) -> String {
        let path = self
            .base_directory
            .join(storage_type.0.as_str())
            .join(format!(
                "{}_{}_{}_v{}.gcube",
                tile_index.x, tile_index.y, tile_index.t, version
            ));
        format!("file://{}", path.display())
    }

    async fn write_bytes(&self, location: &str, bytes: Vec<u8>) -> Result<()> {
        let path = self.path_of(location)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| error::Error::Write {
                    location: location.to_string(),
                    reason: e.to_string(),
                })?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| error::Error::Write {
                location: location.to_string(),
                reason: e.to_string(),
            })
    }

    async fn read_bytes(&self, location: &str) -> Result<Vec<u8>> {
        let path = self.path_of(location)?;
        tokio::fs::read(&path)
            .await
            .map_err(|e| error::Error::TileUnreadable {
                location: location.to_string(),
                reason: e.to_string(),
            })
    }

    async fn delete(&self, location: &str) -> Result<()> {
        let path = self.path_of(location)?;
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| error::Error::Write {
                location: location.to_string(),
                reason: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{read_tile, write_tile};
    use geocube_catalogue::schema::TileIndex;

    #[tokio::test]
    async fn tiles_survive_a_disk_round_trip() {
        let directory = tempfile::tempdir().unwrap();
        let store = FileTileStore::new(directory.path());
        let tile = crate::storage::test_support::a_tile();

        let location = store.location_for(
            &"LS5TM".into(),
            TileIndex {
                t: 2010,
                y: -36,
                x: 140,
            },
            1,
        );
        assert!(location.starts_with("file://"));
        assert!(location.ends_with("140_-36_2010_v1.gcube"));

        let written = write_tile(&store, &location, &tile).await.unwrap();
        assert!(written.bytes > 0);
        assert_eq!(read_tile(&store, &location).await.unwrap(), tile);

        store.delete(&location).await.unwrap();
        assert!(read_tile(&store, &location).await.is_err());
    }

    #[tokio::test]
    async fn foreign_schemes_are_rejected() {
        let store = FileTileStore::new("/tmp");
        assert!(matches!(
            store.read_bytes("s3://bucket/tile.gcube").await.unwrap_err(),
            error::Error::TileUnreadable { .. }
        ));
    }
}
