use super::TileStore;
use crate::error;
use crate::Result;
use async_trait::async_trait;
use geocube_catalogue::schema::TileIndex;
use geocube_datatypes::dataset::StorageTypeTag;
use std::collections::HashMap;
use std::sync::RwLock;

/// Tile storage in process memory, addressed with `mem://` URIs; the
/// reference store of the test suites
#[derive(Debug, Default)]
pub struct InMemoryTileStore {
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryTileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, location: &str) -> bool {
        self.objects
            .read()
            .expect("tile store lock poisoned")
            .contains_key(location)
    }

    pub fn len(&self) -> usize {
        self.objects.read().expect("tile store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl TileStore for InMemoryTileStore {
    fn location_for(
        &self,
        storage_type: &StorageTypeTag,
        tile_index: TileIndex,
        version: u32,
    ) -> String {
        format!(
            "mem://tiles/{}/{}_{}_{}_v{}.gcube",
            storage_type, tile_index.x, tile_index.y, tile_index.t, version
        )
    }

    async fn write_bytes(&self, location: &str, bytes: Vec<u8>) -> Result<()> {
        self.objects
            .write()
            .expect("tile store lock poisoned")
            .insert(location.to_string(), bytes);
        Ok(())
    }

    async fn read_bytes(&self, location: &str) -> Result<Vec<u8>> {
        self.objects
            .read()
            .expect("tile store lock poisoned")
            .get(location)
            .cloned()
            .ok_or_else(|| error::Error::TileUnreadable {
                location: location.to_string(),
                reason: "no such object".to_string(),
            })
    }

    async fn delete(&self, location: &str) -> Result<()> {
        self.objects
            .write()
            .expect("tile store lock poisoned")
            .remove(location)
            .map(|_| ())
            .ok_or_else(|| error::Error::Write {
                location: location.to_string(),
                reason: "no such object".to_string(),
            })
    }
}
