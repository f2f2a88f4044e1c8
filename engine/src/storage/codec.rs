//! The byte layout of a tile container: a magic, a JSON header and one
//! length-prefixed row-chunk sequence per measurement.

use super::{TileData, TileFileHeader};
use crate::error;
use crate::typed_grid::TypedGrid;
use crate::Result;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Cursor, Read};

const MAGIC: &[u8; 4] = b"GCUB";
const LAYOUT_VERSION: u8 = 1;

pub fn encode(tile: &TileData) -> Result<Vec<u8>> {
    let header_json = serde_json::to_vec(&tile.header)?;

    let mut out = Vec::new();
    out.extend_from_slice(MAGIC);
    out.push(LAYOUT_VERSION);
    out.write_u32::<LittleEndian>(header_json.len() as u32)
        .expect("vec write");
    out.extend_from_slice(&header_json);

    for (variable, (tag, grid)) in tile.header.measurements.iter().zip(&tile.bands) {
        debug_assert_eq!(&variable.tag, tag);
        let shape = grid.shape();
        let row_bytes = shape.axis_size_x() * grid.data_type().byte_size();
        let chunk_rows = variable.chunk_rows.clamp(1, shape.axis_size_y().max(1));
        let bytes = grid.to_le_bytes();

        let chunks: Vec<&[u8]> = bytes.chunks((chunk_rows * row_bytes).max(1)).collect();
        out.write_u32::<LittleEndian>(chunks.len() as u32)
            .expect("vec write");
        for chunk in chunks {
            out.write_u32::<LittleEndian>(chunk.len() as u32)
                .expect("vec write");
            out.extend_from_slice(chunk);
        }
    }

    Ok(out)
}

pub fn decode(location: &str, bytes: &[u8]) -> Result<TileData> {
    let unreadable = |reason: &str| error::Error::TileUnreadable {
        location: location.to_string(),
        reason: reason.to_string(),
    };

    let mut cursor = Cursor::new(bytes);

    let mut magic = [0_u8; 4];
    cursor
        .read_exact(&mut magic)
        .map_err(|_| unreadable("truncated magic"))?;
    if &magic != MAGIC {
        return Err(unreadable("not a tile container"));
    }
    let layout_version = cursor
        .read_u8()
        .map_err(|_| unreadable("truncated layout version"))?;
    if layout_version != LAYOUT_VERSION {
        return Err(unreadable("unsupported layout version"));
    }

    let header_len = cursor
        .read_u32::<LittleEndian>()
        .map_err(|_| unreadable("truncated header length"))? as usize;
    let mut header_json = vec![0_u8; header_len];
    cursor
        .read_exact(&mut header_json)
        .map_err(|_| unreadable("truncated header"))?;
    let header: TileFileHeader = serde_json::from_slice(&header_json)?;

    let mut bands = Vec::with_capacity(header.measurements.len());
    for variable in &header.measurements {
        let chunk_count = cursor
            .read_u32::<LittleEndian>()
            .map_err(|_| unreadable("truncated chunk count"))?;
        let mut payload = Vec::new();
        for _ in 0..chunk_count {
            let chunk_len = cursor
                .read_u32::<LittleEndian>()
                .map_err(|_| unreadable("truncated chunk length"))?
                as usize;
            let start = cursor.position() as usize;
            let end = start + chunk_len;
            if end > bytes.len() {
                return Err(unreadable("truncated chunk"));
            }
            payload.extend_from_slice(&bytes[start..end]);
            cursor.set_position(end as u64);
        }

        let grid = TypedGrid::from_le_bytes(
            variable.data_type,
            header.shape,
            variable.no_data_value,
            &payload,
        )?;
        bands.push((variable.tag.clone(), grid));
    }

    Ok(TileData { header, bands })
}
