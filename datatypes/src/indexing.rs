use crate::error;
use crate::Result;
use serde::{Deserialize, Serialize};
use snafu::ensure;
use strum::{Display, EnumString, IntoStaticStr};

/// How indices along a dimension behave
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum IndexingType {
    /// Evenly spaced continuous values with origin and extent
    Regular,
    /// Arbitrarily spaced continuous values, bracketed by a boundary table
    Irregular,
    /// A discrete enumeration tied to a reference system
    Fixed,
}

/// One entry of a fixed dimension's enumeration, e.g. a spectral band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedIndexEntry {
    pub index: i64,
    pub tag: String,
    /// Preserved verbatim from the schema; not interpreted by the core
    pub indexing_value: Option<f64>,
}

/// The indexing rule of a single dimension, answering `coord -> index` and
/// `index -> (min, max)` queries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "indexingType")]
pub enum DimensionIndexer {
    #[serde(rename_all = "camelCase")]
    Regular { origin: f64, extent: f64 },
    #[serde(rename_all = "camelCase")]
    Irregular { boundaries: Vec<f64> },
    #[serde(rename_all = "camelCase")]
    Fixed { entries: Vec<FixedIndexEntry> },
}

impl DimensionIndexer {
    pub fn regular(origin: f64, extent: f64) -> Result<Self> {
        ensure!(
            extent > 0. && extent.is_finite(),
            error::InvalidDimensionExtent { extent }
        );
        Ok(Self::Regular { origin, extent })
    }

    pub fn irregular(boundaries: Vec<f64>) -> Result<Self> {
        ensure!(
            boundaries.len() >= 2 && boundaries.windows(2).all(|w| w[0] < w[1]),
            error::InvalidIrregularBoundaries
        );
        Ok(Self::Irregular { boundaries })
    }

    pub fn fixed(entries: Vec<FixedIndexEntry>) -> Self {
        Self::Fixed { entries }
    }

    pub fn indexing_type(&self) -> IndexingType {
        match self {
            Self::Regular { .. } => IndexingType::Regular,
            Self::Irregular { .. } => IndexingType::Irregular,
            Self::Fixed { .. } => IndexingType::Fixed,
        }
    }

    /// Maps a coordinate value to its index along the dimension.
    ///
    /// Regular dimensions use `floor((value - origin) / extent)`, irregular
    /// dimensions bracket-search their boundary table, and fixed dimensions
    /// look the value up in the enumeration, failing with `UnknownIndex` if
    /// it is missing.
    pub fn coord_to_index(&self, value: f64) -> Result<i64> {
        match self {
            Self::Regular { origin, extent } => {
                Ok(((value - origin) / extent).floor() as i64)
            }
            Self::Irregular { boundaries } => {
                ensure!(
                    value >= boundaries[0] && value <= *boundaries.last().expect("len >= 2"),
                    error::ValueOutsideIndexingTable { value }
                );
                // the upper boundary belongs to the last bracket
                let bracket = match boundaries
                    .binary_search_by(|b| b.partial_cmp(&value).expect("boundaries are finite"))
                {
                    Ok(i) => i.min(boundaries.len() - 2),
                    Err(i) => i - 1,
                };
                Ok(bracket as i64)
            }
            Self::Fixed { entries } => entries
                .iter()
                .find(|e| e.indexing_value == Some(value) || e.index as f64 == value)
                .map(|e| e.index)
                .ok_or(error::Error::UnknownIndex {
                    index: value as i64,
                }),
        }
    }

    /// Maps a tag to its index along a fixed dimension
    pub fn tag_to_index(&self, tag: &str) -> Result<i64> {
        match self {
            Self::Fixed { entries } => entries
                .iter()
                .find(|e| e.tag == tag)
                .map(|e| e.index)
                .ok_or_else(|| error::Error::UnknownIndexTag { tag: tag.into() }),
            Self::Regular { .. } | Self::Irregular { .. } => {
                Err(error::Error::UnknownIndexTag { tag: tag.into() })
            }
        }
    }

    /// The value range covered by `index`; for fixed dimensions
    /// `min == max == index`
    pub fn index_to_range(&self, index: i64) -> Result<(f64, f64)> {
        match self {
            Self::Regular { origin, extent } => {
                let min = origin + index as f64 * extent;
                Ok((min, min + extent))
            }
            Self::Irregular { boundaries } => {
                ensure!(
                    index >= 0 && (index as usize) < boundaries.len() - 1,
                    error::UnknownIndex { index }
                );
                Ok((boundaries[index as usize], boundaries[index as usize + 1]))
            }
            Self::Fixed { entries } => {
                ensure!(
                    entries.iter().any(|e| e.index == index),
                    error::UnknownIndex { index }
                );
                Ok((index as f64, index as f64))
            }
        }
    }

    /// All indices whose ranges intersect `[min, max]`. A range that only
    /// grazes the far boundary of a bracket produces no index for the
    /// adjacent bracket.
    pub fn indices_intersecting(&self, min: f64, max: f64) -> Result<Vec<i64>> {
        debug_assert!(min <= max);
        match self {
            Self::Regular { .. } | Self::Irregular { .. } => {
                let first = self.coord_to_index(min)?;
                let mut last = self.coord_to_index(max)?;
                if last > first {
                    let (range_min, _) = self.index_to_range(last)?;
                    if range_min == max {
                        last -= 1;
                    }
                }
                Ok((first..=last).collect())
            }
            Self::Fixed { entries } => Ok(entries
                .iter()
                .map(|e| e.index)
                .filter(|&i| i as f64 >= min && i as f64 <= max)
                .collect()),
        }
    }
}
