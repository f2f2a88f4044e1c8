//! The deterministic fusion order that resolves conflicts when multiple
//! sources touch one tile: sources are overlaid by ascending solar day; for
//! scenes of the same solar day, the northern footprint centroid is placed
//! last and therefore on top, and identical centroid latitudes order by
//! ascending dataset id.

use crate::error;
use crate::Result;
use chrono::{FixedOffset, NaiveDate};
use geocube_catalogue::schema::{DatasetRecord, ObservationRecord};
use geocube_datatypes::primitives::{Coordinate2D, TimeInstance};

/// A source dataset together with its acquisition
#[derive(Debug, Clone, PartialEq)]
pub struct FusionSource {
    pub dataset: DatasetRecord,
    pub observation: ObservationRecord,
}

impl FusionSource {
    fn centroid(&self) -> Result<Coordinate2D> {
        self.dataset
            .spatial_bounds()
            .map(|bounds| bounds.center())
            .ok_or_else(|| error::Error::FusionConflict {
                reason: format!("dataset {} has no spatial footprint", self.dataset.id),
            })
    }
}

/// The local calendar date of `timestamp` at the given longitude. Longitude
/// converts to a UTC offset of four minutes per degree, so scenes whose UTC
/// timestamp straddles midnight still group into the day experienced at
/// their footprint.
pub fn solar_day(timestamp: TimeInstance, centroid_longitude: f64) -> Result<NaiveDate> {
    let offset_seconds = (centroid_longitude * 240.).round() as i32;
    let offset = FixedOffset::east_opt(offset_seconds).ok_or_else(|| {
        error::Error::FusionConflict {
            reason: format!("longitude {centroid_longitude} yields no valid UTC offset"),
        }
    })?;

    let utc = timestamp
        .as_utc_date_time()
        .ok_or_else(|| error::Error::FusionConflict {
            reason: format!("timestamp {} is outside the representable range", timestamp),
        })?;

    Ok(utc.with_timezone(&offset).date_naive())
}

/// Sorts sources into fusion order, bottom-most first. Given the same set of
/// sources in any input order, the result is identical.
pub fn fusion_order(mut sources: Vec<FusionSource>) -> Result<Vec<FusionSource>> {
    // precompute the keys so sort_by can stay infallible
    let mut keyed: Vec<(NaiveDate, f64, FusionSource)> = sources
        .drain(..)
        .map(|source| {
            let centroid = source.centroid()?;
            let day = solar_day(source.observation.start_datetime, centroid.x)?;
            Ok((day, centroid.y, source))
        })
        .collect::<Result<_>>()?;

    keyed.sort_by(|(day_a, lat_a, source_a), (day_b, lat_b, source_b)| {
        day_a
            .cmp(day_b)
            .then(lat_a.total_cmp(lat_b))
            .then(source_a.dataset.id.cmp(&source_b.dataset.id))
    });

    Ok(keyed.into_iter().map(|(_, _, source)| source).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geocube_catalogue::schema::test_support::{observation_of, scene_descriptor};
    use geocube_catalogue::schema::DatasetRecord;
    use geocube_datatypes::dataset::DatasetId;
    use uuid::Uuid;

    fn source(lat_center: f64, start: &str, id_byte: u8) -> FusionSource {
        let descriptor = scene_descriptor(
            (140.0, 141.0),
            (lat_center - 0.5, lat_center + 0.5),
            start.parse().unwrap(),
            start.parse().unwrap(),
        );
        let observation = observation_of(&descriptor);
        let mut dataset = DatasetRecord {
            id: DatasetId(Uuid::from_bytes([id_byte; 16])),
            dataset_type: descriptor.dataset_type,
            observation: descriptor.observation_id,
            location: descriptor.location,
            dimensions: descriptor.dimensions,
            metadata: serde_json::Value::Null,
        };
        dataset.location = format!("file:///scenes/{id_byte}");
        FusionSource {
            dataset,
            observation,
        }
    }

    #[test]
    fn northern_scene_is_placed_last_within_a_solar_day() {
        let southern = source(-35.1, "2010-06-15T23:10:00Z", 1);
        let northern = source(-34.9, "2010-06-15T23:30:00Z", 2);

        let order = fusion_order(vec![northern.clone(), southern.clone()]).unwrap();
        assert_eq!(order, vec![southern.clone(), northern.clone()]);

        // the input order does not matter
        let order = fusion_order(vec![southern.clone(), northern.clone()]).unwrap();
        assert_eq!(order, vec![southern, northern]);
    }

    #[test]
    fn different_solar_days_order_by_day() {
        let earlier = source(-34.0, "2010-06-14T01:00:00Z", 3);
        let later = source(-36.0, "2010-06-16T01:00:00Z", 4);
        let order = fusion_order(vec![later.clone(), earlier.clone()]).unwrap();
        assert_eq!(order, vec![earlier, later]);
    }

    #[test]
    fn identical_centroids_order_by_dataset_id() {
        let a = source(-35.0, "2010-06-15T23:10:00Z", 1);
        let b = source(-35.0, "2010-06-15T23:10:00Z", 9);
        let order = fusion_order(vec![b.clone(), a.clone()]).unwrap();
        assert_eq!(order, vec![a, b]);
    }

    #[test]
    fn midnight_straddlers_group_by_local_time() {
        // 23:30 UTC on the 15th at longitude 140.5 east is 08:52 local time
        // on the 16th
        let day = solar_day("2010-06-15T23:30:00Z".parse().unwrap(), 140.5).unwrap();
        assert_eq!(day, NaiveDate::from_ymd_opt(2010, 6, 16).unwrap());

        // the same instant far west remains on the 15th
        let day = solar_day("2010-06-15T23:30:00Z".parse().unwrap(), -140.5).unwrap();
        assert_eq!(day, NaiveDate::from_ymd_opt(2010, 6, 15).unwrap());
    }

    #[test]
    fn footprintless_sources_are_fusion_conflicts() {
        let mut broken = source(-35.0, "2010-06-15T23:10:00Z", 1);
        broken.dataset.dimensions.clear();
        assert!(matches!(
            fusion_order(vec![broken]).unwrap_err(),
            error::Error::FusionConflict { .. }
        ));
    }
}
