//! Projection of the selected row onto the dashboard map.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{Error, Record, Value};

/// Names of the record fields used to place and describe a map marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerFields {
    pub latitude: String,
    pub longitude: String,
    /// Shown as the marker's tooltip.
    pub label: String,
    /// Shown in the marker's popup.
    pub popup: String,
}

impl Default for MarkerFields {
    fn default() -> Self {
        Self {
            latitude: "location_lat".to_string(),
            longitude: "location_long".to_string(),
            label: "breed".to_string(),
            popup: "name".to_string(),
        }
    }
}

/// A single map marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerView {
    pub lat: f64,
    pub lon: f64,
    pub label: String,
    pub popup_heading: String,
    pub popup_text: String,
}

/// The map as a whole: a fixed viewport plus the optional marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    pub center: [f64; 2],
    pub zoom: u8,
    pub marker: Option<MarkerView>,
}

impl MapView {
    pub const CENTER: [f64; 2] = [30.75, -97.48];
    pub const ZOOM: u8 = 10;
}

impl From<Option<MarkerView>> for MapView {
    fn from(marker: Option<MarkerView>) -> Self {
        Self {
            center: Self::CENTER,
            zoom: Self::ZOOM,
            marker,
        }
    }
}

/// Project the selected row of `records` onto a map marker.
///
/// A missing or out-of-range selection falls back to the first row. Returns
/// `None` when there are no records, or when the chosen record has no
/// numeric latitude/longitude.
pub fn project(
    records: &[Record],
    selected: Option<usize>,
    fields: &MarkerFields,
) -> Option<MarkerView> {
    if records.is_empty() {
        return None;
    }
    let row = selected.filter(|&i| i < records.len()).unwrap_or(0);
    match marker_for(&records[row], row, fields) {
        Ok(marker) => Some(marker),
        Err(e) => {
            debug!("No marker for selection: {}", e);
            None
        }
    }
}

fn marker_for(record: &Record, row: usize, fields: &MarkerFields) -> Result<MarkerView, Error> {
    let coordinate = |field: &str| {
        record.get(field).and_then(Value::as_f64).ok_or_else(|| {
            Error::MalformedRecord(row, format!("missing or non-numeric \"{}\"", field))
        })
    };
    let lat = coordinate(&fields.latitude)?;
    let lon = coordinate(&fields.longitude)?;
    let text = |field: &str| record.get(field).map(ToString::to_string).unwrap_or_default();
    Ok(MarkerView {
        lat,
        lon,
        label: text(&fields.label),
        popup_heading: "Animal Name".to_string(),
        popup_text: text(&fields.popup),
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::into_records;
    use serde_json::json;

    fn records() -> Vec<Record> {
        into_records(Value::from(json!([
            {"breed": "Labrador", "name": "Biscuit", "location_lat": 30.6, "location_long": -97.4},
            {"breed": "Husky", "name": "Storm", "location_lat": 30.1, "location_long": -97.9},
            {"breed": "Beagle", "name": "Rex", "location_lat": "30.2", "location_long": -97.1},
            {"breed": "Poodle", "location_long": -97.0},
        ])))
        .unwrap()
    }

    #[test]
    fn empty_records_never_project() {
        let fields = MarkerFields::default();
        for selected in [None, Some(0), Some(3), Some(usize::MAX)] {
            assert_eq!(project(&[], selected, &fields), None);
        }
    }

    #[test]
    fn selects_requested_row() {
        let marker = project(&records(), Some(1), &MarkerFields::default()).unwrap();
        assert_eq!(marker.lat, 30.1);
        assert_eq!(marker.lon, -97.9);
        assert_eq!(marker.label, "Husky");
        assert_eq!(marker.popup_heading, "Animal Name");
        assert_eq!(marker.popup_text, "Storm");
    }

    #[test]
    fn out_of_range_selection_falls_back_to_first_row() {
        let records = records();
        let fields = MarkerFields::default();
        let first = project(&records, Some(0), &fields);
        assert!(first.is_some());
        assert_eq!(project(&records, None, &fields), first);
        assert_eq!(project(&records, Some(4), &fields), first);
        assert_eq!(project(&records, Some(usize::MAX), &fields), first);
    }

    #[test]
    fn unusable_coordinates_yield_no_marker() {
        let records = records();
        let fields = MarkerFields::default();
        // Latitude stored as text.
        assert_eq!(project(&records, Some(2), &fields), None);
        // Latitude missing.
        assert_eq!(project(&records, Some(3), &fields), None);
    }

    #[test]
    fn configurable_field_names() {
        let records = into_records(Value::from(json!({"lat": 1, "lon": 2, "title": "Spot"}))).unwrap();
        let fields = MarkerFields {
            latitude: "lat".to_string(),
            longitude: "lon".to_string(),
            label: "title".to_string(),
            popup: "description".to_string(),
        };
        let marker = project(&records, None, &fields).unwrap();
        assert_eq!((marker.lat, marker.lon), (1.0, 2.0));
        assert_eq!(marker.label, "Spot");
        assert_eq!(marker.popup_text, "");
    }

    #[test]
    fn repeated_projection_agrees() {
        let records = records();
        let fields = MarkerFields::default();
        assert_eq!(
            project(&records, Some(1), &fields),
            project(&records, Some(1), &fields)
        );
    }

    #[test]
    fn map_view_wraps_marker() {
        let map = MapView::from(project(&records(), None, &MarkerFields::default()));
        assert_eq!(map.center, [30.75, -97.48]);
        assert_eq!(map.zoom, 10);
        assert!(map.marker.is_some());
    }
}
