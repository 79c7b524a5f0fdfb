//! The image-mode payload.
//!
//! `EarthView` is one EPIC capture, decoded from the metadata endpoint.  The
//! endpoints return a JSON array ordered as the API sees fit; the first
//! element is the one the overlay shows.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

use crate::config::ARCHIVE_BASE;
use crate::error::FetchError;

/// Capture timestamps are published as naive UTC in this layout.
const EPIC_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Sub-spacecraft point at capture time.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Centroid {
    pub lat: f64,
    pub lon: f64,
}

/// A single EPIC capture.
#[derive(Debug, Clone, PartialEq)]
pub struct EarthView {
    /// EPIC identifier, e.g. `20240101003633`.
    pub identifier: String,
    /// Archive image name without extension.
    pub image: String,
    pub caption: String,
    pub captured_at: DateTime<Utc>,
    pub centroid: Option<Centroid>,
}

/// Wire shape of one metadata record.  Unknown fields are ignored.
#[derive(Debug, Deserialize)]
struct EpicRecord {
    identifier: String,
    image: String,
    #[serde(default)]
    caption: String,
    date: String,
    #[serde(default)]
    centroid_coordinates: Option<Centroid>,
}

impl EarthView {
    /// Decode a parsed response body.
    ///
    /// Anything that is not a non-empty array is `EmptyResult`; an array
    /// whose records do not decode is `Malformed`.
    pub fn from_body(body: &serde_json::Value) -> Result<Vec<EarthView>, FetchError> {
        match body.as_array() {
            Some(items) if !items.is_empty() => {}
            _ => return Err(FetchError::EmptyResult),
        }

        let records = Vec::<EpicRecord>::deserialize(body)
            .map_err(|e| FetchError::Malformed(e.to_string()))?;

        records.into_iter().map(EarthView::try_from).collect()
    }

    /// Full-resolution PNG in the public archive.
    pub fn image_url(&self) -> String {
        format!(
            "{ARCHIVE_BASE}/{}/png/{}.png",
            self.captured_at.format("%Y/%m/%d"),
            self.image
        )
    }
}

impl TryFrom<EpicRecord> for EarthView {
    type Error = FetchError;

    fn try_from(record: EpicRecord) -> Result<Self, Self::Error> {
        let captured_at = NaiveDateTime::parse_from_str(&record.date, EPIC_DATE_FORMAT)
            .map_err(|e| FetchError::Malformed(format!("bad date {:?}: {e}", record.date)))?
            .and_utc();

        Ok(EarthView {
            identifier: record.identifier,
            image: record.image,
            caption: record.caption,
            captured_at,
            centroid: record.centroid_coordinates,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    /// Shorthand constructor for tests.
    fn make_view(identifier: &str) -> EarthView {
        EarthView {
            identifier: identifier.to_string(),
            image: format!("epic_1b_{identifier}"),
            caption: "test".to_string(),
            captured_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 31, 45).unwrap(),
            centroid: None,
        }
    }

    #[test]
    fn decodes_epic_records() {
        let body = json!([
            {
                "identifier": "20240101003633",
                "caption": "This image was taken by NASA's EPIC camera",
                "image": "epic_1b_20240101003633",
                "version": "03",
                "centroid_coordinates": { "lat": -21.5, "lon": 170.25 },
                "date": "2024-01-01 00:31:45"
            },
            {
                "identifier": "20240101022135",
                "image": "epic_1b_20240101022135",
                "date": "2024-01-01 02:17:03"
            }
        ]);

        let views = EarthView::from_body(&body).unwrap();
        assert_eq!(views.len(), 2);

        assert_eq!(views[0].identifier, "20240101003633");
        assert_eq!(
            views[0].captured_at,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 31, 45).unwrap()
        );
        assert_eq!(views[0].centroid, Some(Centroid { lat: -21.5, lon: 170.25 }));

        assert!(views[1].caption.is_empty());
        assert!(views[1].centroid.is_none());
    }

    #[test]
    fn builds_archive_url_from_capture_date() {
        let view = make_view("20240101003633");
        assert_eq!(
            view.image_url(),
            "https://epic.gsfc.nasa.gov/archive/natural/2024/01/01/png/epic_1b_20240101003633.png"
        );
    }

    #[test]
    fn empty_or_non_list_is_empty_result() {
        assert_eq!(EarthView::from_body(&json!([])), Err(FetchError::EmptyResult));
        assert_eq!(EarthView::from_body(&json!({})), Err(FetchError::EmptyResult));
        assert_eq!(EarthView::from_body(&json!(null)), Err(FetchError::EmptyResult));
    }

    #[test]
    fn undecodable_records_are_malformed() {
        let missing_image = json!([{ "identifier": "x", "date": "2024-01-01 00:00:00" }]);
        assert!(matches!(
            EarthView::from_body(&missing_image),
            Err(FetchError::Malformed(_))
        ));

        let bad_date = json!([{ "identifier": "x", "image": "y", "date": "yesterday" }]);
        assert!(matches!(
            EarthView::from_body(&bad_date),
            Err(FetchError::Malformed(_))
        ));
    }
}
