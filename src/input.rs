/*!
JSON ROI loader. The document is produced by the upstream segmentation
tooling: one entry per label, each carrying the intensity matrix of the
label's bounding box.
 */

use std::io::Read;

use serde::Deserialize;

use crate::error::Result;
use crate::roi::{IntensityMatrix, RoiRecord};

#[derive(Debug, Deserialize)]
pub struct RoiDocument {
    pub rois: Vec<RoiEntry>,
}

#[derive(Debug, Deserialize)]
pub struct RoiEntry {
    pub label: u32,
    pub pixels: Vec<Vec<u32>>,
}

/// Parse a ROI document and build the records. Ragged or empty matrices
/// are rejected, duplicate labels are caught later by the store.
pub fn load_rois(reader: impl Read) -> Result<Vec<RoiRecord>> {
    let document: RoiDocument = serde_json::from_reader(reader)?;
    document
        .rois
        .into_iter()
        .map(|entry| {
            let pixels = IntensityMatrix::from_rows(entry.pixels)?;
            Ok(RoiRecord::new(entry.label, pixels))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn parses_a_well_formed_document() {
        let doc = r#"{"rois": [
            {"label": 1, "pixels": [[5, 5], [5, 9]]},
            {"label": 2, "pixels": [[7]]}
        ]}"#;
        let records = load_rois(doc.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].label, 1);
        assert_eq!(records[0].pixels.height(), 2);
        assert_eq!(records[1].pixels.width(), 1);
    }

    #[test]
    fn rejects_ragged_matrices() {
        let doc = r#"{"rois": [{"label": 1, "pixels": [[5, 5], [5]]}]}"#;
        let err = load_rois(doc.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::RaggedMatrix { row: 1, .. }));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = load_rois("not json".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }
}
