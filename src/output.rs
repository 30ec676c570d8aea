/*!
CSV readout of the per-ROI feature tables.

Every ROI contributes every feature column. A feature a bad-data label
never computed prints as the degenerate sentinel, so the table keeps its
rectangular shape.
 */

use std::io::Write;

use csv::WriterBuilder;

use crate::error::Result;
use crate::features::{FeatureId, DEGENERATE_ROI_VALUE};
use crate::roi::RoiRecord;

/// Write one row per record: label first, then the first stored value of
/// each feature id in column order.
pub fn write_feature_table(records: &[RoiRecord], out: impl Write) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(out);

    let mut header = vec!["label".to_string()];
    header.extend(
        FeatureId::ALL
            .iter()
            .map(|id| id.column_name().to_string()),
    );
    writer.write_record(&header)?;

    for record in records {
        let mut row = vec![record.label.to_string()];
        for id in FeatureId::ALL {
            let value = record.feature_scalar(id).unwrap_or(DEGENERATE_ROI_VALUE);
            row.push(value.to_string());
        }
        writer.write_record(&row)?;
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roi::IntensityMatrix;

    #[test]
    fn table_is_rectangular_with_sentinels_for_missing_features() {
        let mut computed = RoiRecord::new(
            1,
            IntensityMatrix::from_rows(vec![vec![5, 9]]).unwrap(),
        );
        computed.save_value(FeatureId::AreaPixelsCount, 2.0);
        // Bad-data record with nothing stored at all.
        let mut bad = RoiRecord::new(
            2,
            IntensityMatrix::from_rows(vec![vec![0]]).unwrap(),
        );
        bad.bad_data = true;

        let mut buffer = Vec::new();
        write_feature_table(&[computed, bad], &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.trim_end().lines().collect();

        assert_eq!(lines.len(), 3);
        let columns = 1 + FeatureId::ALL.len();
        for line in &lines {
            assert_eq!(line.split(',').count(), columns);
        }
        assert!(lines[0].starts_with("label,area_pixels_count,"));
        assert!(lines[1].starts_with("1,2,"));
        assert!(lines[2].starts_with("2,0,"));
    }
}
