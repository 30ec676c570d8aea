/*!
Basic per-ROI geometry: foreground pixel count, boundary perimeter and the
intensity range, plus the geodetic length / thickness pair derived from
area and perimeter.
 */

use crate::features::{FeatureId, FeatureMethod, DEGENERATE_ROI_VALUE};
use crate::roi::RoiRecord;
use crate::scheduler::ExtractConfig;

const EDGE_OFFSETS: [(i64, i64); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Scans the pixel matrix once: counts foreground pixels, counts boundary
/// pixels (foreground with a background or out-of-bounds 4-neighbor) and
/// records the intensity range. An all-background matrix marks the record
/// as bad data.
fn basic_geometry(record: &mut RoiRecord, _config: &ExtractConfig) {
    let pixels = &record.pixels;
    let mut area = 0usize;
    let mut perimeter = 0usize;
    let mut min = u32::MAX;
    let mut max = 0u32;

    for row in 0..pixels.height() {
        for col in 0..pixels.width() {
            let pi = pixels.get(row, col);
            if pi == 0 {
                continue;
            }
            area += 1;
            min = min.min(pi);
            max = max.max(pi);

            let on_edge = EDGE_OFFSETS.iter().any(|&(dr, dc)| {
                let (r, c) = (row as i64 + dr, col as i64 + dc);
                !pixels.safe(r, c) || pixels.get(r as usize, c as usize) == 0
            });
            if on_edge {
                perimeter += 1;
            }
        }
    }

    if area == 0 {
        record.bad_data = true;
        for id in [
            FeatureId::AreaPixelsCount,
            FeatureId::Perimeter,
            FeatureId::MinIntensity,
            FeatureId::MaxIntensity,
        ] {
            record.save_value(id, DEGENERATE_ROI_VALUE);
        }
        return;
    }

    record.aux_area = area;
    record.aux_perimeter = perimeter as f64;
    record.aux_min = min;
    record.aux_max = max;

    record.save_value(FeatureId::AreaPixelsCount, area as f64);
    record.save_value(FeatureId::Perimeter, perimeter as f64);
    record.save_value(FeatureId::MinIntensity, min as f64);
    record.save_value(FeatureId::MaxIntensity, max as f64);
}

pub const BASIC_GEOMETRY: FeatureMethod = FeatureMethod {
    name: "basic_geometry",
    provides: &[
        FeatureId::AreaPixelsCount,
        FeatureId::Perimeter,
        FeatureId::MinIntensity,
        FeatureId::MaxIntensity,
    ],
    depends_on: &[],
    calculate: basic_geometry,
};

/// Geodetic length and thickness from the pq-formula:
/// `geodetic = p/4 + sqrt(p^2/16 - area)`, `thickness = p/2 - geodetic`.
/// The radicand is clamped at zero for stubby ROIs.
fn geodetic_length_thickness(record: &mut RoiRecord, _config: &ExtractConfig) {
    let area = record.aux_area as f64;
    let perimeter = record
        .feature_scalar(FeatureId::Perimeter)
        .expect("perimeter is computed before geodetic length");

    let radicand = (perimeter * perimeter / 16.0 - area).max(0.0);
    let geodetic_length = perimeter / 4.0 + radicand.sqrt();
    let thickness = perimeter / 2.0 - geodetic_length;

    record.save_value(FeatureId::GeodeticLength, geodetic_length);
    record.save_value(FeatureId::Thickness, thickness);
}

pub const GEODETIC_LENGTH_THICKNESS: FeatureMethod = FeatureMethod {
    name: "geodetic_length_thickness",
    provides: &[FeatureId::GeodeticLength, FeatureId::Thickness],
    depends_on: &[FeatureId::AreaPixelsCount, FeatureId::Perimeter],
    calculate: geodetic_length_thickness,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roi::IntensityMatrix;

    fn record_from(rows: Vec<Vec<u32>>) -> RoiRecord {
        RoiRecord::new(1, IntensityMatrix::from_rows(rows).unwrap())
    }

    #[test]
    fn geometry_counts_area_perimeter_and_range() {
        // 3x3 block of 5s with a brighter center, ringed by background.
        let mut record = record_from(vec![
            vec![0, 0, 0, 0, 0],
            vec![0, 5, 5, 5, 0],
            vec![0, 5, 9, 5, 0],
            vec![0, 5, 5, 5, 0],
            vec![0, 0, 0, 0, 0],
        ]);
        basic_geometry(&mut record, &ExtractConfig::default());

        assert_eq!(record.feature_scalar(FeatureId::AreaPixelsCount), Some(9.0));
        // Center pixel has no background 4-neighbor, the eight around it do.
        assert_eq!(record.feature_scalar(FeatureId::Perimeter), Some(8.0));
        assert_eq!(record.feature_scalar(FeatureId::MinIntensity), Some(5.0));
        assert_eq!(record.feature_scalar(FeatureId::MaxIntensity), Some(9.0));
        assert_eq!(record.aux_area, 9);
        assert!(!record.bad_data);
    }

    #[test]
    fn matrix_border_counts_as_boundary() {
        let mut record = record_from(vec![vec![5, 5], vec![5, 6]]);
        basic_geometry(&mut record, &ExtractConfig::default());
        assert_eq!(record.feature_scalar(FeatureId::Perimeter), Some(4.0));
    }

    #[test]
    fn all_background_roi_is_bad_data() {
        let mut record = record_from(vec![vec![0, 0], vec![0, 0]]);
        basic_geometry(&mut record, &ExtractConfig::default());
        assert!(record.bad_data);
        assert_eq!(record.feature_scalar(FeatureId::AreaPixelsCount), Some(0.0));
    }

    #[test]
    fn geodetic_length_matches_pq_formula() {
        let mut record = record_from(vec![
            vec![0, 0, 0, 0, 0, 0],
            vec![0, 5, 5, 5, 9, 0],
            vec![0, 0, 0, 0, 0, 0],
        ]);
        basic_geometry(&mut record, &ExtractConfig::default());
        geodetic_length_thickness(&mut record, &ExtractConfig::default());

        let area = record.feature_scalar(FeatureId::AreaPixelsCount).unwrap();
        let p = record.feature_scalar(FeatureId::Perimeter).unwrap();
        let expected = p / 4.0 + (p * p / 16.0 - area).max(0.0).sqrt();
        let geodetic = record.feature_scalar(FeatureId::GeodeticLength).unwrap();
        let thickness = record.feature_scalar(FeatureId::Thickness).unwrap();
        assert!((geodetic - expected).abs() < 1e-12);
        assert!((thickness - (p / 2.0 - geodetic)).abs() < 1e-12);
    }
}
