/*!
Feature identifiers and the pluggable method registry entries.

A feature method is a plain record: a diagnostic name, the feature ids it
provides, the ids it reads from previously computed methods, and a pure
per-ROI function. New methods plug into the [`crate::FeatureManager`]
through registration, the scheduler never has to know about them.
 */

pub mod geometry;
pub mod ngtdm;

use serde::Serialize;

use crate::roi::RoiRecord;
use crate::scheduler::ExtractConfig;

/// Value stored for a feature whose ROI is degenerate or unusable.
pub const DEGENERATE_ROI_VALUE: f64 = 0.0;

/// Fixed feature codes, shared between providers and consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum FeatureId {
    AreaPixelsCount,
    Perimeter,
    MinIntensity,
    MaxIntensity,
    GeodeticLength,
    Thickness,
    NgtdmCoarseness,
    NgtdmContrast,
    NgtdmBusyness,
    NgtdmComplexity,
    NgtdmStrength,
}

impl FeatureId {
    /// Every known id, in output-column order.
    pub const ALL: [FeatureId; 11] = [
        FeatureId::AreaPixelsCount,
        FeatureId::Perimeter,
        FeatureId::MinIntensity,
        FeatureId::MaxIntensity,
        FeatureId::GeodeticLength,
        FeatureId::Thickness,
        FeatureId::NgtdmCoarseness,
        FeatureId::NgtdmContrast,
        FeatureId::NgtdmBusyness,
        FeatureId::NgtdmComplexity,
        FeatureId::NgtdmStrength,
    ];

    pub fn column_name(&self) -> &'static str {
        match self {
            FeatureId::AreaPixelsCount => "area_pixels_count",
            FeatureId::Perimeter => "perimeter",
            FeatureId::MinIntensity => "min_intensity",
            FeatureId::MaxIntensity => "max_intensity",
            FeatureId::GeodeticLength => "geodetic_length",
            FeatureId::Thickness => "thickness",
            FeatureId::NgtdmCoarseness => "ngtdm_coarseness",
            FeatureId::NgtdmContrast => "ngtdm_contrast",
            FeatureId::NgtdmBusyness => "ngtdm_busyness",
            FeatureId::NgtdmComplexity => "ngtdm_complexity",
            FeatureId::NgtdmStrength => "ngtdm_strength",
        }
    }
}

/// Per-ROI computation: reads the record's pixels and previously stored
/// feature values, commits its own outputs into `feature_values`.
pub type CalculateFn = fn(&mut RoiRecord, &ExtractConfig);

/// Self-describing registry entry for one feature computation.
#[derive(Clone, Copy)]
pub struct FeatureMethod {
    pub name: &'static str,
    pub provides: &'static [FeatureId],
    pub depends_on: &'static [FeatureId],
    pub calculate: CalculateFn,
}

impl std::fmt::Debug for FeatureMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureMethod")
            .field("name", &self.name)
            .field("provides", &self.provides)
            .field("depends_on", &self.depends_on)
            .finish()
    }
}

/// The built-in method set: basic geometry, geodetic length/thickness and
/// the NGTDM texture family.
pub fn default_methods() -> Vec<FeatureMethod> {
    vec![
        geometry::BASIC_GEOMETRY,
        geometry::GEODETIC_LENGTH_THICKNESS,
        ngtdm::NGTDM_TEXTURE,
    ]
}
