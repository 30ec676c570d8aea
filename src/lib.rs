//! Quantitative texture and shape descriptors for labeled ROIs extracted
//! from large bioimages.
//!
//! Each ROI is reduced to a fixed set of scalar feature values; features
//! may read other, previously computed features of the same ROI. The crate
//! core is:
//!
//! 1. **ROI store** – owns every [`RoiRecord`] and the per-label guard
//!    mediating concurrent writes.
//! 2. **Feature manager** – registers self-describing [`FeatureMethod`]s,
//!    orders them topologically by their provides/depends-on sets and runs
//!    them over the store in parallel batches, one method at a time.
//! 3. **Feature methods** – basic geometry, geodetic length/thickness and
//!    the NGTDM texture family (Coarseness, Contrast, Busyness,
//!    Complexity, Strength).
//!
//! Image decoding, segmentation and the output surface live upstream and
//! downstream of this crate; [`input`] and [`output`] only provide the
//! thin JSON/CSV shell used by the bundled binary.

pub mod error;
pub mod features;
pub mod input;
pub mod output;
pub mod roi;
pub mod scheduler;

pub use error::{Error, Result};
pub use features::ngtdm::ProbabilityMode;
pub use features::{FeatureId, FeatureMethod, DEGENERATE_ROI_VALUE};
pub use roi::{FeatureTable, IntensityMatrix, RoiRecord, RoiStore};
pub use scheduler::{ExtractConfig, FeatureManager};
