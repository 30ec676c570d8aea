/*!
ROI records, their pixel matrices and the store that owns them.

The store is built once from the loaded ROI set and owns every record for
the whole extraction run. Workers mutate a record only through
[`RoiStore::with_lock`], which scopes the label's guard around the access.
 */

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, PoisonError};

use crate::error::{Error, Result};
use crate::features::FeatureId;

/// Feature identifier -> ordered sequence of values. Most features are
/// scalar and store a single-element sequence.
pub type FeatureTable = BTreeMap<FeatureId, Vec<f64>>;

/// Read-only 2-D intensity matrix covering one ROI's bounding box.
///
/// Intensity 0 is background. Neighbor lookups at the border go through
/// [`IntensityMatrix::safe`], which takes signed coordinates so offsets can
/// be probed without underflow gymnastics at row/column zero.
#[derive(Debug, Clone)]
pub struct IntensityMatrix {
    height: usize,
    width: usize,
    data: Vec<u32>,
}

impl IntensityMatrix {
    pub fn from_rows(rows: Vec<Vec<u32>>) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        if height == 0 || width == 0 {
            return Err(Error::EmptyMatrix);
        }
        let mut data = Vec::with_capacity(height * width);
        for (row, cells) in rows.into_iter().enumerate() {
            if cells.len() != width {
                return Err(Error::RaggedMatrix {
                    row,
                    got: cells.len(),
                    expected: width,
                });
            }
            data.extend(cells);
        }
        Ok(Self {
            height,
            width,
            data,
        })
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn get(&self, row: usize, col: usize) -> u32 {
        self.data[row * self.width + col]
    }

    /// Whether (row, col) lies inside the matrix.
    pub fn safe(&self, row: i64, col: i64) -> bool {
        row >= 0 && col >= 0 && (row as usize) < self.height && (col as usize) < self.width
    }
}

/// Everything known about one labeled ROI.
#[derive(Debug)]
pub struct RoiRecord {
    pub label: u32,
    pub pixels: IntensityMatrix,
    /// Foreground pixel count, set by the geometry method.
    pub aux_area: usize,
    /// Boundary pixel count, set by the geometry method.
    pub aux_perimeter: f64,
    /// Foreground intensity range, set by the geometry method.
    pub aux_min: u32,
    pub aux_max: u32,
    /// Once set, every later feature method skips this record.
    pub bad_data: bool,
    pub feature_values: FeatureTable,
}

impl RoiRecord {
    pub fn new(label: u32, pixels: IntensityMatrix) -> Self {
        Self {
            label,
            pixels,
            aux_area: 0,
            aux_perimeter: 0.0,
            aux_min: 0,
            aux_max: 0,
            bad_data: false,
            feature_values: FeatureTable::new(),
        }
    }

    /// Commit a scalar feature value.
    pub fn save_value(&mut self, id: FeatureId, value: f64) {
        self.feature_values.insert(id, vec![value]);
    }

    /// Commit a multi-valued feature (per-angle variants and the like).
    pub fn save_values(&mut self, id: FeatureId, values: Vec<f64>) {
        self.feature_values.insert(id, values);
    }

    pub fn feature(&self, id: FeatureId) -> Option<&[f64]> {
        self.feature_values.get(&id).map(Vec::as_slice)
    }

    /// First element of a stored feature, if present.
    pub fn feature_scalar(&self, id: FeatureId) -> Option<f64> {
        self.feature(id).and_then(|values| values.first().copied())
    }
}

/// Owner of all ROI records for one extraction run.
///
/// One mutex per label, provisioned here at construction time; a label
/// without a guard cannot exist. Records for distinct labels are never
/// locked together, no feature reads another label's data.
#[derive(Debug)]
pub struct RoiStore {
    labels: Vec<u32>,
    records: HashMap<u32, Mutex<RoiRecord>>,
}

impl RoiStore {
    pub fn new(rois: Vec<RoiRecord>) -> Result<Self> {
        let mut labels = Vec::with_capacity(rois.len());
        let mut records = HashMap::with_capacity(rois.len());
        for record in rois {
            if record.label == 0 {
                return Err(Error::ZeroLabel);
            }
            if records.contains_key(&record.label) {
                return Err(Error::DuplicateLabel(record.label));
            }
            labels.push(record.label);
            records.insert(record.label, Mutex::new(record));
        }
        labels.sort_unstable();
        Ok(Self { labels, records })
    }

    /// Labels in ascending order.
    pub fn labels(&self) -> &[u32] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Run `f` with exclusive access to the label's record. The guard is
    /// released on every exit path, a panic inside `f` poisons only this
    /// label and sibling labels keep going.
    pub fn with_lock<T>(&self, label: u32, f: impl FnOnce(&mut RoiRecord) -> T) -> Result<T> {
        let cell = self
            .records
            .get(&label)
            .ok_or(Error::UnknownLabel(label))?;
        let mut record = cell.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(f(&mut record))
    }

    /// Shared read of one record, for use outside the parallel phases.
    pub fn read<T>(&self, label: u32, f: impl FnOnce(&RoiRecord) -> T) -> Result<T> {
        self.with_lock(label, |record| f(record))
    }

    /// Tear the store down into its records, ascending by label. Only
    /// meaningful once the manager reports completion of all methods.
    pub fn into_records(self) -> Vec<RoiRecord> {
        let mut records = self
            .records
            .into_values()
            .map(|cell| cell.into_inner().unwrap_or_else(PoisonError::into_inner))
            .collect::<Vec<_>>();
        records.sort_unstable_by_key(|record| record.label);
        records
    }
}
