/*!
Neighbourhood Gray-Tone Difference Matrix texture features.

Per ROI the engine runs in two phases: [`NgtdmMatrix::build`] scans the
pixel matrix and accumulates the per-gray-level difference vectors, then
five scalar statistics are read off the finished matrix. A flat ROI (single
foreground intensity) never gets a matrix, [`NgtdmMatrix::build`] reports
it as degenerate and the method stores sentinel values instead.
 */

use std::collections::BTreeSet;
use std::str::FromStr;

use serde::Deserialize;

use crate::features::{FeatureId, FeatureMethod, DEGENERATE_ROI_VALUE};
use crate::roi::{IntensityMatrix, RoiRecord};
use crate::scheduler::ExtractConfig;

const NEIGHBOR_OFFSETS: [(i64, i64); 8] = [
    (-1, 0),  // north
    (-1, 1),  // north-east
    (0, 1),   // east
    (1, 1),   // south-east
    (1, 0),   // south
    (1, -1),  // south-west
    (0, -1),  // west
    (-1, -1), // north-west
];

/// How the per-level probability vector `P` is normalized.
///
/// `LevelDensity` assigns every level the constant `Ng / (height * width)`,
/// matching established extraction pipelines. `Empirical` uses the
/// occurrence probability `N[i] / sum(N)` of the standard NGTDM
/// formulation. The two disagree on real data, so the choice is exposed
/// here rather than baked in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProbabilityMode {
    #[default]
    LevelDensity,
    Empirical,
}

impl FromStr for ProbabilityMode {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "level-density" => Ok(ProbabilityMode::LevelDensity),
            "empirical" => Ok(ProbabilityMode::Empirical),
            _ => Err(format!("{} is not a valid probability mode", s)),
        }
    }
}

/// Outcome of the matrix-construction phase.
pub enum NgtdmInit {
    Ready(NgtdmMatrix),
    /// Flat ROI, no matrix was built. Statistics are not defined.
    Degenerate,
}

/// The finished difference matrix for one ROI.
///
/// Row `i` corresponds to the i-th distinct foreground intensity in
/// ascending order. The statistics below follow the standard NGTDM
/// definitions with 1-based gray-level ranks.
pub struct NgtdmMatrix {
    /// Number of distinct foreground intensities.
    ng: usize,
    /// Number of gray levels with non-zero occurrence probability.
    ngp: usize,
    /// Number of pixels whose averaged neighborhood is strictly positive.
    nvp: usize,
    /// Per-level probability.
    p: Vec<f64>,
    /// Per-level sum of |intensity - average neighbor intensity|.
    s: Vec<f64>,
    /// Per-level occurrence count.
    n: Vec<u64>,
}

impl NgtdmMatrix {
    /// Scan every foreground pixel, average its in-bounds 8-neighborhood
    /// (the divisor is the in-bounds neighbor count, never a fixed 8) and
    /// accumulate the per-level vectors.
    pub fn build(
        min_intensity: u32,
        max_intensity: u32,
        pixels: &IntensityMatrix,
        mode: ProbabilityMode,
    ) -> NgtdmInit {
        if min_intensity == max_intensity {
            return NgtdmInit::Degenerate;
        }

        // Pairs of (intensity, average intensity of in-bounds neighbors),
        // plus the set of unique intensities seen while scanning.
        let mut zones: Vec<(u32, f64)> = Vec::new();
        let mut unique: BTreeSet<u32> = BTreeSet::new();

        for row in 0..pixels.height() {
            for col in 0..pixels.width() {
                let pi = pixels.get(row, col);
                if pi == 0 {
                    continue;
                }

                let mut neighbor_sum = 0u64;
                let mut neighbor_count = 0u32;
                for &(dr, dc) in &NEIGHBOR_OFFSETS {
                    let (r, c) = (row as i64 + dr, col as i64 + dc);
                    if pixels.safe(r, c) {
                        neighbor_sum += pixels.get(r as usize, c as usize) as u64;
                        neighbor_count += 1;
                    }
                }
                // A lone 1x1 matrix would divide by zero here, but it is
                // always flat and already reported as degenerate above.
                let average = neighbor_sum as f64 / neighbor_count as f64;

                zones.push((pi, average));
                unique.insert(pi);
            }
        }

        let levels: Vec<u32> = unique.into_iter().collect();
        let ng = levels.len();
        if ng == 0 {
            return NgtdmInit::Degenerate;
        }

        let mut n = vec![0u64; ng];
        let mut s = vec![0.0f64; ng];
        let mut nvp = 0usize;

        for &(pi, average) in &zones {
            let row = levels
                .binary_search(&pi)
                .expect("intensity was recorded during the scan");
            n[row] += 1;
            s[row] += (pi as f64 - average).abs();
            if average > 0.0 {
                nvp += 1;
            }
        }

        let p = match mode {
            ProbabilityMode::LevelDensity => {
                let density = ng as f64 / (pixels.height() * pixels.width()) as f64;
                vec![density; ng]
            }
            ProbabilityMode::Empirical => {
                let total = zones.len() as f64;
                n.iter().map(|&count| count as f64 / total).collect()
            }
        };

        NgtdmInit::Ready(NgtdmMatrix {
            ng,
            ngp: ng,
            nvp,
            p,
            s,
            n,
        })
    }

    pub fn ng(&self) -> usize {
        self.ng
    }

    /// Per-level occurrence counts, ascending by intensity.
    pub fn counts(&self) -> &[u64] {
        &self.n
    }

    /// Coarseness: `1 / sum_i P[i] * S[i]`.
    pub fn coarseness(&self) -> f64 {
        let mut sum = 0.0;
        for i in 0..self.ng {
            sum += self.p[i] * self.s[i];
        }
        1.0 / sum
    }

    /// Contrast: the normalized pairwise rank spread times the mean
    /// difference magnitude. `Ngp * (Ngp - 1)` collapses to `Ngp` for a
    /// single-level matrix.
    pub fn contrast(&self) -> f64 {
        let mut sum = 0.0;
        for i in 0..self.ng {
            for j in 0..self.ng {
                let d = (i + 1) as f64 - (j + 1) as f64;
                sum += self.p[i] * self.p[j] * d * d;
            }
        }
        let ngp_pairs = if self.ngp > 1 {
            self.ngp * (self.ngp - 1)
        } else {
            self.ngp
        };
        let term1 = sum / ngp_pairs as f64;

        let term2 = self.s.iter().sum::<f64>() / self.ngp as f64;

        term1 * term2
    }

    /// Busyness: exactly `0.0` for a single-level matrix.
    pub fn busyness(&self) -> f64 {
        if self.ngp == 1 {
            return 0.0;
        }

        let mut sum1 = 0.0;
        for i in 0..self.ng {
            sum1 += self.p[i] * self.s[i];
        }

        let mut sum2 = 0.0;
        for i in 0..self.ng {
            for j in 0..self.ng {
                sum2 += (self.p[i] * i as f64 - self.p[j] * j as f64).abs();
            }
        }

        sum1 / sum2
    }

    /// Complexity, normalized by the count of valid-neighborhood pixels.
    pub fn complexity(&self) -> f64 {
        let mut sum = 0.0;
        for i in 0..self.ng {
            for j in 0..self.ng {
                let d = ((i + 1) as f64 - (j + 1) as f64).abs();
                sum += d * (self.p[i] * self.s[i] + self.p[j] * self.s[j])
                    / (self.p[i] + self.p[j]);
            }
        }
        sum / self.nvp as f64
    }

    /// Strength: pairwise rank spread weighted by level probability mass,
    /// over the total difference magnitude.
    pub fn strength(&self) -> f64 {
        let mut sum1 = 0.0;
        for i in 0..self.ng {
            for j in 0..self.ng {
                let d = (i + 1) as f64 - (j + 1) as f64;
                sum1 += (self.p[i] + self.p[j]) * d * d;
            }
        }

        let sum2 = self.s.iter().sum::<f64>();

        sum1 / sum2
    }
}

const NGTDM_IDS: [FeatureId; 5] = [
    FeatureId::NgtdmCoarseness,
    FeatureId::NgtdmContrast,
    FeatureId::NgtdmBusyness,
    FeatureId::NgtdmComplexity,
    FeatureId::NgtdmStrength,
];

fn ngtdm_texture(record: &mut RoiRecord, config: &ExtractConfig) {
    let init = NgtdmMatrix::build(
        record.aux_min,
        record.aux_max,
        &record.pixels,
        config.ngtdm_probability,
    );
    match init {
        NgtdmInit::Ready(matrix) => {
            record.save_value(FeatureId::NgtdmCoarseness, matrix.coarseness());
            record.save_value(FeatureId::NgtdmContrast, matrix.contrast());
            record.save_value(FeatureId::NgtdmBusyness, matrix.busyness());
            record.save_value(FeatureId::NgtdmComplexity, matrix.complexity());
            record.save_value(FeatureId::NgtdmStrength, matrix.strength());
        }
        NgtdmInit::Degenerate => {
            record.bad_data = true;
            for id in NGTDM_IDS {
                record.save_value(id, DEGENERATE_ROI_VALUE);
            }
        }
    }
}

pub const NGTDM_TEXTURE: FeatureMethod = FeatureMethod {
    name: "ngtdm_texture",
    provides: &[
        FeatureId::NgtdmCoarseness,
        FeatureId::NgtdmContrast,
        FeatureId::NgtdmBusyness,
        FeatureId::NgtdmComplexity,
        FeatureId::NgtdmStrength,
    ],
    depends_on: &[FeatureId::MinIntensity, FeatureId::MaxIntensity],
    calculate: ngtdm_texture,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::geometry;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::BTreeSet;

    const EPS: f64 = 1e-12;

    fn matrix(rows: Vec<Vec<u32>>) -> IntensityMatrix {
        IntensityMatrix::from_rows(rows).unwrap()
    }

    fn built(rows: Vec<Vec<u32>>, mode: ProbabilityMode) -> NgtdmMatrix {
        let m = matrix(rows);
        let (mut min, mut max) = (u32::MAX, 0);
        for row in 0..m.height() {
            for col in 0..m.width() {
                let pi = m.get(row, col);
                if pi > 0 {
                    min = min.min(pi);
                    max = max.max(pi);
                }
            }
        }
        match NgtdmMatrix::build(min, max, &m, mode) {
            NgtdmInit::Ready(matrix) => matrix,
            NgtdmInit::Degenerate => panic!("expected a non-degenerate matrix"),
        }
    }

    fn random_matrix(seed: u64) -> IntensityMatrix {
        let mut rng = StdRng::seed_from_u64(seed);
        let rows = (0..8)
            .map(|_| (0..8).map(|_| rng.gen_range(0..6u32)).collect())
            .collect();
        matrix(rows)
    }

    #[test]
    fn flat_roi_stores_sentinels_for_all_five_features() {
        let mut record = RoiRecord::new(1, matrix(vec![vec![7, 7], vec![7, 7]]));
        (geometry::BASIC_GEOMETRY.calculate)(&mut record, &ExtractConfig::default());
        ngtdm_texture(&mut record, &ExtractConfig::default());

        assert!(record.bad_data);
        for id in NGTDM_IDS {
            assert_eq!(record.feature_scalar(id), Some(0.0), "{:?}", id);
        }
    }

    #[test]
    fn hand_worked_3x3_example() {
        // [[5,5,5],[5,9,5],[5,5,5]]: corners average 19/3, edges 29/5, the
        // center averages its eight 5s to exactly 5.
        let m = built(
            vec![vec![5, 5, 5], vec![5, 9, 5], vec![5, 5, 5]],
            ProbabilityMode::LevelDensity,
        );

        assert_eq!(m.ng, 2);
        assert_eq!(m.ngp, 2);
        assert_eq!(m.nvp, 9);
        assert_eq!(m.counts(), &[8, 1]);

        // S[5] = 4*|5 - 19/3| + 4*|5 - 29/5|, S[9] = |9 - 5|.
        let s0 = 4.0 * (5.0f64 - 19.0 / 3.0).abs() + 4.0 * (5.0f64 - 29.0 / 5.0).abs();
        assert!((m.s[0] - s0).abs() < EPS);
        assert!((m.s[1] - 4.0).abs() < EPS);

        // Level-density probability: Ng / (h * w) for every level.
        assert!((m.p[0] - 2.0 / 9.0).abs() < EPS);
        assert!((m.p[1] - 2.0 / 9.0).abs() < EPS);

        let (p, s) = (m.p.clone(), m.s.clone());
        let sum_ps = p[0] * s[0] + p[1] * s[1];
        let sum_s = s[0] + s[1];

        assert!((m.coarseness() - 1.0 / sum_ps).abs() < EPS);

        let contrast = (2.0 * p[0] * p[1] / 2.0) * (sum_s / 2.0);
        assert!((m.contrast() - contrast).abs() < EPS);

        let busyness = sum_ps / (2.0 * p[1]);
        assert!((m.busyness() - busyness).abs() < EPS);

        let complexity = 2.0 * (sum_ps / (p[0] + p[1])) / 9.0;
        assert!((m.complexity() - complexity).abs() < EPS);

        let strength = 2.0 * (p[0] + p[1]) / sum_s;
        assert!((m.strength() - strength).abs() < EPS);
    }

    #[test]
    fn ng_counts_distinct_foreground_intensities() {
        for seed in 0..5 {
            let m = random_matrix(seed);
            let mut distinct = BTreeSet::new();
            for row in 0..m.height() {
                for col in 0..m.width() {
                    let pi = m.get(row, col);
                    if pi > 0 {
                        distinct.insert(pi);
                    }
                }
            }
            if distinct.len() < 2 {
                continue;
            }
            let (&min, &max) = (
                distinct.iter().next().unwrap(),
                distinct.iter().next_back().unwrap(),
            );
            match NgtdmMatrix::build(min, max, &m, ProbabilityMode::LevelDensity) {
                NgtdmInit::Ready(built) => assert_eq!(built.ng(), distinct.len()),
                NgtdmInit::Degenerate => panic!("matrix with {} levels", distinct.len()),
            }
        }
    }

    #[test]
    fn coarseness_is_reciprocal_of_weighted_difference_sum() {
        for seed in 0..5 {
            let m = random_matrix(seed);
            let (mut min, mut max) = (u32::MAX, 0);
            for row in 0..m.height() {
                for col in 0..m.width() {
                    let pi = m.get(row, col);
                    if pi > 0 {
                        min = min.min(pi);
                        max = max.max(pi);
                    }
                }
            }
            if min >= max {
                continue;
            }
            if let NgtdmInit::Ready(built) =
                NgtdmMatrix::build(min, max, &m, ProbabilityMode::LevelDensity)
            {
                let sum_ps: f64 = built.p.iter().zip(&built.s).map(|(p, s)| p * s).sum();
                assert!((built.coarseness() * sum_ps - 1.0).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn busyness_is_zero_for_a_single_level_matrix() {
        let m = NgtdmMatrix {
            ng: 1,
            ngp: 1,
            nvp: 4,
            p: vec![0.5],
            s: vec![2.0],
            n: vec![4],
        };
        assert_eq!(m.busyness(), 0.0);
    }

    #[test]
    fn empirical_probabilities_sum_to_one() {
        let m = built(
            vec![vec![5, 5, 5], vec![5, 9, 5], vec![5, 5, 5]],
            ProbabilityMode::Empirical,
        );
        assert!((m.p[0] - 8.0 / 9.0).abs() < EPS);
        assert!((m.p[1] - 1.0 / 9.0).abs() < EPS);
        assert!((m.p.iter().sum::<f64>() - 1.0).abs() < EPS);
        assert_eq!(m.counts(), &[8, 1]);
    }

    #[test]
    fn background_pixels_are_excluded_from_levels() {
        let m = built(
            vec![vec![0, 5, 0], vec![5, 9, 5], vec![0, 5, 0]],
            ProbabilityMode::LevelDensity,
        );
        assert_eq!(m.ng, 2);
        assert_eq!(m.counts().iter().sum::<u64>(), 5);
    }

    #[test]
    fn probability_mode_parses_like_the_cli_expects() {
        assert_eq!(
            "level-density".parse::<ProbabilityMode>().unwrap(),
            ProbabilityMode::LevelDensity
        );
        assert_eq!(
            "empirical".parse::<ProbabilityMode>().unwrap(),
            ProbabilityMode::Empirical
        );
        assert!("glcm".parse::<ProbabilityMode>().is_err());
    }
}
