use thiserror::Error;

use crate::features::FeatureId;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the extraction library.
///
/// Configuration errors (`DuplicateProvider`, `UnresolvedDependency`,
/// `DependencyCycle`) are detected while planning the execution order,
/// before any ROI is touched. Input errors come out of the loader.
#[derive(Debug, Error)]
pub enum Error {
    #[error("feature {feature:?} is provided by both '{first}' and '{second}'")]
    DuplicateProvider {
        feature: FeatureId,
        first: &'static str,
        second: &'static str,
    },
    #[error("no registered method provides {feature:?}, required by '{method}'")]
    UnresolvedDependency {
        feature: FeatureId,
        method: &'static str,
    },
    #[error("feature methods cannot be ordered, dependency cycle among: {methods:?}")]
    DependencyCycle { methods: Vec<&'static str> },
    #[error("no roi registered for label {0}")]
    UnknownLabel(u32),
    #[error("duplicate roi label {0}")]
    DuplicateLabel(u32),
    #[error("roi label must be a positive integer")]
    ZeroLabel,
    #[error("roi pixel matrix has no rows or no columns")]
    EmptyMatrix,
    #[error("ragged pixel matrix: row {row} has {got} columns, expected {expected}")]
    RaggedMatrix {
        row: usize,
        got: usize,
        expected: usize,
    },
    #[error("couldn't parse roi document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("couldn't write feature table: {0}")]
    Csv(#[from] csv::Error),
}
