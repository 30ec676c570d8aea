use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::LevelFilter;

use roi_feature_extraction::ProbabilityMode;

#[derive(Debug, Parser, Clone)]
pub struct Args {
    /// Input ROI file (.json) :
    /// {"rois": [{"label": <positive int>, "pixels": [[<intensity>, ..], ..]}]}
    pub rois: PathBuf,
    /// Output file (.csv)
    pub output: PathBuf,
    /// Probability normalization for the ngtdm features :
    /// "level-density" matches established extraction pipelines,
    /// "empirical" uses per-level occurrence probabilities
    #[clap(short, long, default_value = "level-density")]
    pub probability: ProbabilityMode,
    /// Batch size :
    /// the number of rois handed to a worker at once
    #[clap(short, long, default_value = "1000")]
    pub batch_size: usize,
    /// Thread count :
    /// the number of threads used by rayon
    /// if not specified, rayon will use the number of cores available on the machine
    #[clap(short, long)]
    pub thread_count: Option<usize>,
    /// Verbose :
    /// if specified, will print more information
    #[clap(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn handle_verbose(&self) {
        if !self.verbose {
            return;
        }
        log::set_max_level(LevelFilter::Debug);
    }

    pub fn handle_thread_count(&self) -> anyhow::Result<()> {
        if let Some(thread_count) = self.thread_count {
            rayon::ThreadPoolBuilder::new()
                .num_threads(thread_count)
                .build_global()
                .context("couldn't size the global rayon pool")?;
        }
        Ok(())
    }
}
