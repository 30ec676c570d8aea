mod args;

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::process::exit;

use clap::Parser;
use log::{error, info};

use roi_feature_extraction::{input, output, ExtractConfig, FeatureManager, RoiStore};

use crate::args::Args;

fn main() {
    pretty_env_logger::init();
    let args = Args::parse();
    args.handle_verbose();
    if let Err(err) = args.handle_thread_count() {
        error!("{:#}", err);
        exit(1);
    }

    let reader = match File::open(&args.rois) {
        Ok(file) => BufReader::new(file),
        Err(err) => {
            error!("Couldn't open roi file {:?} : {}", args.rois, err);
            exit(1);
        }
    };
    let records = match input::load_rois(reader) {
        Ok(records) => records,
        Err(err) => {
            error!("Couldn't load rois : {}", err);
            exit(1);
        }
    };
    info!("loaded {} rois", records.len());

    let store = match RoiStore::new(records) {
        Ok(store) => store,
        Err(err) => {
            error!("Couldn't build the roi store : {}", err);
            exit(1);
        }
    };

    let manager = FeatureManager::with_default_methods();
    let config = ExtractConfig {
        ngtdm_probability: args.probability,
        batch_size: args.batch_size,
    };
    if let Err(err) = manager.run(&store, &config) {
        error!("Feature extraction failed : {}", err);
        exit(1);
    }

    let records = store.into_records();
    let writer = match File::create(&args.output) {
        Ok(file) => BufWriter::new(file),
        Err(err) => {
            error!("Couldn't create output file {:?} : {}", args.output, err);
            exit(1);
        }
    };
    if let Err(err) = output::write_feature_table(&records, writer) {
        error!("Couldn't write the feature table : {}", err);
        exit(1);
    }
    info!("wrote {} rois to {:?}", records.len(), args.output);
}
