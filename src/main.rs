use clap::Parser;
use log::{debug, LevelFilter};
use std::error::Error;

mod args;
mod report;

fn main() {
    let args = args::Args::parse();
    if args.verbose {
        env_logger::Builder::new()
            .filter_level(LevelFilter::Debug)
            .init();
    } else {
        env_logger::init();
    }
    debug!("args: {:?}", args);

    if let Err(e) = report::run_report(&args) {
        eprintln!("An error occured: {}", e);
        let mut source = e.source();
        while let Some(s) = source {
            eprintln!("  caused by: {}", s);
            source = s.source();
        }
        std::process::exit(1);
    }
}
