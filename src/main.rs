use crate::processes::paf_annotate::{PafAnnotateArgs, paf_annotate_process};
use clap::Parser;
use env_logger::Env;

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = PafAnnotateArgs::parse();

    if let Err(e) = paf_annotate_process(&args) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

mod io;
mod processes;
pub(crate) mod utils;
