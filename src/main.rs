use clap::Parser;

mod args;
mod recon;

use crate::args::Args;

fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let res = recon::resolve_settings(&args).and_then(|settings| recon::run_reconciliation(&settings));
    if let Err(e) = res {
        recon::report_error(&e);
        std::process::exit(1);
    }
}
