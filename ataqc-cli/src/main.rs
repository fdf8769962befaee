mod cli;
mod handlers;
mod output;
mod reader;

use anyhow::Result;
use clap::Command;
use env_logger::Env;

pub mod consts {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
    pub const PKG_NAME: &str = "ataqc";
    pub const BIN_NAME: &str = "ataqc";
}

fn build_parser() -> Command {
    cli::create_ataqc_cli()
        .bin_name(consts::BIN_NAME)
        .version(consts::VERSION)
        .about("Quality control metrics for ATAC-seq alignments, reported per read group as JSON.")
}

fn main() -> Result<()> {
    let app = build_parser();
    let matches = app.get_matches();

    let level = if matches.get_flag("verbose") {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    handlers::run_ataqc(&matches)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parser_is_consistent() {
        build_parser().debug_assert();
    }
}
