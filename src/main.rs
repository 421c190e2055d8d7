use clap::Parser;

use macpepdb::cli::{self, Cli};

fn main() {
    dotenv::dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    if let Err(error) = cli::run(cli) {
        log::error!("{error}");
        std::process::exit(1);
    }
}
