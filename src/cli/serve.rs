use clap::Args;

use crate::error::{Error, Result};

/// Placeholder for an eventual HTTP front-end over the catalog. The search
/// core (enumerator, predicate compiler, validator) is already usable as a
/// library; only the network surface is out of scope here.
#[derive(Debug, Args)]
pub struct ServeArgs {
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

pub fn run(args: ServeArgs) -> Result<()> {
    Err(Error::Config(format!(
        "serve is not implemented yet (requested port {})",
        args.port
    )))
}
