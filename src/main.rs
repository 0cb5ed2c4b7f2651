//! # specstack
//!
//! Command-line front end for building and using spectrum stores.
//!
//! ## Usage
//!
//! ```bash
//! # Generate a synthetic catalog and store
//! specstack demo demo/
//!
//! # Composites by redshift and by luminosity
//! specstack -v composite --catalog demo/catalog.csv --store demo/quasars.spdb --by both
//!
//! # Check a store
//! specstack validate demo/quasars.spdb
//! ```

use anyhow::Result;
use clap::Parser;

mod cli;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli::init_logging(cli.verbosity());
    cli::dispatch(cli)
}
