use anyhow::Result;
use log::info;
use std::path::PathBuf;

use specstack::validator::validate_store;

/// Validate spectrum store integrity
pub fn run(store: PathBuf) -> Result<()> {
    info!("Validating spectrum store: {}", store.display());

    match validate_store(&store) {
        Ok(report) => {
            println!("{}", report.format_colored());

            // Exit with error code if validation failed
            if report.has_failures() {
                std::process::exit(1);
            }

            Ok(())
        }
        Err(e) => {
            eprintln!("Validation error: {}", e);
            std::process::exit(1);
        }
    }
}
