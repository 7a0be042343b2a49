use anyhow::{Result, bail};
use std::path::Path;

pub fn run_check(input: &Path, summary: bool, verbose: bool) -> Result<()> {
    let db = crate::load_database(input, verbose)?;

    let Err(errors) = diag_core::validate_database(&db) else {
        println!("{}: valid", input.display());
        return Ok(());
    };

    if !summary {
        for e in &errors {
            eprintln!("{}: {e}", input.display());
        }
    }

    println!(
        "{}: {} validation error{}",
        input.display(),
        errors.len(),
        if errors.len() == 1 { "" } else { "s" }
    );

    bail!(
        "{} validation error{} in {}",
        errors.len(),
        if errors.len() == 1 { "" } else { "s" },
        input.display()
    );
}
