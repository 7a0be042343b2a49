use anyhow::{Context, Result};
use std::path::Path;

use crate::Format;

pub fn run_info(input: &Path, verbose: bool) -> Result<()> {
    let in_fmt = crate::detect_format(input).context("input file")?;
    let db = crate::load_database(input, verbose)?;

    let format_str = match in_fmt {
        Format::Odx => "ODX",
        Format::Pdx => "PDX",
    };

    println!("File:        {}", input.display());
    println!("Format:      {format_str}");
    println!("Layers:      {}", db.layers().count());

    for layer in db.layers() {
        let parents: Vec<&str> = layer.parents().map(|p| p.short_name()).collect();
        println!();
        println!("{} ({})", layer.short_name(), layer.layer_type().as_odx());
        if !parents.is_empty() {
            println!("  Parents:   {}", parents.join(", "));
        }

        for (name, id) in layer.scope().tables() {
            let table = db.table(id);
            let key_dop = table
                .key_dop()
                .map_or("-", |dop| db.dop(dop).short_name.as_str());
            println!(
                "  Table:     {name} ({} rows, key DOP {key_dop})",
                table.rows.len()
            );
        }

        let requests: Vec<&str> = layer.scope().requests().map(|(name, _)| name).collect();
        if !requests.is_empty() {
            println!("  Requests:  {}", requests.join(", "));
        }
        let responses: Vec<&str> = layer.scope().responses().map(|(name, _)| name).collect();
        if !responses.is_empty() {
            println!("  Responses: {}", responses.join(", "));
        }
    }

    Ok(())
}
