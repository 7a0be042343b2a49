use anyhow::{Context, Result, anyhow, bail};
use diag_core::ParameterValues;
use diag_core::odxtypes::{format_hex, parse_hex};
use rayon::prelude::*;
use std::path::Path;
use std::time::Instant;

pub fn run_encode(
    input: &Path,
    layer: &str,
    request: &str,
    values: Option<&str>,
    values_file: Option<&Path>,
    verbose: bool,
) -> Result<()> {
    let text = match (values, values_file) {
        (Some(text), _) => text.to_owned(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        (None, None) => "{}".to_owned(),
    };
    let values: ParameterValues =
        serde_json::from_str(&text).context("parameter values must be a JSON object")?;

    let db = crate::load_database(input, verbose)?;
    let layer_ref = db
        .layer(layer)
        .ok_or_else(|| anyhow!("no layer named '{layer}' in {}", input.display()))?;

    let message = layer_ref
        .encode_request(request, &values)
        .with_context(|| format!("encoding {layer}.{request}"))?;
    println!("{}", format_hex(&message));
    Ok(())
}

pub fn run_decode(
    input: &Path,
    layer: &str,
    message: &str,
    pdus: &[String],
    verbose: bool,
) -> Result<()> {
    let db = crate::load_database(input, verbose)?;
    let layer_ref = db
        .layer(layer)
        .ok_or_else(|| anyhow!("no layer named '{layer}' in {}", input.display()))?;
    if layer_ref.message(message).is_none() {
        bail!("layer '{layer}' has no message named '{message}'");
    }

    let start = Instant::now();
    let decoded = pdus
        .par_iter()
        .map(|hex| {
            let bytes = parse_hex(hex).ok_or_else(|| anyhow!("'{hex}' is not a hex string"))?;
            layer_ref
                .decode(message, &bytes)
                .with_context(|| format!("decoding {hex} as {layer}.{message}"))
        })
        .collect::<Result<Vec<ParameterValues>>>()?;

    if verbose {
        eprintln!(
            "Decoded {} messages in {:.1}ms",
            decoded.len(),
            start.elapsed().as_secs_f64() * 1000.0
        );
    }

    let json = if let [single] = decoded.as_slice() {
        serde_json::to_string_pretty(single)?
    } else {
        serde_json::to_string_pretty(&decoded)?
    };
    println!("{json}");
    Ok(())
}
