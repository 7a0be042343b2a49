use crate::parser::{OdxParseError, read_layers};
use diag_core::Database;
use std::io::Read;
use std::path::Path;

/// Errors that can occur reading a PDX file.
#[derive(Debug, thiserror::Error)]
pub enum PdxReadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("no ODX files found in PDX archive")]
    NoOdxFiles,
    #[error("ODX parse error in '{file}': {source}")]
    OdxParse { file: String, source: OdxParseError },
    #[error("linking PDX content failed: {0}")]
    Link(#[from] diag_core::OdxError),
}

/// Read a PDX file (ZIP archive containing ODX files) into one database.
///
/// Every .odx file inside the archive becomes a document fragment of the
/// same database, so references between them resolve.
pub fn read_pdx_file(path: &Path) -> Result<Database, PdxReadError> {
    let file = std::fs::File::open(path)?;
    read_pdx_from_reader(file)
}

/// Read a PDX from any reader (for testing with in-memory data).
pub fn read_pdx_from_reader<R: Read + std::io::Seek>(reader: R) -> Result<Database, PdxReadError> {
    let mut archive = zip::ZipArchive::new(reader)?;
    let mut layers = Vec::new();
    let mut found_odx = false;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let name = entry.name().to_string();

        let lower = name.to_lowercase();
        #[allow(clippy::case_sensitive_file_extension_comparisons)]
        if !lower.ends_with(".odx") && !lower.contains(".odx-") {
            continue;
        }
        found_odx = true;

        let mut xml = String::new();
        entry.read_to_string(&mut xml)?;

        log::info!("Parsing ODX from PDX entry: {}", name);
        match read_layers(&xml) {
            Ok(found) => layers.extend(found),
            Err(OdxParseError::MissingElement(ref elem)) if elem == "DIAG-LAYER-CONTAINER" => {
                // COMPARAM-SPEC, COMPARAM-SUBSET etc. carry no layers
                log::info!(
                    "Skipping non-DLC ODX entry '{}' (no DIAG-LAYER-CONTAINER)",
                    name
                );
            }
            Err(e) => {
                return Err(PdxReadError::OdxParse {
                    file: name.clone(),
                    source: e,
                });
            }
        }
    }

    if !found_odx {
        return Err(PdxReadError::NoOdxFiles);
    }
    Ok(Database::load(layers)?)
}
