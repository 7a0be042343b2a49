use diag_core::{OdxError, PhysicalValue};
use diag_core::odxlink::LinkError;
use diag_odx::pdx_reader::{PdxReadError, read_pdx_file, read_pdx_from_reader};
use std::collections::BTreeMap;
use std::io::{Cursor, Write};

fn shared_odx() -> &'static str {
    include_str!("../../test-fixtures/odx/shared_tables.odx")
}

fn consumer_odx() -> &'static str {
    include_str!("../../test-fixtures/odx/shared_consumer.odx")
}

fn create_pdx_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
    let buf = Vec::new();
    let cursor = Cursor::new(buf);
    let mut zip = zip::ZipWriter::new(cursor);
    let options =
        zip::write::SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

    for (name, content) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }

    let cursor = zip.finish().unwrap();
    cursor.into_inner()
}

#[test]
fn test_pdx_links_references_across_entries() {
    let bytes = create_pdx_bytes(&[("Lamp.odx", consumer_odx()), ("Shared.odx", shared_odx())]);
    let db = read_pdx_from_reader(Cursor::new(bytes)).unwrap();
    let lamp = db.layer("lamp").unwrap();
    let values = BTreeMap::from([("level".to_owned(), PhysicalValue::Integer(258))]);
    assert_eq!(lamp.encode_request("paint_red", &values).unwrap(), vec![0x3C, 0x02, 0x01]);
}

#[test]
fn test_pdx_skips_non_odx_files() {
    let bytes = create_pdx_bytes(&[
        ("Shared.odx", shared_odx()),
        ("README.txt", "not an ODX file"),
        ("data.xml", "<root/>"),
    ]);
    let db = read_pdx_from_reader(Cursor::new(bytes)).unwrap();
    assert!(db.layer("colors_lib").is_some());
}

#[test]
fn test_pdx_with_no_odx_files_errors() {
    let bytes = create_pdx_bytes(&[("README.txt", "no ODX here")]);
    let result = read_pdx_from_reader(Cursor::new(bytes));
    assert!(result.is_err());
    assert!(
        result.unwrap_err().to_string().contains("no ODX files"),
        "should report no ODX files found"
    );
}

#[test]
fn test_pdx_with_same_document_twice_reports_duplicate_ids() {
    let bytes = create_pdx_bytes(&[("A.odx", shared_odx()), ("B.odx", shared_odx())]);
    let err = read_pdx_from_reader(Cursor::new(bytes)).unwrap_err();
    assert!(
        matches!(
            err,
            PdxReadError::Link(OdxError::Link { source: LinkError::DuplicateId { .. }, .. })
        ),
        "unexpected error: {err}"
    );
}

#[test]
fn test_pdx_with_comparam_spec_skipped() {
    let comparam_xml = include_str!("../../test-fixtures/odx/comparams.odx");

    let bytes = create_pdx_bytes(&[("comparam.odx", comparam_xml), ("Shared.odx", shared_odx())]);
    let result = read_pdx_from_reader(Cursor::new(bytes));
    assert!(
        result.is_ok(),
        "PDX with COMPARAM-SPEC should not fail: {:?}",
        result.err()
    );

    let db = result.unwrap();
    assert_eq!(db.layers().count(), 1);
}

#[test]
fn test_read_pdx_file_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lamp.pdx");
    std::fs::write(
        &path,
        create_pdx_bytes(&[("Lamp.odx", consumer_odx()), ("Shared.odx", shared_odx())]),
    )
    .unwrap();

    let db = read_pdx_file(&path).unwrap();
    assert_eq!(db.layers().count(), 2);
}

#[test]
fn test_read_missing_pdx_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = read_pdx_file(&dir.path().join("absent.pdx")).unwrap_err();
    assert!(matches!(err, PdxReadError::Io(_)));
}
