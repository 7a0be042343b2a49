use diag_core::odxlink::{LinkError, RefDoc};
use diag_core::{DiagLayerType, OdxError, ParameterKind, PhysicalValue};
use diag_odx::{OdxParseError, parse_odx, parse_odx_documents, read_layers};
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;

fn somersault_odx() -> &'static str {
    include_str!("../../test-fixtures/odx/somersault_tables.odx")
}

fn shared_odx() -> &'static str {
    include_str!("../../test-fixtures/odx/shared_tables.odx")
}

fn consumer_odx() -> &'static str {
    include_str!("../../test-fixtures/odx/shared_consumer.odx")
}

fn values(entries: &[(&str, PhysicalValue)]) -> BTreeMap<String, PhysicalValue> {
    entries
        .iter()
        .map(|(name, value)| ((*name).to_owned(), value.clone()))
        .collect()
}

#[test]
fn test_layers_are_mapped_with_their_types() {
    let layers = read_layers(somersault_odx()).unwrap();
    let names: Vec<(&str, DiagLayerType)> = layers
        .iter()
        .map(|l| (l.short_name.as_str(), l.layer_type))
        .collect();
    assert_eq!(
        names,
        vec![
            ("somersault", DiagLayerType::BaseVariant),
            ("somersault_lazy", DiagLayerType::EcuVariant),
        ]
    );
    let base = &layers[0];
    assert_eq!(base.long_name.as_deref(), Some("Somersault base variant"));
    assert_eq!(base.odx_id.doc_fragment.doc_name, "Somersault");
}

#[test]
fn test_table_attributes_are_read() {
    let db = parse_odx(somersault_odx()).unwrap();
    let base = db.layer("somersault").unwrap();
    let modes = base.table("modes").unwrap();
    assert_eq!(modes.semantic.as_deref(), Some("MODES"));
    assert_eq!(modes.key_label.as_deref(), Some("mode"));
    assert_eq!(modes.struct_label.as_deref(), Some("params"));

    let keys: Vec<&PhysicalValue> = modes.rows.iter().map(|r| &r.key).collect();
    assert_eq!(
        keys,
        vec![
            &PhysicalValue::Integer(1),
            &PhysicalValue::Integer(2),
            &PhysicalValue::Integer(3)
        ]
    );
    assert_eq!(modes.rows[1].semantic.as_deref(), Some("HEATING"));
}

#[test]
fn test_table_key_parameter_links() {
    let layers = read_layers(somersault_odx()).unwrap();
    let set_mode = layers[0]
        .structures
        .iter()
        .find(|s| s.short_name == "set_mode")
        .unwrap();
    let ParameterKind::TableKey(key) = &set_mode.parameter("mode").unwrap().kind else {
        panic!("mode should be a table key");
    };
    assert_eq!(key.odx_id.local_id, "REQ.set_mode.mode");
    let table_ref = key.table_ref.as_ref().unwrap();
    assert_eq!(table_ref.ref_id, "TAB.modes");
    assert!(matches!(&table_ref.ref_doc, RefDoc::Source(doc) if doc.doc_name == "Somersault"));
}

#[test]
fn test_encode_and_decode_through_table_structure() {
    let db = parse_odx(somersault_odx()).unwrap();
    let base = db.layer("somersault").unwrap();

    let params = PhysicalValue::Structure(values(&[("height", 9.into())]));
    let msg = base
        .encode_request("set_mode", &values(&[("mode", 1.into()), ("params", params)]))
        .unwrap();
    // count falls back to its physical default
    assert_eq!(msg, vec![0x2E, 0x01, 0x09, 0x01]);

    let decoded = base.decode("set_mode", &msg).unwrap();
    assert_eq!(decoded["mode"], PhysicalValue::Integer(1));
    assert_eq!(
        decoded["params"],
        PhysicalValue::Structure(values(&[("height", 9.into()), ("count", 1.into())]))
    );
}

#[test]
fn test_linear_row_dop() {
    let db = parse_odx(somersault_odx()).unwrap();
    let base = db.layer("somersault").unwrap();
    let msg = base
        .encode_request("set_mode", &values(&[("mode", 2.into()), ("params", (-20).into())]))
        .unwrap();
    assert_eq!(msg, vec![0x2E, 0x02, 0x14]);
    let decoded = base.decode("set_mode", &msg).unwrap();
    assert_eq!(decoded["params"], PhysicalValue::Integer(-20));
}

#[test]
fn test_matching_request_response() {
    let db = parse_odx(somersault_odx()).unwrap();
    let base = db.layer("somersault").unwrap();
    let response = base
        .encode_response("set_mode_pos", &BTreeMap::new(), &[0x2E, 0x03])
        .unwrap();
    assert_eq!(response, vec![0x6E, 0x03]);
}

#[test]
fn test_inherited_request_uses_variant_table() {
    let db = parse_odx(somersault_odx()).unwrap();
    let jump = PhysicalValue::Structure(values(&[("height", 5.into()), ("count", 2.into())]));

    let base = db.layer("somersault").unwrap();
    let msg = base.encode_request("do_jump", &values(&[("data", jump)])).unwrap();
    assert_eq!(msg, vec![0x31, 0x05, 0x02]);

    // the variant's own "modes" table points row "jump" at a padded structure
    let lazy = db.layer("somersault_lazy").unwrap();
    let data = PhysicalValue::Structure(values(&[("height", 5.into())]));
    let msg = lazy.encode_request("do_jump", &values(&[("data", data)])).unwrap();
    assert_eq!(msg, vec![0x31, 0x05, 0x00]);
}

#[test]
fn test_cross_document_references() {
    let db = parse_odx_documents(&[consumer_odx(), shared_odx()]).unwrap();
    let lamp = db.layer("lamp").unwrap();

    // explicit DOCREF
    let msg = lamp
        .encode_request("paint", &values(&[("color", 16.into()), ("level", 500.into())]))
        .unwrap();
    assert_eq!(msg, vec![0x3B, 0x10, 0xF4, 0x01]);
    let decoded = lamp.decode("paint", &msg).unwrap();
    assert_eq!(decoded["level"], PhysicalValue::Integer(500));

    // no DOCREF: found in the only document that defines the row
    let msg = lamp
        .encode_request("paint_red", &values(&[("level", 258.into())]))
        .unwrap();
    assert_eq!(msg, vec![0x3C, 0x02, 0x01]);
}

#[test]
fn test_missing_referenced_document_fails() {
    let err = parse_odx(consumer_odx()).unwrap_err();
    assert!(
        matches!(
            err,
            OdxParseError::Model(OdxError::Link { source: LinkError::NotFound { .. }, .. })
        ),
        "unexpected error: {err}"
    );
}

#[test]
fn test_documents_without_container_are_skipped() {
    let comparams = include_str!("../../test-fixtures/odx/comparams.odx");
    let db = parse_odx_documents(&[comparams, shared_odx()]).unwrap();
    assert_eq!(db.layers().count(), 1);

    let err = parse_odx(comparams).unwrap_err();
    assert!(matches!(err, OdxParseError::MissingElement(ref e) if e == "DIAG-LAYER-CONTAINER"));
}

#[test]
fn test_unsupported_parameter_type() {
    let xml = r#"<ODX xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <DIAG-LAYER-CONTAINER ID="DLC.x">
    <SHORT-NAME>X</SHORT-NAME>
    <BASE-VARIANTS>
      <BASE-VARIANT ID="BV.x">
        <SHORT-NAME>x</SHORT-NAME>
        <REQUESTS>
          <REQUEST ID="REQ.x">
            <SHORT-NAME>x</SHORT-NAME>
            <PARAMS>
              <PARAM xsi:type="DYNAMIC"><SHORT-NAME>dyn</SHORT-NAME></PARAM>
            </PARAMS>
          </REQUEST>
        </REQUESTS>
      </BASE-VARIANT>
    </BASE-VARIANTS>
  </DIAG-LAYER-CONTAINER>
</ODX>"#;
    let err = read_layers(xml).unwrap_err();
    assert!(matches!(
        err,
        OdxParseError::UnsupportedParameter { ref param, ref xsi_type } if param == "dyn" && xsi_type == "DYNAMIC"
    ));
}

#[test]
fn test_table_key_without_linkage_is_rejected() {
    let xml = r#"<ODX xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <DIAG-LAYER-CONTAINER ID="DLC.x">
    <SHORT-NAME>X</SHORT-NAME>
    <BASE-VARIANTS>
      <BASE-VARIANT ID="BV.x">
        <SHORT-NAME>x</SHORT-NAME>
        <REQUESTS>
          <REQUEST ID="REQ.x">
            <SHORT-NAME>x</SHORT-NAME>
            <PARAMS>
              <PARAM xsi:type="TABLE-KEY" ID="REQ.x.k"><SHORT-NAME>k</SHORT-NAME></PARAM>
            </PARAMS>
          </REQUEST>
        </REQUESTS>
      </BASE-VARIANT>
    </BASE-VARIANTS>
  </DIAG-LAYER-CONTAINER>
</ODX>"#;
    let err = read_layers(xml).unwrap_err();
    assert!(matches!(
        err,
        OdxParseError::Model(OdxError::MissingTableLinkage { ref param }) if param == "k"
    ));
}
