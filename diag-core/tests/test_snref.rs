mod common;

use common::{base_layer, id, int, link, values, variant_layer};
use diag_core::{Database, DiagLayer, DiagLayerType, OdxError, ParentRef, PhysicalValue, TableKeyLinkage};
use diag_core::{Parameter, Structure, StructureKind};
use pretty_assertions::assert_eq;

#[test]
fn test_inherited_snref_resolves_against_inheriting_layer() {
    let db = Database::load(vec![base_layer(), variant_layer()]).unwrap();

    // In Base, row "two" of Base.modes selects struct_y
    let base = db.layer("Base").unwrap();
    let msg = base
        .encode_request("fixed_mode", &values(r#"{"data": {"y_hi": 1, "y_lo": 2}}"#))
        .unwrap();
    assert_eq!(msg, vec![0x31, 0x01, 0x02]);

    // In Variant, row "two" of Variant.modes selects struct_x
    let variant = db.layer("Variant").unwrap();
    let msg = variant
        .encode_request("fixed_mode", &values(r#"{"data": {"x": 7}}"#))
        .unwrap();
    assert_eq!(msg, vec![0x31, 0x07]);
    let decoded = variant.decode("fixed_mode", &msg).unwrap();
    assert_eq!(decoded["key"], int(2));
    assert_eq!(decoded["data"], PhysicalValue::Structure(values(r#"{"x": 7}"#)));
}

#[test]
fn test_odxlink_reference_ignores_layer_scope() {
    let db = Database::load(vec![base_layer(), variant_layer()]).unwrap();
    let variant = db.layer("Variant").unwrap();
    // set_mode references Base.modes by ID, so Variant's override does not apply
    let msg = variant
        .encode_request("set_mode", &values(r#"{"mode": 1, "data": {"x": 3}}"#))
        .unwrap();
    assert_eq!(msg, vec![0x2E, 0x01, 0x03]);
}

#[test]
fn test_scope_overrides_by_short_name() {
    let db = Database::load(vec![base_layer(), variant_layer()]).unwrap();
    let base = db.layer("Base").unwrap();
    let variant = db.layer("Variant").unwrap();
    assert_eq!(base.table("modes").unwrap().odx_id, id("TAB.modes"));
    assert_eq!(variant.table("modes").unwrap().odx_id, id("TAB.modes_v"));
    // inherited objects stay visible
    assert!(variant.table("dups").is_some());
    assert!(variant.dop("uint8").is_some());
    assert_eq!(
        variant.parents().map(|p| p.short_name()).collect::<Vec<_>>(),
        vec!["Base"]
    );
}

#[test]
fn test_not_inherited_table_hides_it() {
    let mut parent = ParentRef::new(link("BV.base"));
    parent.not_inherited_tables.push("modes".to_owned());
    let child = DiagLayer::new(id("EV.child"), "Child", DiagLayerType::EcuVariant).with_parent(parent);

    // fixed_mode is inherited and names "modes" by short name, which Child no longer sees
    let err = Database::load(vec![base_layer(), child]).unwrap_err();
    match err {
        OdxError::UnknownShortName { kind, name, layer } => {
            assert_eq!(kind, "table");
            assert_eq!(name, "modes");
            assert_eq!(layer, "Child");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_row_snref_without_table_fails() {
    let layer = base_layer().with_structure(
        Structure::new(id("REQ.orphan"), "orphan", StructureKind::Request).with_parameter(
            Parameter::table_key(
                "key",
                id("TK.orphan"),
                TableKeyLinkage::default().with_row_short_name("two"),
            )
            .unwrap(),
        ),
    );
    let err = Database::load(vec![layer]).unwrap_err();
    assert!(matches!(err, OdxError::TableRowWithoutTable { row, .. } if row == "two"));
}

#[test]
fn test_unknown_row_snref_fails() {
    let layer = base_layer().with_structure(
        Structure::new(id("REQ.badrow"), "bad_row", StructureKind::Request).with_parameter(
            Parameter::table_key(
                "key",
                id("TK.badrow"),
                TableKeyLinkage::table_short_name("modes").with_row_short_name("seven"),
            )
            .unwrap(),
        ),
    );
    let err = Database::load(vec![layer]).unwrap_err();
    assert!(matches!(err, OdxError::UnknownShortName { kind: "table row", .. }));
}

#[test]
fn test_circular_parents_do_not_hang() {
    let a = DiagLayer::new(id("L.a"), "A", DiagLayerType::BaseVariant)
        .with_parent(ParentRef::new(link("L.b")));
    let b = DiagLayer::new(id("L.b"), "B", DiagLayerType::EcuVariant)
        .with_parent(ParentRef::new(link("L.a")));
    let db = Database::load(vec![a, b]).unwrap();
    assert_eq!(db.layers().count(), 2);
}
