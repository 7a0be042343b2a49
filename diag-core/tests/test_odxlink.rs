mod common;

use common::{base_layer, id, link};
use diag_core::odxlink::{
    DopId, LinkError, LinkKind, LinkTarget, OdxLinkDatabaseBuilder, RefDoc, TableId,
};
use diag_core::{
    DataObjectProperty, Database, DiagLayer, DiagLayerType, DocFragment, OdxError, OdxLinkId,
    OdxLinkRef, Parameter, TableKeyLinkage,
};
use pretty_assertions::assert_eq;

fn table_target() -> LinkTarget {
    let db = Database::load(vec![base_layer()]).unwrap();
    LinkTarget::Table(db.resolve::<TableId>(&link("TAB.modes")).unwrap())
}

#[test]
fn test_every_registered_id_resolves() {
    let db = Database::load(vec![base_layer()]).unwrap();
    for local in ["BV.base", "DOP.uint8", "TAB.modes", "TAB.modes.two", "STRUCT.x", "TK.mode"] {
        let target = db.odxlinks().resolve_target(&link(local)).unwrap();
        assert!(db.odxlinks().contains(&id(local)), "{local} -> {target:?}");
        assert_eq!(db.odxlinks().get(&id(local)), Some(target));
    }

    let elsewhere = OdxLinkId::new("DOP.uint8", DocFragment::container("Other"));
    assert!(!db.odxlinks().contains(&elsewhere));
    assert_eq!(db.odxlinks().get(&elsewhere), None);
    assert_eq!(db.odxlinks().get(&id("DOP.missing")), None);
}

#[test]
fn test_explicit_docref_searches_only_that_document() {
    let shared = DocFragment::container("Shared");
    let mut builder = OdxLinkDatabaseBuilder::new();
    let target = table_target();
    builder
        .register(&OdxLinkId::new("T1", shared.clone()), target)
        .unwrap();
    let links = builder.finish();

    let explicit = OdxLinkRef::in_fragment("T1", shared);
    assert_eq!(links.resolve_target(&explicit).unwrap(), target);

    let wrong_doc = OdxLinkRef::in_fragment("T1", DocFragment::container("Other"));
    assert!(matches!(
        links.resolve_target(&wrong_doc),
        Err(LinkError::NotFound { .. })
    ));
}

#[test]
fn test_missing_docref_falls_back_to_unique_match() {
    let target = table_target();
    let mut builder = OdxLinkDatabaseBuilder::new();
    builder
        .register(&OdxLinkId::new("T1", DocFragment::container("Shared")), target)
        .unwrap();
    let links = builder.finish();

    let from_source = OdxLinkRef::from_attributes("T1", None, None, &DocFragment::container("Ecu"));
    assert!(matches!(from_source.ref_doc, RefDoc::Source(_)));
    assert_eq!(links.resolve_target(&from_source).unwrap(), target);
}

#[test]
fn test_fallback_with_several_matches_is_ambiguous() {
    let target = table_target();
    let mut builder = OdxLinkDatabaseBuilder::new();
    for doc in ["A", "B"] {
        builder
            .register(&OdxLinkId::new("T1", DocFragment::container(doc)), target)
            .unwrap();
    }
    let links = builder.finish();

    let r = OdxLinkRef::from_attributes("T1", None, None, &DocFragment::container("Ecu"));
    match links.resolve_target(&r) {
        Err(LinkError::Ambiguous { candidates, .. }) => {
            assert_eq!(candidates, vec!["A".to_owned(), "B".to_owned()]);
        }
        other => panic!("unexpected result: {other:?}"),
    }

    // an exact hit in the source document wins
    let in_a = OdxLinkRef::from_attributes("T1", None, None, &DocFragment::container("A"));
    assert_eq!(links.resolve_target(&in_a).unwrap(), target);
}

#[test]
fn test_duplicate_id_is_rejected() {
    let layer = base_layer().with_dop(DataObjectProperty::identical_uint(id("DOP.uint8"), "again", 8));
    let err = Database::load(vec![layer]).unwrap_err();
    match err {
        OdxError::Link { source: LinkError::DuplicateId { id: dup, first, second }, .. } => {
            assert_eq!(dup, id("DOP.uint8"));
            assert_eq!(first, LinkKind::Dop);
            assert_eq!(second, LinkKind::Dop);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_resolve_checks_kind() {
    let db = Database::load(vec![base_layer()]).unwrap();
    let err = db.resolve::<DopId>(&link("TAB.modes")).unwrap_err();
    assert!(matches!(
        err,
        LinkError::TypeMismatch { expected: LinkKind::Dop, found: LinkKind::Table, .. }
    ));
}

#[test]
fn test_unresolvable_reference_fails_load() {
    let layer = DiagLayer::new(id("BV.x"), "X", DiagLayerType::BaseVariant).with_structure(
        common::request(
            "REQ.x",
            "x",
            vec![
                Parameter::table_key("k", id("TK.x"), TableKeyLinkage::table(link("TAB.nowhere")))
                    .unwrap(),
            ],
        ),
    );
    let err = Database::load(vec![layer]).unwrap_err();
    assert!(matches!(
        err,
        OdxError::Link { source: LinkError::NotFound { .. }, .. }
    ));
}

#[test]
fn test_bit_position_beyond_byte_fails_load() {
    let layer = base_layer().with_structure(common::request(
        "REQ.bits",
        "bits",
        vec![common::value("v", "DOP.uint8").at_byte(0).at_bit(200)],
    ));
    let err = Database::load(vec![layer]).unwrap_err();
    assert!(matches!(
        err,
        OdxError::InvalidBitPosition { ref param, bit_position: 200 } if param == "v"
    ));

    let layer = base_layer().with_structure(common::request(
        "REQ.bits",
        "bits",
        vec![common::value("v", "DOP.uint8").at_byte(0).at_bit(7)],
    ));
    let db = Database::load(vec![layer]).unwrap();
    let msg = db
        .layer("Base")
        .unwrap()
        .encode_request("bits", &common::values(r#"{"v": 1}"#))
        .unwrap();
    assert_eq!(msg, vec![0x00, 0x80]);
}

#[test]
fn test_table_key_requires_linkage() {
    let err = Parameter::table_key("k", id("TK.k"), TableKeyLinkage::default()).unwrap_err();
    assert!(matches!(err, OdxError::MissingTableLinkage { param } if param == "k"));
}

#[test]
fn test_row_ref_alone_determines_table() {
    let layer = base_layer().with_structure(common::request(
        "REQ.byrow",
        "by_row",
        vec![
            common::sid(0x40),
            Parameter::table_key("key", id("TK.byrow"), TableKeyLinkage::row(link("TAB.modes.one")))
                .unwrap(),
            common::table_struct_snref("data", "key").at_byte(1),
        ],
    ));
    let db = Database::load(vec![layer]).unwrap();
    let base = db.layer("Base").unwrap();
    let msg = base
        .encode_request("by_row", &common::values(r#"{"data": {"x": 9}}"#))
        .unwrap();
    assert_eq!(msg, vec![0x40, 0x09]);
}
