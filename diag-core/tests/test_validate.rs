mod common;

use common::{base_layer, id, link};
use diag_core::{Database, DiagLayer, DiagLayerType, Table, TableRow, ValidationError, validate_database};

#[test]
fn test_fixture_problems_are_reported() {
    let db = Database::load(vec![base_layer()]).unwrap();
    let errors = validate_database(&db).unwrap_err();

    assert!(errors.contains(&ValidationError::DuplicateTableKey(
        "dups".into(),
        "a".into(),
        "b".into()
    )));
    assert!(errors.contains(&ValidationError::TableStructBeforeKey(
        "Base.bad_order".into(),
        "data".into(),
        "mode".into()
    )));
    assert!(errors.contains(&ValidationError::MissingKeyDop(
        "Base.nokey_mode".into(),
        "mode".into(),
        "nokeydop".into()
    )));
    assert_eq!(errors.len(), 3, "{errors:?}");
}

#[test]
fn test_clean_layer_validates() {
    let layer = DiagLayer::new(id("BV.clean"), "Clean", DiagLayerType::BaseVariant)
        .with_dop(diag_core::DataObjectProperty::identical_uint(id("DOP.k"), "k", 8))
        .with_table(
            Table::new(id("TAB.t"), "t")
                .with_key_dop(link("DOP.k"))
                .with_row(TableRow::new(id("TAB.t.a"), "a", 1))
                .with_row(TableRow::new(id("TAB.t.b"), "b", 2)),
        );
    let db = Database::load(vec![layer]).unwrap();
    assert!(validate_database(&db).is_ok());
}
