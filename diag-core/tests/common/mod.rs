#![allow(dead_code)]

use diag_core::parameters::{
    CodedConstParameter, MatchingRequestParameter, TableStructParameter, ValueParameter,
};
use diag_core::{
    DataObjectProperty, DataType, DiagCodedType, DiagLayer, DiagLayerType, DocFragment,
    OdxLinkId, OdxLinkRef, Parameter, ParameterKind, ParameterValues, ParentRef, PhysicalValue,
    Structure, StructureKind, Table, TableKeyLinkage, TableRow,
};

pub fn doc() -> DocFragment {
    DocFragment::container("Somersault")
}

pub fn id(local: &str) -> OdxLinkId {
    OdxLinkId::new(local, doc())
}

pub fn link(local: &str) -> OdxLinkRef {
    OdxLinkRef::from_attributes(local, None, None, &doc())
}

pub fn values(json: &str) -> ParameterValues {
    serde_json::from_str(json).unwrap()
}

pub fn sid(value: u32) -> Parameter {
    Parameter::new(
        "sid",
        ParameterKind::CodedConst(CodedConstParameter::new(
            DiagCodedType::standard_length(DataType::AUint32, 8),
            value,
        )),
    )
    .at_byte(0)
}

pub fn value(name: &str, dop: &str) -> Parameter {
    Parameter::new(name, ParameterKind::Value(ValueParameter::new(link(dop))))
}

pub fn table_struct_ref(name: &str, key: &str) -> Parameter {
    Parameter::new(
        name,
        ParameterKind::TableStruct(TableStructParameter::new(name, Some(link(key)), None).unwrap()),
    )
}

pub fn table_struct_snref(name: &str, key: &str) -> Parameter {
    Parameter::new(
        name,
        ParameterKind::TableStruct(
            TableStructParameter::new(name, None, Some(key.to_owned())).unwrap(),
        ),
    )
}

pub fn request(local: &str, name: &str, params: Vec<Parameter>) -> Structure {
    params
        .into_iter()
        .fold(Structure::new(id(local), name, StructureKind::Request), Structure::with_parameter)
}

pub fn structure(local: &str, name: &str, params: Vec<Parameter>) -> Structure {
    params.into_iter().fold(
        Structure::new(id(local), name, StructureKind::Structure),
        Structure::with_parameter,
    )
}

/// Base variant with a keyed table `modes`:
///
/// | row   | key | data          |
/// |-------|-----|---------------|
/// | one   | 1   | struct_x      |
/// | two   | 2   | struct_y      |
/// | three | 3   | DOP uint16    |
/// | four  | 4   | nothing       |
pub fn base_layer() -> DiagLayer {
    let modes = Table::new(id("TAB.modes"), "modes")
        .with_key_dop(link("DOP.uint8"))
        .with_row(TableRow::new(id("TAB.modes.one"), "one", "1").with_structure(link("STRUCT.x")))
        .with_row(TableRow::new(id("TAB.modes.two"), "two", "2").with_structure(link("STRUCT.y")))
        .with_row(TableRow::new(id("TAB.modes.three"), "three", "3").with_dop(link("DOP.uint16")))
        .with_row(TableRow::new(id("TAB.modes.four"), "four", "4"));
    let dups = Table::new(id("TAB.dups"), "dups")
        .with_key_dop(link("DOP.uint8"))
        .with_row(TableRow::new(id("TAB.dups.a"), "a", 5))
        .with_row(TableRow::new(id("TAB.dups.b"), "b", 5));
    let no_key_dop = Table::new(id("TAB.nokeydop"), "nokeydop")
        .with_row(TableRow::new(id("TAB.nokeydop.z"), "z", "7"));

    DiagLayer::new(id("BV.base"), "Base", DiagLayerType::BaseVariant)
        .with_dop(DataObjectProperty::identical_uint(id("DOP.uint8"), "uint8", 8))
        .with_dop(DataObjectProperty::identical_uint(id("DOP.uint16"), "uint16", 16))
        .with_table(modes)
        .with_table(dups)
        .with_table(no_key_dop)
        .with_structure(structure("STRUCT.x", "struct_x", vec![value("x", "DOP.uint8")]))
        .with_structure(structure(
            "STRUCT.y",
            "struct_y",
            vec![value("y_hi", "DOP.uint8"), value("y_lo", "DOP.uint8")],
        ))
        .with_structure(request(
            "REQ.set",
            "set_mode",
            vec![
                sid(0x2E),
                Parameter::table_key("mode", id("TK.mode"), TableKeyLinkage::table(link("TAB.modes")))
                    .unwrap()
                    .at_byte(1),
                table_struct_ref("data", "TK.mode").at_byte(2),
            ],
        ))
        .with_structure(request(
            "REQ.fixed",
            "fixed_mode",
            vec![
                sid(0x31),
                Parameter::table_key(
                    "key",
                    id("TK.fixed"),
                    TableKeyLinkage::table_short_name("modes").with_row_short_name("two"),
                )
                .unwrap(),
                table_struct_snref("data", "key").at_byte(1),
            ],
        ))
        .with_structure(request(
            "REQ.dup",
            "dup_mode",
            vec![
                sid(0x32),
                Parameter::table_key("mode", id("TK.dup"), TableKeyLinkage::table(link("TAB.dups")))
                    .unwrap()
                    .at_byte(1),
            ],
        ))
        .with_structure(request(
            "REQ.nokey",
            "nokey_mode",
            vec![
                sid(0x33),
                Parameter::table_key(
                    "mode",
                    id("TK.nokey"),
                    TableKeyLinkage::table(link("TAB.nokeydop")),
                )
                .unwrap()
                .at_byte(1),
            ],
        ))
        .with_structure(request(
            "REQ.order",
            "bad_order",
            vec![
                sid(0x34),
                table_struct_ref("data", "TK.order").at_byte(2),
                Parameter::table_key("mode", id("TK.order"), TableKeyLinkage::table(link("TAB.modes")))
                    .unwrap()
                    .at_byte(1),
            ],
        ))
        .with_structure(
            Structure::new(id("RESP.set"), "set_mode_resp", StructureKind::PositiveResponse)
                .with_parameter(sid(0x6E))
                .with_parameter(
                    Parameter::new(
                        "echo",
                        ParameterKind::MatchingRequest(MatchingRequestParameter::new(1, 1)),
                    )
                    .at_byte(1),
                ),
        )
}

/// ECU variant inheriting from `Base` that overrides `modes` with swapped
/// row structures.
pub fn variant_layer() -> DiagLayer {
    let modes = Table::new(id("TAB.modes_v"), "modes")
        .with_key_dop(link("DOP.uint8"))
        .with_row(TableRow::new(id("TAB.modes_v.one"), "one", 1).with_structure(link("STRUCT.y")))
        .with_row(TableRow::new(id("TAB.modes_v.two"), "two", 2).with_structure(link("STRUCT.x")));
    DiagLayer::new(id("EV.variant"), "Variant", DiagLayerType::EcuVariant)
        .with_parent(ParentRef::new(link("BV.base")))
        .with_table(modes)
}

pub fn int(v: i64) -> PhysicalValue {
    PhysicalValue::Integer(v)
}
