//! ODX XML deserialization model.
//!
//! Serde-deserializable types matching the parts of the ODX 2.2.0 XML
//! structure needed for table-driven message coding. Uses quick-xml with
//! `#[serde(rename = "TAG")]` for ODX element names; unknown elements are
//! ignored.

use serde::Deserialize;

// --- Root ---

#[derive(Debug, Deserialize)]
#[serde(rename = "ODX")]
pub struct Odx {
    #[serde(rename = "@VERSION", alias = "@MODEL-VERSION")]
    pub version: Option<String>,
    #[serde(rename = "DIAG-LAYER-CONTAINER")]
    pub diag_layer_container: Option<DiagLayerContainer>,
}

// --- DiagLayerContainer ---

#[derive(Debug, Deserialize)]
#[serde(rename = "DIAG-LAYER-CONTAINER")]
pub struct DiagLayerContainer {
    #[serde(rename = "@ID")]
    pub id: Option<String>,
    #[serde(rename = "SHORT-NAME")]
    pub short_name: Option<String>,
    #[serde(rename = "LONG-NAME")]
    pub long_name: Option<String>,
    #[serde(rename = "PROTOCOLS")]
    pub protocols: Option<ProtocolsWrapper>,
    #[serde(rename = "FUNCTIONAL-GROUPS")]
    pub functional_groups: Option<FunctionalGroupsWrapper>,
    #[serde(rename = "BASE-VARIANTS")]
    pub base_variants: Option<BaseVariantsWrapper>,
    #[serde(rename = "ECU-VARIANTS")]
    pub ecu_variants: Option<EcuVariantsWrapper>,
    #[serde(rename = "ECU-SHARED-DATAS")]
    pub ecu_shared_datas: Option<EcuSharedDatasWrapper>,
}

// Wrapper types for list containers
#[derive(Debug, Deserialize)]
pub struct BaseVariantsWrapper {
    #[serde(rename = "BASE-VARIANT", default)]
    pub items: Vec<DiagLayerVariant>,
}

#[derive(Debug, Deserialize)]
pub struct EcuVariantsWrapper {
    #[serde(rename = "ECU-VARIANT", default)]
    pub items: Vec<DiagLayerVariant>,
}

#[derive(Debug, Deserialize)]
pub struct EcuSharedDatasWrapper {
    #[serde(rename = "ECU-SHARED-DATA", default)]
    pub items: Vec<DiagLayerVariant>,
}

#[derive(Debug, Deserialize)]
pub struct FunctionalGroupsWrapper {
    #[serde(rename = "FUNCTIONAL-GROUP", default)]
    pub items: Vec<DiagLayerVariant>,
}

#[derive(Debug, Deserialize)]
pub struct ProtocolsWrapper {
    #[serde(rename = "PROTOCOL", default)]
    pub items: Vec<DiagLayerVariant>,
}

// --- DiagLayer (shared across variant types) ---

#[derive(Debug, Deserialize)]
pub struct DiagLayerVariant {
    #[serde(rename = "@ID")]
    pub id: Option<String>,
    #[serde(rename = "SHORT-NAME")]
    pub short_name: Option<String>,
    #[serde(rename = "LONG-NAME")]
    pub long_name: Option<String>,
    #[serde(rename = "DIAG-DATA-DICTIONARY-SPEC")]
    pub diag_data_dictionary_spec: Option<DiagDataDictionarySpec>,
    #[serde(rename = "REQUESTS")]
    pub requests: Option<RequestsWrapper>,
    #[serde(rename = "POS-RESPONSES")]
    pub pos_responses: Option<PosResponsesWrapper>,
    #[serde(rename = "NEG-RESPONSES")]
    pub neg_responses: Option<NegResponsesWrapper>,
    #[serde(rename = "PARENT-REFS")]
    pub parent_refs: Option<ParentRefsWrapper>,
}

#[derive(Debug, Deserialize)]
pub struct RequestsWrapper {
    #[serde(rename = "REQUEST", default)]
    pub items: Vec<OdxBasicStructure>,
}

#[derive(Debug, Deserialize)]
pub struct PosResponsesWrapper {
    #[serde(rename = "POS-RESPONSE", default)]
    pub items: Vec<OdxBasicStructure>,
}

#[derive(Debug, Deserialize)]
pub struct NegResponsesWrapper {
    #[serde(rename = "NEG-RESPONSE", default)]
    pub items: Vec<OdxBasicStructure>,
}

#[derive(Debug, Deserialize)]
pub struct ParentRefsWrapper {
    #[serde(rename = "PARENT-REF", default)]
    pub items: Vec<OdxParentRef>,
}

// --- Requests, responses and structures ---

/// `REQUEST`, `POS-RESPONSE`, `NEG-RESPONSE` and `STRUCTURE` share this
/// shape.
#[derive(Debug, Deserialize)]
pub struct OdxBasicStructure {
    #[serde(rename = "@ID")]
    pub id: Option<String>,
    #[serde(rename = "SHORT-NAME")]
    pub short_name: Option<String>,
    #[serde(rename = "LONG-NAME")]
    pub long_name: Option<String>,
    #[serde(rename = "BYTE-SIZE")]
    pub byte_size: Option<u32>,
    #[serde(rename = "PARAMS")]
    pub params: Option<ParamsWrapper>,
}

// --- Params ---

#[derive(Debug, Deserialize)]
pub struct ParamsWrapper {
    #[serde(rename = "PARAM", default)]
    pub items: Vec<OdxParam>,
}

/// Generic param - uses `xsi:type` attribute for polymorphism.
/// We capture all supported fields and dispatch based on type attr.
#[derive(Debug, Deserialize)]
pub struct OdxParam {
    #[serde(rename = "@xsi:type", alias = "@type")]
    pub xsi_type: Option<String>,
    #[serde(rename = "@ID")]
    pub id: Option<String>,
    #[serde(rename = "@SEMANTIC")]
    pub semantic: Option<String>,
    #[serde(rename = "SHORT-NAME")]
    pub short_name: Option<String>,
    #[serde(rename = "LONG-NAME")]
    pub long_name: Option<String>,
    #[serde(rename = "BYTE-POSITION")]
    pub byte_position: Option<u32>,
    #[serde(rename = "BIT-POSITION")]
    pub bit_position: Option<u32>,
    // VALUE
    #[serde(rename = "DOP-REF")]
    pub dop_ref: Option<OdxRef>,
    #[serde(rename = "DOP-SNREF")]
    pub dop_snref: Option<OdxSnRef>,
    #[serde(rename = "PHYSICAL-DEFAULT-VALUE")]
    pub physical_default_value: Option<String>,
    // CODED-CONST
    #[serde(rename = "CODED-VALUE")]
    pub coded_value: Option<String>,
    #[serde(rename = "DIAG-CODED-TYPE")]
    pub diag_coded_type: Option<OdxDiagCodedType>,
    // RESERVED
    #[serde(rename = "BIT-LENGTH")]
    pub bit_length: Option<u32>,
    // MATCHING-REQUEST-PARAM
    #[serde(rename = "REQUEST-BYTE-POS")]
    pub request_byte_pos: Option<u32>,
    #[serde(rename = "MATCH-BYTE-LENGTH", alias = "BYTE-LENGTH")]
    pub match_byte_length: Option<u32>,
    // TABLE-KEY
    #[serde(rename = "TABLE-REF")]
    pub table_ref: Option<OdxRef>,
    #[serde(rename = "TABLE-SNREF")]
    pub table_snref: Option<OdxSnRef>,
    #[serde(rename = "TABLE-ROW-REF")]
    pub table_row_ref: Option<OdxRef>,
    #[serde(rename = "TABLE-ROW-SNREF")]
    pub table_row_snref: Option<OdxSnRef>,
    // TABLE-STRUCT
    #[serde(rename = "TABLE-KEY-REF")]
    pub table_key_ref: Option<OdxRef>,
    #[serde(rename = "TABLE-KEY-SNREF")]
    pub table_key_snref: Option<OdxSnRef>,
}

// --- DiagDataDictionarySpec ---

#[derive(Debug, Deserialize)]
pub struct DiagDataDictionarySpec {
    #[serde(rename = "DATA-OBJECT-PROPS")]
    pub data_object_props: Option<DataObjectPropsWrapper>,
    #[serde(rename = "STRUCTURES")]
    pub structures: Option<StructuresWrapper>,
    #[serde(rename = "TABLES")]
    pub tables: Option<TablesWrapper>,
}

#[derive(Debug, Deserialize)]
pub struct DataObjectPropsWrapper {
    #[serde(rename = "DATA-OBJECT-PROP", default)]
    pub items: Vec<OdxDataObjectProp>,
}

#[derive(Debug, Deserialize)]
pub struct StructuresWrapper {
    #[serde(rename = "STRUCTURE", default)]
    pub items: Vec<OdxBasicStructure>,
}

#[derive(Debug, Deserialize)]
pub struct TablesWrapper {
    #[serde(rename = "TABLE", default)]
    pub items: Vec<OdxTable>,
}

// --- DataObjectProp (DOP) ---

#[derive(Debug, Deserialize)]
pub struct OdxDataObjectProp {
    #[serde(rename = "@ID")]
    pub id: Option<String>,
    #[serde(rename = "SHORT-NAME")]
    pub short_name: Option<String>,
    #[serde(rename = "LONG-NAME")]
    pub long_name: Option<String>,
    #[serde(rename = "DIAG-CODED-TYPE")]
    pub diag_coded_type: Option<OdxDiagCodedType>,
    #[serde(rename = "PHYSICAL-TYPE")]
    pub physical_type: Option<OdxPhysicalType>,
    #[serde(rename = "COMPU-METHOD")]
    pub compu_method: Option<OdxCompuMethod>,
}

// --- DiagCodedType ---

#[derive(Debug, Deserialize)]
pub struct OdxDiagCodedType {
    #[serde(rename = "@xsi:type", alias = "@type")]
    pub xsi_type: Option<String>,
    #[serde(rename = "@BASE-DATA-TYPE")]
    pub base_data_type: Option<String>,
    #[serde(rename = "@IS-HIGHLOW-BYTE-ORDER")]
    pub is_highlow_byte_order: Option<String>,
    #[serde(rename = "BIT-LENGTH")]
    pub bit_length: Option<u32>,
    #[serde(rename = "BIT-MASK")]
    pub bit_mask: Option<String>,
}

// --- CompuMethod ---

#[derive(Debug, Deserialize)]
pub struct OdxCompuMethod {
    #[serde(rename = "CATEGORY")]
    pub category: Option<String>,
    #[serde(rename = "COMPU-INTERNAL-TO-PHYS")]
    pub compu_internal_to_phys: Option<OdxCompuInternalToPhys>,
}

#[derive(Debug, Deserialize)]
pub struct OdxCompuInternalToPhys {
    #[serde(rename = "COMPU-SCALES")]
    pub compu_scales: Option<CompuScalesWrapper>,
}

#[derive(Debug, Deserialize)]
pub struct CompuScalesWrapper {
    #[serde(rename = "COMPU-SCALE", default)]
    pub items: Vec<OdxCompuScale>,
}

#[derive(Debug, Deserialize)]
pub struct OdxCompuScale {
    #[serde(rename = "COMPU-RATIONAL-COEFFS")]
    pub compu_rational_coeffs: Option<OdxCompuRationalCoeffs>,
}

#[derive(Debug, Deserialize)]
pub struct OdxCompuRationalCoeffs {
    #[serde(rename = "COMPU-NUMERATOR")]
    pub compu_numerator: Option<CompuCoeffsWrapper>,
    #[serde(rename = "COMPU-DENOMINATOR")]
    pub compu_denominator: Option<CompuCoeffsWrapper>,
}

#[derive(Debug, Deserialize)]
pub struct CompuCoeffsWrapper {
    #[serde(rename = "V", default)]
    pub items: Vec<String>,
}

// --- PhysicalType ---

#[derive(Debug, Deserialize)]
pub struct OdxPhysicalType {
    #[serde(rename = "@BASE-DATA-TYPE")]
    pub base_data_type: Option<String>,
}

// --- Table ---

#[derive(Debug, Deserialize)]
pub struct OdxTable {
    #[serde(rename = "@ID")]
    pub id: Option<String>,
    #[serde(rename = "@SEMANTIC")]
    pub semantic: Option<String>,
    #[serde(rename = "SHORT-NAME")]
    pub short_name: Option<String>,
    #[serde(rename = "LONG-NAME")]
    pub long_name: Option<String>,
    #[serde(rename = "KEY-LABEL")]
    pub key_label: Option<String>,
    #[serde(rename = "STRUCT-LABEL")]
    pub struct_label: Option<String>,
    #[serde(rename = "KEY-DOP-REF")]
    pub key_dop_ref: Option<OdxRef>,
    #[serde(rename = "TABLE-ROW", default)]
    pub table_rows: Vec<OdxTableRow>,
}

#[derive(Debug, Deserialize)]
pub struct OdxTableRow {
    #[serde(rename = "@ID")]
    pub id: Option<String>,
    #[serde(rename = "@SEMANTIC")]
    pub semantic: Option<String>,
    #[serde(rename = "SHORT-NAME")]
    pub short_name: Option<String>,
    #[serde(rename = "LONG-NAME")]
    pub long_name: Option<String>,
    #[serde(rename = "KEY")]
    pub key: Option<String>,
    #[serde(rename = "STRUCTURE-REF")]
    pub structure_ref: Option<OdxRef>,
    #[serde(rename = "DATA-OBJECT-PROP-REF")]
    pub dop_ref: Option<OdxRef>,
}

// --- ParentRef ---

#[derive(Debug, Deserialize)]
pub struct OdxParentRef {
    #[serde(rename = "@ID-REF")]
    pub id_ref: Option<String>,
    #[serde(rename = "@DOCREF")]
    pub docref: Option<String>,
    #[serde(rename = "@DOCTYPE")]
    pub doctype: Option<String>,
    #[serde(rename = "NOT-INHERITED-DOPS")]
    pub not_inherited_dops: Option<NotInheritedDopsWrapper>,
    #[serde(rename = "NOT-INHERITED-TABLES")]
    pub not_inherited_tables: Option<NotInheritedTablesWrapper>,
}

#[derive(Debug, Deserialize)]
pub struct NotInheritedDopsWrapper {
    #[serde(rename = "NOT-INHERITED-DOP", default)]
    pub items: Vec<NotInheritedSnRef>,
}

#[derive(Debug, Deserialize)]
pub struct NotInheritedTablesWrapper {
    #[serde(rename = "NOT-INHERITED-TABLE", default)]
    pub items: Vec<NotInheritedSnRef>,
}

#[derive(Debug, Deserialize)]
pub struct NotInheritedSnRef {
    #[serde(rename = "DOP-BASE-SNREF", alias = "TABLE-SNREF")]
    pub snref: Option<OdxSnRef>,
}

// --- Common types ---

#[derive(Debug, Deserialize)]
pub struct OdxRef {
    #[serde(rename = "@ID-REF")]
    pub id_ref: Option<String>,
    #[serde(rename = "@DOCREF")]
    pub docref: Option<String>,
    #[serde(rename = "@DOCTYPE")]
    pub doctype: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OdxSnRef {
    #[serde(rename = "@SHORT-NAME")]
    pub short_name: Option<String>,
}
