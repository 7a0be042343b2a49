//! ODX parser: XML documents -> linked `diag_core::Database`.
//!
//! 1. XML deserialization (odx_model)
//! 2. ODX -> `DiagLayer` mapping, one document fragment per container
//! 3. Reference resolution and linking (`Database::load`)

use diag_core::parameters::{
    CodedConstParameter, MatchingRequestParameter, ReservedParameter, TableStructParameter,
    ValueParameter,
};
use diag_core::{
    CompuMethod, DataObjectProperty, DataType, Database, DiagCodedType, DiagLayer, DiagLayerType,
    DocFragment, LinearCompuMethod, OdxError, OdxLinkId, OdxLinkRef, Parameter, ParameterKind,
    ParentRef, PhysicalValue, Structure, StructureKind, Table, TableKeyLinkage, TableRow,
};
use thiserror::Error;

use crate::odx_model::{self, Odx};

#[derive(Debug, Error)]
pub enum OdxParseError {
    #[error("XML deserialization failed: {0}")]
    XmlError(#[from] quick_xml::DeError),
    #[error("Missing required element: {0}")]
    MissingElement(String),
    #[error("parameter '{param}' has unsupported type '{xsi_type}'")]
    UnsupportedParameter { param: String, xsi_type: String },
    #[error("unsupported {0}")]
    Unsupported(String),
    #[error("invalid {element} '{value}'")]
    InvalidValue { element: &'static str, value: String },
    #[error(transparent)]
    Model(#[from] OdxError),
}

/// Parse a single ODX document into a linked database.
pub fn parse_odx(xml: &str) -> Result<Database, OdxParseError> {
    let layers = read_layers(xml)?;
    Ok(Database::load(layers)?)
}

/// Parse several ODX documents that reference each other into one database.
///
/// Documents without a `DIAG-LAYER-CONTAINER` (comparam specs and the like)
/// are skipped.
pub fn parse_odx_documents(documents: &[&str]) -> Result<Database, OdxParseError> {
    let mut layers = Vec::new();
    for xml in documents {
        match read_layers(xml) {
            Ok(found) => layers.extend(found),
            Err(OdxParseError::MissingElement(ref elem)) if elem == "DIAG-LAYER-CONTAINER" => {
                log::info!("Skipping ODX document without DIAG-LAYER-CONTAINER");
            }
            Err(e) => return Err(e),
        }
    }
    if layers.is_empty() {
        return Err(OdxParseError::MissingElement("DIAG-LAYER-CONTAINER".into()));
    }
    Ok(Database::load(layers)?)
}

/// Deserialize one ODX document and map its layers, without linking.
pub fn read_layers(xml: &str) -> Result<Vec<DiagLayer>, OdxParseError> {
    let odx: Odx = quick_xml::de::from_str(xml)?;
    let dlc = odx
        .diag_layer_container
        .as_ref()
        .ok_or_else(|| OdxParseError::MissingElement("DIAG-LAYER-CONTAINER".into()))?;
    let container = dlc
        .short_name
        .as_deref()
        .ok_or_else(|| OdxParseError::MissingElement("DIAG-LAYER-CONTAINER/SHORT-NAME".into()))?;
    log::debug!(
        "Reading container '{container}' (ODX {})",
        odx.version.as_deref().unwrap_or("?")
    );
    let doc = DocFragment::container(container);

    let groups: [(Option<&Vec<odx_model::DiagLayerVariant>>, DiagLayerType); 5] = [
        (dlc.protocols.as_ref().map(|w| &w.items), DiagLayerType::Protocol),
        (
            dlc.functional_groups.as_ref().map(|w| &w.items),
            DiagLayerType::FunctionalGroup,
        ),
        (dlc.base_variants.as_ref().map(|w| &w.items), DiagLayerType::BaseVariant),
        (dlc.ecu_variants.as_ref().map(|w| &w.items), DiagLayerType::EcuVariant),
        (
            dlc.ecu_shared_datas.as_ref().map(|w| &w.items),
            DiagLayerType::EcuSharedData,
        ),
    ];

    let mut layers = Vec::new();
    for (items, layer_type) in groups {
        for layer in items.into_iter().flatten() {
            layers.push(map_layer(layer, layer_type, &doc)?);
        }
    }
    Ok(layers)
}

fn map_layer(
    layer: &odx_model::DiagLayerVariant,
    layer_type: DiagLayerType,
    doc: &DocFragment,
) -> Result<DiagLayer, OdxParseError> {
    let short_name = short_name(layer.short_name.as_ref(), "DIAG-LAYER")?;
    let mut out = DiagLayer::new(
        odx_id(layer.id.as_ref(), &short_name, doc)?,
        short_name,
        layer_type,
    );
    out.long_name.clone_from(&layer.long_name);

    if let Some(w) = &layer.parent_refs {
        for pref in &w.items {
            out = out.with_parent(map_parent_ref(pref, doc)?);
        }
    }

    if let Some(ddds) = &layer.diag_data_dictionary_spec {
        if let Some(w) = &ddds.data_object_props {
            for dop in &w.items {
                out = out.with_dop(map_data_object_prop(dop, doc)?);
            }
        }
        if let Some(w) = &ddds.tables {
            for table in &w.items {
                out = out.with_table(map_table(table, doc)?);
            }
        }
        if let Some(w) = &ddds.structures {
            for s in &w.items {
                out = out.with_structure(map_structure(s, StructureKind::Structure, doc)?);
            }
        }
    }

    let messages = [
        (layer.requests.as_ref().map(|w| &w.items), StructureKind::Request),
        (
            layer.pos_responses.as_ref().map(|w| &w.items),
            StructureKind::PositiveResponse,
        ),
        (
            layer.neg_responses.as_ref().map(|w| &w.items),
            StructureKind::NegativeResponse,
        ),
    ];
    for (items, kind) in messages {
        for s in items.into_iter().flatten() {
            out = out.with_structure(map_structure(s, kind, doc)?);
        }
    }

    Ok(out)
}

fn map_parent_ref(
    pref: &odx_model::OdxParentRef,
    doc: &DocFragment,
) -> Result<ParentRef, OdxParseError> {
    let id_ref = pref
        .id_ref
        .as_deref()
        .ok_or_else(|| OdxParseError::MissingElement("PARENT-REF/@ID-REF".into()))?;
    let mut parent = ParentRef::new(OdxLinkRef::from_attributes(
        id_ref,
        pref.docref.as_deref(),
        pref.doctype.as_deref(),
        doc,
    ));
    parent.not_inherited_dops = pref
        .not_inherited_dops
        .as_ref()
        .map(|w| not_inherited_names(&w.items))
        .unwrap_or_default();
    parent.not_inherited_tables = pref
        .not_inherited_tables
        .as_ref()
        .map(|w| not_inherited_names(&w.items))
        .unwrap_or_default();
    Ok(parent)
}

fn not_inherited_names(items: &[odx_model::NotInheritedSnRef]) -> Vec<String> {
    items
        .iter()
        .filter_map(|ni| ni.snref.as_ref().and_then(|s| s.short_name.clone()))
        .collect()
}

fn map_data_object_prop(
    dop: &odx_model::OdxDataObjectProp,
    doc: &DocFragment,
) -> Result<DataObjectProperty, OdxParseError> {
    let short_name = short_name(dop.short_name.as_ref(), "DATA-OBJECT-PROP")?;
    let dct = dop.diag_coded_type.as_ref().ok_or_else(|| {
        OdxParseError::MissingElement(format!("DIAG-CODED-TYPE of DOP '{short_name}'"))
    })?;
    let diag_coded_type = map_diag_coded_type(dct)?;
    let physical_type = match dop
        .physical_type
        .as_ref()
        .and_then(|pt| pt.base_data_type.as_deref())
    {
        Some(name) => parse_data_type(name)?,
        None => diag_coded_type.base_data_type,
    };
    let compu_method = match &dop.compu_method {
        Some(cm) => map_compu_method(cm)?,
        None => CompuMethod::Identical,
    };

    let mut out = DataObjectProperty::new(
        odx_id(dop.id.as_ref(), &short_name, doc)?,
        short_name,
        diag_coded_type,
        physical_type,
        compu_method,
    );
    out.long_name.clone_from(&dop.long_name);
    Ok(out)
}

fn map_diag_coded_type(dct: &odx_model::OdxDiagCodedType) -> Result<DiagCodedType, OdxParseError> {
    let xsi_type = dct.xsi_type.as_deref().unwrap_or("STANDARD-LENGTH-TYPE");
    let base_data_type = parse_data_type(dct.base_data_type.as_deref().unwrap_or("A_UINT32"))?;
    let is_high_low = dct.is_highlow_byte_order.as_deref() != Some("false");
    let bit_length = dct
        .bit_length
        .ok_or_else(|| OdxParseError::MissingElement(format!("BIT-LENGTH of {xsi_type}")))?;

    let coded = match xsi_type {
        "STANDARD-LENGTH-TYPE" => {
            let coded = DiagCodedType::standard_length(base_data_type, bit_length);
            match dct.bit_mask.as_deref() {
                Some(mask) => coded.with_bit_mask(parse_bit_mask(mask)?),
                None => coded,
            }
        }
        "LEADING-LENGTH-INFO-TYPE" => DiagCodedType::leading_length_info(base_data_type, bit_length),
        other => return Err(OdxParseError::Unsupported(format!("diag coded type '{other}'"))),
    };
    Ok(coded.with_byte_order(is_high_low))
}

fn map_compu_method(cm: &odx_model::OdxCompuMethod) -> Result<CompuMethod, OdxParseError> {
    match cm.category.as_deref() {
        None | Some("IDENTICAL") => Ok(CompuMethod::Identical),
        Some("LINEAR") => {
            let coeffs = cm
                .compu_internal_to_phys
                .as_ref()
                .and_then(|c| c.compu_scales.as_ref())
                .and_then(|w| w.items.first())
                .and_then(|s| s.compu_rational_coeffs.as_ref())
                .ok_or_else(|| {
                    OdxParseError::MissingElement("COMPU-RATIONAL-COEFFS of LINEAR".into())
                })?;
            let numerator = coeffs
                .compu_numerator
                .as_ref()
                .map(|w| w.items.as_slice())
                .unwrap_or_default();
            let [offset, factor] = numerator else {
                return Err(OdxParseError::InvalidValue {
                    element: "COMPU-NUMERATOR",
                    value: numerator.join(" "),
                });
            };
            let mut linear = LinearCompuMethod::new(parse_coeff(offset)?, parse_coeff(factor)?);
            if let Some(denominator) = coeffs
                .compu_denominator
                .as_ref()
                .and_then(|w| w.items.first())
            {
                linear.denominator = parse_coeff(denominator)?;
            }
            Ok(CompuMethod::Linear(linear))
        }
        Some(other) => Err(OdxParseError::Unsupported(format!("compu method category '{other}'"))),
    }
}

fn map_table(table: &odx_model::OdxTable, doc: &DocFragment) -> Result<Table, OdxParseError> {
    let short_name = short_name(table.short_name.as_ref(), "TABLE")?;
    let mut out = Table::new(odx_id(table.id.as_ref(), &short_name, doc)?, short_name);
    out.long_name.clone_from(&table.long_name);
    out.semantic.clone_from(&table.semantic);
    out.key_label.clone_from(&table.key_label);
    out.struct_label.clone_from(&table.struct_label);
    if let Some(r) = &table.key_dop_ref {
        out = out.with_key_dop(link(r, doc, "KEY-DOP-REF")?);
    }
    for row in &table.table_rows {
        out = out.with_row(map_table_row(row, doc)?);
    }
    Ok(out)
}

fn map_table_row(row: &odx_model::OdxTableRow, doc: &DocFragment) -> Result<TableRow, OdxParseError> {
    let short_name = short_name(row.short_name.as_ref(), "TABLE-ROW")?;
    let key = row
        .key
        .as_deref()
        .ok_or_else(|| OdxParseError::MissingElement(format!("KEY of table row '{short_name}'")))?;
    // keys stay textual until the key DOP is known
    let mut out = TableRow::new(
        odx_id(row.id.as_ref(), &short_name, doc)?,
        short_name,
        PhysicalValue::Text(key.trim().to_owned()),
    );
    out.long_name.clone_from(&row.long_name);
    out.semantic.clone_from(&row.semantic);
    if let Some(r) = &row.structure_ref {
        out = out.with_structure(link(r, doc, "STRUCTURE-REF")?);
    }
    if let Some(r) = &row.dop_ref {
        out = out.with_dop(link(r, doc, "DATA-OBJECT-PROP-REF")?);
    }
    Ok(out)
}

fn map_structure(
    s: &odx_model::OdxBasicStructure,
    kind: StructureKind,
    doc: &DocFragment,
) -> Result<Structure, OdxParseError> {
    let short_name = short_name(s.short_name.as_ref(), "STRUCTURE")?;
    let mut out = Structure::new(odx_id(s.id.as_ref(), &short_name, doc)?, short_name, kind);
    out.long_name.clone_from(&s.long_name);
    if let Some(byte_size) = s.byte_size {
        out = out.with_byte_size(byte_size);
    }
    if let Some(w) = &s.params {
        for p in &w.items {
            out = out.with_parameter(map_param(p, doc)?);
        }
    }
    Ok(out)
}

fn map_param(p: &odx_model::OdxParam, doc: &DocFragment) -> Result<Parameter, OdxParseError> {
    let short_name = short_name(p.short_name.as_ref(), "PARAM")?;
    let xsi_type = p.xsi_type.as_deref().unwrap_or("");
    let missing = |element: &str| {
        OdxParseError::MissingElement(format!("{element} of {xsi_type} parameter '{short_name}'"))
    };

    let mut param = match xsi_type {
        "CODED-CONST" => {
            let dct = map_diag_coded_type(
                p.diag_coded_type
                    .as_ref()
                    .ok_or_else(|| missing("DIAG-CODED-TYPE"))?,
            )?;
            let text = p.coded_value.as_deref().ok_or_else(|| missing("CODED-VALUE"))?;
            let value = dct.base_data_type.parse_value(text.trim())?;
            Parameter::new(
                short_name.clone(),
                ParameterKind::CodedConst(CodedConstParameter::new(dct, value)),
            )
        }
        "VALUE" => {
            let mut value = match (&p.dop_ref, &p.dop_snref) {
                (Some(r), _) => ValueParameter::new(link(r, doc, "DOP-REF")?),
                (None, Some(snref)) => ValueParameter::by_short_name(snref_name(snref, "DOP-SNREF")?),
                (None, None) => return Err(missing("DOP-REF")),
            };
            if let Some(default) = &p.physical_default_value {
                value = value.with_default(default.trim());
            }
            Parameter::new(short_name.clone(), ParameterKind::Value(value))
        }
        "RESERVED" => {
            let bit_length = p.bit_length.ok_or_else(|| missing("BIT-LENGTH"))?;
            Parameter::new(
                short_name.clone(),
                ParameterKind::Reserved(ReservedParameter::new(bit_length)),
            )
        }
        "MATCHING-REQUEST-PARAM" => {
            let request_byte_pos = p.request_byte_pos.ok_or_else(|| missing("REQUEST-BYTE-POS"))?;
            let byte_length = p.match_byte_length.ok_or_else(|| missing("BYTE-LENGTH"))?;
            Parameter::new(
                short_name.clone(),
                ParameterKind::MatchingRequest(MatchingRequestParameter::new(
                    request_byte_pos,
                    byte_length,
                )),
            )
        }
        "TABLE-KEY" => {
            let linkage = TableKeyLinkage {
                table_ref: p.table_ref.as_ref().map(|r| link(r, doc, "TABLE-REF")).transpose()?,
                table_snref: p
                    .table_snref
                    .as_ref()
                    .map(|s| snref_name(s, "TABLE-SNREF"))
                    .transpose()?,
                table_row_ref: p
                    .table_row_ref
                    .as_ref()
                    .map(|r| link(r, doc, "TABLE-ROW-REF"))
                    .transpose()?,
                table_row_snref: p
                    .table_row_snref
                    .as_ref()
                    .map(|s| snref_name(s, "TABLE-ROW-SNREF"))
                    .transpose()?,
            };
            Parameter::table_key(short_name.clone(), odx_id(p.id.as_ref(), &short_name, doc)?, linkage)?
        }
        "TABLE-STRUCT" => {
            let key_ref = p
                .table_key_ref
                .as_ref()
                .map(|r| link(r, doc, "TABLE-KEY-REF"))
                .transpose()?;
            let key_snref = p
                .table_key_snref
                .as_ref()
                .map(|s| snref_name(s, "TABLE-KEY-SNREF"))
                .transpose()?;
            Parameter::new(
                short_name.clone(),
                ParameterKind::TableStruct(TableStructParameter::new(&short_name, key_ref, key_snref)?),
            )
        }
        other => {
            return Err(OdxParseError::UnsupportedParameter {
                param: short_name.clone(),
                xsi_type: other.to_owned(),
            });
        }
    };

    param.semantic.clone_from(&p.semantic);
    param.byte_position = p.byte_position;
    param.bit_position = p.bit_position;
    Ok(param)
}

fn short_name(value: Option<&String>, element: &str) -> Result<String, OdxParseError> {
    value
        .map(|s| s.trim().to_owned())
        .ok_or_else(|| OdxParseError::MissingElement(format!("{element}/SHORT-NAME")))
}

fn odx_id(
    id: Option<&String>,
    short_name: &str,
    doc: &DocFragment,
) -> Result<OdxLinkId, OdxParseError> {
    let id = id.ok_or_else(|| OdxParseError::MissingElement(format!("@ID of '{short_name}'")))?;
    Ok(OdxLinkId::new(id.clone(), doc.clone()))
}

fn link(r: &odx_model::OdxRef, doc: &DocFragment, element: &str) -> Result<OdxLinkRef, OdxParseError> {
    let id_ref = r
        .id_ref
        .as_deref()
        .ok_or_else(|| OdxParseError::MissingElement(format!("{element}/@ID-REF")))?;
    Ok(OdxLinkRef::from_attributes(
        id_ref,
        r.docref.as_deref(),
        r.doctype.as_deref(),
        doc,
    ))
}

fn snref_name(s: &odx_model::OdxSnRef, element: &str) -> Result<String, OdxParseError> {
    s.short_name
        .clone()
        .ok_or_else(|| OdxParseError::MissingElement(format!("{element}/@SHORT-NAME")))
}

fn parse_data_type(name: &str) -> Result<DataType, OdxParseError> {
    DataType::from_odx(name).ok_or_else(|| OdxParseError::Unsupported(format!("data type '{name}'")))
}

fn parse_bit_mask(text: &str) -> Result<u64, OdxParseError> {
    let digits = text.trim();
    let digits = digits.strip_prefix("0x").unwrap_or(digits);
    u64::from_str_radix(digits, 16).map_err(|_| OdxParseError::InvalidValue {
        element: "BIT-MASK",
        value: text.to_owned(),
    })
}

fn parse_coeff(text: &str) -> Result<f64, OdxParseError> {
    text.trim().parse().map_err(|_| OdxParseError::InvalidValue {
        element: "V",
        value: text.to_owned(),
    })
}
