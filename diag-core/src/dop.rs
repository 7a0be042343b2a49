use crate::compu_method::CompuMethod;
use crate::decode_state::DecodeState;
use crate::diag_coded_type::DiagCodedType;
use crate::encode_state::EncodeState;
use crate::error::{DecodeError, EncodeError};
use crate::odxlink::OdxLinkId;
use crate::odxtypes::{DataType, PhysicalValue};

/// Conversion interface shared by everything that maps physical values to
/// bytes and back.
pub trait DopBase {
    fn short_name(&self) -> &str;

    fn convert_physical_to_internal(&self, value: &PhysicalValue) -> Result<PhysicalValue, EncodeError>;

    fn convert_physical_to_bytes(
        &self,
        value: &PhysicalValue,
        state: &EncodeState<'_>,
        bit_position: u32,
    ) -> Result<Vec<u8>, EncodeError>;

    /// Returns the physical value at the cursor of `state` and the byte
    /// position following it.
    fn convert_bytes_to_physical(
        &self,
        state: &DecodeState<'_>,
        bit_position: u32,
    ) -> Result<(PhysicalValue, usize), DecodeError>;
}

/// A simple data object property: coded type, physical type and the
/// computation between them.
#[derive(Debug, Clone, PartialEq)]
pub struct DataObjectProperty {
    pub odx_id: OdxLinkId,
    pub short_name: String,
    pub long_name: Option<String>,
    pub diag_coded_type: DiagCodedType,
    pub physical_type: DataType,
    pub compu_method: CompuMethod,
}

impl DataObjectProperty {
    pub fn new(
        odx_id: OdxLinkId,
        short_name: impl Into<String>,
        diag_coded_type: DiagCodedType,
        physical_type: DataType,
        compu_method: CompuMethod,
    ) -> Self {
        Self {
            odx_id,
            short_name: short_name.into(),
            long_name: None,
            diag_coded_type,
            physical_type,
            compu_method,
        }
    }

    /// Identical mapping of an integer of `bit_length` bits.
    pub fn identical_uint(odx_id: OdxLinkId, short_name: impl Into<String>, bit_length: u32) -> Self {
        Self::new(
            odx_id,
            short_name,
            DiagCodedType::standard_length(DataType::AUint32, bit_length),
            DataType::AUint32,
            CompuMethod::Identical,
        )
    }
}

impl DopBase for DataObjectProperty {
    fn short_name(&self) -> &str {
        &self.short_name
    }

    fn convert_physical_to_internal(&self, value: &PhysicalValue) -> Result<PhysicalValue, EncodeError> {
        if !self.physical_type.accepts(value) {
            return Err(EncodeError::IncompatibleValue {
                value: value.clone(),
                data_type: self.physical_type,
            });
        }
        self.compu_method
            .convert_physical_to_internal(value, self.diag_coded_type.base_data_type)
    }

    fn convert_physical_to_bytes(
        &self,
        value: &PhysicalValue,
        _state: &EncodeState<'_>,
        bit_position: u32,
    ) -> Result<Vec<u8>, EncodeError> {
        let internal = self.convert_physical_to_internal(value)?;
        self.diag_coded_type
            .convert_internal_to_bytes(&internal, bit_position)
    }

    fn convert_bytes_to_physical(
        &self,
        state: &DecodeState<'_>,
        bit_position: u32,
    ) -> Result<(PhysicalValue, usize), DecodeError> {
        let (internal, next) = self
            .diag_coded_type
            .convert_bytes_to_internal(state, bit_position)?;
        let physical = self
            .compu_method
            .convert_internal_to_physical(&internal, self.physical_type)?;
        Ok((physical, next))
    }
}
