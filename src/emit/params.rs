//! Per-message-kind protocol header fill.
//!
//! A fixed external contract: every generated message schema opens with the
//! same ordered assignments into `params_members`, keyed by the qualified
//! header-field identifiers. Any deviation breaks the runtime library, so
//! the field tables are data, not logic.

use crate::error::GenError;
use crate::model::{KIND_NOTIFICATION, KIND_REQUEST, KIND_RESPONSE};

use super::{
    KEY_CODE, KEY_CORRELATION_ID, KEY_FUNCTION_ID, KEY_MESSAGE_TYPE, KEY_PROTOCOL_TYPE,
    KEY_PROTOCOL_VERSION,
};

/// One header-field assignment. Every fill field is unconditionally
/// mandatory; the flag is carried so callers can see the contract rather
/// than assume it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillField {
    pub key: &'static str,
    pub expr: &'static str,
    pub mandatory: bool,
}

const FUNCTION_ID: FillField = FillField {
    key: KEY_FUNCTION_ID,
    expr: "TEnumSchemaItem<FunctionID::eType>::create(function_id_items)",
    mandatory: true,
};
const MESSAGE_TYPE: FillField = FillField {
    key: KEY_MESSAGE_TYPE,
    expr: "TEnumSchemaItem<messageType::eType>::create(message_type_items)",
    mandatory: true,
};
const PROTOCOL_VERSION: FillField = FillField {
    key: KEY_PROTOCOL_VERSION,
    expr: "TNumberSchemaItem<int>::create()",
    mandatory: true,
};
const PROTOCOL_TYPE: FillField = FillField {
    key: KEY_PROTOCOL_TYPE,
    expr: "TNumberSchemaItem<int>::create()",
    mandatory: true,
};
const CORRELATION_ID: FillField = FillField {
    key: KEY_CORRELATION_ID,
    expr: "TNumberSchemaItem<int>::create()",
    mandatory: true,
};
const CODE: FillField = FillField {
    key: KEY_CODE,
    expr: "TNumberSchemaItem<int>::create()",
    mandatory: true,
};

static REQUEST_FIELDS: &[FillField] = &[
    FUNCTION_ID,
    MESSAGE_TYPE,
    PROTOCOL_VERSION,
    PROTOCOL_TYPE,
    CORRELATION_ID,
];

static RESPONSE_FIELDS: &[FillField] = &[
    FUNCTION_ID,
    MESSAGE_TYPE,
    PROTOCOL_VERSION,
    PROTOCOL_TYPE,
    CORRELATION_ID,
    CODE,
];

static NOTIFICATION_FIELDS: &[FillField] = &[
    FUNCTION_ID,
    MESSAGE_TYPE,
    PROTOCOL_VERSION,
    PROTOCOL_TYPE,
];

/// The ordered header-field set for one message kind. An unrecognized kind
/// is a contract violation, never an empty set.
pub fn params_fill(message_kind: &str) -> Result<&'static [FillField], GenError> {
    match message_kind {
        KIND_REQUEST => Ok(REQUEST_FIELDS),
        KIND_RESPONSE => Ok(RESPONSE_FIELDS),
        KIND_NOTIFICATION => Ok(NOTIFICATION_FIELDS),
        other => Err(GenError::contract(format!(
            "no params fill defined for message kind '{other}'"
        ))),
    }
}

/// Render the fill as `params_members[...] = SMember(..., true);` lines,
/// one per field, each prefixed with `indent`.
pub fn render_params_fill(message_kind: &str, indent: &str) -> Result<String, GenError> {
    let mut out = String::new();
    for field in params_fill(message_kind)? {
        out.push_str(&format!(
            "{indent}params_members[{}] = SMember({}, {});\n",
            field.key, field.expr, field.mandatory
        ));
    }
    Ok(out)
}
