//! Message-kind enum preprocessing.
//!
//! An interface that declares responses can also receive error responses,
//! which the wire protocol tags with a message kind the document never
//! declares. The generated enum and its element list must cover it, so the
//! working copy of the message-kind enum grows a synthetic element before
//! emission. The caller's model is never mutated.

use crate::model::{Enum, EnumElement, KIND_ERROR_RESPONSE, KIND_RESPONSE};

/// Return a copy of the message-kind enum, augmented with an
/// `error_response` element appended after all existing elements when the
/// enum contains `response` and lacks `error_response`. Otherwise the copy
/// is unchanged. Pure and deterministic.
pub fn preprocess_message_type(message_type: &Enum) -> Enum {
    let mut result = message_type.clone();
    if result.contains(KIND_RESPONSE) && !result.contains(KIND_ERROR_RESPONSE) {
        result.elements.push(EnumElement::named(KIND_ERROR_RESPONSE));
    }
    result
}
