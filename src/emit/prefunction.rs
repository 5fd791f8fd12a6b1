//! Synthesized error-response schemas.
//!
//! Every function identity with a declared successful response can also
//! receive an error response on the wire, which the interface document never
//! spells out. This pass scans the declared functions and emits one
//! auxiliary schema block per distinct function-id, in first-seen order,
//! before any declared schema is built.
//!
//! The block layout is a byte-fixed contract: the response header fill plus
//! an unconditional message field, wrapped under the single `S_PARAMS` key,
//! then registered under (function-id, error_response).

use indexmap::IndexSet;

use crate::error::GenError;
use crate::model::{Function, KIND_ERROR_RESPONSE, KIND_RESPONSE};

use super::params::render_params_fill;
use super::{GenContext, KEY_MESSAGE, KEY_PARAMS, SCHEMA_KEY};

/// Emit the auxiliary error-response blocks for `functions`, registering
/// each under (function-id, "error_response"). Functions whose kind is not
/// `response` never trigger synthesis; a function-id that already produced
/// a block is skipped entirely. No response-kind functions → empty output.
pub fn pre_function_schemas(
    functions: &[Function],
    ctx: &mut GenContext,
) -> Result<String, GenError> {
    let mut out = String::new();
    let mut seen: IndexSet<&str> = IndexSet::new();

    for function in functions {
        if function.message_kind != KIND_RESPONSE {
            continue;
        }
        if !seen.insert(function.function_id.as_str()) {
            continue;
        }
        out.push_str(&error_response_block(&function.function_id)?);
        ctx.register_schema(
            &function.function_id,
            KIND_ERROR_RESPONSE,
            "error_response_schema",
        )?;
    }

    Ok(out)
}

fn error_response_block(function_id: &str) -> Result<String, GenError> {
    let mut block = String::new();

    block.push_str("  std::map<std::string, SMember> params_members;\n");
    block.push_str(&render_params_fill(KIND_RESPONSE, "  ")?);
    block.push_str(&format!(
        "  params_members[{KEY_MESSAGE}] = SMember(CStringSchemaItem::create(), true);\n"
    ));
    block.push('\n');

    block.push_str("  std::map<std::string, SMember> root_members_map;\n");
    block.push_str(&format!(
        "  root_members_map[{KEY_PARAMS}] = \
SMember(CObjectSchemaItem::create(params_members), true);\n"
    ));
    block.push('\n');

    block.push_str(
        "  CSmartSchema error_response_schema(CObjectSchemaItem::create(root_members_map));\n",
    );
    block.push('\n');

    block.push_str(&format!(
        "  functions_schemes_.insert(std::make_pair({SCHEMA_KEY}(\
FunctionID::{function_id}, messageType::error_response), error_response_schema));\n"
    ));
    block.push('\n');

    Ok(block)
}
