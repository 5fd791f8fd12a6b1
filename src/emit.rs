//! Emission engine: turns the validated model into schema-construction text.
//!
//! Split by concern:
//! - [`params`] — the fixed per-message-kind protocol header fill.
//! - [`prefunction`] — synthesized error-response schemas, one per
//!   distinct function identity.
//! - [`types`] — recursive, memoizing rendering of any type reference.
//!
//! All deduplication state (element lists, struct cache, schema registry)
//! lives in one [`GenContext`] threaded through a single generation call;
//! nothing here is process-wide, so independent calls never interfere.

pub mod params;
pub mod prefunction;
pub mod types;

use indexmap::IndexMap;

use crate::error::GenError;

// ------------------------- Fixed generated identifiers --------------------- //
//
// External contract: the runtime library consuming the generated text keys
// protocol header fields by these exact qualified names. Byte-for-byte.

pub const HANDLER_NS: &str = "ns_smart_device_link::ns_json_handler";

pub const KEY_FUNCTION_ID: &str =
    "ns_smart_device_link::ns_json_handler::strings::S_FUNCTION_ID";
pub const KEY_MESSAGE_TYPE: &str =
    "ns_smart_device_link::ns_json_handler::strings::S_MESSAGE_TYPE";
pub const KEY_PROTOCOL_VERSION: &str =
    "ns_smart_device_link::ns_json_handler::strings::S_PROTOCOL_VERSION";
pub const KEY_PROTOCOL_TYPE: &str =
    "ns_smart_device_link::ns_json_handler::strings::S_PROTOCOL_TYPE";
pub const KEY_CORRELATION_ID: &str =
    "ns_smart_device_link::ns_json_handler::strings::S_CORRELATION_ID";
pub const KEY_CODE: &str = "ns_smart_device_link::ns_json_handler::strings::kCode";
pub const KEY_MESSAGE: &str = "ns_smart_device_link::ns_json_handler::strings::kMessage";
pub const KEY_PARAMS: &str = "ns_smart_device_link::ns_json_handler::strings::S_PARAMS";
pub const KEY_MSG_PARAMS: &str =
    "ns_smart_device_link::ns_json_handler::strings::S_MSG_PARAMS";

/// Key type of the generated schema registry.
pub const SCHEMA_KEY: &str = "ns_smart_device_link::ns_json_handler::SmartSchemaKey<\
FunctionID::eType, messageType::eType>";

// ------------------------------ Generation state --------------------------- //

/// Per-call emission state. Scoped to one `generate` invocation, never
/// shared: the caches make repeated references resolve to one emission, and
/// the registry enforces insert-or-fail on (function-id, message-kind).
#[derive(Debug, Default)]
pub struct GenContext {
    /// File-scope element lists, identifier → rendered block, in first
    /// registration order.
    element_lists: IndexMap<String, String>,
    /// Struct name → cached schema-item identifier.
    struct_items: IndexMap<String, String>,
    /// (function-id, message-kind) → registered schema tag.
    registry: IndexMap<(String, String), String>,
}

impl GenContext {
    /// Register a file-scope element list once. Re-registering the identical
    /// block is a no-op; the same identifier with different content means two
    /// distinct declarations collided on one name.
    pub fn register_element_list(
        &mut self,
        identifier: &str,
        block: String,
    ) -> Result<(), GenError> {
        match self.element_lists.get(identifier) {
            None => {
                self.element_lists.insert(identifier.to_string(), block);
                Ok(())
            }
            Some(existing) if *existing == block => Ok(()),
            Some(_) => Err(GenError::semantic(
                identifier.to_string(),
                "conflicting element lists share one identifier",
            )),
        }
    }

    /// Insert-or-fail registration of one schema under its identity.
    pub fn register_schema(
        &mut self,
        function_id: &str,
        message_kind: &str,
        tag: &str,
    ) -> Result<(), GenError> {
        let key = (function_id.to_string(), message_kind.to_string());
        if self.registry.contains_key(&key) {
            return Err(GenError::semantic(
                format!("({function_id}, {message_kind})"),
                "schema already registered for this function identity",
            ));
        }
        self.registry.insert(key, tag.to_string());
        Ok(())
    }

    pub fn is_registered(&self, function_id: &str, message_kind: &str) -> bool {
        self.registry
            .contains_key(&(function_id.to_string(), message_kind.to_string()))
    }

    pub fn cached_struct(&self, name: &str) -> Option<&str> {
        self.struct_items.get(name).map(String::as_str)
    }

    pub fn cache_struct(&mut self, name: &str, identifier: String) {
        self.struct_items.insert(name.to_string(), identifier);
    }

    /// Rendered element-list blocks in registration order.
    pub fn element_list_blocks(&self) -> impl Iterator<Item = &str> {
        self.element_lists.values().map(String::as_str)
    }
}

// -------------------------------- Utilities -------------------------------- //

/// Convert a declaration name to the snake_case stem used for generated
/// local identifiers. Acronym runs stay joined: `messageType` →
/// `message_type`, `FunctionID` → `function_id`, `Enum1` → `enum1`.
pub fn to_snake_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).map(|n| n.is_lowercase()).unwrap_or(false);
            if prev.is_lowercase() || prev.is_numeric() || next_lower {
                result.push('_');
            }
        }
        for lc in c.to_lowercase() {
            result.push(lc);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snake_case_stems() {
        assert_eq!(to_snake_case("messageType"), "message_type");
        assert_eq!(to_snake_case("FunctionID"), "function_id");
        assert_eq!(to_snake_case("Enum1"), "enum1");
        assert_eq!(to_snake_case("E2"), "e2");
        assert_eq!(to_snake_case("S1Sub"), "s1_sub");
    }

    #[test]
    fn element_list_registration_dedupes_identical_blocks() {
        let mut ctx = GenContext::default();
        ctx.register_element_list("a_items", "block".into()).unwrap();
        ctx.register_element_list("a_items", "block".into()).unwrap();
        assert_eq!(ctx.element_list_blocks().count(), 1);
    }

    #[test]
    fn element_list_registration_rejects_conflicts() {
        let mut ctx = GenContext::default();
        ctx.register_element_list("a_items", "one".into()).unwrap();
        let err = ctx.register_element_list("a_items", "two".into());
        assert!(matches!(err, Err(GenError::Semantic { .. })));
    }

    #[test]
    fn registry_rejects_duplicate_identity() {
        let mut ctx = GenContext::default();
        ctx.register_schema("id1", "response", "s1").unwrap();
        assert!(ctx.is_registered("id1", "response"));
        assert!(!ctx.is_registered("id1", "request"));
        let err = ctx.register_schema("id1", "response", "s2");
        assert!(matches!(err, Err(GenError::Semantic { .. })));
    }
}
