//! Strongly-typed interface model. No `serde_json::Value` past the boundary.
//!
//! This is the parser collaborator's output: a read-only snapshot of one
//! RPC interface document (enums, structs, functions, bounded primitives),
//! deserialized from JSON with every ordering preserved.
//!
//! Design notes:
//! - Top-level collections and member lists are `Vec`s, not maps: declaration
//!   order is an externally observable emission contract, and duplicate names
//!   must be *reported* by validation rather than silently collapsed during
//!   deserialization (a JSON map would keep only the last entry).
//! - `EnumSubset` holds a name-based back-reference to its parent enum,
//!   resolved through [`ModelIndex`] at emission time. No cyclic ownership.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

// ----------------------------- Message kinds ------------------------------ //

pub const KIND_REQUEST: &str = "request";
pub const KIND_RESPONSE: &str = "response";
pub const KIND_NOTIFICATION: &str = "notification";
pub const KIND_ERROR_RESPONSE: &str = "error_response";

/// Name of the message-kind enumeration within an interface document.
pub const MESSAGE_TYPE_ENUM: &str = "messageType";

// ------------------------------- Elements --------------------------------- //

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EnumElement {
    pub name: String,
    /// Internal alias used as the emitted identifier when present.
    #[serde(default)]
    pub internal_name: Option<String>,
    /// Explicit numeric value; elements without one take the previous + 1.
    #[serde(default)]
    pub value: Option<i64>,
    #[serde(default)]
    pub description: Vec<String>,
}

impl EnumElement {
    pub fn named(name: impl Into<String>) -> Self {
        EnumElement {
            name: name.into(),
            ..EnumElement::default()
        }
    }

    /// Identifier used in generated declarations and element lists.
    pub fn emitted_name(&self) -> &str {
        self.internal_name.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Enum {
    pub name: String,
    /// Declaration order is the emission order.
    #[serde(default)]
    pub elements: Vec<EnumElement>,
    #[serde(default)]
    pub description: Vec<String>,
}

impl Enum {
    pub fn element(&self, name: &str) -> Option<&EnumElement> {
        self.elements.iter().find(|e| e.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.element(name).is_some()
    }
}

/// A named, restricted view over a parent enum's elements. The allowed set
/// is a set only; emission order always follows the parent's declaration.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EnumSubset {
    pub name: String,
    /// Parent enum name (non-owning back-reference).
    #[serde(rename = "enum")]
    pub enum_name: String,
    pub allowed: Vec<String>,
}

// --------------------------------- Types ---------------------------------- //

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ArrayType {
    #[serde(default)]
    pub min_size: Option<u64>,
    #[serde(default)]
    pub max_size: Option<u64>,
    pub element: Box<TypeRef>,
}

/// Everything a [`Param`] may be typed as.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeRef {
    Boolean,
    Integer {
        #[serde(default)]
        min: Option<i64>,
        #[serde(default)]
        max: Option<i64>,
    },
    Float {
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
    },
    Enum {
        name: String,
    },
    Subset(EnumSubset),
    Struct {
        name: String,
    },
    Array(ArrayType),
}

fn default_true() -> bool {
    true
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Param {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    /// Membership flag on the enclosing object schema. Defaults to true.
    #[serde(default = "default_true")]
    pub mandatory: bool,
    /// Carried through from the parser; not part of the emitted schema text.
    #[serde(default)]
    pub default_value: Option<serde_json::Value>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Struct {
    pub name: String,
    #[serde(default)]
    pub members: Vec<Param>,
    #[serde(default)]
    pub description: Vec<String>,
}

// ------------------------------- Functions -------------------------------- //

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Function {
    pub name: String,
    /// Element name within the function-identifier enum.
    pub function_id: String,
    /// Element name within the message-kind enum (request/response/notification).
    pub message_kind: String,
    #[serde(default)]
    pub params: Vec<Param>,
}

impl Function {
    /// A function's identity: two functions sharing this pair conflict.
    pub fn identity(&self) -> (&str, &str) {
        (&self.function_id, &self.message_kind)
    }
}

// ------------------------------- Interface -------------------------------- //

/// Root of one parsed interface document. Built once, treated as read-only
/// input to a generation pass.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Interface {
    #[serde(default)]
    pub enums: Vec<Enum>,
    #[serde(default)]
    pub structs: Vec<Struct>,
    #[serde(default)]
    pub functions: Vec<Function>,
    /// Free-form key/value parameters of the document itself.
    #[serde(default)]
    pub params: IndexMap<String, String>,
}

impl Interface {
    pub fn enum_(&self, name: &str) -> Option<&Enum> {
        self.enums.iter().find(|e| e.name == name)
    }

    pub fn message_type_enum(&self) -> Option<&Enum> {
        self.enum_(MESSAGE_TYPE_ENUM)
    }
}

// ------------------------------ Lookup index ------------------------------- //

/// Name → declaration lookup tables, built once per generation call after
/// validation has rejected duplicates. Subset back-references resolve here.
pub struct ModelIndex<'a> {
    enums: IndexMap<&'a str, &'a Enum>,
    structs: IndexMap<&'a str, &'a Struct>,
}

impl<'a> ModelIndex<'a> {
    pub fn build(interface: &'a Interface) -> Self {
        let mut enums = IndexMap::new();
        for e in &interface.enums {
            enums.entry(e.name.as_str()).or_insert(e);
        }
        let mut structs = IndexMap::new();
        for s in &interface.structs {
            structs.entry(s.name.as_str()).or_insert(s);
        }
        ModelIndex { enums, structs }
    }

    pub fn enum_(&self, name: &str) -> Option<&'a Enum> {
        self.enums.get(name).copied()
    }

    pub fn struct_(&self, name: &str) -> Option<&'a Struct> {
        self.structs.get(name).copied()
    }
}

// --------------------------------- Tests ---------------------------------- //
