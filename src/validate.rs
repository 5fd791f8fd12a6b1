//! Interface model validator.
//!
//! Checks one [`Interface`] for semantic problems before any artifact is
//! emitted. Findings carry a severity: `Error` blocks generation, `Warning`
//! is advisory. Duplicates are reported, never merged or overwritten.

use crate::error::GenError;
use crate::model::{
    EnumSubset, Interface, ModelIndex, Param, TypeRef, KIND_NOTIFICATION, KIND_REQUEST,
    KIND_RESPONSE,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Severity {
    /// Blocks generation — emitted artifacts would be wrong or ambiguous.
    Error,
    /// Advisory — generation proceeds but the output may surprise.
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub message: String,
    /// Location in the model, e.g. `structs[0].members[3]`.
    pub location: String,
    pub severity: Severity,
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARN",
        };
        write!(f, "[{}] {}: {}", tag, self.location, self.message)
    }
}

/// Validate an interface model and return every problem found.
pub fn validate(interface: &Interface) -> Vec<Finding> {
    let mut findings = Vec::new();
    let index = ModelIndex::build(interface);

    validate_enums(interface, &mut findings);
    validate_structs(interface, &index, &mut findings);
    validate_functions(interface, &index, &mut findings);

    findings
}

/// Returns `true` when [`validate`] produces no `Error`-severity findings.
pub fn is_valid(interface: &Interface) -> bool {
    !validate(interface)
        .iter()
        .any(|f| f.severity == Severity::Error)
}

/// First blocking finding converted to the fatal error `generate` surfaces.
pub fn first_error(findings: &[Finding]) -> Option<GenError> {
    findings
        .iter()
        .find(|f| f.severity == Severity::Error)
        .map(|f| GenError::semantic(f.location.clone(), f.message.clone()))
}

// ----------------------------- Per-kind checks ----------------------------- //

fn error(findings: &mut Vec<Finding>, location: String, message: String) {
    findings.push(Finding {
        message,
        location,
        severity: Severity::Error,
    });
}

fn warn(findings: &mut Vec<Finding>, location: String, message: String) {
    findings.push(Finding {
        message,
        location,
        severity: Severity::Warning,
    });
}

fn validate_enums(interface: &Interface, findings: &mut Vec<Finding>) {
    let mut seen: Vec<&str> = Vec::new();
    for (idx, e) in interface.enums.iter().enumerate() {
        let loc = format!("enums[{idx}]");
        if e.name.is_empty() {
            error(findings, loc, "enum name must not be empty".into());
            continue;
        }
        if seen.contains(&e.name.as_str()) {
            error(findings, loc, format!("duplicate enum name '{}'", e.name));
            continue;
        }
        seen.push(&e.name);

        if e.elements.is_empty() {
            warn(
                findings,
                loc.clone(),
                format!("enum '{}' has no elements", e.name),
            );
        }
        let mut elems: Vec<&str> = Vec::new();
        for (eidx, el) in e.elements.iter().enumerate() {
            if elems.contains(&el.name.as_str()) {
                error(
                    findings,
                    format!("{loc}.elements[{eidx}]"),
                    format!("duplicate element name '{}' in enum '{}'", el.name, e.name),
                );
            } else {
                elems.push(&el.name);
            }
        }
    }
}

fn validate_structs(interface: &Interface, index: &ModelIndex, findings: &mut Vec<Finding>) {
    let mut seen: Vec<&str> = Vec::new();
    for (idx, s) in interface.structs.iter().enumerate() {
        let loc = format!("structs[{idx}]");
        if s.name.is_empty() {
            error(findings, loc, "struct name must not be empty".into());
            continue;
        }
        if seen.contains(&s.name.as_str()) {
            error(findings, loc, format!("duplicate struct name '{}'", s.name));
            continue;
        }
        seen.push(&s.name);

        if s.members.is_empty() {
            warn(
                findings,
                loc.clone(),
                format!("struct '{}' has no members", s.name),
            );
        }
        validate_params(&s.members, &loc, "members", index, findings);
    }
}

fn validate_functions(interface: &Interface, index: &ModelIndex, findings: &mut Vec<Finding>) {
    let mut identities: Vec<(&str, &str)> = Vec::new();
    for (idx, f) in interface.functions.iter().enumerate() {
        let loc = format!("functions[{idx}]");

        match f.message_kind.as_str() {
            KIND_REQUEST | KIND_RESPONSE | KIND_NOTIFICATION => {}
            other => error(
                findings,
                format!("{loc}.message_kind"),
                format!("unknown message kind '{other}'"),
            ),
        }

        if identities.contains(&f.identity()) {
            error(
                findings,
                loc.clone(),
                format!(
                    "duplicate function identity ({}, {})",
                    f.function_id, f.message_kind
                ),
            );
        } else {
            identities.push(f.identity());
        }

        validate_params(&f.params, &loc, "params", index, findings);
    }
}

// ------------------------------ Type walking ------------------------------- //

fn validate_params(
    params: &[Param],
    loc: &str,
    field: &str,
    index: &ModelIndex,
    findings: &mut Vec<Finding>,
) {
    let mut names: Vec<&str> = Vec::new();
    for (pidx, p) in params.iter().enumerate() {
        let ploc = format!("{loc}.{field}[{pidx}]");
        if names.contains(&p.name.as_str()) {
            error(
                findings,
                ploc.clone(),
                format!("duplicate member name '{}'", p.name),
            );
        } else {
            names.push(&p.name);
        }
        validate_type(&p.ty, &ploc, index, findings);
    }
}

fn validate_type(ty: &TypeRef, loc: &str, index: &ModelIndex, findings: &mut Vec<Finding>) {
    match ty {
        TypeRef::Boolean => {}
        TypeRef::Integer { min, max } => {
            if let (Some(lo), Some(hi)) = (min, max) {
                if lo > hi {
                    error(
                        findings,
                        loc.to_string(),
                        format!("integer bounds inverted ({lo} > {hi})"),
                    );
                }
            }
        }
        TypeRef::Float { min, max } => {
            if let (Some(lo), Some(hi)) = (min, max) {
                if lo > hi {
                    error(
                        findings,
                        loc.to_string(),
                        format!("float bounds inverted ({lo} > {hi})"),
                    );
                }
            }
        }
        TypeRef::Enum { name } => {
            if index.enum_(name).is_none() {
                error(
                    findings,
                    loc.to_string(),
                    format!("reference to undeclared enum '{name}'"),
                );
            }
        }
        TypeRef::Subset(subset) => validate_subset(subset, loc, index, findings),
        TypeRef::Struct { name } => {
            if index.struct_(name).is_none() {
                error(
                    findings,
                    loc.to_string(),
                    format!("reference to undeclared struct '{name}'"),
                );
            }
        }
        TypeRef::Array(arr) => {
            if let (Some(lo), Some(hi)) = (arr.min_size, arr.max_size) {
                if lo > hi {
                    error(
                        findings,
                        loc.to_string(),
                        format!("array size bounds inverted ({lo} > {hi})"),
                    );
                }
            }
            validate_type(&arr.element, loc, index, findings);
        }
    }
}

fn validate_subset(subset: &EnumSubset, loc: &str, index: &ModelIndex, findings: &mut Vec<Finding>) {
    let Some(parent) = index.enum_(&subset.enum_name) else {
        error(
            findings,
            loc.to_string(),
            format!(
                "subset '{}' references undeclared enum '{}'",
                subset.name, subset.enum_name
            ),
        );
        return;
    };
    if subset.allowed.is_empty() {
        warn(
            findings,
            loc.to_string(),
            format!("subset '{}' allows no elements", subset.name),
        );
    }
    let mut seen: Vec<&str> = Vec::new();
    for allowed in &subset.allowed {
        if !parent.contains(allowed) {
            error(
                findings,
                loc.to_string(),
                format!(
                    "subset '{}' allows '{}' which does not exist in enum '{}'",
                    subset.name, allowed, subset.enum_name
                ),
            );
        }
        if seen.contains(&allowed.as_str()) {
            warn(
                findings,
                loc.to_string(),
                format!("subset '{}' lists '{}' twice", subset.name, allowed),
            );
        } else {
            seen.push(allowed);
        }
    }
}

// --------------------------------- Tests ---------------------------------- //
