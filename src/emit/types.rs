//! Recursive, memoizing type-reference renderer.
//!
//! Turns any [`TypeRef`] into a schema-construction expression. Composite
//! types need more than an expression: structs emit a members-map block
//! into the caller's statement buffer the first time they are referenced
//! (later references reuse the cached identifier), and enums/subsets
//! register a file-scope element list exactly once. Declared order is the
//! emission order throughout; subsets reorder their allowed set to the
//! parent enum's declaration order.

use crate::error::GenError;
use crate::model::{ArrayType, Enum, EnumSubset, ModelIndex, TypeRef};

use super::{to_snake_case, GenContext};

pub struct TypeEmitter<'a, 'i> {
    index: &'a ModelIndex<'i>,
    pub ctx: &'a mut GenContext,
    /// Structs currently being emitted; a re-entry is a definition cycle.
    in_progress: Vec<String>,
}

impl<'a, 'i> TypeEmitter<'a, 'i> {
    pub fn new(index: &'a ModelIndex<'i>, ctx: &'a mut GenContext) -> Self {
        TypeEmitter {
            index,
            ctx,
            in_progress: Vec::new(),
        }
    }

    /// Render `ty` as a schema-construction expression. Prerequisite
    /// statements (struct members maps and their schema items) are appended
    /// to `stmts` ahead of any statement that uses the returned expression.
    pub fn schema_expr(&mut self, ty: &TypeRef, stmts: &mut String) -> Result<String, GenError> {
        match ty {
            TypeRef::Boolean => Ok("CBoolSchemaItem::create()".to_string()),
            TypeRef::Integer { min, max } => Ok(bounded_number("int", *min, *max)),
            TypeRef::Float { min, max } => Ok(bounded_number("double", *min, *max)),
            TypeRef::Enum { name } => {
                let parent = self.index.enum_(name).ok_or_else(|| {
                    GenError::semantic(name.clone(), "reference to undeclared enum")
                })?;
                let items = self.ensure_enum_items(parent)?;
                Ok(enum_schema_expr(&parent.name, &items))
            }
            TypeRef::Subset(subset) => {
                let items = self.ensure_subset_items(subset)?;
                Ok(enum_schema_expr(&subset.enum_name, &items))
            }
            TypeRef::Struct { name } => self.ensure_struct(name, stmts),
            TypeRef::Array(arr) => self.array_expr(arr, stmts),
        }
    }

    /// Register the per-enum static element list once; returns its
    /// identifier. Elements appear in declaration order under their
    /// emitted (alias-aware) names.
    pub fn ensure_enum_items(&mut self, parent: &Enum) -> Result<String, GenError> {
        let identifier = format!("{}_items", to_snake_case(&parent.name));
        let mut block = format!(
            "static const {}::eType {identifier}[] = {{\n",
            parent.name
        );
        for element in &parent.elements {
            block.push_str(&format!("  {}::{},\n", parent.name, element.emitted_name()));
        }
        block.push_str("};\n");
        self.ctx.register_element_list(&identifier, block)?;
        Ok(identifier)
    }

    /// Register a subset's element list once: the allowed names, ordered by
    /// the parent enum's declaration order regardless of how the subset was
    /// constructed.
    pub fn ensure_subset_items(&mut self, subset: &EnumSubset) -> Result<String, GenError> {
        let parent = self.index.enum_(&subset.enum_name).ok_or_else(|| {
            GenError::semantic(
                subset.name.clone(),
                format!("subset references undeclared enum '{}'", subset.enum_name),
            )
        })?;
        for allowed in &subset.allowed {
            if !parent.contains(allowed) {
                return Err(GenError::semantic(
                    subset.name.clone(),
                    format!(
                        "subset allows '{allowed}' which does not exist in enum '{}'",
                        parent.name
                    ),
                ));
            }
        }

        let identifier = format!("{}_items", to_snake_case(&subset.name));
        let mut block = format!(
            "static const {}::eType {identifier}[] = {{\n",
            parent.name
        );
        for element in &parent.elements {
            if subset.allowed.iter().any(|a| *a == element.name) {
                block.push_str(&format!(
                    "  {}::{},\n",
                    parent.name,
                    element.emitted_name()
                ));
            }
        }
        block.push_str("};\n");
        self.ctx.register_element_list(&identifier, block)?;
        Ok(identifier)
    }

    /// Emit a struct's members map and schema item on first reference and
    /// cache the identifier; later references reuse it without re-emitting.
    pub fn ensure_struct(&mut self, name: &str, stmts: &mut String) -> Result<String, GenError> {
        if let Some(cached) = self.ctx.cached_struct(name) {
            return Ok(cached.to_string());
        }
        if self.in_progress.iter().any(|n| n == name) {
            return Err(GenError::semantic(
                name.to_string(),
                "struct definition cycle",
            ));
        }
        let st = self
            .index
            .struct_(name)
            .ok_or_else(|| GenError::semantic(name.to_string(), "reference to undeclared struct"))?;

        self.in_progress.push(name.to_string());
        let stem = to_snake_case(name);
        let map = format!("{stem}_members");
        let identifier = format!("struct_{stem}");

        let mut member_lines = String::new();
        for member in &st.members {
            // Nested composites land in `stmts` ahead of this block.
            let expr = self.schema_expr(&member.ty, stmts)?;
            member_lines.push_str(&format!(
                "  {map}[\"{}\"] = SMember({expr}, {});\n",
                member.name, member.mandatory
            ));
        }
        self.in_progress.pop();

        stmts.push_str(&format!(
            "  std::map<std::string, SMember> {map};\n{member_lines}\n  ISchemaItemPtr {identifier} = CObjectSchemaItem::create({map});\n\n"
        ));
        self.ctx.cache_struct(name, identifier.clone());
        Ok(identifier)
    }

    fn array_expr(&mut self, arr: &ArrayType, stmts: &mut String) -> Result<String, GenError> {
        let element = self.schema_expr(&arr.element, stmts)?;
        Ok(match (arr.min_size, arr.max_size) {
            (None, None) => format!("CArraySchemaItem::create({element})"),
            (min, max) => format!(
                "CArraySchemaItem::create({element}, {}, {})",
                bound_param("size_t", min),
                bound_param("size_t", max)
            ),
        })
    }
}

// ------------------------------ Free renderers ----------------------------- //

fn enum_schema_expr(enum_name: &str, items_identifier: &str) -> String {
    format!("TEnumSchemaItem<{enum_name}::eType>::create({items_identifier})")
}

/// Bounded-primitive constructor. No bounds → no arguments (natural range);
/// any bound present → both positions emitted, absent ones empty.
fn bounded_number<T: std::fmt::Display>(cpp_type: &str, min: Option<T>, max: Option<T>) -> String {
    match (&min, &max) {
        (None, None) => format!("TNumberSchemaItem<{cpp_type}>::create()"),
        _ => format!(
            "TNumberSchemaItem<{cpp_type}>::create({}, {})",
            bound_param(cpp_type, min),
            bound_param(cpp_type, max)
        ),
    }
}

fn bound_param<T: std::fmt::Display>(cpp_type: &str, value: Option<T>) -> String {
    match value {
        Some(v) => format!("TSchemaItemParameter<{cpp_type}>({v})"),
        None => format!("TSchemaItemParameter<{cpp_type}>()"),
    }
}

// --------------------------------- Tests ---------------------------------- //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Enum, EnumElement, Interface, Param, Struct};

    fn enum_of(name: &str, elements: &[&str]) -> Enum {
        Enum {
            name: name.into(),
            elements: elements.iter().map(|e| EnumElement::named(*e)).collect(),
            ..Enum::default()
        }
    }

    fn param(name: &str, ty: TypeRef) -> Param {
        Param {
            name: name.into(),
            ty,
            mandatory: true,
            default_value: None,
        }
    }

    fn fixture() -> Interface {
        Interface {
            enums: vec![enum_of("E1", &["a", "b", "c"])],
            structs: vec![
                Struct {
                    name: "Inner".into(),
                    members: vec![param("flag", TypeRef::Boolean)],
                    ..Struct::default()
                },
                Struct {
                    name: "Outer".into(),
                    members: vec![param(
                        "inner",
                        TypeRef::Struct {
                            name: "Inner".into(),
                        },
                    )],
                    ..Struct::default()
                },
            ],
            ..Interface::default()
        }
    }

    fn emit(ty: &TypeRef, iface: &Interface) -> (String, String) {
        let index = ModelIndex::build(iface);
        let mut ctx = GenContext::default();
        let mut emitter = TypeEmitter::new(&index, &mut ctx);
        let mut stmts = String::new();
        let expr = emitter.schema_expr(ty, &mut stmts).unwrap();
        (expr, stmts)
    }

    #[test]
    fn primitive_expressions() {
        let iface = fixture();
        assert_eq!(
            emit(&TypeRef::Boolean, &iface).0,
            "CBoolSchemaItem::create()"
        );
        assert_eq!(
            emit(&TypeRef::Integer { min: None, max: None }, &iface).0,
            "TNumberSchemaItem<int>::create()"
        );
        assert_eq!(
            emit(
                &TypeRef::Integer {
                    min: Some(1),
                    max: Some(10)
                },
                &iface
            )
            .0,
            "TNumberSchemaItem<int>::create(TSchemaItemParameter<int>(1), \
TSchemaItemParameter<int>(10))"
        );
        assert_eq!(
            emit(
                &TypeRef::Integer {
                    min: None,
                    max: Some(2)
                },
                &iface
            )
            .0,
            "TNumberSchemaItem<int>::create(TSchemaItemParameter<int>(), \
TSchemaItemParameter<int>(2))"
        );
        assert_eq!(
            emit(
                &TypeRef::Float {
                    min: Some(0.5),
                    max: None
                },
                &iface
            )
            .0,
            "TNumberSchemaItem<double>::create(TSchemaItemParameter<double>(0.5), \
TSchemaItemParameter<double>())"
        );
    }

    #[test]
    fn enum_reference_registers_items_once() {
        let iface = fixture();
        let index = ModelIndex::build(&iface);
        let mut ctx = GenContext::default();
        let mut emitter = TypeEmitter::new(&index, &mut ctx);
        let mut stmts = String::new();

        let ty = TypeRef::Enum { name: "E1".into() };
        let first = emitter.schema_expr(&ty, &mut stmts).unwrap();
        let second = emitter.schema_expr(&ty, &mut stmts).unwrap();
        assert_eq!(first, "TEnumSchemaItem<E1::eType>::create(e1_items)");
        assert_eq!(first, second);

        let blocks: Vec<&str> = ctx.element_list_blocks().collect();
        assert_eq!(blocks.len(), 1);
        assert_eq!(
            blocks[0],
            "static const E1::eType e1_items[] = {\n  E1::a,\n  E1::b,\n  E1::c,\n};\n"
        );
    }

    #[test]
    fn subset_follows_parent_declaration_order() {
        let iface = fixture();
        let index = ModelIndex::build(&iface);
        let mut ctx = GenContext::default();
        let mut emitter = TypeEmitter::new(&index, &mut ctx);
        let mut stmts = String::new();

        // Constructed order c-then-a; emission must be a-then-c.
        let ty = TypeRef::Subset(EnumSubset {
            name: "Sub".into(),
            enum_name: "E1".into(),
            allowed: vec!["c".into(), "a".into()],
        });
        let expr = emitter.schema_expr(&ty, &mut stmts).unwrap();
        assert_eq!(expr, "TEnumSchemaItem<E1::eType>::create(sub_items)");

        let blocks: Vec<&str> = ctx.element_list_blocks().collect();
        assert_eq!(
            blocks[0],
            "static const E1::eType sub_items[] = {\n  E1::a,\n  E1::c,\n};\n"
        );
    }

    #[test]
    fn struct_is_emitted_once_and_reused() {
        let iface = fixture();
        let index = ModelIndex::build(&iface);
        let mut ctx = GenContext::default();
        let mut emitter = TypeEmitter::new(&index, &mut ctx);
        let mut stmts = String::new();

        let ty = TypeRef::Struct {
            name: "Inner".into(),
        };
        let first = emitter.schema_expr(&ty, &mut stmts).unwrap();
        let after_first = stmts.clone();
        let second = emitter.schema_expr(&ty, &mut stmts).unwrap();

        assert_eq!(first, "struct_inner");
        assert_eq!(first, second, "both sites use the identical identifier");
        assert_eq!(stmts, after_first, "second reference emits nothing");
        assert_eq!(
            stmts,
            concat!(
                "  std::map<std::string, SMember> inner_members;\n",
                "  inner_members[\"flag\"] = SMember(CBoolSchemaItem::create(), true);\n",
                "\n",
                "  ISchemaItemPtr struct_inner = CObjectSchemaItem::create(inner_members);\n\n",
            )
        );
    }

    #[test]
    fn nested_struct_statements_precede_the_outer_block() {
        let iface = fixture();
        let (expr, stmts) = emit(
            &TypeRef::Struct {
                name: "Outer".into(),
            },
            &iface,
        );
        assert_eq!(expr, "struct_outer");
        let inner_pos = stmts.find("struct_inner = ").unwrap();
        let outer_decl = stmts.find("outer_members;").unwrap();
        assert!(inner_pos < outer_decl);
        assert!(stmts.contains("outer_members[\"inner\"] = SMember(struct_inner, true);"));
    }

    #[test]
    fn array_wraps_element_with_bounds() {
        let iface = fixture();
        let bounded = TypeRef::Array(ArrayType {
            min_size: Some(0),
            max_size: Some(20),
            element: Box::new(TypeRef::Boolean),
        });
        assert_eq!(
            emit(&bounded, &iface).0,
            "CArraySchemaItem::create(CBoolSchemaItem::create(), \
TSchemaItemParameter<size_t>(0), TSchemaItemParameter<size_t>(20))"
        );

        let unbounded = TypeRef::Array(ArrayType {
            min_size: None,
            max_size: None,
            element: Box::new(TypeRef::Enum { name: "E1".into() }),
        });
        assert_eq!(
            emit(&unbounded, &iface).0,
            "CArraySchemaItem::create(TEnumSchemaItem<E1::eType>::create(e1_items))"
        );
    }

    #[test]
    fn struct_cycle_is_rejected() {
        let mut iface = fixture();
        iface.structs.push(Struct {
            name: "Loop".into(),
            members: vec![param("again", TypeRef::Struct { name: "Loop".into() })],
            ..Struct::default()
        });
        let index = ModelIndex::build(&iface);
        let mut ctx = GenContext::default();
        let mut emitter = TypeEmitter::new(&index, &mut ctx);
        let mut stmts = String::new();
        let err = emitter.ensure_struct("Loop", &mut stmts);
        assert!(matches!(err, Err(GenError::Semantic { .. })));
    }

    #[test]
    fn internal_alias_names_the_emitted_element() {
        let mut iface = fixture();
        iface.enums.push(Enum {
            name: "E2".into(),
            elements: vec![
                EnumElement {
                    name: "xxx".into(),
                    internal_name: Some("val_1".into()),
                    ..EnumElement::default()
                },
                EnumElement::named("yyy"),
            ],
            ..Enum::default()
        });
        let (expr, _) = emit(&TypeRef::Enum { name: "E2".into() }, &iface);
        assert_eq!(expr, "TEnumSchemaItem<E2::eType>::create(e2_items)");

        let index = ModelIndex::build(&iface);
        let mut ctx = GenContext::default();
        let mut emitter = TypeEmitter::new(&index, &mut ctx);
        emitter
            .ensure_enum_items(index.enum_("E2").unwrap())
            .unwrap();
        let blocks: Vec<&str> = ctx.element_list_blocks().collect();
        assert_eq!(
            blocks[0],
            "static const E2::eType e2_items[] = {\n  E2::val_1,\n  E2::yyy,\n};\n"
        );
    }
}
