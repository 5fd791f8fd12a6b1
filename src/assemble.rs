//! Output assembly: one validated interface model in, two artifacts out.
//!
//! `<base>.h` carries the declarations (enum `eType` blocks, file-scope
//! element lists, the factory class), `<base>_schema.h` carries the factory
//! constructor body. Emission runs to completion before the first write, so
//! a semantic failure never leaves a partial artifact behind. Writes go
//! through the [`FileSystem`] collaborator; the destination directory must
//! already exist.

use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::emit::prefunction::pre_function_schemas;
use crate::emit::types::TypeEmitter;
use crate::emit::{to_snake_case, GenContext, KEY_MSG_PARAMS, KEY_PARAMS, SCHEMA_KEY};
use crate::error::GenError;
use crate::model::{Interface, ModelIndex, MESSAGE_TYPE_ENUM};
use crate::preprocess::preprocess_message_type;
use crate::validate;

// ------------------------------ Collaborator ------------------------------- //

/// Write seam for the assembler. Production code uses [`OsFileSystem`];
/// tests substitute a recording double.
pub trait FileSystem {
    fn dir_exists(&self, path: &Path) -> bool;
    fn write_file(&self, path: &Path, contents: &str) -> io::Result<()>;
}

pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn dir_exists(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn write_file(&self, path: &Path, contents: &str) -> io::Result<()> {
        std::fs::write(path, contents)
    }
}

// ------------------------------- Entry points ------------------------------ //

/// Generate both artifacts for `interface` into `destination_dir`.
///
/// `filename` is the source document's name; its base name (stem) names the
/// artifacts and the factory class. `namespace` is a possibly-empty
/// `::`-separated wrapper for all generated declarations.
pub fn generate(
    interface: &Interface,
    filename: &str,
    namespace: &str,
    destination_dir: &Path,
) -> Result<(), GenError> {
    generate_with(&OsFileSystem, interface, filename, namespace, destination_dir)
}

pub fn generate_with(
    fs: &dyn FileSystem,
    interface: &Interface,
    filename: &str,
    namespace: &str,
    destination_dir: &Path,
) -> Result<(), GenError> {
    let findings = validate::validate(interface);
    if let Some(err) = validate::first_error(&findings) {
        return Err(err);
    }

    let base = artifact_base(filename)?;
    if !fs.dir_exists(destination_dir) {
        return Err(GenError::io(
            destination_dir,
            io::Error::new(
                io::ErrorKind::NotFound,
                "destination directory does not exist",
            ),
        ));
    }

    // Working copy: the message-kind enum grows its synthetic element here,
    // never in the caller's model.
    let mut working = interface.clone();
    if let Some(mt) = working.enums.iter_mut().find(|e| e.name == MESSAGE_TYPE_ENUM) {
        *mt = preprocess_message_type(mt);
    }

    let index = ModelIndex::build(&working);
    let mut ctx = GenContext::default();

    // Element lists for every declared enum come first, in declared order;
    // subset lists registered during emission follow them.
    {
        let mut emitter = TypeEmitter::new(&index, &mut ctx);
        for decl in &working.enums {
            emitter.ensure_enum_items(decl)?;
        }
    }

    let mut body = pre_function_schemas(&working.functions, &mut ctx)?;

    {
        let mut emitter = TypeEmitter::new(&index, &mut ctx);
        let mut struct_stmts = String::new();
        for decl in &working.structs {
            emitter.ensure_struct(&decl.name, &mut struct_stmts)?;
        }
        body.push_str(&struct_stmts);
    }

    for function in &working.functions {
        let block = function_block(function, &index, &mut ctx)?;
        body.push_str(&block);
        ctx.register_schema(&function.function_id, &function.message_kind, "schema")?;
    }

    let declarations = declarations_artifact(&working, &ctx, &base, namespace);
    let schema = schema_artifact(&body, &base, namespace);

    let declarations_path = destination_dir.join(format!("{base}.h"));
    let schema_path = destination_dir.join(format!("{base}_schema.h"));
    debug!(declarations = %declarations_path.display(), schema = %schema_path.display(),
        "writing artifacts");

    write_artifact(fs, &declarations_path, &declarations)?;
    write_artifact(fs, &schema_path, &schema)?;
    Ok(())
}

fn write_artifact(fs: &dyn FileSystem, path: &PathBuf, contents: &str) -> Result<(), GenError> {
    fs.write_file(path, contents)
        .map_err(|source| GenError::io(path.clone(), source))
}

/// Base name of the source document: `Test.xml` → `Test`.
fn artifact_base(filename: &str) -> Result<String, GenError> {
    Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| GenError::contract(format!("input filename '{filename}' has no base name")))
}

// ----------------------------- Function blocks ----------------------------- //

/// One brace-scoped registration block per declared function: the per-kind
/// header fill under the params key, the function's own members under the
/// message-params key, both wrapped into one root object schema.
fn function_block(
    function: &crate::model::Function,
    index: &ModelIndex,
    ctx: &mut GenContext,
) -> Result<String, GenError> {
    let fill = crate::emit::params::render_params_fill(&function.message_kind, "    ")?;

    // Declared structs are already cached, so member expressions hoist no
    // statements in practice; anything that does land here belongs at
    // constructor scope, ahead of the block.
    let mut hoisted = String::new();
    let mut member_lines = String::new();
    {
        let mut emitter = TypeEmitter::new(index, ctx);
        for param in &function.params {
            let expr = emitter.schema_expr(&param.ty, &mut hoisted)?;
            member_lines.push_str(&format!(
                "    msg_params_members[\"{}\"] = SMember({expr}, {});\n",
                param.name, param.mandatory
            ));
        }
    }

    let mut block = hoisted;
    block.push_str("  {\n");
    block.push_str("    std::map<std::string, SMember> params_members;\n");
    block.push_str(&fill);
    block.push('\n');

    block.push_str("    std::map<std::string, SMember> msg_params_members;\n");
    block.push_str(&member_lines);
    block.push('\n');

    block.push_str("    std::map<std::string, SMember> root_members_map;\n");
    block.push_str(&format!(
        "    root_members_map[{KEY_PARAMS}] = \
SMember(CObjectSchemaItem::create(params_members), true);\n"
    ));
    block.push_str(&format!(
        "    root_members_map[{KEY_MSG_PARAMS}] = \
SMember(CObjectSchemaItem::create(msg_params_members), true);\n"
    ));
    block.push('\n');

    block.push_str("    CSmartSchema schema(CObjectSchemaItem::create(root_members_map));\n");
    block.push('\n');

    block.push_str(&format!(
        "    functions_schemes_.insert(std::make_pair({SCHEMA_KEY}(\
FunctionID::{}, messageType::{}), schema));\n",
        function.function_id, function.message_kind
    ));
    block.push_str("  }\n\n");
    Ok(block)
}

// ------------------------------- Artifacts --------------------------------- //

fn declarations_artifact(
    working: &Interface,
    ctx: &GenContext,
    base: &str,
    namespace: &str,
) -> String {
    let guard = include_guard(namespace, base, "_H");
    let mut out = format!("#ifndef {guard}\n#define {guard}\n\n");

    if !working.params.is_empty() {
        out.push_str("// Interface parameters:\n");
        for (key, value) in &working.params {
            out.push_str(&format!("//   {key}: {value}\n"));
        }
        out.push('\n');
    }

    out.push_str(&namespace_open(namespace));

    for decl in &working.enums {
        out.push_str(&enum_declaration(decl));
        out.push('\n');
    }

    for block in ctx.element_list_blocks() {
        out.push_str(block);
        out.push('\n');
    }

    out.push_str(&format!(
        "class {base}Factory {{\n public:\n  {base}Factory();\n}};\n\n"
    ));

    out.push_str(&namespace_close(namespace));
    out.push_str(&format!("#endif  // {guard}\n"));
    out
}

fn schema_artifact(body: &str, base: &str, namespace: &str) -> String {
    let guard = include_guard(namespace, base, "_SCHEMA_H");
    let mut out = format!("#ifndef {guard}\n#define {guard}\n\n#include \"{base}.h\"\n\n");

    out.push_str(&namespace_open(namespace));
    out.push_str(&format!("{base}Factory::{base}Factory() {{\n"));
    out.push_str(body.strip_suffix('\n').unwrap_or(body));
    out.push_str("}\n\n");
    out.push_str(&namespace_close(namespace));
    out.push_str(&format!("#endif  // {guard}\n"));
    out
}

/// Enum `eType` declaration. Every generated enum opens with
/// `INVALID_ENUM = -1`; elements use the internal alias when present and
/// carry explicit values only where declared.
fn enum_declaration(decl: &crate::model::Enum) -> String {
    let mut out = String::new();
    for line in &decl.description {
        out.push_str(&format!("// {line}\n"));
    }
    out.push_str(&format!("namespace {} {{\nenum eType {{\n", decl.name));
    out.push_str("  INVALID_ENUM = -1,\n");
    for element in &decl.elements {
        match element.value {
            Some(value) => out.push_str(&format!("  {} = {value},\n", element.emitted_name())),
            None => out.push_str(&format!("  {},\n", element.emitted_name())),
        }
    }
    out.push_str(&format!("}};\n}}  // namespace {}\n", decl.name));
    out
}

fn include_guard(namespace: &str, base: &str, suffix: &str) -> String {
    let mut parts: Vec<String> = namespace
        .split("::")
        .filter(|p| !p.is_empty())
        .map(|p| to_snake_case(p).to_uppercase())
        .collect();
    parts.push(to_snake_case(base).to_uppercase());
    format!("{}{suffix}", parts.join("_"))
}

fn namespace_open(namespace: &str) -> String {
    let mut out = String::new();
    for part in namespace.split("::").filter(|p| !p.is_empty()) {
        out.push_str(&format!("namespace {part} {{\n"));
    }
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

fn namespace_close(namespace: &str) -> String {
    let mut out = String::new();
    let parts: Vec<&str> = namespace.split("::").filter(|p| !p.is_empty()).collect();
    for part in parts.into_iter().rev() {
        out.push_str(&format!("}}  // namespace {part}\n"));
    }
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

// --------------------------------- Tests ----------------------------------- //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Enum, EnumElement, Function, Param, Struct, TypeRef};
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingFs {
        dir_missing: bool,
        writes: RefCell<Vec<(PathBuf, String)>>,
    }

    impl FileSystem for RecordingFs {
        fn dir_exists(&self, _path: &Path) -> bool {
            !self.dir_missing
        }

        fn write_file(&self, path: &Path, contents: &str) -> io::Result<()> {
            self.writes
                .borrow_mut()
                .push((path.to_path_buf(), contents.to_string()));
            Ok(())
        }
    }

    fn enum_of(name: &str, elements: &[&str]) -> Enum {
        Enum {
            name: name.into(),
            elements: elements.iter().map(|e| EnumElement::named(*e)).collect(),
            ..Enum::default()
        }
    }

    fn fixture() -> Interface {
        Interface {
            enums: vec![
                enum_of("FunctionID", &["id1", "id2"]),
                enum_of("messageType", &["request", "response", "notification"]),
            ],
            structs: vec![Struct {
                name: "S1".into(),
                members: vec![Param {
                    name: "flag".into(),
                    ty: TypeRef::Boolean,
                    mandatory: true,
                    default_value: None,
                }],
                ..Struct::default()
            }],
            functions: vec![
                Function {
                    name: "F1".into(),
                    function_id: "id1".into(),
                    message_kind: "request".into(),
                    params: vec![Param {
                        name: "payload".into(),
                        ty: TypeRef::Struct { name: "S1".into() },
                        mandatory: false,
                        default_value: None,
                    }],
                },
                Function {
                    name: "F2".into(),
                    function_id: "id2".into(),
                    message_kind: "response".into(),
                    params: vec![],
                },
            ],
            ..Interface::default()
        }
    }

    fn run(iface: &Interface) -> Vec<(PathBuf, String)> {
        let fs = RecordingFs::default();
        generate_with(&fs, iface, "Test.xml", "XXX::YYY", Path::new("/out")).unwrap();
        fs.writes.into_inner()
    }

    #[test]
    fn writes_declarations_then_schema() {
        let writes = run(&fixture());
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0].0, Path::new("/out/Test.h"));
        assert_eq!(writes[1].0, Path::new("/out/Test_schema.h"));
    }

    #[test]
    fn declarations_cover_enums_lists_and_factory() {
        let writes = run(&fixture());
        let decls = &writes[0].1;

        assert!(decls.starts_with("#ifndef XXX_YYY_TEST_H\n#define XXX_YYY_TEST_H\n"));
        assert!(decls.ends_with("#endif  // XXX_YYY_TEST_H\n"));
        assert!(decls.contains("namespace XXX {\nnamespace YYY {\n"));
        assert!(decls.contains("}  // namespace YYY\n}  // namespace XXX\n"));

        assert!(decls.contains(
            "namespace FunctionID {\nenum eType {\n  INVALID_ENUM = -1,\n  id1,\n  id2,\n};\n"
        ));
        // Preprocessing appends the synthetic kind to the declaration too.
        assert!(decls.contains("  notification,\n  error_response,\n};"));

        assert!(decls.contains("static const FunctionID::eType function_id_items[] = {"));
        assert!(decls
            .contains("static const messageType::eType message_type_items[] = {"));
        assert!(decls.contains("  messageType::error_response,\n"));

        assert!(decls.contains("class TestFactory {\n public:\n  TestFactory();\n};\n"));
    }

    #[test]
    fn schema_body_orders_prefunction_structs_then_functions() {
        let writes = run(&fixture());
        let schema = &writes[1].1;

        assert!(schema.contains("#include \"Test.h\"\n"));
        assert!(schema.contains("TestFactory::TestFactory() {\n"));

        let prefunction = schema
            .find("messageType::error_response), error_response_schema")
            .unwrap();
        let struct_block = schema.find("std::map<std::string, SMember> s1_members;").unwrap();
        let first_function = schema.find("  {\n    std::map").unwrap();
        assert!(prefunction < struct_block);
        assert!(struct_block < first_function);

        // The declared struct is referenced by its cached identifier.
        assert!(schema.contains("msg_params_members[\"payload\"] = SMember(struct_s1, false);"));
        assert!(schema.contains("root_members_map[\
ns_smart_device_link::ns_json_handler::strings::S_MSG_PARAMS] = \
SMember(CObjectSchemaItem::create(msg_params_members), true);"));
        assert!(schema.contains("FunctionID::id1, messageType::request), schema));"));
        assert!(schema.contains("FunctionID::id2, messageType::response), schema));"));
    }

    #[test]
    fn response_function_also_gets_the_synthesized_registration() {
        let writes = run(&fixture());
        let schema = &writes[1].1;
        assert!(schema
            .contains("FunctionID::id2, messageType::error_response), error_response_schema));"));
    }

    #[test]
    fn empty_namespace_emits_no_wrapping() {
        let fs = RecordingFs::default();
        generate_with(&fs, &fixture(), "Test.xml", "", Path::new("/out")).unwrap();
        let writes = fs.writes.into_inner();
        assert!(!writes[0].1.contains("namespace XXX"));
        assert!(writes[0].1.starts_with("#ifndef TEST_H\n"));
    }

    #[test]
    fn missing_destination_dir_writes_nothing() {
        let fs = RecordingFs {
            dir_missing: true,
            ..RecordingFs::default()
        };
        let err = generate_with(&fs, &fixture(), "Test.xml", "", Path::new("/absent"));
        assert!(matches!(err, Err(GenError::Io { .. })));
        assert!(fs.writes.into_inner().is_empty());
    }

    #[test]
    fn semantic_failure_precedes_any_write() {
        let mut iface = fixture();
        iface.enums.push(enum_of("FunctionID", &["dup"]));
        let fs = RecordingFs::default();
        let err = generate_with(&fs, &iface, "Test.xml", "", Path::new("/out"));
        assert!(matches!(err, Err(GenError::Semantic { .. })));
        assert!(fs.writes.into_inner().is_empty());
    }

    #[test]
    fn filename_without_base_name_is_rejected() {
        let err = artifact_base("");
        assert!(matches!(err, Err(GenError::Contract { .. })));
        assert_eq!(artifact_base("dir/Test.xml").unwrap(), "Test");
    }

    #[test]
    fn generation_is_deterministic() {
        let first = run(&fixture());
        let second = run(&fixture());
        assert_eq!(first, second);
    }
}
