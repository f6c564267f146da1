//! Concrete `SourceParser` backed by `tree-sitter`/`tree-sitter-go`.
//!
//! Mirrors the teacher's `parser/symbols.rs` shape: a compiled `Query` run
//! once per file via `QueryCursor`, followed by manual node inspection for
//! structure a flat query can't express (receiver types, struct fields,
//! interface method sets). Also mirrors the teacher's `parser/mod.rs`
//! thread-local `Parser` reuse, since `Loader::load` parses every package's
//! files in parallel with `rayon`.

use std::cell::RefCell;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use tree_sitter::{Node, Parser, Query, QueryCursor, StreamingIterator};

use crate::ir::{ReferenceKind, SymbolKind};

use super::{ExtractedImport, ExtractedReference, ExtractedSymbol, ParseOptions, ParsedFile, ParsedPackage, SourceParser};

thread_local! {
    static PARSER_GO: RefCell<Parser> = RefCell::new({
        let mut p = Parser::new();
        p.set_language(&tree_sitter_go::LANGUAGE.into())
            .expect("failed to load tree-sitter-go grammar");
        p
    });
}

const TOP_LEVEL_QUERY: &str = r#"
    (function_declaration name: (identifier) @name) @decl
    (method_declaration name: (field_identifier) @name) @decl
    (type_declaration (type_spec name: (type_identifier) @name)) @decl
    (const_declaration (const_spec name: (identifier) @name)) @decl
    (var_declaration (var_spec name: (identifier) @name)) @decl
    (import_declaration) @import_decl
"#;

static TOP_LEVEL: OnceLock<Query> = OnceLock::new();

fn top_level_query() -> &'static Query {
    TOP_LEVEL.get_or_init(|| {
        Query::new(&tree_sitter_go::LANGUAGE.into(), TOP_LEVEL_QUERY)
            .expect("invalid go top-level query")
    })
}

/// Parses Go source with `tree-sitter-go` and extracts the declarations
/// spec §4.3 step 5 enumerates.
pub struct GoTreeSitterParser;

impl GoTreeSitterParser {
    /// Construct the parser. Stateless — all mutable parser state is
    /// thread-local (see `PARSER_GO`).
    pub fn new() -> Self {
        Self
    }
}

impl Default for GoTreeSitterParser {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceParser for GoTreeSitterParser {
    fn load_package(&self, dir: &Path, opts: &ParseOptions) -> ParsedPackage {
        let mut package = ParsedPackage::default();

        let entries = match fs::read_dir(dir) {
            Ok(e) => e,
            Err(e) => {
                package.errors.push(format!("{}: {e}", dir.display()));
                return package;
            }
        };

        let mut go_files: Vec<std::path::PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("go"))
            .collect();
        go_files.sort();

        for path in go_files {
            let basename = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default()
                .to_owned();
            let is_test_file = crate::ir::file::looks_like_test_file(&basename);
            if is_test_file && !opts.include_tests {
                continue;
            }

            if let Some(limit) = opts.max_file_bytes {
                match fs::metadata(&path) {
                    Ok(meta) if meta.len() > limit => {
                        package
                            .errors
                            .push(format!("{}: exceeds max_file_bytes ({} > {limit})", path.display(), meta.len()));
                        continue;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        package.errors.push(format!("{}: {e}", path.display()));
                        continue;
                    }
                }
            }

            let source = match fs::read_to_string(&path) {
                Ok(s) => s,
                Err(e) => {
                    package.errors.push(format!("{}: {e}", path.display()));
                    continue;
                }
            };

            match parse_one_file(&path, &basename, &source, is_test_file) {
                Ok((parsed, mut decl_errors)) => {
                    if package.name.is_empty() {
                        if let Some(name) = extract_package_name(&source) {
                            package.name = name;
                        }
                    }
                    package.errors.append(&mut decl_errors);
                    package.files.push(parsed);
                }
                Err(e) => package.errors.push(format!("{}: {e}", path.display())),
            }
        }

        package
    }
}

fn extract_package_name(source: &str) -> Option<String> {
    for line in source.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("package ") {
            return Some(rest.trim().to_owned());
        }
    }
    None
}

fn parse_one_file(
    path: &Path,
    basename: &str,
    source: &str,
    is_test_file: bool,
) -> Result<(ParsedFile, Vec<String>), String> {
    let tree = PARSER_GO
        .with(|p| p.borrow_mut().parse(source.as_bytes(), None))
        .ok_or_else(|| "tree-sitter returned no tree".to_string())?;

    let query = top_level_query();
    let mut cursor = QueryCursor::new();
    let source_bytes = source.as_bytes();
    let mut matches = cursor.matches(query, tree.root_node(), source_bytes);

    let mut symbols = Vec::new();
    let mut imports = Vec::new();
    let mut references = Vec::new();
    let mut decl_errors = Vec::new();

    while let Some(m) = matches.next() {
        let mut decl_node: Option<Node> = None;
        let mut name_node: Option<Node> = None;
        let mut import_decl_node: Option<Node> = None;

        for cap in m.captures {
            let cap_name = query.capture_names()[cap.index as usize];
            match cap_name {
                "decl" => decl_node = Some(cap.node),
                "name" => name_node = Some(cap.node),
                "import_decl" => import_decl_node = Some(cap.node),
                _ => {}
            }
        }

        if let Some(import_node) = import_decl_node {
            imports.extend(extract_imports(import_node, source_bytes));
            continue;
        }

        let (Some(decl), Some(name)) = (decl_node, name_node) else {
            continue;
        };
        let name_text = node_text(name, source_bytes).to_owned();
        let decl_kind = decl.kind();

        // Per-declaration panic isolation (spec §4.3 step 6): a panic while
        // extracting one declaration is downgraded to a recorded error
        // instead of losing the rest of the file.
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let mut decl_symbols = Vec::new();
            let mut decl_references = Vec::new();
            match decl_kind {
                "function_declaration" => {
                    decl_symbols.push(ExtractedSymbol {
                        name: name_text.clone(),
                        kind: SymbolKind::Function,
                        receiver_type: None,
                        parent_name: None,
                        start_offset: decl.start_byte(),
                        end_offset: decl.end_byte(),
                        signature: Some(callable_signature(decl, source_bytes)),
                    });
                    collect_callable_references(decl, &name_text, source_bytes, &mut decl_references);
                }
                "method_declaration" => {
                    let receiver_type = decl
                        .child_by_field_name("receiver")
                        .and_then(|r| receiver_base_type(r, source_bytes));
                    decl_symbols.push(ExtractedSymbol {
                        name: name_text.clone(),
                        kind: SymbolKind::Method,
                        receiver_type,
                        parent_name: None,
                        start_offset: decl.start_byte(),
                        end_offset: decl.end_byte(),
                        signature: Some(callable_signature(decl, source_bytes)),
                    });
                    collect_callable_references(decl, &name_text, source_bytes, &mut decl_references);
                }
                "type_declaration" => {
                    decl_symbols.extend(extract_type_spec(decl, &name_text, name, source_bytes, &mut decl_references));
                }
                "const_declaration" => {
                    decl_symbols.push(ExtractedSymbol {
                        name: name_text.clone(),
                        kind: SymbolKind::Constant,
                        receiver_type: None,
                        parent_name: None,
                        start_offset: decl.start_byte(),
                        end_offset: decl.end_byte(),
                        signature: None,
                    });
                    walk_children(decl, source_bytes, None, &mut decl_references);
                }
                "var_declaration" => {
                    decl_symbols.push(ExtractedSymbol {
                        name: name_text.clone(),
                        kind: SymbolKind::Variable,
                        receiver_type: None,
                        parent_name: None,
                        start_offset: decl.start_byte(),
                        end_offset: decl.end_byte(),
                        signature: None,
                    });
                    walk_children(decl, source_bytes, None, &mut decl_references);
                }
                _ => {}
            }
            (decl_symbols, decl_references)
        }));

        match outcome {
            Ok((mut decl_symbols, mut decl_references)) => {
                symbols.append(&mut decl_symbols);
                references.append(&mut decl_references);
            }
            Err(_) => {
                decl_errors.push(format!("{basename}: panic while extracting `{name_text}` ({decl_kind})"));
            }
        }
    }

    Ok((
        ParsedFile {
            path: path.to_path_buf(),
            basename: basename.to_owned(),
            source: source.to_owned(),
            symbols,
            imports,
            references,
            is_test_file,
        },
        decl_errors,
    ))
}

/// Walk a function/method declaration's parameter list, result type and
/// body for reference use-sites, tagging them with the declaration's own
/// name as the enclosing symbol (spec §3.1 Reference "containing Symbol").
fn collect_callable_references<'a>(
    decl: Node<'a>,
    enclosing: &str,
    source: &'a [u8],
    out: &mut Vec<ExtractedReference>,
) {
    if let Some(params) = decl.child_by_field_name("parameters") {
        walk_children(params, source, Some(enclosing), out);
    }
    if let Some(result) = decl.child_by_field_name("result") {
        emit_type_use(result, source, Some(enclosing), out);
    }
    if let Some(body) = decl.child_by_field_name("body") {
        walk_children(body, source, Some(enclosing), out);
    }
}

/// Recurse into every named child of `node`, dispatching each to
/// [`walk_expr`].
fn walk_children<'a>(node: Node<'a>, source: &'a [u8], enclosing: Option<&str>, out: &mut Vec<ExtractedReference>) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        walk_expr(child, source, enclosing, out);
    }
}

/// A pragmatic syntactic reference walker: calls, plain selector reads,
/// assignment targets and type uses. Without a real type-checker seam
/// (spec §1, §6.1) a bare identifier read cannot be told apart from a
/// local variable, so this intentionally does not attempt to classify
/// every identifier — only the shapes that can be named without type
/// information.
fn walk_expr<'a>(node: Node<'a>, source: &'a [u8], enclosing: Option<&str>, out: &mut Vec<ExtractedReference>) {
    match node.kind() {
        "call_expression" => {
            if let Some(func) = node.child_by_field_name("function") {
                match func.kind() {
                    "identifier" => out.push(reference(func, source, None, ReferenceKind::Call, enclosing)),
                    "selector_expression" => {
                        if let Some(field) = func.child_by_field_name("field") {
                            let qualifier = func.child_by_field_name("operand").map(|o| node_text(o, source).to_owned());
                            out.push(reference(field, source, qualifier, ReferenceKind::Call, enclosing));
                        }
                        if let Some(operand) = func.child_by_field_name("operand") {
                            walk_expr(operand, source, enclosing, out);
                        }
                    }
                    _ => walk_expr(func, source, enclosing, out),
                }
            }
            if let Some(args) = node.child_by_field_name("arguments") {
                walk_children(args, source, enclosing, out);
            }
        }
        "selector_expression" => {
            if let Some(field) = node.child_by_field_name("field") {
                let qualifier = node.child_by_field_name("operand").map(|o| node_text(o, source).to_owned());
                out.push(reference(field, source, qualifier, ReferenceKind::Read, enclosing));
            }
            if let Some(operand) = node.child_by_field_name("operand") {
                walk_expr(operand, source, enclosing, out);
            }
        }
        "assignment_statement" => {
            if let Some(left) = node.child_by_field_name("left") {
                collect_write_targets(left, source, enclosing, out);
            }
            if let Some(right) = node.child_by_field_name("right") {
                walk_children(right, source, enclosing, out);
            }
        }
        "composite_literal" => {
            if let Some(ty) = node.child_by_field_name("type") {
                emit_type_use(ty, source, enclosing, out);
            }
            if let Some(body) = node.child_by_field_name("body") {
                walk_children(body, source, enclosing, out);
            }
        }
        "parameter_declaration" | "variadic_parameter_declaration" => {
            if let Some(ty) = node.child_by_field_name("type") {
                emit_type_use(ty, source, enclosing, out);
            }
        }
        "type_identifier" | "qualified_type" => {
            emit_type_use(node, source, enclosing, out);
        }
        _ => walk_children(node, source, enclosing, out),
    }
}

/// Emit `Write` references for every plain-identifier assignment target in
/// an `expression_list`; selector-expression targets (`x.Field = ...`)
/// still have their operand walked as a read.
fn collect_write_targets<'a>(node: Node<'a>, source: &'a [u8], enclosing: Option<&str>, out: &mut Vec<ExtractedReference>) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "identifier" => out.push(reference(child, source, None, ReferenceKind::Write, enclosing)),
            "selector_expression" => {
                if let Some(field) = child.child_by_field_name("field") {
                    let qualifier = child.child_by_field_name("operand").map(|o| node_text(o, source).to_owned());
                    out.push(reference(field, source, qualifier, ReferenceKind::Write, enclosing));
                }
                if let Some(operand) = child.child_by_field_name("operand") {
                    walk_expr(operand, source, enclosing, out);
                }
            }
            _ => walk_expr(child, source, enclosing, out),
        }
    }
}

/// Emit a `TypeUse` reference for a type node, unwrapping the shapes that
/// wrap a named type (pointer, slice, array) one level deep.
fn emit_type_use<'a>(node: Node<'a>, source: &'a [u8], enclosing: Option<&str>, out: &mut Vec<ExtractedReference>) {
    match node.kind() {
        "type_identifier" => out.push(reference(node, source, None, ReferenceKind::TypeUse, enclosing)),
        "qualified_type" => {
            if let (Some(pkg), Some(name)) = (node.child_by_field_name("package"), node.child_by_field_name("name")) {
                out.push(reference(name, source, Some(node_text(pkg, source).to_owned()), ReferenceKind::TypeUse, enclosing));
            }
        }
        "pointer_type" | "slice_type" | "array_type" => {
            if let Some(inner) = node.child_by_field_name("element").or_else(|| node.named_child(0)) {
                emit_type_use(inner, source, enclosing, out);
            }
        }
        "parameter_list" => {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                if let Some(ty) = child.child_by_field_name("type") {
                    emit_type_use(ty, source, enclosing, out);
                } else {
                    emit_type_use(child, source, enclosing, out);
                }
            }
        }
        _ => {}
    }
}

fn reference<'a>(
    name_node: Node<'a>,
    source: &'a [u8],
    qualifier: Option<String>,
    kind: ReferenceKind,
    enclosing: Option<&str>,
) -> ExtractedReference {
    ExtractedReference {
        name: node_text(name_node, source).to_owned(),
        qualifier,
        kind,
        enclosing_name: enclosing.map(|s| s.to_owned()),
        start_offset: name_node.start_byte(),
        end_offset: name_node.end_byte(),
    }
}

/// Canonical, parameter-name-stripped signature: `(paramType,paramType)(resultTypes)`.
/// Used to group structurally-identical methods across unrelated types for
/// the interface extractor's bipartite graph (spec §4.9), since there is no
/// real type-checker seam to compare resolved signatures with.
fn callable_signature<'a>(decl: Node<'a>, source: &'a [u8]) -> String {
    let params = decl
        .child_by_field_name("parameters")
        .map(|p| param_types(p, source))
        .unwrap_or_default();
    let result = decl
        .child_by_field_name("result")
        .map(|r| node_text(r, source).trim().to_owned())
        .unwrap_or_default();
    format!("({params}){result}")
}

fn param_types<'a>(param_list: Node<'a>, source: &'a [u8]) -> String {
    let mut cursor = param_list.walk();
    param_list
        .named_children(&mut cursor)
        .filter_map(|child| child.child_by_field_name("type").map(|ty| node_text(ty, source).to_owned()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Unwrap a pointer receiver once and return the receiver type's base
/// name (spec §4.3 step 5: "the receiver type's base name (pointer is
/// unwrapped once)").
fn receiver_base_type<'a>(receiver_list: Node<'a>, source: &'a [u8]) -> Option<String> {
    let param = receiver_list.named_child(0)?;
    let mut ty = param.child_by_field_name("type")?;
    if ty.kind() == "pointer_type" {
        ty = ty.named_child(0)?;
    }
    Some(node_text(ty, source).trim_start_matches('*').to_owned())
}

/// Expand a `type_spec` node into its own symbol plus, for struct/interface
/// right-hand sides, its children (fields or method signatures) per
/// spec §4.3 step 5.
fn extract_type_spec<'a>(
    decl: Node<'a>,
    name: &str,
    name_node: Node<'a>,
    source: &'a [u8],
    references: &mut Vec<ExtractedReference>,
) -> Vec<ExtractedSymbol> {
    let mut out = Vec::new();
    // `decl` here is the `type_declaration`; find the matching `type_spec`
    // that owns `name_node`.
    let Some(type_spec) = find_enclosing_type_spec(decl, name_node) else {
        return out;
    };
    let Some(rhs) = type_spec.child_by_field_name("type") else {
        return out;
    };

    match rhs.kind() {
        "struct_type" => {
            out.push(ExtractedSymbol {
                name: name.to_owned(),
                kind: SymbolKind::Struct,
                receiver_type: None,
                parent_name: None,
                start_offset: type_spec.start_byte(),
                end_offset: type_spec.end_byte(),
                signature: None,
            });
            out.extend(extract_struct_fields(rhs, name, source, references));
        }
        "interface_type" => {
            out.push(ExtractedSymbol {
                name: name.to_owned(),
                kind: SymbolKind::Interface,
                receiver_type: None,
                parent_name: None,
                start_offset: type_spec.start_byte(),
                end_offset: type_spec.end_byte(),
                signature: None,
            });
            out.extend(extract_interface_methods(rhs, name, source, references));
        }
        _ => out.push(ExtractedSymbol {
            name: name.to_owned(),
            kind: SymbolKind::Type,
            receiver_type: None,
            parent_name: None,
            start_offset: type_spec.start_byte(),
            end_offset: type_spec.end_byte(),
            signature: None,
        }),
    }

    out
}

fn find_enclosing_type_spec<'a>(decl: Node<'a>, name_node: Node<'a>) -> Option<Node<'a>> {
    let mut cursor = decl.walk();
    for child in decl.children(&mut cursor) {
        if child.kind() == "type_spec" {
            if let Some(n) = child.child_by_field_name("name") {
                if n.id() == name_node.id() {
                    return Some(child);
                }
            }
        }
    }
    None
}

fn extract_struct_fields<'a>(
    struct_type: Node<'a>,
    parent: &str,
    source: &'a [u8],
    references: &mut Vec<ExtractedReference>,
) -> Vec<ExtractedSymbol> {
    let mut out = Vec::new();
    let Some(body) = struct_type.child_by_field_name("body") else {
        return out;
    };
    let mut cursor = body.walk();
    for field_decl in body.children(&mut cursor) {
        if field_decl.kind() != "field_declaration" {
            continue;
        }
        let field_type = field_decl.child_by_field_name("type");
        if let Some(name_node) = field_decl.child_by_field_name("name") {
            out.push(ExtractedSymbol {
                name: node_text(name_node, source).to_owned(),
                kind: SymbolKind::Field,
                receiver_type: None,
                parent_name: Some(parent.to_owned()),
                start_offset: field_decl.start_byte(),
                end_offset: field_decl.end_byte(),
                signature: None,
            });
            if let Some(ty) = field_type {
                emit_type_use(ty, source, Some(parent), references);
            }
        } else {
            // Embedded field: the type name itself is the implicit field name.
            if let Some(ty) = field_decl.named_child(0) {
                out.push(ExtractedSymbol {
                    name: node_text(ty, source).trim_start_matches('*').to_owned(),
                    kind: SymbolKind::Field,
                    receiver_type: None,
                    parent_name: Some(parent.to_owned()),
                    start_offset: field_decl.start_byte(),
                    end_offset: field_decl.end_byte(),
                    signature: None,
                });
                emit_embed_use(ty, source, parent, references);
            }
        }
    }
    out
}

/// Like [`emit_type_use`] but tagged `Embed` (spec §3.1 ReferenceKind:
/// "a struct embedding another type") instead of `TypeUse`.
fn emit_embed_use<'a>(node: Node<'a>, source: &'a [u8], parent: &str, out: &mut Vec<ExtractedReference>) {
    let mut tmp = Vec::new();
    emit_type_use(node, source, Some(parent), &mut tmp);
    out.extend(tmp.into_iter().map(|r| ExtractedReference { kind: ReferenceKind::Embed, ..r }));
}

fn extract_interface_methods<'a>(
    iface_type: Node<'a>,
    parent: &str,
    source: &'a [u8],
    references: &mut Vec<ExtractedReference>,
) -> Vec<ExtractedSymbol> {
    let mut out = Vec::new();
    let mut cursor = iface_type.walk();
    for elem in iface_type.children(&mut cursor) {
        if elem.kind() != "method_spec" {
            continue;
        }
        if let Some(name_node) = elem.child_by_field_name("name") {
            out.push(ExtractedSymbol {
                name: node_text(name_node, source).to_owned(),
                kind: SymbolKind::Method,
                receiver_type: None,
                parent_name: Some(parent.to_owned()),
                start_offset: elem.start_byte(),
                end_offset: elem.end_byte(),
                signature: Some(callable_signature(elem, source)),
            });
            let method_name = node_text(name_node, source).to_owned();
            if let Some(params) = elem.child_by_field_name("parameters") {
                emit_type_use(params, source, Some(&method_name), references);
            }
            if let Some(result) = elem.child_by_field_name("result") {
                emit_type_use(result, source, Some(&method_name), references);
            }
        }
    }
    out
}

fn extract_imports<'a>(import_decl: Node<'a>, source: &'a [u8]) -> Vec<ExtractedImport> {
    let mut out = Vec::new();
    collect_import_specs(import_decl, source, &mut out);
    out
}

fn collect_import_specs<'a>(node: Node<'a>, source: &'a [u8], out: &mut Vec<ExtractedImport>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "import_spec" => {
                let path_node = child.child_by_field_name("path");
                let name_node = child.child_by_field_name("name");
                if let Some(path_node) = path_node {
                    let target = node_text(path_node, source).trim_matches('"').to_owned();
                    out.push(ExtractedImport {
                        target,
                        alias: name_node.map(|n| node_text(n, source).to_owned()),
                        start_offset: child.start_byte(),
                        end_offset: child.end_byte(),
                    });
                }
            }
            "import_spec_list" => collect_import_specs(child, source, out),
            _ => {}
        }
    }
}

fn node_text<'a>(node: Node<'a>, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn extracts_functions_structs_and_methods() {
        let dir = tempfile::tempdir().unwrap();
        let src = r#"package foo

type Reader struct {
	buf []byte
}

func (r *Reader) Read(p []byte) (int, error) {
	return 0, nil
}

type Closer interface {
	Close() error
}

const MaxSize = 1024

var Count int
"#;
        fs::write(dir.path().join("foo.go"), src).unwrap();

        let parser = GoTreeSitterParser::new();
        let parsed = parser.load_package(dir.path(), &ParseOptions { include_tests: false, max_file_bytes: None });

        assert_eq!(parsed.name, "foo");
        assert_eq!(parsed.files.len(), 1);
        let names: Vec<&str> = parsed.files[0].symbols.iter().map(|s| s.name.as_str()).collect();
        assert!(names.contains(&"Reader"));
        assert!(names.contains(&"Read"));
        assert!(names.contains(&"Closer"));
        assert!(names.contains(&"Close"));
        assert!(names.contains(&"MaxSize"));
        assert!(names.contains(&"Count"));

        let read = parsed.files[0]
            .symbols
            .iter()
            .find(|s| s.name == "Read" && s.kind == SymbolKind::Method)
            .unwrap();
        assert_eq!(read.receiver_type.as_deref(), Some("Reader"));
    }

    #[test]
    fn test_files_excluded_unless_requested() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("foo.go"), "package foo\n").unwrap();
        fs::write(dir.path().join("foo_test.go"), "package foo\n").unwrap();

        let parser = GoTreeSitterParser::new();
        let without_tests = parser.load_package(dir.path(), &ParseOptions { include_tests: false, max_file_bytes: None });
        assert_eq!(without_tests.files.len(), 1);

        let with_tests = parser.load_package(dir.path(), &ParseOptions { include_tests: true, max_file_bytes: None });
        assert_eq!(with_tests.files.len(), 2);
    }

    #[test]
    fn well_formed_declarations_report_no_extraction_errors() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("foo.go"),
            "package foo\n\nfunc Foo() int {\n\treturn 1\n}\n\ntype Bar struct {\n\tX int\n}\n",
        )
        .unwrap();

        let parser = GoTreeSitterParser::new();
        let parsed = parser.load_package(dir.path(), &ParseOptions { include_tests: false, max_file_bytes: None });
        assert!(parsed.errors.is_empty(), "unexpected extraction errors: {:?}", parsed.errors);
    }
}
