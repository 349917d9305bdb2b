use tree_sitter::StreamingIterator;

use crate::helpers::{child_by_field, find_child_by_kind, node_range, node_text};
use crate::{ClassDecl, FileOutline, FnDecl, FrontEnd, ImportDecl, LangError, Result, VarDecl};

/// The tree-sitter reference query source for Python.
pub const PYTHON_REFERENCES_QUERY_SOURCE: &str = include_str!("queries/python-references.scm");

#[derive(Debug)]
pub struct PythonFrontEnd;

impl FrontEnd for PythonFrontEnd {
    fn id(&self) -> &'static str {
        "python"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["py"]
    }

    fn tree_sitter_language(&self) -> tree_sitter::Language {
        tree_sitter_python::LANGUAGE.into()
    }

    fn parse(&self, source: &str) -> Result<tree_sitter::Tree> {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&self.tree_sitter_language())
            .map_err(|e| LangError::Parse(e.to_string()))?;
        parser
            .parse(source, None)
            .ok_or_else(|| LangError::Parse("tree-sitter produced no tree".to_string()))
    }

    fn outline(&self, tree: &tree_sitter::Tree, source: &str) -> FileOutline {
        let mut outline = FileOutline::default();

        let root = tree.root_node();
        let mut cursor = root.walk();
        for child in root.children(&mut cursor) {
            outline_statement(child, source, &mut outline);
        }

        outline
    }

    fn capture_references(&self, source: &str) -> Result<Vec<String>> {
        let tree = self.parse(source)?;
        let language = self.tree_sitter_language();
        let query = tree_sitter::Query::new(&language, PYTHON_REFERENCES_QUERY_SOURCE)
            .map_err(|e| LangError::Query(e.to_string()))?;

        let mut names = Vec::new();
        let mut cursor = tree_sitter::QueryCursor::new();
        let mut captures = cursor.captures(&query, tree.root_node(), source.as_bytes());
        while let Some((mat, capture_index)) = captures.next() {
            let capture = mat.captures[*capture_index];
            let capture_name = query.capture_names()[capture.index as usize];
            if capture_name == "name.reference" {
                names.push(node_text(capture.node, source).to_string());
            }
        }

        Ok(names)
    }
}

fn outline_statement(node: tree_sitter::Node<'_>, source: &str, outline: &mut FileOutline) {
    match node.kind() {
        "import_statement" => outline_import(node, source, outline),
        "import_from_statement" => outline_from_import(node, source, outline),
        "expression_statement" => outline_assignment(node, source, outline),
        "function_definition" => {
            if let Some(decl) = function_decl(node, source) {
                outline.functions.push(decl);
            }
        }
        "class_definition" => {
            if let Some(decl) = class_decl(node, source) {
                outline.classes.push(decl);
            }
        }
        "decorated_definition" => {
            // Unwrap decorator to get the inner definition
            let inner = find_child_by_kind(node, "function_definition")
                .or_else(|| find_child_by_kind(node, "class_definition"));
            if let Some(def) = inner {
                outline_statement(def, source, outline);
            }
        }
        _ => {}
    }
}

/// `import a.b, c as d` — one record per listed module.
fn outline_import(node: tree_sitter::Node<'_>, source: &str, outline: &mut FileOutline) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "dotted_name" => {
                let name = node_text(child, source);
                outline.imports.push(ImportDecl {
                    specifier: name.to_string(),
                    imported: name.to_string(),
                    alias: None,
                });
            }
            "aliased_import" => {
                let name = child_by_field(child, "name").map_or("", |n| node_text(n, source));
                let alias = child_by_field(child, "alias").map(|n| node_text(n, source));
                outline.imports.push(ImportDecl {
                    specifier: name.to_string(),
                    imported: name.to_string(),
                    alias: alias.map(String::from),
                });
            }
            _ => {}
        }
    }
}

/// `from pkg.mod import A as B, C` — one record per imported name, with the
/// module prefix folded into the specifier. Relative modules keep their
/// leading dots; a bare-dot module concatenates directly (`from . import x`
/// yields specifier `.x`).
fn outline_from_import(node: tree_sitter::Node<'_>, source: &str, outline: &mut FileOutline) {
    let module_node = child_by_field(node, "module_name");
    let module = module_node.map_or("", |n| node_text(n, source));
    let module_id = module_node.map(|n| n.id());

    let mut push = |name: &str, alias: Option<&str>| {
        let specifier = if module.ends_with('.') {
            format!("{module}{name}")
        } else {
            format!("{module}.{name}")
        };
        outline.imports.push(ImportDecl {
            specifier,
            imported: name.to_string(),
            alias: alias.map(String::from),
        });
    };

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if Some(child.id()) == module_id {
            continue;
        }
        match child.kind() {
            "dotted_name" => push(node_text(child, source), None),
            "aliased_import" => {
                let name = child_by_field(child, "name").map_or("", |n| node_text(n, source));
                let alias = child_by_field(child, "alias").map(|n| node_text(n, source));
                push(name, alias);
            }
            _ => {}
        }
    }
}

/// Module-scope simple assignment with an identifier left-hand side.
/// Augmented assignments (`x += 1`) are deliberately not outlined.
fn outline_assignment(node: tree_sitter::Node<'_>, source: &str, outline: &mut FileOutline) {
    let Some(expr) = node.child(0) else {
        return;
    };
    if expr.kind() != "assignment" {
        return;
    }
    let Some(left) = child_by_field(expr, "left") else {
        return;
    };
    if left.kind() == "identifier" {
        outline.variables.push(VarDecl {
            name: node_text(left, source).to_string(),
            text: node_text(expr, source).to_string(),
            range: node_range(expr),
        });
    }
}

fn function_decl(node: tree_sitter::Node<'_>, source: &str) -> Option<FnDecl> {
    let name_node = child_by_field(node, "name")?;
    Some(FnDecl {
        name: node_text(name_node, source).to_string(),
        text: node_text(node, source).to_string(),
        range: node_range(node),
    })
}

fn class_decl(node: tree_sitter::Node<'_>, source: &str) -> Option<ClassDecl> {
    let name_node = child_by_field(node, "name")?;

    // Base-list entries: only plain identifiers and dotted attributes count
    let mut bases = Vec::new();
    if let Some(superclasses) = child_by_field(node, "superclasses") {
        let mut cursor = superclasses.walk();
        for arg in superclasses.children(&mut cursor) {
            match arg.kind() {
                "identifier" | "attribute" => bases.push(node_text(arg, source).to_string()),
                _ => {}
            }
        }
    }

    // Methods: function definitions directly in the class body, one level deep
    let mut methods = Vec::new();
    if let Some(body) = child_by_field(node, "body") {
        let mut cursor = body.walk();
        for stmt in body.children(&mut cursor) {
            let def = match stmt.kind() {
                "function_definition" => Some(stmt),
                "decorated_definition" => find_child_by_kind(stmt, "function_definition"),
                _ => None,
            };
            if let Some(def) = def {
                if let Some(decl) = function_decl(def, source) {
                    methods.push(decl);
                }
            }
        }
    }

    Some(ClassDecl {
        name: node_text(name_node, source).to_string(),
        text: node_text(node, source).to_string(),
        range: node_range(node),
        bases,
        methods,
    })
}
