use tree_sitter::Node;

use crate::TextRange;

/// Extract the source text for a tree-sitter node.
pub fn node_text<'a>(node: Node<'_>, source: &'a str) -> &'a str {
    &source[node.byte_range()]
}

/// Find the first child with a specific kind.
pub fn find_child_by_kind<'a>(node: Node<'a>, kind: &str) -> Option<Node<'a>> {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .find(|child| child.kind() == kind)
}

/// Find a child by field name.
pub fn child_by_field<'a>(node: Node<'a>, field: &str) -> Option<Node<'a>> {
    node.child_by_field_name(field)
}

/// Convert a tree-sitter node to a `TextRange`.
pub fn node_range(node: Node<'_>) -> TextRange {
    node.range().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> tree_sitter::Tree {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .unwrap();
        parser.parse(source, None).unwrap()
    }

    #[test]
    fn node_text_slices_source() {
        let source = "x = 1\n";
        let tree = parse(source);
        let stmt = tree.root_node().child(0).unwrap();
        assert_eq!(node_text(stmt, source), "x = 1");
    }

    #[test]
    fn child_by_field_finds_name() {
        let source = "def foo():\n    pass\n";
        let tree = parse(source);
        let def = tree.root_node().child(0).unwrap();
        let name = child_by_field(def, "name").unwrap();
        assert_eq!(node_text(name, source), "foo");
    }
}
