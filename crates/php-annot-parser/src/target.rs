//! Classify what kind of declaration an annotation at a position applies to.
//!
//! The cursor is either inside a docblock comment or inside a `#[...]`
//! attribute list; in both cases the annotated construct is the next
//! declaration following it in the CST.

use php_annot_types::TargetKind;
use tree_sitter::{Node, Point, Tree};

/// Determine the target kind for an annotation written at the given
/// position. Returns `None` when the position annotates nothing (end of
/// file, trailing comment with no declaration after it).
pub fn target_at(tree: &Tree, source: &str, line: u32, character: u32) -> Option<TargetKind> {
    let point = Point::new(line as usize, character as usize);
    let node = smallest_node_at(tree.root_node(), point)?;

    if let Some(attr_list) = ancestor_of_kind(node, "attribute_list") {
        // `#[...]` attaches to its parent declaration directly.
        return attr_list.parent().map(classify_declaration);
    }

    let comment = if node.kind() == "comment" {
        node
    } else {
        ancestor_of_kind(node, "comment")?
    };
    if !source[comment.byte_range()].starts_with("/**") {
        return None;
    }

    following_declaration(comment).map(classify_declaration)
}

/// Walk forward from a docblock to the declaration it documents, skipping
/// further comments and attribute lists between the two.
fn following_declaration(comment: Node) -> Option<Node> {
    let mut current = comment;
    loop {
        let next = current.next_named_sibling()?;
        match next.kind() {
            "comment" | "attribute_list" | "text_interpolation" => current = next,
            _ => return Some(next),
        }
    }
}

fn classify_declaration(node: Node) -> TargetKind {
    match node.kind() {
        "class_declaration"
        | "interface_declaration"
        | "trait_declaration"
        | "enum_declaration" => TargetKind::Class,
        "method_declaration" => TargetKind::Method,
        "property_declaration" => TargetKind::Property,
        "function_definition" => TargetKind::Function,
        // A docblock on some other construct (a statement, a constant) is
        // still an annotation site, just one we cannot name.
        _ => TargetKind::Unknown,
    }
}

pub fn ancestor_of_kind<'a>(node: Node<'a>, kind: &str) -> Option<Node<'a>> {
    let mut current = node;
    while let Some(parent) = current.parent() {
        if parent.kind() == kind {
            return Some(parent);
        }
        current = parent;
    }
    None
}

/// Deepest node whose range contains the point, comments included. The
/// descendant lookups on `Node` skip extras, which is exactly wrong here:
/// docblocks are extras.
pub fn smallest_node_at(root: Node, point: Point) -> Option<Node> {
    if point < root.start_position() || point > root.end_position() {
        return None;
    }
    let mut current = root;
    loop {
        let mut cursor = current.walk();
        let next = current
            .children(&mut cursor)
            .find(|child| point >= child.start_position() && point <= child.end_position());
        match next {
            Some(child) => current = child,
            None => return Some(current),
        }
    }
}
