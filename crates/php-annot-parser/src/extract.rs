//! Extract annotation definitions from a tree-sitter CST.
//!
//! Walks the CST and produces `FileAnnotations`: the namespace, use
//! statements, and every annotation class declared in the file. A class is
//! an annotation definition when its docblock carries the `@Annotation`
//! marker or it is decorated with `#[Attribute]`.

use crate::docblock::parse_docblock;
use php_annot_types::*;
use tree_sitter::{Node, Tree};

/// Extract annotation-relevant facts from a parsed PHP file.
pub fn extract_file_annotations(tree: &Tree, source: &str, uri: &str) -> FileAnnotations {
    let mut result = FileAnnotations::default();
    let root = tree.root_node();

    let mut current_ns: Option<String> = None;
    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        if child.kind() == "namespace_definition" {
            let ns_name = find_namespace_name(child, source);
            if ns_name.is_some() {
                result.namespace = ns_name.clone();
            }
            current_ns = ns_name.clone();

            // Braced namespace: recurse into the body; unbraced applies to
            // the rest of the file.
            if let Some(body) = child.child_by_field_name("body") {
                let mut body_cursor = body.walk();
                for decl in body.children(&mut body_cursor) {
                    extract_from_node(decl, source, uri, &mut result, &ns_name);
                }
            }
        } else {
            extract_from_node(child, source, uri, &mut result, &current_ns);
        }
    }

    result
}

fn extract_from_node(
    node: Node,
    source: &str,
    uri: &str,
    result: &mut FileAnnotations,
    current_ns: &Option<String>,
) {
    match node.kind() {
        "namespace_use_declaration" => extract_use_statements(node, source, result),
        "class_declaration" => extract_annotation_class(node, source, uri, result, current_ns),
        _ => {}
    }
}

/// The namespace name lives in a `namespace_name` child, not a field.
fn find_namespace_name(node: Node, source: &str) -> Option<String> {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .find(|c| c.kind() == "namespace_name");
    found.map(|c| node_text(c, source).to_string())
}

/// Extract use statements, including grouped `use Prefix\{A, B as C};` form.
fn extract_use_statements(node: Node, source: &str, result: &mut FileAnnotations) {
    let kind = determine_use_kind(node, source);

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "namespace_use_clause" => {
                if let Some(stmt) = parse_use_clause(child, source, None, kind) {
                    result.use_statements.push(stmt);
                }
            }
            "namespace_use_group" => {
                let prefix = find_namespace_name(node, source);
                let mut group_cursor = child.walk();
                for clause in child.children(&mut group_cursor) {
                    if clause.kind() == "namespace_use_clause" {
                        if let Some(stmt) =
                            parse_group_use_clause(clause, source, prefix.as_deref(), kind)
                        {
                            result.use_statements.push(stmt);
                        }
                    }
                }
            }
            _ => {}
        }
    }
}

/// Top-level clause: `qualified_name, [as, name(alias)]` as direct children.
fn parse_use_clause(
    clause: Node,
    source: &str,
    _prefix: Option<&str>,
    kind: UseKind,
) -> Option<UseStatement> {
    let mut fqn: Option<String> = None;
    let mut alias: Option<String> = None;
    let mut saw_as = false;

    let mut cursor = clause.walk();
    for child in clause.children(&mut cursor) {
        match child.kind() {
            "qualified_name" | "namespace_name" | "name" if !saw_as => {
                fqn = Some(node_text(child, source).to_string());
            }
            "as" => saw_as = true,
            "name" if saw_as => alias = Some(node_text(child, source).to_string()),
            _ => {}
        }
    }

    Some(UseStatement {
        fqn: fqn?,
        alias,
        kind,
    })
}

/// Grouped clause: the name is the first named `name` child (only `alias` is
/// a field in the grammar).
fn parse_group_use_clause(
    clause: Node,
    source: &str,
    prefix: Option<&str>,
    kind: UseKind,
) -> Option<UseStatement> {
    let alias_node = clause.child_by_field_name("alias");
    let mut cursor = clause.walk();
    let name_node = clause.children(&mut cursor).find(|c| {
        matches!(c.kind(), "name" | "qualified_name")
            && alias_node.map_or(true, |a| a.id() != c.id())
    })?;
    let name = node_text(name_node, source);
    let fqn = match prefix {
        Some(p) if !p.is_empty() => format!("{}\\{}", p, name),
        _ => name.to_string(),
    };
    let alias = clause
        .child_by_field_name("alias")
        .map(|n| node_text(n, source).to_string());
    Some(UseStatement { fqn, alias, kind })
}

fn determine_use_kind(node: Node, source: &str) -> UseKind {
    let text = node_text(node, source);
    if text.starts_with("use function") {
        UseKind::Function
    } else if text.starts_with("use const") {
        UseKind::Constant
    } else {
        UseKind::Class
    }
}

/// Extract a class declaration if it is an annotation definition.
fn extract_annotation_class(
    node: Node,
    source: &str,
    uri: &str,
    result: &mut FileAnnotations,
    current_ns: &Option<String>,
) {
    let name_node = match node.child_by_field_name("name") {
        Some(n) => n,
        None => return,
    };
    let name = node_text(name_node, source).to_string();

    let doc = find_doc_comment(node, source).map(|c| parse_docblock(c));
    let attribute_targets = attribute_declaration_targets(node, source);

    let is_annotation =
        doc.as_ref().map(|d| d.is_annotation).unwrap_or(false) || attribute_targets.is_some();
    if !is_annotation {
        return;
    }

    // Docblock @Target wins over attribute flags when both declare one.
    let targets = match &doc {
        Some(d) if !d.targets.is_empty() => d.targets.clone(),
        _ => attribute_targets.unwrap_or_default(),
    };

    let fqn = match current_ns {
        Some(ns) if !ns.is_empty() => format!("{}\\{}", ns, name),
        _ => name.clone(),
    };

    let mut properties = Vec::new();
    if let Some(body) = node.child_by_field_name("body") {
        extract_properties(body, source, &mut properties);
    }

    tracing::debug!(
        "Extracted annotation definition {} ({} properties)",
        fqn,
        properties.len()
    );

    result.definitions.push(AnnotationDefinition {
        name,
        fqn,
        targets,
        properties,
        uri: uri.to_string(),
        summary: doc.and_then(|d| d.summary),
        is_builtin: false,
    });
}

/// If the class is decorated with `#[Attribute]` or `#[Attribute(...)]`,
/// return the declared targets (empty vec = attribute with no flags).
fn attribute_declaration_targets(class_node: Node, source: &str) -> Option<Vec<TargetKind>> {
    let mut cursor = class_node.walk();
    for child in class_node.children(&mut cursor) {
        if child.kind() != "attribute_list" {
            continue;
        }
        for attr in named_descendants_of_kind(child, "attribute") {
            let attr_name = attr
                .named_child(0)
                .map(|n| node_text(n, source))
                .unwrap_or("");
            if attr_name.trim_start_matches('\\') != "Attribute" {
                continue;
            }

            let mut targets = Vec::new();
            if let Some(args) = attr
                .child_by_field_name("parameters")
                .or_else(|| find_child_of_kind(attr, "arguments"))
            {
                // Flags appear as `Attribute::TARGET_* | ...`; scan the
                // argument text for the constant names.
                let text = node_text(args, source);
                for token in text.split(|c: char| !(c.is_alphanumeric() || c == '_')) {
                    if let Some(kind) = TargetKind::from_attribute_flag(token) {
                        if !targets.contains(&kind) {
                            targets.push(kind);
                        }
                    }
                }
            }
            return Some(targets);
        }
    }
    None
}

/// Extract non-constant properties from a class body, declaration order
/// preserved. Covers declared properties and constructor-promoted
/// parameters; class constants never become descriptors.
fn extract_properties(body: Node, source: &str, out: &mut Vec<PropertyDescriptor>) {
    let mut cursor = body.walk();
    for member in body.children(&mut cursor) {
        match member.kind() {
            "property_declaration" => {
                let mut element_cursor = member.walk();
                for element in member.children(&mut element_cursor) {
                    if element.kind() == "property_element" {
                        if let Some(prop) = property_from_element(element, source) {
                            out.push(prop);
                        }
                    }
                }
            }
            "method_declaration" => {
                let is_ctor = member
                    .child_by_field_name("name")
                    .map(|n| node_text(n, source) == "__construct")
                    .unwrap_or(false);
                if !is_ctor {
                    continue;
                }
                if let Some(params) = member.child_by_field_name("parameters") {
                    let mut param_cursor = params.walk();
                    for param in params.children(&mut param_cursor) {
                        if param.kind() == "property_promotion_parameter" {
                            if let Some(prop) = property_from_promoted_param(param, source) {
                                out.push(prop);
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }
}

fn property_from_element(element: Node, source: &str) -> Option<PropertyDescriptor> {
    let name_node = element.child_by_field_name("name")?;
    let raw_name = node_text(name_node, source);
    let name = raw_name.strip_prefix('$').unwrap_or(raw_name).to_string();

    let default = element
        .child_by_field_name("default_value")
        .or_else(|| child_after_equals(element));

    Some(descriptor(name, default, source))
}

fn property_from_promoted_param(param: Node, source: &str) -> Option<PropertyDescriptor> {
    let name_node = param.child_by_field_name("name")?;
    let raw_name = node_text(name_node, source);
    let name = raw_name.strip_prefix('$').unwrap_or(raw_name).to_string();

    let default = param.child_by_field_name("default_value");
    Some(descriptor(name, default, source))
}

fn descriptor(name: String, default: Option<Node>, source: &str) -> PropertyDescriptor {
    // The value-kind rule of the data model: an array literal default makes
    // the property a List, anything else is a Scalar.
    let value_kind = match default {
        Some(node) if node.kind() == "array_creation_expression" => ValueKind::List,
        _ => ValueKind::Scalar,
    };
    PropertyDescriptor {
        name,
        value_kind,
        default_value: default.map(|n| node_text(n, source).to_string()),
    }
}

/// First named child following the `=` token, used where the grammar does
/// not expose a `default_value` field.
fn child_after_equals<'a>(node: Node<'a>) -> Option<Node<'a>> {
    let mut saw_equals = false;
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "=" {
            saw_equals = true;
        } else if saw_equals && child.is_named() {
            return Some(child);
        }
    }
    None
}

fn find_child_of_kind<'a>(node: Node<'a>, kind: &str) -> Option<Node<'a>> {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).find(|c| c.kind() == kind);
    found
}

fn named_descendants_of_kind<'a>(node: Node<'a>, kind: &'a str) -> Vec<Node<'a>> {
    let mut found = Vec::new();
    let mut stack = vec![node];
    while let Some(n) = stack.pop() {
        if n.kind() == kind {
            found.push(n);
            continue;
        }
        for i in (0..n.named_child_count()).rev() {
            if let Some(child) = n.named_child(i) {
                stack.push(child);
            }
        }
    }
    found
}

/// Find the docblock immediately preceding a declaration node.
pub(crate) fn find_doc_comment<'a>(node: Node, source: &'a str) -> Option<&'a str> {
    let prev = node.prev_sibling()?;
    if prev.kind() == "comment" {
        let text = node_text(prev, source);
        if text.starts_with("/**") {
            return Some(text);
        }
    }
    None
}

pub(crate) fn node_text<'a>(node: Node, source: &'a str) -> &'a str {
    &source[node.byte_range()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::FileParser;

    fn parse_and_extract(code: &str) -> FileAnnotations {
        let mut parser = FileParser::new();
        parser.parse_full(code);
        let tree = parser.tree().unwrap();
        extract_file_annotations(tree, code, "file:///test.php")
    }

    #[test]
    fn test_docblock_annotation_class() {
        let file = parse_and_extract(
            "<?php\nnamespace App\\Annot;\n/**\n * @Annotation\n * @Target({\"CLASS\"})\n */\nclass Entity {\n    public string $repositoryClass = '';\n}\n",
        );
        assert_eq!(file.namespace.as_deref(), Some("App\\Annot"));
        assert_eq!(file.definitions.len(), 1);
        let def = &file.definitions[0];
        assert_eq!(def.name, "Entity");
        assert_eq!(def.fqn, "App\\Annot\\Entity");
        assert_eq!(def.targets, vec![TargetKind::Class]);
        assert_eq!(def.properties.len(), 1);
        assert_eq!(def.properties[0].name, "repositoryClass");
        assert_eq!(def.properties[0].value_kind, ValueKind::Scalar);
    }

    #[test]
    fn test_plain_class_is_not_a_definition() {
        let file = parse_and_extract("<?php\nclass UserService {\n    public string $name;\n}\n");
        assert!(file.definitions.is_empty());
    }

    #[test]
    fn test_value_kind_from_default_shape() {
        let file = parse_and_extract(
            "<?php\n/**\n * @Annotation\n */\nclass Route {\n    public string $name = '';\n    public array $methods = [];\n    public array $defaults = array();\n    public $requirements;\n}\n",
        );
        let props = &file.definitions[0].properties;
        assert_eq!(props.len(), 4);
        assert_eq!(props[0].name, "name");
        assert_eq!(props[0].value_kind, ValueKind::Scalar);
        assert_eq!(props[1].name, "methods");
        assert_eq!(props[1].value_kind, ValueKind::List);
        assert_eq!(props[2].name, "defaults");
        assert_eq!(props[2].value_kind, ValueKind::List);
        // No default at all is still a scalar.
        assert_eq!(props[3].name, "requirements");
        assert_eq!(props[3].value_kind, ValueKind::Scalar);
    }

    #[test]
    fn test_constants_are_not_properties() {
        let file = parse_and_extract(
            "<?php\n/**\n * @Annotation\n */\nclass Cache {\n    const DEFAULT_TTL = 60;\n    public int $ttl = 60;\n}\n",
        );
        let props = &file.definitions[0].properties;
        assert_eq!(props.len(), 1);
        assert_eq!(props[0].name, "ttl");
    }

    #[test]
    fn test_php8_attribute_class() {
        let file = parse_and_extract(
            "<?php\nnamespace App;\n#[Attribute(Attribute::TARGET_METHOD | Attribute::TARGET_FUNCTION)]\nclass Listener {\n    public string $event = '';\n}\n",
        );
        assert_eq!(file.definitions.len(), 1);
        let def = &file.definitions[0];
        assert_eq!(def.fqn, "App\\Listener");
        assert_eq!(def.targets, vec![TargetKind::Method, TargetKind::Function]);
    }

    #[test]
    fn test_php8_attribute_without_flags_is_unconstrained() {
        let file = parse_and_extract("<?php\n#[Attribute]\nclass Marker {}\n");
        assert_eq!(file.definitions.len(), 1);
        assert!(file.definitions[0].targets.is_empty());
    }

    #[test]
    fn test_promoted_constructor_properties() {
        let file = parse_and_extract(
            "<?php\n#[Attribute]\nclass Listen {\n    public function __construct(\n        public string $event = '',\n        public array $priorities = [],\n    ) {}\n}\n",
        );
        let props = &file.definitions[0].properties;
        assert_eq!(props.len(), 2);
        assert_eq!(props[0].name, "event");
        assert_eq!(props[0].value_kind, ValueKind::Scalar);
        assert_eq!(props[1].name, "priorities");
        assert_eq!(props[1].value_kind, ValueKind::List);
    }

    #[test]
    fn test_declaration_order_preserved() {
        let file = parse_and_extract(
            "<?php\n/**\n * @Annotation\n */\nclass Column {\n    public $name;\n    public $type;\n    public $options = [];\n}\n",
        );
        let names: Vec<&str> = file.definitions[0]
            .properties
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["name", "type", "options"]);
    }

    #[test]
    fn test_use_statements() {
        let file = parse_and_extract(
            "<?php\nuse Doctrine\\ORM\\Mapping\\Entity;\nuse App\\Annot\\Route as R;\nuse App\\Annot\\{Cache, Listen as L};\n",
        );
        assert_eq!(file.use_statements.len(), 4);
        assert_eq!(file.use_statements[0].fqn, "Doctrine\\ORM\\Mapping\\Entity");
        assert_eq!(file.use_statements[1].alias.as_deref(), Some("R"));
        assert_eq!(file.use_statements[2].fqn, "App\\Annot\\Cache");
        assert_eq!(file.use_statements[3].fqn, "App\\Annot\\Listen");
        assert_eq!(file.use_statements[3].alias.as_deref(), Some("L"));
    }

    #[test]
    fn test_docblock_summary_carried() {
        let file = parse_and_extract(
            "<?php\n/**\n * Marks a class as a persistent entity.\n *\n * @Annotation\n */\nclass Entity {}\n",
        );
        assert_eq!(
            file.definitions[0].summary.as_deref(),
            Some("Marks a class as a persistent entity.")
        );
    }
}
