//! Shared types for php-annot-lsp.
//!
//! Contains the annotation data model — target kinds, value kinds, property
//! descriptors, and annotation definitions — used across the parser, index,
//! and completion crates.

use serde::{Deserialize, Serialize};

/// The kind of code construct an annotation may be applied to.
///
/// `All`, `Unknown`, and `Undefined` are declaration-side values: a
/// definition carrying one of them is applicable everywhere. A query never
/// asks for `All`; it asks for the concrete construct under the cursor, or
/// `Unknown` when the docblock is attached to something unclassifiable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetKind {
    Class,
    Method,
    Property,
    Function,
    All,
    Unknown,
    Undefined,
}

impl TargetKind {
    /// Parse a `@Target({"CLASS", ...})` token (Doctrine convention).
    pub fn from_doctrine_token(token: &str) -> Option<TargetKind> {
        match token {
            "CLASS" => Some(TargetKind::Class),
            "METHOD" => Some(TargetKind::Method),
            "PROPERTY" => Some(TargetKind::Property),
            "FUNCTION" => Some(TargetKind::Function),
            "ALL" => Some(TargetKind::All),
            _ => None,
        }
    }

    /// Parse a `Attribute::TARGET_*` flag name (PHP 8 attribute convention).
    pub fn from_attribute_flag(flag: &str) -> Option<TargetKind> {
        match flag {
            "TARGET_CLASS" => Some(TargetKind::Class),
            "TARGET_METHOD" => Some(TargetKind::Method),
            "TARGET_PROPERTY" => Some(TargetKind::Property),
            "TARGET_FUNCTION" => Some(TargetKind::Function),
            "TARGET_ALL" => Some(TargetKind::All),
            // Parameter/constant targets exist in PHP but have no docblock
            // counterpart; treat them as an unknown constraint.
            "TARGET_PARAMETER" | "TARGET_CLASS_CONSTANT" => Some(TargetKind::Unknown),
            _ => None,
        }
    }

    /// Whether this declared target satisfies a query for `wanted`.
    pub fn applies_to(self, wanted: TargetKind) -> bool {
        matches!(
            self,
            TargetKind::All | TargetKind::Unknown | TargetKind::Undefined
        ) || self == wanted
    }
}

impl std::fmt::Display for TargetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TargetKind::Class => "CLASS",
            TargetKind::Method => "METHOD",
            TargetKind::Property => "PROPERTY",
            TargetKind::Function => "FUNCTION",
            TargetKind::All => "ALL",
            TargetKind::Unknown => "UNKNOWN",
            TargetKind::Undefined => "UNDEFINED",
        };
        write!(f, "{}", s)
    }
}

/// The value shape of an annotation property.
///
/// Fixed once at definition time from the shape of the property's default
/// value: an array literal makes it `List`, anything else is `Scalar`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ValueKind {
    #[default]
    Scalar,
    List,
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueKind::Scalar => write!(f, "scalar"),
            ValueKind::List => write!(f, "list"),
        }
    }
}

/// A named property of an annotation definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    /// Property name without the leading `$`.
    pub name: String,
    /// Value shape, derived from the default value at extraction time.
    pub value_kind: ValueKind,
    /// Raw default value text, if the property declares one.
    pub default_value: Option<String>,
}

/// A single annotation class known to the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationDefinition {
    /// Short name (e.g. "Route").
    pub name: String,
    /// Fully qualified name (e.g. "Symfony\\Component\\Routing\\Annotation\\Route").
    pub fqn: String,
    /// Declared target constraint, in declaration order.
    ///
    /// Empty means unconstrained: the definition is assumed applicable
    /// everywhere, because static analysis cannot prove non-applicability.
    pub targets: Vec<TargetKind>,
    /// Non-constant properties, in declaration order.
    pub properties: Vec<PropertyDescriptor>,
    /// URI of the file the definition was extracted from.
    pub uri: String,
    /// Docblock summary line, if any.
    pub summary: Option<String>,
    /// True for bundled well-known annotations (not extracted from the
    /// workspace).
    pub is_builtin: bool,
}

impl AnnotationDefinition {
    /// Whether this definition is a candidate for the given target kind.
    ///
    /// Permissive by policy: an empty target set matches everything, and so
    /// do declared `All`/`Unknown`/`Undefined` targets.
    pub fn matches_target(&self, wanted: TargetKind) -> bool {
        self.targets.is_empty() || self.targets.iter().any(|t| t.applies_to(wanted))
    }
}

/// A use statement in a PHP file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UseStatement {
    pub fqn: String,
    pub alias: Option<String>,
    pub kind: UseKind,
}

/// Kind of use statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UseKind {
    Class,
    Function,
    Constant,
}

/// Annotation-relevant facts extracted from a single file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileAnnotations {
    pub namespace: Option<String>,
    pub use_statements: Vec<UseStatement>,
    /// Annotation classes declared in this file.
    pub definitions: Vec<AnnotationDefinition>,
}
