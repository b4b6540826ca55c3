//! Bundled annotation definitions for common frameworks.
//!
//! Workspaces rarely open the vendor tree in the editor, so the catalog is
//! seeded with definitions for the Doctrine and Symfony annotations users
//! actually type. Workspace-extracted definitions with the same FQN replace
//! these on update.

use crate::catalog::AnnotationCatalog;
use php_annot_types::{AnnotationDefinition, PropertyDescriptor, TargetKind, ValueKind};

/// Load all bundled definitions into the catalog. Returns how many were
/// inserted.
pub fn load_builtins(catalog: &AnnotationCatalog) -> usize {
    let defs = builtin_definitions();
    let count = defs.len();
    for def in defs {
        tracing::trace!("Bundled annotation definition {}", def.fqn);
        catalog.insert_builtin(def);
    }
    tracing::debug!("Loaded {} bundled annotation definitions", count);
    count
}

fn builtin_definitions() -> Vec<AnnotationDefinition> {
    vec![
        // Doctrine ORM mapping
        def(
            "Doctrine\\ORM\\Mapping\\Entity",
            "Marks a class as a persistent Doctrine entity.",
            &[TargetKind::Class],
            &[
                scalar("repositoryClass"),
                scalar("readOnly"),
            ],
        ),
        def(
            "Doctrine\\ORM\\Mapping\\Table",
            "Names the database table an entity is stored in.",
            &[TargetKind::Class],
            &[
                scalar("name"),
                scalar("schema"),
                list("indexes"),
                list("uniqueConstraints"),
                list("options"),
            ],
        ),
        def(
            "Doctrine\\ORM\\Mapping\\Column",
            "Maps a property to a database column.",
            &[TargetKind::Property],
            &[
                scalar("name"),
                scalar("type"),
                scalar("length"),
                scalar("unique"),
                scalar("nullable"),
                list("options"),
            ],
        ),
        def(
            "Doctrine\\ORM\\Mapping\\Id",
            "Marks a property as part of the entity identifier.",
            &[TargetKind::Property],
            &[],
        ),
        def(
            "Doctrine\\ORM\\Mapping\\GeneratedValue",
            "Configures identifier generation for an id property.",
            &[TargetKind::Property],
            &[scalar("strategy")],
        ),
        def(
            "Doctrine\\ORM\\Mapping\\ManyToOne",
            "Defines a many-to-one association to another entity.",
            &[TargetKind::Property],
            &[
                scalar("targetEntity"),
                scalar("inversedBy"),
                list("cascade"),
                scalar("fetch"),
            ],
        ),
        def(
            "Doctrine\\ORM\\Mapping\\OneToMany",
            "Defines a one-to-many association to another entity.",
            &[TargetKind::Property],
            &[
                scalar("targetEntity"),
                scalar("mappedBy"),
                list("cascade"),
                scalar("fetch"),
                scalar("orphanRemoval"),
            ],
        ),
        def(
            "Doctrine\\ORM\\Mapping\\JoinColumn",
            "Configures the join column of an association.",
            &[TargetKind::Property, TargetKind::Unknown],
            &[
                scalar("name"),
                scalar("referencedColumnName"),
                scalar("nullable"),
                scalar("onDelete"),
            ],
        ),
        // Symfony routing and framework-extra
        def(
            "Symfony\\Component\\Routing\\Annotation\\Route",
            "Maps a request path to a controller class or method.",
            &[TargetKind::Class, TargetKind::Method],
            &[
                scalar("path"),
                scalar("name"),
                list("requirements"),
                list("defaults"),
                list("methods"),
                list("schemes"),
            ],
        ),
        def(
            "Sensio\\Bundle\\FrameworkExtraBundle\\Configuration\\Template",
            "Renders the template named after the controller action.",
            &[TargetKind::Method],
            &[scalar("template"), list("vars")],
        ),
        def(
            "Symfony\\Component\\Validator\\Constraints\\NotBlank",
            "Validates that a value is not blank.",
            &[TargetKind::Property, TargetKind::Method],
            &[scalar("message"), list("groups")],
        ),
        def(
            "Symfony\\Component\\Validator\\Constraints\\Length",
            "Validates the length of a string value.",
            &[TargetKind::Property, TargetKind::Method],
            &[
                scalar("min"),
                scalar("max"),
                scalar("minMessage"),
                scalar("maxMessage"),
                list("groups"),
            ],
        ),
    ]
}

fn def(
    fqn: &str,
    summary: &str,
    targets: &[TargetKind],
    properties: &[PropertyDescriptor],
) -> AnnotationDefinition {
    let name = fqn.rsplit('\\').next().unwrap_or(fqn).to_string();
    AnnotationDefinition {
        name,
        fqn: fqn.to_string(),
        targets: targets.to_vec(),
        properties: properties.to_vec(),
        uri: String::new(),
        summary: Some(summary.to_string()),
        is_builtin: true,
    }
}

fn scalar(name: &str) -> PropertyDescriptor {
    PropertyDescriptor {
        name: name.to_string(),
        value_kind: ValueKind::Scalar,
        default_value: None,
    }
}

fn list(name: &str) -> PropertyDescriptor {
    PropertyDescriptor {
        name: name.to_string(),
        value_kind: ValueKind::List,
        default_value: None,
    }
}
