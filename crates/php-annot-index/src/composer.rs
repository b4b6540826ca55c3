//! Composer.json parsing and namespace mapping.
//!
//! Parses composer.json to extract PSR-4 autoload configuration and builds
//! the namespace-to-directory mapping used to decide which directories to
//! scan for annotation classes.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Namespace mapping extracted from composer.json autoload config.
#[derive(Debug, Clone, Default)]
pub struct NamespaceMap {
    /// PSR-4: namespace prefix → directories
    pub psr4: Vec<(String, Vec<PathBuf>)>,
    /// files: specific files to always load (annotation helpers, etc.)
    pub files: Vec<PathBuf>,
}

impl NamespaceMap {
    /// Resolve a fully qualified class name to possible file paths.
    ///
    /// E.g., with mapping `App\` → `src/`, resolving `App\Annot\Route`
    /// returns `[src/Annot/Route.php]`.
    pub fn resolve_class_to_paths(&self, fqn: &str) -> Vec<PathBuf> {
        let mut results = Vec::new();
        for (prefix, dirs) in &self.psr4 {
            if let Some(relative) = fqn.strip_prefix(prefix.as_str()) {
                let relative_path = relative.replace('\\', "/") + ".php";
                for dir in dirs {
                    results.push(dir.join(&relative_path));
                }
            }
        }
        results
    }

    /// All directories that should be scanned for annotation classes.
    pub fn source_directories(&self) -> Vec<&Path> {
        let mut dirs: Vec<&Path> = Vec::new();
        for (_, paths) in &self.psr4 {
            for p in paths {
                dirs.push(p.as_path());
            }
        }
        dirs
    }
}

/// Partial composer.json schema (only what we need).
#[derive(Debug, Deserialize, Default)]
struct ComposerJson {
    #[serde(default)]
    autoload: AutoloadSection,
    #[serde(default, rename = "autoload-dev")]
    autoload_dev: AutoloadSection,
}

#[derive(Debug, Deserialize, Default)]
struct AutoloadSection {
    #[serde(default, rename = "psr-4")]
    psr4: HashMap<String, Psr4Value>,
    #[serde(default)]
    files: Vec<String>,
}

/// PSR-4 value can be a string or array of strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Psr4Value {
    Single(String),
    Multiple(Vec<String>),
}

impl Psr4Value {
    fn to_paths(&self, base_dir: &Path) -> Vec<PathBuf> {
        match self {
            Psr4Value::Single(s) => vec![base_dir.join(s)],
            Psr4Value::Multiple(v) => v.iter().map(|s| base_dir.join(s)).collect(),
        }
    }
}

/// Parse composer.json from the given path and return a NamespaceMap.
pub fn parse_composer_json(path: &Path) -> Result<NamespaceMap, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    parse_composer_json_str(&content, path.parent().unwrap_or(Path::new(".")))
}

/// Parse composer.json content with a base directory for resolving paths.
pub fn parse_composer_json_str(content: &str, base_dir: &Path) -> Result<NamespaceMap, String> {
    let composer: ComposerJson =
        serde_json::from_str(content).map_err(|e| format!("Invalid composer.json: {}", e))?;

    let mut map = NamespaceMap::default();
    process_autoload_section(&composer.autoload, base_dir, &mut map);
    process_autoload_section(&composer.autoload_dev, base_dir, &mut map);
    Ok(map)
}

fn process_autoload_section(section: &AutoloadSection, base_dir: &Path, map: &mut NamespaceMap) {
    for (prefix, value) in &section.psr4 {
        map.psr4.push((prefix.clone(), value.to_paths(base_dir)));
    }
    for path in &section.files {
        map.files.push(base_dir.join(path));
    }
}
