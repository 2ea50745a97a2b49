//! Repository layout configuration.
//!
//! Every path the core reads or writes is derived from a [`Config`] value
//! passed in explicitly. Defaults describe the conventional layout; a
//! `canonid.toml` at the repository root overrides any subset of fields.

use crate::core::error::CanonError;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "canonid.toml";

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Repository root. Not read from the config file.
    #[serde(skip)]
    pub root: PathBuf,
    pub constitution_dir: String,
    /// Canonical documents, relative to `constitution_dir`. All are required.
    pub canonical_docs: Vec<String>,
    /// Tag taxonomy, relative to `constitution_dir`. Optional on disk.
    pub tag_taxonomy: String,
    /// Extra documents scanned for references, relative to the root. Optional on disk.
    pub reference_docs: Vec<String>,
    pub adr_dir: String,
    pub specs_dir: String,
    /// Filename prefix of spec documents (`FS-0042-slug.md`).
    pub spec_prefix: String,
    /// Files in `specs_dir` that are never linted.
    pub spec_skip: Vec<String>,
    pub outputs: Outputs,
}

/// Generated artifact filenames, relative to `constitution_dir`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Outputs {
    pub id_index: String,
    pub id_index_by_tag: String,
    pub catalog: String,
}

impl Default for Outputs {
    fn default() -> Self {
        Self {
            id_index: "id-index.md".to_string(),
            id_index_by_tag: "id-index-by-tag.md".to_string(),
            catalog: "id-catalog.json".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            constitution_dir: "docs/constitution".to_string(),
            canonical_docs: vec![
                "invariants.md".to_string(),
                "domain-model.md".to_string(),
                "acceptance-kill.md".to_string(),
            ],
            tag_taxonomy: "tag-taxonomy.md".to_string(),
            reference_docs: vec!["docs/constitution.md".to_string()],
            adr_dir: "docs/adr".to_string(),
            specs_dir: "docs/specs".to_string(),
            spec_prefix: "FS".to_string(),
            spec_skip: vec!["_TEMPLATE.md".to_string(), "README.md".to_string()],
            outputs: Outputs::default(),
        }
    }
}

impl Config {
    /// Default layout rooted at `root`.
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Load `config_path` (or `<root>/canonid.toml`) if it exists, defaults otherwise.
    pub fn load(root: &Path, config_path: Option<&Path>) -> Result<Self, CanonError> {
        let path = match config_path {
            Some(p) => p.to_path_buf(),
            None => root.join(CONFIG_FILE),
        };
        if !path.exists() {
            if config_path.is_some() {
                return Err(CanonError::NotFound(format!(
                    "config file {}",
                    path.display()
                )));
            }
            return Ok(Self::for_root(root));
        }
        let content = fs::read_to_string(&path)?;
        let mut config: Config =
            toml::from_str(&content).map_err(|source| CanonError::ConfigError {
                path: path.clone(),
                source,
            })?;
        config.root = root.to_path_buf();
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Root-relative posix path of a file inside the constitution directory.
    pub fn constitution_rel(&self, name: &str) -> String {
        join_rel(&self.constitution_dir, name)
    }

    pub fn canonical_doc_paths(&self) -> Vec<String> {
        self.canonical_docs
            .iter()
            .map(|d| self.constitution_rel(d))
            .collect()
    }

    pub fn taxonomy_rel(&self) -> String {
        self.constitution_rel(&self.tag_taxonomy)
    }

    pub fn id_index_rel(&self) -> String {
        self.constitution_rel(&self.outputs.id_index)
    }

    pub fn id_index_by_tag_rel(&self) -> String {
        self.constitution_rel(&self.outputs.id_index_by_tag)
    }

    pub fn catalog_rel(&self) -> String {
        self.constitution_rel(&self.outputs.catalog)
    }

    /// Absolute (root-joined) path of a root-relative posix path.
    pub fn abs(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    /// Root-relative posix form of `path`, or its display form when outside the root.
    pub fn rel(&self, path: &Path) -> String {
        match path.strip_prefix(&self.root) {
            Ok(stripped) => stripped
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/"),
            Err(_) => path.to_string_lossy().replace('\\', "/"),
        }
    }
}

fn join_rel(dir: &str, name: &str) -> String {
    let dir = dir.trim_end_matches('/');
    if dir.is_empty() || dir == "." {
        name.to_string()
    } else {
        format!("{}/{}", dir, name)
    }
}
