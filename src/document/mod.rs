//! Project documents on disk
//!
//! A project is a manifest plus, beside it, one structural document per
//! namespace (`<ns>.xml`), an optional view-template document
//! (`<ns>.vt.xml`) and one translation document per language (`<lang>.xml`).
//! Every write replaces the whole file.

pub mod codec;
pub mod map;
pub mod translation;
pub mod xml;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use self::translation::{decode_translation, encode_translation, Translation};
use self::xml::{Element, XmlError};
use crate::error::{MfdError, Result};
use crate::graph::Project;

pub use map::TextMap;

const VT_SUFFIX: &str = ".vt.xml";
const XML_SUFFIX: &str = ".xml";

/// Options for reading a project
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Start an empty project named after the manifest when it does not exist
    pub create_missing: bool,
}

/// Options for writing documents
#[derive(Debug, Clone)]
pub struct WriteOptions {
    pub indent: usize,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self { indent: 4 }
    }
}

pub fn namespace_path(dir: &Path, namespace: &str) -> PathBuf {
    dir.join(format!("{namespace}{XML_SUFFIX}"))
}

pub fn vt_path(dir: &Path, namespace: &str) -> PathBuf {
    dir.join(format!("{namespace}{VT_SUFFIX}"))
}

pub fn translation_path(dir: &Path, language: &str) -> PathBuf {
    dir.join(format!("{language}{XML_SUFFIX}"))
}

/// Directory the companion documents of a manifest live in
pub fn project_dir(manifest: &Path) -> PathBuf {
    match manifest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn read_document(path: &Path) -> Result<Element> {
    let content = fs::read_to_string(path).map_err(|e| MfdError::io(path, e))?;
    xml::parse(&content).map_err(|source| MfdError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn render_document(path: &Path, element: &Element, options: &WriteOptions) -> Result<String> {
    xml::write(element, options.indent).map_err(|source| match source {
        XmlError::Write(e) => MfdError::io(path, e),
        source => MfdError::Parse {
            path: path.to_path_buf(),
            source,
        },
    })
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| MfdError::io(parent, e))?;
    }
    fs::write(path, content).map_err(|e| MfdError::io(path, e))
}

/// Read the manifest and every namespace it lists, without linking
///
/// Structural documents are required; a missing view-template document means
/// the namespace has no view entities.
pub fn read_project(manifest: &Path, options: &LoadOptions) -> Result<Project> {
    if options.create_missing && !manifest.exists() {
        let name = manifest
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        debug!(path = %manifest.display(), "manifest not found, starting empty project");
        return Ok(Project::new(name));
    }

    let mut project = codec::decode_manifest(&read_document(manifest)?).map_err(|source| MfdError::Parse {
        path: manifest.to_path_buf(),
        source,
    })?;
    let dir = project_dir(manifest);

    for name in project.namespace_names.clone() {
        let path = namespace_path(&dir, &name);
        let mut namespace = codec::decode_namespace(&read_document(&path)?, &name)
            .map_err(|source| MfdError::Parse { path: path.clone(), source })?;

        let path = vt_path(&dir, &name);
        if path.exists() {
            namespace.vt_entities = codec::decode_vt_namespace(&read_document(&path)?)
                .map_err(|source| MfdError::Parse { path: path.clone(), source })?;
        }

        debug!(
            namespace = %name,
            entities = namespace.entities.len(),
            vt_entities = namespace.vt_entities.len(),
            "loaded namespace"
        );
        project.namespaces.push(namespace);
    }

    Ok(project)
}

/// Every document of the project as `(path, content)`, manifest first
pub fn render_project(project: &Project, manifest: &Path, options: &WriteOptions) -> Result<Vec<(PathBuf, String)>> {
    let dir = project_dir(manifest);
    let mut documents = vec![(
        manifest.to_path_buf(),
        render_document(manifest, &codec::encode_manifest(project), options)?,
    )];

    for namespace in &project.namespaces {
        let path = namespace_path(&dir, &namespace.name);
        let content = render_document(&path, &codec::encode_namespace(namespace), options)?;
        documents.push((path, content));

        if !namespace.vt_entities.is_empty() {
            let path = vt_path(&dir, &namespace.name);
            let content = render_document(&path, &codec::encode_vt_namespace(&namespace.vt_entities), options)?;
            documents.push((path, content));
        }
    }

    Ok(documents)
}

/// View-template documents on disk for namespaces without view entities
pub fn stale_documents(project: &Project, manifest: &Path) -> Vec<PathBuf> {
    let dir = project_dir(manifest);
    project
        .namespaces
        .iter()
        .filter(|ns| ns.vt_entities.is_empty())
        .map(|ns| vt_path(&dir, &ns.name))
        .filter(|path| path.exists())
        .collect()
}

/// Overwrite the manifest and every namespace document
///
/// A view-template document left over from a namespace that no longer has
/// view entities is removed, so reading the project back gives the same model.
pub fn write_project(project: &Project, manifest: &Path, options: &WriteOptions) -> Result<()> {
    for (path, content) in render_project(project, manifest, options)? {
        write_file(&path, &content)?;
        debug!(path = %path.display(), "wrote document");
    }
    for path in stale_documents(project, manifest) {
        fs::remove_file(&path).map_err(|e| MfdError::io(&path, e))?;
        debug!(path = %path.display(), "removed stale document");
    }
    Ok(())
}

/// Translation of one language; a missing document is an empty translation
pub fn read_translation(dir: &Path, language: &str) -> Result<Translation> {
    let path = translation_path(dir, language);
    if !path.exists() {
        return Ok(Translation::new(language));
    }

    let mut translation = decode_translation(&read_document(&path)?).map_err(|source| MfdError::Parse {
        path: path.clone(),
        source,
    })?;
    if translation.language.is_empty() {
        translation.language = language.to_string();
    }
    Ok(translation)
}

pub fn write_translation(dir: &Path, translation: &Translation, options: &WriteOptions) -> Result<PathBuf> {
    let path = translation_path(dir, &translation.language);
    let content = render_document(&path, &encode_translation(translation), options)?;
    write_file(&path, &content)?;
    debug!(path = %path.display(), "wrote translation");
    Ok(path)
}

/// Bring the translation documents of `languages` in line with the project
///
/// `namespaces` restricts the namespaces synced. Returns the written paths.
pub fn sync_translations(
    project: &Project,
    dir: &Path,
    languages: &[String],
    namespaces: Option<&[String]>,
    options: &WriteOptions,
) -> Result<Vec<PathBuf>> {
    let selected: Vec<_> = project
        .namespaces
        .iter()
        .filter(|ns| namespaces.map_or(true, |names| names.contains(&ns.name)))
        .collect();

    let mut written = Vec::with_capacity(languages.len());
    for language in languages {
        let mut translation = read_translation(dir, language)?;
        let filled: usize = selected
            .iter()
            .map(|ns| translation.sync_namespace(ns, None, &project.dictionary))
            .sum();
        debug!(language = %language, entities = filled, "synced translation");
        written.push(write_translation(dir, &translation, options)?);
    }
    Ok(written)
}

impl Project {
    /// Read, link and check a project
    pub fn open(manifest: impl AsRef<Path>, options: &LoadOptions) -> Result<Project> {
        let mut project = read_project(manifest.as_ref(), options)?;
        project.link();
        project.check_consistency()?;
        Ok(project)
    }

    /// Write the manifest and every namespace document
    pub fn save(&self, manifest: impl AsRef<Path>, options: &WriteOptions) -> Result<()> {
        write_project(self, manifest.as_ref(), options)
    }
}
