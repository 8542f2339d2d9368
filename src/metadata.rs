use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use ignore::WalkBuilder;
use log::{debug, info, warn};
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use thiserror::Error;

use crate::hash::Digester;
use crate::source::FileSource;
use crate::spk::{Archive, FileEntry, Package, PackageType, SpkError, Version};

pub const METADATA_FILE: &str = "metadata.json";

// Mode used where the platform has no unix permission bits
#[cfg(not(unix))]
const DEFAULT_MODE: u16 = 0o100644;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    #[error("invalid metadata: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("invalid file pattern: {0}")]
    PatternError(#[from] glob::PatternError),
    #[error(transparent)]
    WalkError(#[from] ignore::Error),
    #[error("path {0:?} is not valid utf-8")]
    NonUtf8Path(PathBuf),
    #[error(transparent)]
    SpkError(#[from] SpkError),
}

// metadata.json
#[derive(Deserialize, Debug)]
pub struct Metadata {
    pub header: Option<PathBuf>,

    // Packages are written in the order they are declared
    #[serde(deserialize_with = "ordered_packages")]
    pub packages: Vec<(String, PackageMetadata)>,
}

#[derive(Deserialize, Debug)]
pub struct PackageMetadata {
    #[serde(rename = "type")]
    pub package_type: PackageType,
    pub version: Version,
    #[serde(default)]
    pub shortname: String,
    pub files: Vec<String>,
}

struct PackagesVisitor;

impl<'de> Visitor<'de> for PackagesVisitor {
    type Value = Vec<(String, PackageMetadata)>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "a map of package name to package metadata")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut packages = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((name, package)) = map.next_entry()? {
            packages.push((name, package));
        }
        Ok(packages)
    }
}

fn ordered_packages<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<(String, PackageMetadata)>, D::Error> {
    deserializer.deserialize_map(PackagesVisitor)
}

impl Metadata {
    pub fn from_file(path: &Path) -> Result<Self, MetadataError> {
        let data = fs::read(path)?;
        Ok(serde_json::from_slice(&data)?)
    }
}

// Folder holding the files of a package, GAME packages pad the minor version
pub fn package_folder(name: &str, package_type: PackageType, version: Version) -> String {
    match package_type {
        PackageType::Game => format!(
            "{}-{}_{:02}_{}",
            name, version.major, version.minor, version.patch
        ),
        _ => format!(
            "{}-{}_{}_{}",
            name, version.major, version.minor, version.patch
        ),
    }
}

/// Resolves the patterns against every regular file below `root`.
///
/// Files come out grouped by the first pattern matching them, sorted by path
/// within a pattern. Hidden files are included and `**` crosses directories.
pub fn resolve_files(root: &Path, patterns: &[String]) -> Result<Vec<String>, MetadataError> {
    if !root.is_dir() {
        warn!("Package folder {} does not exist", root.display());
        return Ok(Vec::new());
    }

    let mut candidates = Vec::new();
    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .follow_links(true)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().map_or(false, |ft| ft.is_file()) {
            continue;
        }

        let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
        let rel = rel
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<Vec<&str>>>()
            .ok_or_else(|| MetadataError::NonUtf8Path(entry.path().to_path_buf()))?
            .join("/");
        candidates.push(rel);
    }

    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };

    let mut seen = HashSet::new();
    let mut files: Vec<String> = Vec::new();
    for pattern in patterns.iter() {
        let matcher = Pattern::new(pattern)?;
        let before = files.len();

        for rel in candidates.iter() {
            if matcher.matches_with(rel, options) && seen.insert(rel.as_str()) {
                files.push(rel.clone());
            }
        }
        debug!("Pattern '{}' matched {} files", pattern, files.len() - before);
    }
    Ok(files)
}

fn file_mode(meta: &fs::Metadata) -> u16 {
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        meta.mode() as u16
    }
    #[cfg(not(unix))]
    {
        let _ = meta;
        DEFAULT_MODE
    }
}

pub fn load_files(
    base: &Path,
    paths: &[String],
    digester: &Digester,
) -> Result<Vec<FileEntry>, MetadataError> {
    let mut files = Vec::with_capacity(paths.len());

    for path in paths.iter() {
        let full_path = base.join(path);
        let meta = fs::metadata(&full_path)?;
        info!("Loading {}", full_path.display());

        files.push(FileEntry::new(
            path.as_str(),
            file_mode(&meta),
            meta.len(),
            FileSource::Path(full_path),
            digester,
        )?);
    }
    Ok(files)
}

/// Builds the archive described by `<base>/metadata.json`.
pub fn load(base: &Path, digester: &Digester) -> Result<Archive, MetadataError> {
    let metadata = Metadata::from_file(&base.join(METADATA_FILE))?;
    craft(base, metadata, digester)
}

pub fn craft(base: &Path, metadata: Metadata, digester: &Digester) -> Result<Archive, MetadataError> {
    let mut packages = Vec::with_capacity(metadata.packages.len());

    for (name, meta) in metadata.packages.into_iter() {
        let root = base.join(package_folder(&name, meta.package_type, meta.version));
        debug!("Package {} from {}", name, root.display());

        let paths = resolve_files(&root, &meta.files)?;
        let files = load_files(&root, &paths, digester)?;

        packages.push(Package::new(
            meta.package_type,
            name,
            meta.shortname,
            meta.version,
            files,
        )?);
    }

    let archive = Archive::new(packages);
    Ok(match metadata.header {
        Some(header) => archive.with_prefix(FileSource::Path(base.join(header))),
        None => archive,
    })
}
