//! Source collection: enumerate the files that go into a code package.
//!
//! Code files land in the `src/` namespace and deployment metadata in
//! `META-INF/`. Hidden directories are never descended into; hidden files
//! inside the metadata tree are skipped. Metadata files are checked
//! against the whitelist in [`crate::metadata`] as they are collected.
//! Workspace chaincode also carries the files of every non-standard
//! package it imports, each under `src/<import path>/`.

use crate::archive::entry::{ArchiveEntry, EntryContent, METADATA_PREFIX, SOURCE_PREFIX};
use crate::descriptor::{SourceDescriptor, SourceLayout};
use crate::error::{PackagerError, Result};
use crate::metadata::validate_metadata_file;
use crate::module_info::{DependencyPackage, MODULE_LOCK, MODULE_MANIFEST};
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, trace};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use walkdir::{DirEntry, WalkDir};

/// A collected file: where it lives and its filesystem mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Location on the local filesystem.
    pub local_path: Utf8PathBuf,
    /// Mode as reported by the filesystem, type bits included.
    pub mode: u32,
}

/// Collected files keyed by archive path, in archive order.
pub type SourceMap = BTreeMap<String, SourceFile>;

/// Enumerates every file to package for `descriptor`.
///
/// # Errors
///
/// - [`PackagerError::SourceNotFound`] if the source root does not exist.
/// - [`PackagerError::EmptySource`] if it holds no code files.
/// - [`PackagerError::UnexpectedMetadata`] /
///   [`PackagerError::InvalidMetadata`] if a metadata file fails the
///   whitelist.
/// - [`PackagerError::Io`] if a file cannot be read.
pub fn find_source(descriptor: &SourceDescriptor) -> Result<SourceMap> {
    let source_dir = &descriptor.source_dir;
    if !source_dir.is_dir() {
        return Err(PackagerError::SourceNotFound {
            path: source_dir.clone(),
        });
    }

    let mut sources = SourceMap::new();
    collect_code(descriptor, &mut sources)?;
    if sources.is_empty() {
        return Err(PackagerError::EmptySource {
            path: source_dir.clone(),
        });
    }

    if let SourceLayout::Module { .. } = descriptor.layout {
        collect_module_files(source_dir, &mut sources)?;
    }

    if let Some(metadata_dir) = descriptor.metadata_dir.as_deref() {
        collect_metadata(metadata_dir, &mut sources)?;
    }

    debug!(
        "collected {} entries for {} from {source_dir}",
        sources.len(),
        descriptor.path
    );
    Ok(sources)
}

/// Adds the files of each resolved dependency of the chaincode at
/// `chaincode_path` to `sources`.
///
/// Standard packages and the chaincode package itself are skipped; the
/// latter is already collected whole.
///
/// # Errors
///
/// Returns [`PackagerError::Io`] if a dependency file cannot be read.
pub fn add_dependencies(
    chaincode_path: &str,
    packages: &[DependencyPackage],
    sources: &mut SourceMap,
) -> Result<()> {
    let imported = packages
        .iter()
        .filter(|package| !package.standard && package.import_path != chaincode_path);
    for package in imported {
        for name in &package.files {
            let local_path = package.dir.join(name);
            let archive_path = format!("{SOURCE_PREFIX}{}/{name}", package.import_path);
            trace!("dependency file {local_path} -> {archive_path}");
            sources.insert(archive_path, source_file(local_path)?);
        }
    }
    Ok(())
}

/// Converts a collected map into archive entries in archive-path order.
#[must_use]
pub fn into_entries(sources: SourceMap) -> Vec<ArchiveEntry> {
    sources
        .into_iter()
        .map(|(archive_path, file)| ArchiveEntry {
            archive_path,
            mode: file.mode,
            content: EntryContent::File(file.local_path),
        })
        .collect()
}

fn collect_code(descriptor: &SourceDescriptor, sources: &mut SourceMap) -> Result<()> {
    let root = &descriptor.source_dir;
    let metadata_dir = descriptor.metadata_dir.as_deref();
    let namespace_root = match descriptor.layout {
        SourceLayout::Workspace { .. } => format!("{SOURCE_PREFIX}{}", descriptor.path),
        SourceLayout::Module { .. } => SOURCE_PREFIX.trim_end_matches('/').to_owned(),
    };

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !skip_code_dir(entry, metadata_dir));

    for entry in walker {
        let entry = entry.map_err(io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let local_path = utf8_path(entry.path())?;
        let relative = relative_name(root, &local_path)?;
        let archive_path = format!("{namespace_root}/{relative}");
        trace!("code file {local_path} -> {archive_path}");
        sources.insert(archive_path, source_file(local_path)?);
    }

    Ok(())
}

fn skip_code_dir(entry: &DirEntry, metadata_dir: Option<&Utf8Path>) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    is_hidden(entry) || metadata_dir.is_some_and(|dir| entry.path() == dir.as_std_path())
}

/// Emits the module manifest and lock file at the `src/` root.
fn collect_module_files(module_root: &Utf8Path, sources: &mut SourceMap) -> Result<()> {
    for name in [MODULE_MANIFEST, MODULE_LOCK] {
        let local_path = module_root.join(name);
        if local_path.is_file() {
            sources.insert(format!("{SOURCE_PREFIX}{name}"), source_file(local_path)?);
        }
    }
    Ok(())
}

fn collect_metadata(metadata_dir: &Utf8Path, sources: &mut SourceMap) -> Result<()> {
    if !metadata_dir.is_dir() {
        trace!("no metadata directory at {metadata_dir}");
        return Ok(());
    }

    let walker = WalkDir::new(metadata_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));

    for entry in walker {
        let entry = entry.map_err(io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let local_path = utf8_path(entry.path())?;
        let relative = relative_name(metadata_dir, &local_path)?;
        let contents = fs::read(&local_path)?;
        validate_metadata_file(&relative, &contents)?;

        let archive_path = format!("{METADATA_PREFIX}{relative}");
        trace!("metadata file {local_path} -> {archive_path}");
        sources.insert(archive_path, source_file(local_path)?);
    }

    Ok(())
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

fn utf8_path(path: &std::path::Path) -> Result<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(path.to_path_buf()).map_err(|p| {
        PackagerError::Io(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("path is not valid UTF-8: {}", p.display()),
        ))
    })
}

/// `/`-joined path of `path` below `root`.
fn relative_name(root: &Utf8Path, path: &Utf8Path) -> Result<String> {
    let relative = path.strip_prefix(root).map_err(|_| {
        PackagerError::Io(io::Error::other(format!("{path} is not below {root}")))
    })?;
    Ok(relative
        .components()
        .map(|component| component.as_str())
        .collect::<Vec<_>>()
        .join("/"))
}

fn source_file(local_path: Utf8PathBuf) -> Result<SourceFile> {
    let metadata = fs::metadata(&local_path)?;
    Ok(SourceFile {
        mode: file_mode(&metadata),
        local_path,
    })
}

#[cfg(unix)]
fn file_mode(metadata: &fs::Metadata) -> u32 {
    use std::os::unix::fs::MetadataExt;

    metadata.mode()
}

#[cfg(not(unix))]
fn file_mode(metadata: &fs::Metadata) -> u32 {
    if metadata.permissions().readonly() {
        0o100_444
    } else {
        0o100_644
    }
}
