//! Code package creation.
//!
//! Serializes archive entries into a gzip-compressed tar stream. Entries
//! are written in archive-path order with zeroed timestamps and
//! ownership so identical inputs produce identical bytes.

use super::entry::{ArchiveEntry, EntryContent, check_path};
use crate::error::{PackagerError, Result, ValidationRule};
use flate2::Compression;
use flate2::write::GzEncoder;
use log::{debug, trace};
use std::collections::HashSet;
use std::fs;
use std::io::{self, Read, Write};
use tar::{EntryType, Header};

/// Serializes `entries` into a compressed code package.
///
/// Each entry is written with its path, mode, and size; directory entries
/// carry no content.
///
/// # Errors
///
/// Returns [`PackagerError::PackageValidation`] if an entry path is
/// outside the recognized namespaces, climbs out of them, or appears more
/// than once, and [`PackagerError::Io`] if a file cannot be read.
///
/// # Examples
///
/// ```
/// use ccpack_packager::archive::{ArchiveEntry, build_package, validate_package};
///
/// let entries = vec![ArchiveEntry::bytes("src/cc/main.go", 0o100_644, "package main\n")];
/// let package = build_package(&entries)?;
/// validate_package(&package)?;
/// # Ok::<(), ccpack_packager::error::PackagerError>(())
/// ```
pub fn build_package(entries: &[ArchiveEntry]) -> Result<Vec<u8>> {
    let mut ordered: Vec<&ArchiveEntry> = entries.iter().collect();
    ordered.sort_by(|a, b| a.archive_path.cmp(&b.archive_path));
    check_entry_paths(&ordered)?;

    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for entry in ordered {
        append_entry(&mut builder, entry)?;
    }

    let package = builder.into_inner()?.finish()?;
    debug!("built code package of {} bytes from {} entries", package.len(), entries.len());
    Ok(package)
}

fn check_entry_paths(entries: &[&ArchiveEntry]) -> Result<()> {
    let mut seen = HashSet::with_capacity(entries.len());
    for entry in entries {
        if let Some(rule) = check_path(&entry.archive_path) {
            return Err(PackagerError::PackageValidation {
                path: entry.archive_path.clone(),
                rule,
            });
        }
        if !seen.insert(entry.archive_path.as_str()) {
            return Err(PackagerError::PackageValidation {
                path: entry.archive_path.clone(),
                rule: ValidationRule::DuplicateEntry,
            });
        }
    }
    Ok(())
}

fn append_entry<W: Write>(builder: &mut tar::Builder<W>, entry: &ArchiveEntry) -> Result<()> {
    let mut header = Header::new_gnu();
    header.set_mode(entry.mode);
    header.set_mtime(0);
    header.set_uid(0);
    header.set_gid(0);
    trace!("appending {} (mode {:o})", entry.archive_path, entry.mode);

    match &entry.content {
        EntryContent::Directory => {
            header.set_entry_type(EntryType::Directory);
            header.set_size(0);
            builder.append_data(&mut header, &entry.archive_path, io::empty())?;
        }
        EntryContent::Bytes(contents) => {
            header.set_entry_type(EntryType::Regular);
            header.set_size(contents.len() as u64);
            builder.append_data(&mut header, &entry.archive_path, contents.as_slice())?;
        }
        EntryContent::File(path) => {
            let file = fs::File::open(path)?;
            let size = file.metadata()?.len();
            header.set_entry_type(EntryType::Regular);
            header.set_size(size);
            builder.append_data(&mut header, &entry.archive_path, file.take(size))?;
        }
    }
    Ok(())
}
