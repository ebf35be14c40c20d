use std::borrow::Cow;
use std::io::{self, Cursor, Read};
use std::path::Path;

use flate2::read::GzDecoder;
use log::{debug, warn};

use crate::error::PackageError;
use crate::types::RawFile;
use crate::AnalyzeOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    Tar,
    TarGz,
}

/// Detect an archive from the declared file name.
pub fn archive_kind(filename: &str) -> Option<ArchiveKind> {
    let lower = filename.to_lowercase();
    if lower.ends_with(".zip") {
        Some(ArchiveKind::Zip)
    } else if lower.ends_with(".tar.gz") || lower.ends_with(".tgz") {
        Some(ArchiveKind::TarGz)
    } else if lower.ends_with(".tar") {
        Some(ArchiveKind::Tar)
    } else {
        None
    }
}

/// Turn an uploaded blob into a flat list of text files.
///
/// Only an unreadable archive or a package with no files is fatal. An entry
/// that cannot be read or decoded becomes an empty placeholder carrying a
/// warning, so its siblings are still analyzed.
pub fn extract(
    data: &[u8],
    filename: &str,
    opts: &AnalyzeOptions,
) -> Result<Vec<RawFile>, PackageError> {
    let files = match archive_kind(filename) {
        Some(ArchiveKind::Zip) => extract_zip(data, opts)?,
        Some(ArchiveKind::Tar) => extract_tar(data, opts)?,
        Some(ArchiveKind::TarGz) => extract_tar(GzDecoder::new(data), opts)?,
        None => vec![decode(filename.to_string(), data.to_vec())],
    };

    if files.is_empty() {
        return Err(PackageError::Empty);
    }
    debug!("extracted {} file(s) from {filename}", files.len());
    Ok(files)
}

fn extract_zip(data: &[u8], opts: &AnalyzeOptions) -> Result<Vec<RawFile>, PackageError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data))?;
    let mut files = Vec::new();

    for i in 0..archive.len() {
        let mut entry = match archive.by_index(i) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("zip entry #{i} unreadable: {e}");
                let name = format!("entry #{i}");
                files.push(RawFile::placeholder(
                    name.clone(),
                    format!("{name}: could not be read: {e}"),
                ));
                continue;
            }
        };
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();
        if is_metadata(&name) {
            debug!("skipping metadata entry {name}");
            continue;
        }
        if entry.size() > opts.max_entry_bytes {
            files.push(oversized(name, opts));
            continue;
        }
        // The declared size can lie, so the read is capped as well
        files.push(read_entry(name, &mut entry, opts));
    }

    Ok(files)
}

fn extract_tar<R: Read>(reader: R, opts: &AnalyzeOptions) -> Result<Vec<RawFile>, PackageError> {
    let mut archive = tar::Archive::new(reader);
    let mut files = Vec::new();

    for (i, entry) in archive.entries()?.enumerate() {
        let mut entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                // The stream cannot be resynchronized after a bad header
                warn!("tar stream truncated: {e}");
                if files.is_empty() {
                    return Err(PackageError::Io(e));
                }
                break;
            }
        };
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let name = match entry_name(i, entry.path()) {
            Ok(name) => name,
            Err(placeholder) => {
                files.push(placeholder);
                continue;
            }
        };
        if is_metadata(&name) {
            continue;
        }
        if entry.size() > opts.max_entry_bytes {
            files.push(oversized(name, opts));
            continue;
        }
        files.push(read_entry(name, &mut entry, opts));
    }

    Ok(files)
}

/// An entry whose path cannot be decoded still shows up, as a placeholder.
fn entry_name(index: usize, path: io::Result<Cow<'_, Path>>) -> Result<String, RawFile> {
    match path {
        Ok(path) => Ok(path.to_string_lossy().into_owned()),
        Err(e) => {
            warn!("tar entry #{index} has an unreadable path: {e}");
            let name = format!("entry #{index}");
            let warning = format!("{name}: could not be read: {e}");
            Err(RawFile::placeholder(name, warning))
        }
    }
}

/// Read one entry, never buffering more than the configured limit.
fn read_entry<R: Read>(name: String, reader: R, opts: &AnalyzeOptions) -> RawFile {
    let mut bytes = Vec::new();
    let limit = opts.max_entry_bytes.saturating_add(1);
    match reader.take(limit).read_to_end(&mut bytes) {
        Ok(_) if bytes.len() as u64 > opts.max_entry_bytes => oversized(name, opts),
        Ok(_) => decode(name, bytes),
        Err(e) => {
            warn!("{name} unreadable: {e}");
            let warning = format!("{name}: could not be read: {e}");
            RawFile::placeholder(name, warning)
        }
    }
}

fn decode(name: String, bytes: Vec<u8>) -> RawFile {
    match String::from_utf8(bytes) {
        Ok(content) => RawFile::new(name, content),
        Err(e) => {
            warn!("{name} is not valid UTF-8 text");
            let warning = format!("{name}: not a text file ({e})");
            RawFile::placeholder(name, warning)
        }
    }
}

fn oversized(name: String, opts: &AnalyzeOptions) -> RawFile {
    warn!("{name} skipped: larger than {} bytes", opts.max_entry_bytes);
    let warning = format!(
        "{name}: skipped, exceeds the {} byte limit",
        opts.max_entry_bytes
    );
    RawFile::placeholder(name, warning)
}

/// macOS resource forks and dot-files that ride along in archives.
fn is_metadata(name: &str) -> bool {
    name.starts_with("__MACOSX/")
        || name
            .rsplit('/')
            .next()
            .is_some_and(|base| base.starts_with('.'))
}
