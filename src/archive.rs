/* This is part of nodegyp-offline - which is under the MIT License ***********/

use std::fs::File;
use std::path::{Component, Path, PathBuf};

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use snafu::{ResultExt, OptionExt, ensure};
use walkdir::WalkDir;
use zip::CompressionMethod;
use zip::write::FileOptions;
use log::*;

use crate::error::Result;
use crate::error;
use crate::util;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    TarGz,
}

impl ArchiveFormat {
    pub fn parse(name: &str) -> Result<ArchiveFormat> {
        match name {
            "zip" => Ok(ArchiveFormat::Zip),
            "tar.gz" | "tgz" => Ok(ArchiveFormat::TarGz),
            _ => error::InvalidArchiveFormat{format: name}.fail(),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ArchiveFormat::Zip => "zip",
            ArchiveFormat::TarGz => "tar.gz",
        }
    }
}

/// Packing of a directory into an archive
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveOp {
    pub source: PathBuf,
    pub dest: PathBuf,
    pub format: ArchiveFormat,
    /// Delete the source directory once archived
    pub remove_source: bool,
    /// Store the entries under the name of the source directory instead
    /// of at the root of the archive
    pub include_root: bool,
}

/// Extraction of a gzip-compressed tarball. The top-level directory of the
/// tarball may be renamed on the fly.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub archive: PathBuf,
    pub dest: PathBuf,
    pub rename: Option<(String, String)>,
}

/// Directory the archive entries are relative to
fn entries_base(source: &Path, include_root: bool) -> Result<&Path> {
    if include_root {
        source.parent().context(error::IllFormedPath{path: source.to_path_buf()})
    } else {
        Ok(source)
    }
}

/// Name of a zip entry: relative to base, always '/'-separated
fn zip_name(base: &Path, path: &Path) -> Result<String> {
    let rel = path.strip_prefix(base)
        .ok()
        .context(error::IllFormedPath{path: path.to_path_buf()})?;
    let parts: Vec<String> = rel.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Ok(parts.join("/"))
}

#[cfg(unix)]
fn permissions(meta: &std::fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode()
}

#[cfg(not(unix))]
fn permissions(meta: &std::fs::Metadata) -> u32 {
    if meta.is_dir() { 0o755 } else { 0o644 }
}

fn zip_dir(source: &Path, dest: &Path, include_root: bool) -> Result<()> {
    let base = entries_base(source, include_root)?;
    let file = File::create(dest).context(error::CreateFileError{path: dest.to_path_buf()})?;
    let mut zip = zip::ZipWriter::new(file);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(9));

    // Links are followed: the archive is meant to be extracted on systems
    // that may not support them.
    let walker = WalkDir::new(source)
        .follow_links(true)
        .sort_by(|a, b| a.file_name().cmp(b.file_name()));
    for entry in walker {
        let entry = entry.context(error::DirIterFailed{dir: source.to_path_buf()})?;
        let name = zip_name(base, entry.path())?;
        if name.is_empty() {
            continue;
        }
        let meta = entry.metadata().context(error::DirIterFailed{dir: source.to_path_buf()})?;
        let options = options.unix_permissions(permissions(&meta));
        if meta.is_dir() {
            trace!("zip: adding directory {}", name);
            zip.add_directory(format!("{}/", name), options)
                .context(error::ZipFailed{path: dest.to_path_buf()})?;
        } else {
            trace!("zip: adding file {}", name);
            zip.start_file(name, options)
                .context(error::ZipFailed{path: dest.to_path_buf()})?;
            let mut input = File::open(entry.path())
                .context(error::FailedToRead{path: entry.path().to_path_buf()})?;
            std::io::copy(&mut input, &mut zip)
                .context(error::ArchiveFailed{path: dest.to_path_buf()})?;
        }
    }
    zip.finish().context(error::ZipFailed{path: dest.to_path_buf()})?;
    Ok(())
}

fn tar_gz_dir(source: &Path, dest: &Path, include_root: bool) -> Result<()> {
    let root = if include_root {
        PathBuf::from(source.file_name()
            .context(error::IllFormedPath{path: source.to_path_buf()})?)
    } else {
        PathBuf::from(".")
    };
    let file = File::create(dest).context(error::CreateFileError{path: dest.to_path_buf()})?;
    let encoder = GzEncoder::new(file, Compression::best());
    let mut builder = tar::Builder::new(encoder);
    builder.append_dir_all(&root, source)
        .context(error::ArchiveFailed{path: dest.to_path_buf()})?;
    let encoder = builder.into_inner()
        .context(error::ArchiveFailed{path: dest.to_path_buf()})?;
    encoder.finish()
        .context(error::ArchiveFailed{path: dest.to_path_buf()})?;
    Ok(())
}

/// Pack a directory as described by op
pub fn create(op: &ArchiveOp) -> Result<()> {
    info!("Packing {:#?} into {:#?}", op.source, op.dest);
    ensure!(op.source.is_dir(), error::IllFormedPath{path: op.source.clone()});
    match op.format {
        ArchiveFormat::Zip => zip_dir(&op.source, &op.dest, op.include_root)?,
        ArchiveFormat::TarGz => tar_gz_dir(&op.source, &op.dest, op.include_root)?,
    }
    if op.remove_source {
        util::remove_path(&op.source)?;
    }
    Ok(())
}

/// Path an archive entry is extracted to, relative to the destination.
/// Entries that would escape the destination are refused.
fn extracted_path(arch: &Path, entry: &Path, rename: &Option<(String, String)>) -> Result<PathBuf> {
    let mut out = PathBuf::new();
    for component in entry.components() {
        match component {
            Component::Normal(name) => {
                let top = out.as_os_str().is_empty();
                match rename {
                    Some((from, to)) if top && name == from.as_str() => out.push(to),
                    _ => out.push(name),
                }
            },
            Component::CurDir => {},
            _ => return error::UnsafeArchiveEntry{
                arch: arch.to_path_buf(),
                entry: entry.to_path_buf(),
            }.fail(),
        }
    }
    Ok(out)
}

/// Extract a gzip-compressed tarball
pub fn extract(ex: &Extraction) -> Result<()> {
    info!("Extracting {:#?} into {:#?}", ex.archive, ex.dest);
    let file = File::open(&ex.archive).context(error::FailedToRead{path: ex.archive.clone()})?;
    let mut archive = tar::Archive::new(GzDecoder::new(file));
    util::create_dir(&ex.dest)?;

    let entries = archive.entries().context(error::TarFailed{path: ex.archive.clone()})?;
    for entry in entries {
        let mut entry = entry.context(error::TarFailed{path: ex.archive.clone()})?;
        let name = entry.path().context(error::TarFailed{path: ex.archive.clone()})?
            .into_owned();
        let rel = extracted_path(&ex.archive, &name, &ex.rename)?;
        if rel.as_os_str().is_empty() {
            continue;
        }
        let target = ex.dest.join(&rel);
        if let Some(dir) = target.parent() {
            util::create_dir(dir)?;
        }
        entry.unpack(&target).context(error::TarFailed{path: ex.archive.clone()})?;
    }
    Ok(())
}
