use crate::error::{DeltaError, DeltaResult};
use flate2::Compression;
use flate2::write::GzEncoder;
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;
use tar::{Builder, EntryType, Header, HeaderMode};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Writes a gzip-compressed tar of everything below `source_dir` to
/// `archive_path`.
///
/// Entries are relative to `source_dir`, sorted by name, and carry fixed
/// ownership, modes, and mtimes so identical inputs produce identical
/// archives. Top-level names listed in `exclude` are skipped along with the
/// archive itself.
pub fn write_archive(source_dir: &Path, archive_path: &Path, exclude: &[&str]) -> DeltaResult<()> {
    let archive_file = File::create(archive_path).map_err(|error| {
        DeltaError::io(
            format!("failed to create archive at {}", archive_path.display()),
            error,
        )
    })?;
    let encoder = GzEncoder::new(archive_file, Compression::default());
    let mut builder = Builder::new(encoder);
    builder.mode(HeaderMode::Deterministic);

    let walk_context = || format!("failed to walk {}", source_dir.display());
    let entries = WalkDir::new(source_dir)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !(entry.depth() == 1 && is_excluded(entry.file_name(), exclude)));

    for entry in entries {
        let entry = entry.map_err(|error| DeltaError::io(walk_context(), io::Error::from(error)))?;
        if entry.path() == archive_path {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(source_dir)
            .map_err(|_| {
                DeltaError::io(
                    walk_context(),
                    io::Error::other(format!("{} escaped the walk root", entry.path().display())),
                )
            })?;

        let file_type = entry.file_type();
        let appended = if file_type.is_dir() {
            append_directory_entry(&mut builder, relative, 0o755)
        } else if file_type.is_file() {
            append_file_entry(&mut builder, relative, entry.path(), 0o644)
        } else {
            warn!(path = %entry.path().display(), "skipping non-regular file in archive");
            continue;
        };
        appended.map_err(|error| {
            DeltaError::io(format!("failed to archive {}", entry.path().display()), error)
        })?;
        debug!(entry = %relative.display(), "archived");
    }

    let finish = || -> io::Result<()> {
        let encoder = builder.into_inner()?;
        encoder.finish()?.sync_all()
    };
    finish().map_err(|error| {
        DeltaError::io(
            format!("failed to finish archive {}", archive_path.display()),
            error,
        )
    })
}

fn is_excluded(name: &OsStr, exclude: &[&str]) -> bool {
    exclude.iter().any(|candidate| name == *candidate)
}

fn append_directory_entry<W: Write>(
    builder: &mut Builder<W>,
    path: &Path,
    mode: u32,
) -> io::Result<()> {
    let mut header = Header::new_gnu();
    header.set_entry_type(EntryType::Directory);
    header.set_mode(mode);
    header.set_uid(0);
    header.set_gid(0);
    header.set_mtime(0);
    header.set_size(0);
    header.set_path(path)?;
    header.set_cksum();
    builder.append(&header, io::empty())
}

fn append_file_entry<W: Write>(
    builder: &mut Builder<W>,
    destination: &Path,
    source: &Path,
    mode: u32,
) -> io::Result<()> {
    let mut file = File::open(source)?;
    let metadata = file.metadata()?;

    let mut header = Header::new_gnu();
    header.set_entry_type(EntryType::Regular);
    header.set_mode(mode);
    header.set_uid(0);
    header.set_gid(0);
    header.set_mtime(0);
    header.set_size(metadata.len());
    header.set_path(destination)?;
    header.set_cksum();
    builder.append(&header, &mut file)
}

/// Renames `from` to `to`, replacing any existing file at `to`.
pub fn rename_archive(from: &Path, to: &Path) -> DeltaResult<()> {
    fs::rename(from, to).map_err(|error| {
        DeltaError::io(
            format!("failed to rename {} to {}", from.display(), to.display()),
            error,
        )
    })
}
