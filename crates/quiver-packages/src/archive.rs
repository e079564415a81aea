//! Package archive codec: gzip-compressed tar without a wrapping directory.
//!
//! Extraction guards against:
//! - Path traversal (`../` components) and absolute paths
//! - Symlinks, hardlinks and device nodes
//! - Excessive entry counts and gzip bombs

use std::fs::File;
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use tar::Archive;
use tracing::debug;

use crate::error::{PackageError, PackageResult};

/// File extension of package archives.
pub const PACKAGE_EXTENSION: &str = "tpkg";

/// Maximum number of entries allowed in a package.
const MAX_ENTRY_COUNT: usize = 10_000;

/// Maximum total extracted size (500 MB).
const MAX_EXTRACTED_SIZE: u64 = 500_000_000;

/// Archive the contents of `source` into a gzip tar at `dest`.
///
/// Entry paths are relative to `source`, so the manifest lands at the archive
/// root. The archive is written to a temporary sibling and moved over `dest`
/// only once complete, replacing any existing file; on failure nothing is left
/// at `dest`. If `dest` lies inside `source` it is not archived into itself.
///
/// Returns the number of files written.
///
/// # Errors
///
/// Returns [`PackageError::Archive`] if the tree contains a symlink or any
/// read or write fails.
pub fn pack_directory(source: &Path, dest: &Path) -> PackageResult<usize> {
    let source = source
        .canonicalize()
        .map_err(|e| PackageError::io(source, e))?;
    let parent = dest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    std::fs::create_dir_all(parent).map_err(|e| PackageError::io(parent, e))?;
    let parent = parent
        .canonicalize()
        .map_err(|e| PackageError::io(parent, e))?;

    let staged = tempfile::Builder::new()
        .prefix(".quiver-pack-")
        .tempfile_in(&parent)
        .map_err(|e| PackageError::io(&parent, e))?;
    let excluded = [
        parent.join(dest.file_name().unwrap_or_default()),
        staged.path().to_path_buf(),
    ];

    let file = staged.reopen().map_err(|e| PackageError::io(staged.path(), e))?;
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
    builder.follow_symlinks(false);

    let mut files = 0usize;
    append_tree(&mut builder, &source, Path::new(""), &excluded, &mut files)?;

    let encoder = builder.into_inner().map_err(|e| PackageError::Archive {
        message: format!("failed to finalize archive: {e}"),
    })?;
    encoder.finish().map_err(|e| PackageError::Archive {
        message: format!("failed to finish compression: {e}"),
    })?;

    staged.persist(dest).map_err(|e| PackageError::Archive {
        message: format!("failed to write {}: {}", dest.display(), e.error),
    })?;

    debug!(source = %source.display(), dest = %dest.display(), files, "packed directory");
    Ok(files)
}

fn append_tree(
    builder: &mut tar::Builder<GzEncoder<File>>,
    dir: &Path,
    relative: &Path,
    excluded: &[PathBuf],
    files: &mut usize,
) -> PackageResult<()> {
    let mut entries = std::fs::read_dir(dir)
        .map_err(|e| PackageError::io(dir, e))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| PackageError::io(dir, e))?;
    entries.sort_by_key(std::fs::DirEntry::file_name);

    for entry in entries {
        let path = entry.path();
        if excluded.iter().any(|x| *x == path) {
            continue;
        }
        let name = relative.join(entry.file_name());
        let file_type = entry.file_type().map_err(|e| PackageError::io(&path, e))?;

        if file_type.is_symlink() {
            return Err(PackageError::Archive {
                message: format!("refusing to package symlink: {}", name.display()),
            });
        }

        if file_type.is_dir() {
            builder
                .append_dir(&name, &path)
                .map_err(|e| PackageError::Archive {
                    message: format!("failed to append directory {}: {e}", name.display()),
                })?;
            append_tree(builder, &path, &name, excluded, files)?;
        } else if file_type.is_file() {
            builder
                .append_path_with_name(&path, &name)
                .map_err(|e| PackageError::Archive {
                    message: format!("failed to append file {}: {e}", name.display()),
                })?;
            *files = files.saturating_add(1);
        } else {
            debug!(path = %path.display(), "skipping special file");
        }
    }
    Ok(())
}

/// Extract a package archive into `dest`.
///
/// Returns the number of entries extracted.
///
/// # Errors
///
/// Returns [`PackageError::Archive`] on decompression or limit failures,
/// [`PackageError::UnsafeEntryType`] for links and devices, and
/// [`PackageError::PathTraversal`] for entries escaping `dest`.
pub fn extract_archive(data: &[u8], dest: &Path) -> PackageResult<usize> {
    let mut archive = Archive::new(GzDecoder::new(data));
    // No setuid/setgid bits from untrusted archives.
    archive.set_preserve_permissions(false);

    let dest = dest.canonicalize().map_err(|e| PackageError::Archive {
        message: format!("failed to canonicalize destination: {e}"),
    })?;

    let mut entry_count = 0usize;
    let mut total_size: u64 = 0;

    let entries = archive.entries().map_err(|e| PackageError::Archive {
        message: format!("failed to read archive entries: {e}"),
    })?;

    for entry_result in entries {
        let mut entry = entry_result.map_err(|e| PackageError::Archive {
            message: format!("failed to read archive entry: {e}"),
        })?;

        entry_count = entry_count.saturating_add(1);
        if entry_count > MAX_ENTRY_COUNT {
            return Err(PackageError::Archive {
                message: format!("archive exceeds maximum entry count ({MAX_ENTRY_COUNT})"),
            });
        }

        let entry_type = entry.header().entry_type();
        if !is_safe_entry_type(entry_type) {
            let entry_path = entry
                .path()
                .map_or_else(|_| "<unknown>".to_string(), |p| p.display().to_string());
            return Err(PackageError::UnsafeEntryType {
                entry_type: format!("{entry_type:?}"),
                path: entry_path,
            });
        }

        let entry_size = entry.header().size().map_err(|e| PackageError::Archive {
            message: format!("failed to read entry size: {e}"),
        })?;
        total_size = total_size.saturating_add(entry_size);
        if total_size > MAX_EXTRACTED_SIZE {
            return Err(PackageError::Archive {
                message: format!(
                    "archive exceeds maximum extracted size ({MAX_EXTRACTED_SIZE} bytes)"
                ),
            });
        }

        let entry_path = entry
            .path()
            .map_err(|e| PackageError::Archive {
                message: format!("failed to read entry path: {e}"),
            })?
            .into_owned();
        validate_entry_path(&entry_path)?;

        let target = dest.join(&entry_path);

        // Catches escapes through directories created by earlier entries.
        if let Some(canonical_parent) = target.parent().and_then(|p| p.canonicalize().ok()) {
            let canonical_target = canonical_parent.join(target.file_name().unwrap_or_default());
            if !canonical_target.starts_with(&dest) {
                return Err(PackageError::PathTraversal {
                    path: entry_path.display().to_string(),
                });
            }
        }

        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|e| PackageError::Archive {
                message: format!("failed to create directory {}: {e}", parent.display()),
            })?;
        }

        entry.unpack(&target).map_err(|e| PackageError::Archive {
            message: format!("failed to unpack {}: {e}", entry_path.display()),
        })?;
    }

    if entry_count == 0 {
        return Err(PackageError::Archive {
            message: "archive is empty".into(),
        });
    }

    Ok(entry_count)
}

/// Content digest of archive bytes, as `blake3:<hex>`.
#[must_use]
pub fn archive_digest(data: &[u8]) -> String {
    format!("blake3:{}", blake3::hash(data).to_hex())
}

/// Regular files, directories and metadata headers only.
fn is_safe_entry_type(entry_type: tar::EntryType) -> bool {
    matches!(
        entry_type,
        tar::EntryType::Regular
            | tar::EntryType::Directory
            | tar::EntryType::GNULongName
            | tar::EntryType::XHeader
            | tar::EntryType::XGlobalHeader
    )
}

fn validate_entry_path(path: &Path) -> PackageResult<()> {
    let escapes = path.is_absolute()
        || path.components().any(|c| {
            matches!(
                c,
                std::path::Component::ParentDir
                    | std::path::Component::Prefix(_)
                    | std::path::Component::RootDir
            )
        });
    if escapes {
        return Err(PackageError::PathTraversal {
            path: path.display().to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::arithmetic_side_effects)]
mod tests {
    use std::io::Write;

    use super::*;

    fn gzip(tar_data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::fast());
        encoder.write_all(tar_data).unwrap();
        encoder.finish().unwrap()
    }

    /// One raw tar header block, bypassing the tar crate's own path checks.
    fn raw_entry(path: &[u8], typeflag: u8, link: &[u8], data: &[u8]) -> Vec<u8> {
        let mut header = [0u8; 512];
        header[..path.len()].copy_from_slice(path);
        header[100..108].copy_from_slice(b"0000644\0");
        let size = format!("{:011o}\0", data.len());
        header[124..136].copy_from_slice(size.as_bytes());
        header[156] = typeflag;
        header[157..157 + link.len()].copy_from_slice(link);
        header[148..156].copy_from_slice(b"        ");
        let cksum: u32 = header.iter().map(|&b| u32::from(b)).sum();
        header[148..156].copy_from_slice(format!("{cksum:06o}\0 ").as_bytes());

        let mut out = header.to_vec();
        out.extend_from_slice(data);
        out.extend(std::iter::repeat_n(0u8, (512 - data.len() % 512) % 512));
        out.extend(std::iter::repeat_n(0u8, 1024));
        gzip(&out)
    }

    fn sample_tree(root: &Path) {
        std::fs::create_dir_all(root.join("tests")).unwrap();
        std::fs::write(root.join("manifest.json"), b"{}").unwrap();
        std::fs::write(root.join("tests/hello.json"), b"{\"name\":\"hello\"}").unwrap();
    }

    #[test]
    fn pack_then_extract_has_no_wrapping_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src");
        sample_tree(&src);
        let archive = tmp.path().join("out.tpkg");

        let files = pack_directory(&src, &archive).unwrap();
        assert_eq!(files, 2);

        let dest = tmp.path().join("dest");
        std::fs::create_dir_all(&dest).unwrap();
        extract_archive(&std::fs::read(&archive).unwrap(), &dest).unwrap();

        assert!(dest.join("manifest.json").is_file());
        assert_eq!(
            std::fs::read(dest.join("tests/hello.json")).unwrap(),
            b"{\"name\":\"hello\"}"
        );
    }

    #[test]
    fn pack_replaces_existing_destination() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src");
        sample_tree(&src);
        let archive = tmp.path().join("out.tpkg");
        std::fs::write(&archive, b"stale").unwrap();

        pack_directory(&src, &archive).unwrap();
        assert_ne!(std::fs::read(&archive).unwrap(), b"stale");
    }

    #[test]
    fn pack_skips_destination_inside_source() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src");
        sample_tree(&src);
        let archive = src.join("self.tpkg");

        pack_directory(&src, &archive).unwrap();

        let dest = tmp.path().join("dest");
        std::fs::create_dir_all(&dest).unwrap();
        extract_archive(&std::fs::read(&archive).unwrap(), &dest).unwrap();
        assert!(!dest.join("self.tpkg").exists());
        let leftovers: Vec<_> = std::fs::read_dir(&dest)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|n| n.starts_with(".quiver-pack-"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn pack_rejects_symlinks_and_leaves_no_file() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src");
        sample_tree(&src);
        std::os::unix::fs::symlink("/etc/passwd", src.join("link")).unwrap();
        let archive = tmp.path().join("out.tpkg");

        let err = pack_directory(&src, &archive).unwrap_err();
        assert!(err.to_string().contains("symlink"));
        assert!(!archive.exists());
    }

    #[test]
    fn reject_path_traversal() {
        let tgz = raw_entry(b"../../etc/passwd", b'0', b"", b"x");
        let tmp = tempfile::tempdir().unwrap();
        let err = extract_archive(&tgz, tmp.path()).unwrap_err();
        assert!(matches!(err, PackageError::PathTraversal { .. }), "{err}");
    }

    #[test]
    fn reject_absolute_path() {
        let tgz = raw_entry(b"/etc/passwd", b'0', b"", b"x");
        let tmp = tempfile::tempdir().unwrap();
        let err = extract_archive(&tgz, tmp.path()).unwrap_err();
        assert!(err.to_string().contains("path traversal"), "{err}");
    }

    #[test]
    fn reject_symlink_entry() {
        let tgz = raw_entry(b"evil-link", b'2', b"/etc/passwd", b"");
        let tmp = tempfile::tempdir().unwrap();
        let err = extract_archive(&tgz, tmp.path()).unwrap_err();
        assert!(err.to_string().contains("unsafe archive entry type"), "{err}");
    }

    #[test]
    fn reject_empty_archive() {
        let tgz = gzip(&[0u8; 1024]);
        let tmp = tempfile::tempdir().unwrap();
        let err = extract_archive(&tgz, tmp.path()).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn reject_non_gzip_data() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(extract_archive(b"not an archive", tmp.path()).is_err());
    }

    #[test]
    fn digest_is_prefixed_hex() {
        let digest = archive_digest(b"abc");
        assert!(digest.starts_with("blake3:"));
        assert_eq!(digest.len(), "blake3:".len() + 64);
    }
}
