//! Archive extraction for downloaded artifacts
//!
//! All functions here are blocking; callers run them on the blocking pool.

use flate2::read::GzDecoder;
use sdk::{CompressionKind, MnError};
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

/// Unpack `src` into `dest` according to `kind`, returning the number of
/// regular files written.
///
/// For `CompressionKind::None` the download is copied into `dest` unchanged,
/// named `file_name`.
pub fn extract(
    kind: CompressionKind,
    src: &Path,
    dest: &Path,
    file_name: &str,
) -> Result<usize, MnError> {
    let result = match kind {
        CompressionKind::TarGzip => {
            info!("Extracting .tar.gz file into {}", dest.display());
            unpack_tar_gz(src, dest)
        }
        CompressionKind::Zip => {
            info!("Extracting .zip file into {}", dest.display());
            unpack_zip(src, dest)
        }
        CompressionKind::None => {
            info!(
                "No compression, placing {} in {} as-is",
                file_name,
                dest.display()
            );
            copy_as_is(src, dest, file_name)
        }
    };
    result.map_err(|e| MnError::ExtractionFailed(e.to_string()))
}

fn unpack_tar_gz(src: &Path, dest: &Path) -> io::Result<usize> {
    let file = File::open(src)?;
    let mut archive = tar::Archive::new(GzDecoder::new(BufReader::new(file)));
    fs::create_dir_all(dest)?;

    let mut files = 0;
    for entry in archive.entries()? {
        let mut entry = entry?;
        let rel = entry.path()?.into_owned();
        let target = safe_join(dest, &rel)?;
        let kind = entry.header().entry_type();

        if kind.is_dir() {
            fs::create_dir_all(&target)?;
        } else if kind.is_file() {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            let mode = entry.header().mode().unwrap_or(0o644);
            let mut out = File::create(&target)?;
            io::copy(&mut entry, &mut out)?;
            set_mode(&target, mode)?;
            files += 1;
        } else {
            debug!("Skipping tar entry {} ({:?})", rel.display(), kind);
        }
    }
    Ok(files)
}

fn unpack_zip(src: &Path, dest: &Path) -> io::Result<usize> {
    let mut archive = zip::ZipArchive::new(File::open(src)?).map_err(invalid_data)?;
    fs::create_dir_all(dest)?;

    let mut files = 0;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(invalid_data)?;
        let rel = entry.enclosed_name().map(Path::to_path_buf).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("unsafe entry path {}", entry.name()),
            )
        })?;
        let target = dest.join(rel);

        if entry.is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&target)?;
        io::copy(&mut entry, &mut out)?;
        if let Some(mode) = entry.unix_mode() {
            set_mode(&target, mode)?;
        }
        files += 1;
    }
    Ok(files)
}

fn copy_as_is(src: &Path, dest: &Path, file_name: &str) -> io::Result<usize> {
    fs::create_dir_all(dest)?;
    let target = safe_join(dest, Path::new(file_name))?;
    fs::copy(src, target)?;
    Ok(1)
}

/// Join an archive entry path onto `dest`, refusing anything that would land
/// outside of it.
fn safe_join(dest: &Path, rel: &Path) -> io::Result<PathBuf> {
    let mut target = dest.to_path_buf();
    for component in rel.components() {
        match component {
            Component::Normal(part) => target.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("unsafe entry path {}", rel.display()),
                ));
            }
        }
    }
    Ok(target)
}

fn invalid_data(e: zip::result::ZipError) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, e)
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o7777))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn tar_gz_with(entries: &[(&str, &[u8], u32)]) -> Vec<u8> {
        let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
        for (path, data, mode) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(*mode);
            header.set_cksum();
            builder.append_data(&mut header, path, *data).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap()
    }

    #[test]
    fn test_tar_gz_nested_layout() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("bundle.tar.gz");
        std::fs::write(
            &src,
            tar_gz_with(&[
                ("coin-1.0/bin/coind", b"daemon", 0o755),
                ("coin-1.0/README", b"readme", 0o644),
            ]),
        )
        .unwrap();

        let dest = dir.path().join("out");
        let files = extract(CompressionKind::TarGzip, &src, &dest, "bundle.tar.gz").unwrap();

        assert_eq!(files, 2);
        assert!(dest.join("coin-1.0/bin").is_dir());
        assert_eq!(std::fs::read(dest.join("coin-1.0/bin/coind")).unwrap(), b"daemon");
        assert_eq!(std::fs::read(dest.join("coin-1.0/README")).unwrap(), b"readme");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(dest.join("coin-1.0/bin/coind"))
                .unwrap()
                .permissions()
                .mode();
            assert_eq!(mode & 0o777, 0o755);
        }
    }

    #[test]
    fn test_zip_extraction() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("chain.zip");
        {
            let mut writer = zip::ZipWriter::new(File::create(&src).unwrap());
            let options = zip::write::FileOptions::default().unix_permissions(0o640);
            writer.add_directory("blocks/", options).unwrap();
            writer.start_file("blocks/bootstrap.dat", options).unwrap();
            writer.write_all(b"chaindata").unwrap();
            writer.finish().unwrap();
        }

        let dest = dir.path().join("data");
        let files = extract(CompressionKind::Zip, &src, &dest, "chain.zip").unwrap();

        assert_eq!(files, 1);
        assert_eq!(
            std::fs::read(dest.join("blocks/bootstrap.dat")).unwrap(),
            b"chaindata"
        );
    }

    #[test]
    fn test_none_copies_as_is() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("download");
        std::fs::write(&src, b"raw").unwrap();

        let dest = dir.path().join("dest");
        extract(CompressionKind::None, &src, &dest, "bootstrap.dat").unwrap();
        assert_eq!(std::fs::read(dest.join("bootstrap.dat")).unwrap(), b"raw");
    }

    #[test]
    fn test_garbage_is_extraction_failure() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("bad.tar.gz");
        std::fs::write(&src, b"definitely not gzip").unwrap();

        let result = extract(CompressionKind::TarGzip, &src, &dir.path().join("x"), "bad");
        assert!(matches!(result, Err(MnError::ExtractionFailed(_))));
    }

    #[test]
    fn test_safe_join_rejects_parent_dirs() {
        let dest = Path::new("/tmp/dest");
        assert!(safe_join(dest, Path::new("../etc/passwd")).is_err());
        assert!(safe_join(dest, Path::new("/etc/passwd")).is_err());
        assert_eq!(
            safe_join(dest, Path::new("./a/b")).unwrap(),
            PathBuf::from("/tmp/dest/a/b")
        );
    }
}
