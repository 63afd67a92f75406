//! Utilities to deal with archive files, e.g. tar or gzip.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;
use tracing::debug;

use crate::error::{Result, UtilsError};

/// Archive formats recognised by [`extract_file`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArchiveFormat {
    TarGz,
    Tar,
    Zip,
    Gz,
    /// Not an archive, copied as-is
    Plain,
}

fn classify(path: &Path) -> ArchiveFormat {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_lowercase();
    if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        ArchiveFormat::TarGz
    } else if name.ends_with(".tar") {
        ArchiveFormat::Tar
    } else if name.ends_with(".zip") {
        ArchiveFormat::Zip
    } else if name.ends_with(".gz") {
        ArchiveFormat::Gz
    } else {
        ArchiveFormat::Plain
    }
}

/// Open a text file for reading, even if it is compressed with gzip.
///
/// The file is expected to contain text; the returned reader yields the
/// uncompressed content either way.
pub fn open_text_file(file_path: impl AsRef<Path>) -> Result<Box<dyn BufRead>> {
    let path = file_path.as_ref();
    let file = File::open(path)?;
    if path.extension().is_some_and(|ext| ext == "gz") {
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Extract `src_file` into `dst_dir`.
///
/// If the file is not a recognised archive it is copied into `dst_dir`
/// instead. `dst_dir` is created if it does not exist.
pub fn extract_file(src_file: impl AsRef<Path>, dst_dir: impl AsRef<Path>) -> Result<()> {
    let src = src_file.as_ref();
    let dst = dst_dir.as_ref();
    let format = classify(src);
    debug!(src = %src.display(), dst = %dst.display(), ?format, "Extracting file");

    fs::create_dir_all(dst)?;
    match format {
        ArchiveFormat::TarGz => {
            let mut archive = tar::Archive::new(GzDecoder::new(File::open(src)?));
            archive.unpack(dst)?;
        }
        ArchiveFormat::Tar => {
            let mut archive = tar::Archive::new(File::open(src)?);
            archive.unpack(dst)?;
        }
        ArchiveFormat::Zip => {
            let mut archive = zip::ZipArchive::new(File::open(src)?)?;
            archive.extract(dst)?;
        }
        ArchiveFormat::Gz => {
            // Drop the '.gz' extension to build the destination file name
            let file_name = src
                .file_stem()
                .ok_or_else(|| UtilsError::archive(src.display().to_string(), "no file name"))?;
            let mut decoder = GzDecoder::new(File::open(src)?);
            let mut out = File::create(dst.join(file_name))?;
            io::copy(&mut decoder, &mut out)?;
        }
        ArchiveFormat::Plain => {
            let file_name = src
                .file_name()
                .ok_or_else(|| UtilsError::archive(src.display().to_string(), "no file name"))?;
            fs::copy(src, dst.join(file_name))?;
        }
    }
    Ok(())
}

/// Read the full text content of a plain or gzipped file.
pub fn read_text_file(file_path: impl AsRef<Path>) -> Result<String> {
    let mut reader = open_text_file(file_path)?;
    let mut content = String::new();
    reader.read_to_string(&mut content)?;
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn write_gz(path: &Path, content: &str) {
        let mut encoder = GzEncoder::new(File::create(path).unwrap(), Compression::default());
        encoder.write_all(content.as_bytes()).unwrap();
        encoder.finish().unwrap();
    }

    #[test]
    fn test_open_text_file_plain() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.txt");
        fs::write(&path, "plain content\n").unwrap();
        assert_eq!(read_text_file(&path).unwrap(), "plain content\n");
    }

    #[test]
    fn test_open_text_file_gzip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("compressed.txt.gz");
        write_gz(&path, "gzipped content\n");
        assert_eq!(read_text_file(&path).unwrap(), "gzipped content\n");
    }

    #[test]
    fn test_extract_gz_file() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("data.txt.gz");
        write_gz(&src, "payload");
        let dst = dir.path().join("out");
        extract_file(&src, &dst).unwrap();
        assert_eq!(fs::read_to_string(dst.join("data.txt")).unwrap(), "payload");
    }

    #[test]
    fn test_extract_tar_archive() {
        let dir = tempfile::tempdir().unwrap();
        let member = dir.path().join("member.txt");
        fs::write(&member, "inside tar").unwrap();
        let src = dir.path().join("bundle.tar");
        let mut builder = tar::Builder::new(File::create(&src).unwrap());
        builder.append_path_with_name(&member, "member.txt").unwrap();
        builder.finish().unwrap();

        let dst = dir.path().join("out");
        extract_file(&src, &dst).unwrap();
        assert_eq!(
            fs::read_to_string(dst.join("member.txt")).unwrap(),
            "inside tar"
        );
    }

    #[test]
    fn test_extract_tar_gz_archive() {
        let dir = tempfile::tempdir().unwrap();
        let member = dir.path().join("member.txt");
        fs::write(&member, "inside tar.gz").unwrap();
        let src = dir.path().join("bundle.tar.gz");
        let encoder = GzEncoder::new(File::create(&src).unwrap(), Compression::default());
        let mut builder = tar::Builder::new(encoder);
        builder.append_path_with_name(&member, "member.txt").unwrap();
        builder.into_inner().unwrap().finish().unwrap();

        let dst = dir.path().join("out");
        extract_file(&src, &dst).unwrap();
        assert_eq!(
            fs::read_to_string(dst.join("member.txt")).unwrap(),
            "inside tar.gz"
        );
    }

    #[test]
    fn test_extract_zip_archive() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("bundle.zip");
        let mut writer = zip::ZipWriter::new(File::create(&src).unwrap());
        writer
            .start_file("member.txt", zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"inside zip").unwrap();
        writer.finish().unwrap();

        let dst = dir.path().join("out");
        extract_file(&src, &dst).unwrap();
        assert_eq!(
            fs::read_to_string(dst.join("member.txt")).unwrap(),
            "inside zip"
        );
    }

    #[test]
    fn test_extract_plain_file_copies() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("notes.txt");
        fs::write(&src, "not an archive").unwrap();
        let dst = dir.path().join("deep").join("out");
        extract_file(&src, &dst).unwrap();
        assert_eq!(
            fs::read_to_string(dst.join("notes.txt")).unwrap(),
            "not an archive"
        );
    }
}
