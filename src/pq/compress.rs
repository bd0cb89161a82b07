// rpmpq: RPM spec patch-queue tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Compression of exported patches and decompression of staged ones.

use flate2::Compression as GzLevel;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write as _};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::types::ByteSize;
use crate::core::process::builder::ProcessBuilder;
use crate::error::{FsError, PatchError, PqResult};
use crate::spec::archive::{Compression, parse_archive_filename};

/// Gzips `path` to `<path>.gz` if it is larger than `threshold`.
///
/// Returns the file name to list in the spec file. A zero threshold disables
/// compression.
///
/// # Errors
///
/// Returns `FsError::IoError` if reading, writing or removing fails.
pub fn compress_if_large(path: &Path, threshold: ByteSize) -> PqResult<String> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let size = std::fs::metadata(path)
        .map_err(|e| FsError::io(path, e))?
        .len();
    if threshold.is_zero() || size <= threshold.bytes() {
        return Ok(name);
    }

    debug!(patch = %name, size, "compressing");
    let target = PathBuf::from(format!("{}.gz", path.display()));
    let mut input = BufReader::new(File::open(path).map_err(|e| FsError::io(path, e))?);
    let output = File::create(&target).map_err(|e| FsError::io(&target, e))?;
    let mut encoder = GzEncoder::new(BufWriter::new(output), GzLevel::default());
    std::io::copy(&mut input, &mut encoder).map_err(|e| FsError::io(&target, e))?;
    encoder
        .finish()
        .and_then(|mut writer| writer.flush())
        .map_err(|e| FsError::io(&target, e))?;
    std::fs::remove_file(path).map_err(|e| FsError::io(path, e))?;
    Ok(format!("{name}.gz"))
}

/// Copies the patch at `source` into `dir`, uncompressed.
///
/// gzip is unpacked in-process, bzip2 through `bzip2 -dc`. Returns the staged path.
///
/// # Errors
///
/// Returns `PatchError::UnsupportedCompression` for any other compression
/// and an I/O or process error if staging fails.
pub fn stage_patch(source: &Path, dir: &Path) -> PqResult<PathBuf> {
    let file_name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let archive = parse_archive_filename(&file_name);
    let io_err = |path: &Path, e| FsError::io(path, e);

    match archive.compression {
        None => {
            let target = dir.join(&file_name);
            std::fs::copy(source, &target).map_err(|e| io_err(source, e))?;
            Ok(target)
        }
        Some(Compression::Gzip) => {
            debug!(patch = %file_name, "uncompressing");
            let target = dir.join(&archive.base);
            let input = File::open(source).map_err(|e| io_err(source, e))?;
            let mut decoder = MultiGzDecoder::new(BufReader::new(input));
            let mut output = File::create(&target).map_err(|e| io_err(&target, e))?;
            std::io::copy(&mut decoder, &mut output).map_err(|e| io_err(source, e))?;
            Ok(target)
        }
        Some(Compression::Bzip2) => {
            debug!(patch = %file_name, "uncompressing");
            let target = dir.join(&archive.base);
            let output = ProcessBuilder::which("bzip2")
                .map_err(Box::new)?
                .arg("-dc")
                .arg(source)
                .capture_output()
                .run()?;
            std::fs::write(&target, output.stdout_bytes()).map_err(|e| io_err(&target, e))?;
            Ok(target)
        }
        Some(other) => Err(PatchError::UnsupportedCompression {
            patch: file_name,
            compression: other.to_string(),
        }
        .into()),
    }
}
