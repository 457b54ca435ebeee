// fraction_coder/src/file.rs

//! Whole-file compression helpers.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use log::info;

use crate::config::{CodingConfig, ProgressObserver};
use crate::error::Result;

/// Sizes of the source and destination of a file transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileReport {
    pub input_len: usize,
    pub output_len: usize,
}

/// Compresses the file at `input` into a container at `output`.
pub fn compress_file(
    input: &Path,
    output: &Path,
    config: &CodingConfig,
    observer: ProgressObserver<'_>,
) -> Result<FileReport> {
    let content = read_all(input)?;
    let packed = crate::compress_with(&content, config, observer)?;
    write_all(output, &packed)?;
    info!(
        "compressed {} ({} bytes) into {} ({} bytes)",
        input.display(),
        content.len(),
        output.display(),
        packed.len()
    );
    Ok(FileReport {
        input_len: content.len(),
        output_len: packed.len(),
    })
}

/// Decompresses the container at `input` into `output`.
pub fn decompress_file(
    input: &Path,
    output: &Path,
    config: &CodingConfig,
    observer: ProgressObserver<'_>,
) -> Result<FileReport> {
    let packed = read_all(input)?;
    let content = crate::decompress_with(&packed, config, observer)?;
    write_all(output, &content)?;
    info!(
        "decompressed {} ({} bytes) into {} ({} bytes)",
        input.display(),
        packed.len(),
        output.display(),
        content.len()
    );
    Ok(FileReport {
        input_len: packed.len(),
        output_len: content.len(),
    })
}

fn read_all(path: &Path) -> Result<Vec<u8>> {
    let mut file = File::open(path)?;
    let mut content = Vec::new();
    file.read_to_end(&mut content)?;
    Ok(content)
}

fn write_all(path: &Path, content: &[u8]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(content)?;
    writer.flush()?;
    Ok(())
}
