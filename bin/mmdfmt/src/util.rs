use std::fs::File;
use std::io::BufWriter;

use mmd_format::read::is_pmd_file;
use mmd_format::read_vmd::is_vmd_file;

use crate::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Model,
    Motion,
}

/// Decide the format from the magic bytes, not the extension.
pub fn detect_file_kind(path: &Path) -> AnyResult<FileKind> {
    let mut file = File::open(path).context("Could not open input file")?;
    if is_pmd_file(&mut file).context("Cannot autodetect file format")? {
        return Ok(FileKind::Model);
    }
    if is_vmd_file(&mut file).context("Cannot autodetect file format")? {
        return Ok(FileKind::Motion);
    }
    bail!("{} is neither a PMD model nor a VMD motion file", path.display());
}

pub fn create_output(path: &Path, overwrite: bool) -> AnyResult<BufWriter<File>> {
    let outfile = if overwrite {
        File::create(path).context("Could not open output file")?
    } else {
        File::create_new(path).context("Could not open output file")?
    };
    Ok(BufWriter::new(outfile))
}
