use std::io::Cursor;

use compressed_mesh::io::EndianReader;
use compressed_mesh::serialize::read_compressed_mesh;
use compressed_mesh::{CompressedMesh, MeshCapabilities};

use crate::ReadArgs;
use crate::prelude::*;

/// A record file loaded fully into memory.
pub struct LoadedRecord {
    pub bytes: Vec<u8>,
    pub mesh: CompressedMesh,
    pub consumed: u64,
}

pub fn load_record(path: &Path, args: &ReadArgs) -> AnyResult<LoadedRecord> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Could not read input file {}", path.display()))?;
    let mut reader = EndianReader::new(Cursor::new(&bytes[..]), args.into());
    let mesh = read_compressed_mesh(&mut reader, MeshCapabilities::from(args))
        .context("Cannot parse compressed mesh record")?;
    let consumed = reader.into_inner().position();
    if consumed < bytes.len() as u64 {
        tracing::warn!(
            trailing = bytes.len() as u64 - consumed,
            "File has bytes after the record"
        );
    }
    Ok(LoadedRecord {
        bytes,
        mesh,
        consumed,
    })
}
