//! Compressed mesh records in the engine's serialized field layout.

use std::io::ErrorKind;

use tracing::debug;

use crate::bits::MAX_BIT_SIZE;
use crate::compressed::{CompressedMesh, MeshCapabilities};
use crate::io::{EndianReader, EndianWriter, ReadSeek, WriteSeek};
use crate::packed::{PackedBitVector, PackedFloatVector};

fn read_bit_size<R: ReadSeek>(r: &mut EndianReader<R>) -> std::io::Result<u8> {
    let bit_size = r.read_u8()?;
    if bit_size > MAX_BIT_SIZE {
        return Err(std::io::Error::new(
            ErrorKind::InvalidData,
            format!("bit size {bit_size} exceeds {MAX_BIT_SIZE}"),
        ));
    }
    Ok(bit_size)
}

pub fn read_int_vector<R: ReadSeek>(
    r: &mut EndianReader<R>,
) -> std::io::Result<PackedBitVector> {
    let num_items = r.read_u32()?;
    let data = r.read_byte_array()?;
    r.align()?;
    let bit_size = read_bit_size(r)?;
    r.align()?;
    Ok(PackedBitVector {
        num_items,
        bit_size,
        data,
    })
}

pub fn read_float_vector<R: ReadSeek>(
    r: &mut EndianReader<R>,
) -> std::io::Result<PackedFloatVector> {
    let num_items = r.read_u32()?;
    let range = r.read_f32()?;
    let start = r.read_f32()?;
    let data = r.read_byte_array()?;
    r.align()?;
    let bit_size = read_bit_size(r)?;
    r.align()?;
    Ok(PackedFloatVector {
        range,
        start,
        bits: PackedBitVector {
            num_items,
            bit_size,
            data,
        },
    })
}

pub fn write_int_vector<W: WriteSeek>(
    w: &mut EndianWriter<W>,
    v: &PackedBitVector,
) -> std::io::Result<()> {
    w.write_u32(v.num_items)?;
    w.write_byte_array(&v.data)?;
    w.align()?;
    w.write_u8(v.bit_size)?;
    w.align()
}

pub fn write_float_vector<W: WriteSeek>(
    w: &mut EndianWriter<W>,
    v: &PackedFloatVector,
) -> std::io::Result<()> {
    w.write_u32(v.bits.num_items)?;
    w.write_f32(v.range)?;
    w.write_f32(v.start)?;
    w.write_byte_array(&v.bits.data)?;
    w.align()?;
    w.write_u8(v.bits.bit_size)?;
    w.align()
}

/// Read one record. Fields the schema lacks are left empty.
pub fn read_compressed_mesh<R: ReadSeek>(
    r: &mut EndianReader<R>,
    caps: MeshCapabilities,
) -> std::io::Result<CompressedMesh> {
    let mut mesh = CompressedMesh {
        vertices: read_float_vector(r)?,
        uv: read_float_vector(r)?,
        ..Default::default()
    };
    if caps.contains(MeshCapabilities::BIND_POSES) {
        mesh.bind_poses = read_float_vector(r)?;
    }
    mesh.normals = read_float_vector(r)?;
    mesh.tangents = read_float_vector(r)?;
    mesh.weights = read_int_vector(r)?;
    mesh.normal_signs = read_int_vector(r)?;
    mesh.tangent_signs = read_int_vector(r)?;
    if caps.contains(MeshCapabilities::FLOAT_COLORS) {
        mesh.float_colors = read_float_vector(r)?;
    }
    mesh.bone_indices = read_int_vector(r)?;
    mesh.triangles = read_int_vector(r)?;
    if caps.contains(MeshCapabilities::COLORS) {
        mesh.colors = read_int_vector(r)?;
    }
    if caps.contains(MeshCapabilities::UV_INFO) {
        mesh.uv_info = r.read_u32()?;
    }
    debug!(
        vertices = mesh.vertex_count(),
        endian = ?r.endian(),
        "Read compressed mesh record"
    );
    Ok(mesh)
}

pub fn write_compressed_mesh<W: WriteSeek>(
    w: &mut EndianWriter<W>,
    mesh: &CompressedMesh,
    caps: MeshCapabilities,
) -> std::io::Result<()> {
    write_float_vector(w, &mesh.vertices)?;
    write_float_vector(w, &mesh.uv)?;
    if caps.contains(MeshCapabilities::BIND_POSES) {
        write_float_vector(w, &mesh.bind_poses)?;
    }
    write_float_vector(w, &mesh.normals)?;
    write_float_vector(w, &mesh.tangents)?;
    write_int_vector(w, &mesh.weights)?;
    write_int_vector(w, &mesh.normal_signs)?;
    write_int_vector(w, &mesh.tangent_signs)?;
    if caps.contains(MeshCapabilities::FLOAT_COLORS) {
        write_float_vector(w, &mesh.float_colors)?;
    }
    write_int_vector(w, &mesh.bone_indices)?;
    write_int_vector(w, &mesh.triangles)?;
    if caps.contains(MeshCapabilities::COLORS) {
        write_int_vector(w, &mesh.colors)?;
    }
    if caps.contains(MeshCapabilities::UV_INFO) {
        w.write_u32(mesh.uv_info)?;
    }
    Ok(())
}
