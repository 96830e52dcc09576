use glam::{Mat4, Vec3, Vec4};
use tracing::{debug, warn};

use crate::compressed::{CompressedMesh, MeshCapabilities};
use crate::error::{CodecError, CodecResult};
use crate::mesh::{BoneWeight4, Color32, ColorFloat, DecompressedMesh};
use crate::packed::{PackedBitVector, PackedFloatVector};
use crate::uv::{UvChannels, write_uv_channels};

/// Quantization widths used when packing float streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompressSettings {
    pub vertex_bits: u8,
    /// Width of the x and y components; z is rebuilt on decode, so low
    /// widths lose precision fastest near the equator.
    pub normal_bits: u8,
    pub tangent_bits: u8,
    pub uv_bits: u8,
    pub bind_pose_bits: u8,
    pub float_color_bits: u8,
}

impl Default for CompressSettings {
    fn default() -> Self {
        Self {
            vertex_bits: 20,
            normal_bits: 16,
            tangent_bits: 16,
            uv_bits: 16,
            bind_pose_bits: 24,
            float_color_bits: 16,
        }
    }
}

impl CompressedMesh {
    /// Replace every stream with the packed form of `mesh`.
    ///
    /// Absent attributes clear their stream. On error the record keeps
    /// its previous contents.
    pub fn compress(
        &mut self,
        mesh: &DecompressedMesh,
        caps: MeshCapabilities,
        settings: &CompressSettings,
    ) -> CodecResult<()> {
        debug!(
            vertices = mesh.n_vertices(),
            uv_channels = mesh.n_uv_channels(),
            ?caps,
            "Compressing mesh"
        );
        let mut staged = self.clone();
        staged.set_vertices(
            mesh.vertices.as_deref().unwrap_or_default(),
            settings.vertex_bits,
        )?;
        staged.set_uv_channels(&mesh.uv, caps, settings.uv_bits)?;
        staged.set_bind_poses(
            mesh.bind_poses.as_deref().unwrap_or_default(),
            caps,
            settings.bind_pose_bits,
        )?;
        staged.set_normals(
            mesh.normals.as_deref().unwrap_or_default(),
            settings.normal_bits,
        )?;
        staged.set_tangents(
            mesh.tangents.as_deref().unwrap_or_default(),
            settings.tangent_bits,
        )?;
        staged.set_float_colors(
            mesh.colors.as_deref().unwrap_or_default(),
            caps,
            settings.float_color_bits,
        )?;
        staged.set_skin_weights(mesh.skin.as_deref().unwrap_or_default())?;
        staged.set_triangles(mesh.triangles.as_deref().unwrap_or_default())?;
        *self = staged;
        Ok(())
    }

    pub fn set_vertices(&mut self, vertices: &[Vec3], bit_size: u8) -> CodecResult<()> {
        self.vertices.pack_floats(bytemuck::cast_slice(vertices), bit_size)
    }

    pub fn set_uv_channels(
        &mut self,
        channels: &UvChannels,
        caps: MeshCapabilities,
        bit_size: u8,
    ) -> CodecResult<()> {
        let (uv, uv_info) =
            write_uv_channels(channels, caps.contains(MeshCapabilities::UV_INFO), bit_size)?;
        self.uv = uv;
        self.uv_info = uv_info;
        Ok(())
    }

    pub fn set_bind_poses(
        &mut self,
        bind_poses: &[Mat4],
        caps: MeshCapabilities,
        bit_size: u8,
    ) -> CodecResult<()> {
        if !caps.contains(MeshCapabilities::BIND_POSES) {
            if !bind_poses.is_empty() {
                warn!(count = bind_poses.len(), "Schema has no bind pose stream, skipping");
            }
            return Ok(());
        }
        let floats: Vec<f32> = bind_poses.iter().flat_map(Mat4::to_cols_array).collect();
        self.bind_poses.pack_floats(&floats, bit_size)
    }

    pub fn set_normals(&mut self, normals: &[Vec3], bit_size: u8) -> CodecResult<()> {
        let mut xy = Vec::with_capacity(normals.len() * 2);
        let mut signs = Vec::with_capacity(normals.len());
        for n in normals {
            let n = n.normalize_or_zero();
            xy.extend([n.x, n.y]);
            signs.push(sign_bit(n.z));
        }
        let (floats, signs) = pack_with_signs(&xy, &signs, bit_size)?;
        self.normals = floats;
        self.normal_signs = signs;
        Ok(())
    }

    pub fn set_tangents(&mut self, tangents: &[Vec4], bit_size: u8) -> CodecResult<()> {
        let mut xy = Vec::with_capacity(tangents.len() * 2);
        let mut signs = Vec::with_capacity(tangents.len() * 2);
        for t in tangents {
            let v = t.truncate().normalize_or_zero();
            xy.extend([v.x, v.y]);
            signs.extend([sign_bit(v.z), sign_bit(t.w)]);
        }
        let (floats, signs) = pack_with_signs(&xy, &signs, bit_size)?;
        self.tangents = floats;
        self.tangent_signs = signs;
        Ok(())
    }

    /// Store colors in whichever color stream the schema has.
    pub fn set_float_colors(
        &mut self,
        colors: &[ColorFloat],
        caps: MeshCapabilities,
        bit_size: u8,
    ) -> CodecResult<()> {
        if caps.contains(MeshCapabilities::FLOAT_COLORS) {
            self.float_colors.pack_floats(bytemuck::cast_slice(colors), bit_size)
        } else if caps.contains(MeshCapabilities::COLORS) {
            let packed: Vec<u32> = colors
                .iter()
                .map(|&c| Color32::from(c).to_packed())
                .collect();
            // Full width so the stream can be read back as 4 bytes per color.
            self.colors.pack_uints_with_bit_size(&packed, 32)
        } else {
            if !colors.is_empty() {
                warn!(count = colors.len(), "Schema has no color stream, skipping");
            }
            Ok(())
        }
    }

    /// Only clearing the weights is supported; the slot layout
    /// the encoder picked cannot be recovered from [`BoneWeight4`]s.
    pub fn set_skin_weights(&mut self, weights: &[BoneWeight4]) -> CodecResult<()> {
        if !weights.is_empty() {
            return Err(CodecError::NotSupported("encoding skin weights"));
        }
        self.weights.reset();
        self.bone_indices.reset();
        Ok(())
    }

    pub fn set_triangles(&mut self, triangles: &[u32]) -> CodecResult<()> {
        self.triangles.pack_uints(triangles)
    }
}

fn sign_bit(v: f32) -> u32 {
    if v < 0.0 { 0 } else { 1 }
}

fn pack_with_signs(
    xy: &[f32],
    signs: &[u32],
    bit_size: u8,
) -> CodecResult<(PackedFloatVector, PackedBitVector)> {
    let mut floats = PackedFloatVector::default();
    floats.pack_floats(xy, bit_size)?;
    let mut bits = PackedBitVector::default();
    bits.pack_uints(signs)?;
    Ok((floats, bits))
}
