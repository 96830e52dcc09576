use glam::{Mat4, Vec3, Vec4};
use tracing::{debug, trace};

use crate::compressed::{CompressedMesh, MeshCapabilities};
use crate::error::{CodecError, CodecResult};
use crate::mesh::{BoneWeight4, Color32, ColorFloat, DecompressedMesh};
use crate::uv::{UvChannels, read_uv_channels};
use crate::{BONE_WEIGHT_SCALE, MATRIX_FLOATS};

impl CompressedMesh {
    /// Reconstruct every attribute the record carries.
    pub fn decompress(&self, caps: MeshCapabilities) -> CodecResult<DecompressedMesh> {
        let has_bind_poses = caps.contains(MeshCapabilities::BIND_POSES);
        let has_float_colors = caps.contains(MeshCapabilities::FLOAT_COLORS);
        let has_colors = caps.contains(MeshCapabilities::COLORS);
        debug!(
            vertices = self.vertex_count(),
            ?caps,
            "Decompressing mesh"
        );

        let mut out = DecompressedMesh::default();
        if !self.vertices.is_empty() {
            out.vertices = Some(self.vertices()?);
        }
        out.uv = self.uv_channels(caps)?;
        if has_bind_poses && !self.bind_poses.is_empty() {
            out.bind_poses = Some(self.bind_poses(caps)?);
        }
        if !self.normals.is_empty() {
            out.normals = Some(self.normals()?);
        }
        if !self.tangents.is_empty() {
            out.tangents = Some(self.tangents()?);
        }
        if (has_float_colors && !self.float_colors.is_empty())
            || (has_colors && !self.colors.is_empty())
        {
            out.colors = Some(self.float_colors(caps)?);
        }
        if !self.weights.is_empty() {
            out.skin = Some(self.skin_weights()?);
        }
        if !self.triangles.is_empty() {
            out.triangles = Some(self.triangles()?);
        }
        Ok(out)
    }

    pub fn vertices(&self) -> CodecResult<Vec<Vec3>> {
        let floats = self.vertices.unpack_all(3)?;
        Ok(bytemuck::cast_slice(&floats).to_vec())
    }

    pub fn uv_channels(&self, caps: MeshCapabilities) -> CodecResult<UvChannels> {
        read_uv_channels(
            &self.uv,
            self.uv_info,
            caps.contains(MeshCapabilities::UV_INFO),
            self.vertex_count(),
        )
    }

    /// Empty when the schema keeps bind poses elsewhere.
    pub fn bind_poses(&self, caps: MeshCapabilities) -> CodecResult<Vec<Mat4>> {
        if !caps.contains(MeshCapabilities::BIND_POSES) {
            return Ok(vec![]);
        }
        let floats = self.bind_poses.unpack_all(MATRIX_FLOATS)?;
        Ok(floats
            .chunks_exact(MATRIX_FLOATS)
            .map(Mat4::from_cols_slice)
            .collect())
    }

    pub fn normals(&self) -> CodecResult<Vec<Vec3>> {
        let xy = self.normals.unpack_all(2)?;
        let n = xy.len() / 2;
        let mut signs = Vec::with_capacity(n);
        self.normal_signs.unpack_range(0, n, &mut signs)?;

        let mut repaired = 0;
        let normals: Vec<Vec3> = xy
            .chunks_exact(2)
            .zip(signs)
            .map(|(xy, sign)| {
                let (v, ok) = reconstruct_unit(xy[0], xy[1]);
                repaired += usize::from(!ok);
                if sign == 0 { v.with_z(-v.z) } else { v }
            })
            .collect();
        if repaired > 0 {
            trace!(repaired, "Renormalized normals outside the unit disc");
        }
        Ok(normals)
    }

    pub fn tangents(&self) -> CodecResult<Vec<Vec4>> {
        let xy = self.tangents.unpack_all(2)?;
        let n = xy.len() / 2;
        let mut signs = Vec::with_capacity(n * 2);
        self.tangent_signs.unpack_range(0, n * 2, &mut signs)?;

        let mut repaired = 0;
        let tangents: Vec<Vec4> = xy
            .chunks_exact(2)
            .zip(signs.chunks_exact(2))
            .map(|(xy, signs)| {
                let (v, ok) = reconstruct_unit(xy[0], xy[1]);
                repaired += usize::from(!ok);
                let z = if signs[0] == 0 { -v.z } else { v.z };
                let w = if signs[1] == 0 { -1.0 } else { 1.0 };
                Vec4::new(v.x, v.y, z, w)
            })
            .collect();
        if repaired > 0 {
            trace!(repaired, "Renormalized tangents outside the unit disc");
        }
        Ok(tangents)
    }

    /// Vertex colors from the float stream, or from the packed 32-bit
    /// stream read as four 8-bit components per color.
    pub fn float_colors(&self, caps: MeshCapabilities) -> CodecResult<Vec<ColorFloat>> {
        if caps.contains(MeshCapabilities::FLOAT_COLORS) && !self.float_colors.is_empty() {
            let floats = self.float_colors.unpack_all(4)?;
            return Ok(bytemuck::cast_slice(&floats).to_vec());
        }
        if caps.contains(MeshCapabilities::COLORS) && !self.colors.is_empty() {
            let bytes = self
                .colors
                .unpack_uints_as(self.colors.len() * 4, self.colors.bit_size / 4)?;
            return Ok(bytes
                .chunks_exact(4)
                .map(|c| {
                    ColorFloat::from(Color32 {
                        r: c[0] as u8,
                        g: c[1] as u8,
                        b: c[2] as u8,
                        a: c[3] as u8,
                    })
                })
                .collect());
        }
        Ok(vec![])
    }

    /// Walk the weight stream, filling up to four influences per vertex.
    ///
    /// A vertex ends once its weights reach [`BONE_WEIGHT_SCALE`]. After
    /// three weights that fall short, the fourth weight is the remainder
    /// and only its bone index is stored.
    pub fn skin_weights(&self) -> CodecResult<Vec<BoneWeight4>> {
        let weights = self.weights.unpack_uints()?;
        let bone_indices = self.bone_indices.unpack_ints()?;
        let scale = BONE_WEIGHT_SCALE as f32;

        let mut next_index = 0;
        let mut read_bone = || {
            let r = bone_indices.get(next_index).copied().ok_or(CodecError::OutOfRange {
                first: next_index,
                count: 1,
                available: bone_indices.len(),
            });
            next_index += 1;
            r
        };

        let mut skin = Vec::new();
        let mut current = BoneWeight4::default();
        let mut slot = 0;
        let mut sum = 0;
        for (i, &w) in weights.iter().enumerate() {
            if w > BONE_WEIGHT_SCALE {
                return Err(CodecError::InvalidArgument(format!(
                    "skin weight {w} at index {i} exceeds {BONE_WEIGHT_SCALE}"
                )));
            }
            current.weights[slot] = w as f32 / scale;
            current.indices[slot] = read_bone()?;
            slot += 1;
            sum += w;

            if sum >= BONE_WEIGHT_SCALE {
                skin.push(current);
            } else if slot == 3 {
                current.weights[3] = (BONE_WEIGHT_SCALE - sum) as f32 / scale;
                current.indices[3] = read_bone()?;
                skin.push(current);
            } else {
                continue;
            }
            current = BoneWeight4::default();
            slot = 0;
            sum = 0;
        }
        if slot > 0 {
            debug!(slot, "Weight stream ends inside a vertex");
            skin.push(current);
        }
        Ok(skin)
    }

    pub fn triangles(&self) -> CodecResult<Vec<u32>> {
        self.triangles.unpack_uints()
    }
}

/// Rebuild a unit vector from its x and y components with z >= 0.
///
/// Returns `false` alongside the vector when `(x, y)` lies outside the
/// unit disc and had to be renormalized with z = 0.
fn reconstruct_unit(x: f32, y: f32) -> (Vec3, bool) {
    let zsqr = 1.0 - x * x - y * y;
    if zsqr >= 0.0 {
        (Vec3::new(x, y, zsqr.sqrt()), true)
    } else {
        (Vec3::new(x, y, 0.0).normalize(), false)
    }
}
