use glam::{Mat4, Vec3, Vec4};

use crate::MAX_UV_CHANNELS;

#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[derive(bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct ColorFloat {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct Color32 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl ColorFloat {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

impl From<Color32> for ColorFloat {
    fn from(c: Color32) -> Self {
        Self {
            r: c.r as f32 / 255.0,
            g: c.g as f32 / 255.0,
            b: c.b as f32 / 255.0,
            a: c.a as f32 / 255.0,
        }
    }
}

impl From<ColorFloat> for Color32 {
    fn from(c: ColorFloat) -> Self {
        fn to_byte(v: f32) -> u8 {
            (v.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        Self {
            r: to_byte(c.r),
            g: to_byte(c.g),
            b: to_byte(c.b),
            a: to_byte(c.a),
        }
    }
}

impl Color32 {
    /// Packed with `r` in the lowest byte.
    pub const fn to_packed(self) -> u32 {
        u32::from_le_bytes([self.r, self.g, self.b, self.a])
    }

    pub const fn from_packed(v: u32) -> Self {
        let [r, g, b, a] = v.to_le_bytes();
        Self { r, g, b, a }
    }
}

/// Skinning data for one vertex: up to four bone influences.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[derive(bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct BoneWeight4 {
    pub weights: [f32; 4],
    pub indices: [i32; 4],
}

impl BoneWeight4 {
    pub fn total_weight(&self) -> f32 {
        self.weights.iter().sum()
    }
}

/// One texture coordinate channel, `dimension` floats per vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct UvChannel {
    pub dimension: u8,
    pub data: Vec<f32>,
}

impl UvChannel {
    pub fn new(dimension: u8, data: Vec<f32>) -> Self {
        Self { dimension, data }
    }

    pub fn from_vec2(uvs: &[glam::Vec2]) -> Self {
        Self {
            dimension: 2,
            data: bytemuck::cast_slice(uvs).to_vec(),
        }
    }

    pub fn n_vertices(&self) -> usize {
        if self.dimension == 0 {
            return 0;
        }
        self.data.len() / self.dimension as usize
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The coordinates of vertex `i`.
    pub fn get(&self, i: usize) -> Option<&[f32]> {
        let d = self.dimension as usize;
        self.data.get(i * d..(i + 1) * d)
    }
}

/// Attribute arrays reconstructed from a compressed mesh.
///
/// A field is `None` when its source stream is empty or the schema does
/// not have it.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DecompressedMesh {
    pub vertices: Option<Vec<Vec3>>,
    pub normals: Option<Vec<Vec3>>,
    pub tangents: Option<Vec<Vec4>>,
    pub colors: Option<Vec<ColorFloat>>,
    pub skin: Option<Vec<BoneWeight4>>,
    pub uv: [Option<UvChannel>; MAX_UV_CHANNELS],
    pub bind_poses: Option<Vec<Mat4>>,
    pub triangles: Option<Vec<u32>>,
}

impl DecompressedMesh {
    pub fn n_vertices(&self) -> usize {
        self.vertices.as_ref().map(Vec::len).unwrap_or(0)
    }

    pub fn n_uv_channels(&self) -> usize {
        self.uv.iter().filter(|c| c.is_some()).count()
    }
}
