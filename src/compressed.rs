use crate::checksum::checksum_stream;
use crate::packed::{PackedBitVector, PackedFloatVector};

bitflags::bitflags! {
    /// Optional fields present in the serialized schema of a given
    /// engine version.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MeshCapabilities: u8 {
        /// Bind poses stored in the compressed record (before 5.0)
        const BIND_POSES = 0b0001;
        /// Dedicated float color stream (5.0 and later)
        const FLOAT_COLORS = 0b0010;
        /// Packed 32-bit color stream (before 5.0)
        const COLORS = 0b0100;
        /// Per-channel UV layout word (5.0 and later)
        const UV_INFO = 0b1000;
    }
}

impl MeshCapabilities {
    pub const fn legacy() -> Self {
        Self::BIND_POSES.union(Self::COLORS)
    }

    pub const fn modern() -> Self {
        Self::FLOAT_COLORS.union(Self::UV_INFO)
    }
}

impl Default for MeshCapabilities {
    fn default() -> Self {
        Self::modern()
    }
}

/// The on-disk compressed representation of a mesh: one packed stream
/// per attribute.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompressedMesh {
    pub vertices: PackedFloatVector,
    pub uv: PackedFloatVector,
    pub bind_poses: PackedFloatVector,
    pub normals: PackedFloatVector,
    pub tangents: PackedFloatVector,
    pub weights: PackedBitVector,
    pub normal_signs: PackedBitVector,
    pub tangent_signs: PackedBitVector,
    pub float_colors: PackedFloatVector,
    pub bone_indices: PackedBitVector,
    pub triangles: PackedBitVector,
    pub colors: PackedBitVector,
    pub uv_info: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSummary {
    pub name: &'static str,
    pub num_items: u32,
    pub bit_size: u8,
    pub byte_len: usize,
    pub checksum: u64,
}

impl StreamSummary {
    fn of(name: &'static str, bits: &PackedBitVector) -> Self {
        Self {
            name,
            num_items: bits.num_items,
            bit_size: bits.bit_size,
            byte_len: bits.data.len(),
            checksum: checksum_stream(bits.num_items, bits.bit_size, &bits.data),
        }
    }
}

impl CompressedMesh {
    /// Whether the record holds any geometry at all.
    pub fn is_set(&self) -> bool {
        !self.vertices.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }

    /// Metadata and content checksum of every stream the schema has.
    pub fn stream_summaries(&self, caps: MeshCapabilities) -> Vec<StreamSummary> {
        let mut r = vec![
            StreamSummary::of("vertices", &self.vertices.bits),
            StreamSummary::of("uv", &self.uv.bits),
        ];
        if caps.contains(MeshCapabilities::BIND_POSES) {
            r.push(StreamSummary::of("bind_poses", &self.bind_poses.bits));
        }
        r.extend([
            StreamSummary::of("normals", &self.normals.bits),
            StreamSummary::of("tangents", &self.tangents.bits),
            StreamSummary::of("weights", &self.weights),
            StreamSummary::of("normal_signs", &self.normal_signs),
            StreamSummary::of("tangent_signs", &self.tangent_signs),
        ]);
        if caps.contains(MeshCapabilities::FLOAT_COLORS) {
            r.push(StreamSummary::of("float_colors", &self.float_colors.bits));
        }
        r.push(StreamSummary::of("bone_indices", &self.bone_indices));
        r.push(StreamSummary::of("triangles", &self.triangles));
        if caps.contains(MeshCapabilities::COLORS) {
            r.push(StreamSummary::of("colors", &self.colors));
        }
        r
    }
}
