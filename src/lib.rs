pub mod bits;
pub mod checksum;
pub mod error;
pub mod packed;

pub mod compressed;
pub mod mesh;
pub mod uv;

pub mod read;
pub mod write;

pub mod io;
pub mod serialize;

pub use compressed::{CompressedMesh, MeshCapabilities, StreamSummary};
pub use error::{CodecError, CodecResult};
pub use mesh::{BoneWeight4, Color32, ColorFloat, DecompressedMesh, UvChannel};
pub use packed::{PackedBitVector, PackedFloatVector};
pub use write::CompressSettings;

/// Number of UV channel slots a mesh can carry.
pub const MAX_UV_CHANNELS: usize = 8;
/// Skin weights are stored in units of 1/31; four of them sum to this.
pub const BONE_WEIGHT_SCALE: u32 = 31;
/// Floats per bind pose matrix.
pub const MATRIX_FLOATS: usize = 16;
