//! Texture coordinate channels sharing one packed float stream.
//!
//! The `uv_info` word holds 4 bits per channel: bit 2 marks the channel
//! as present and bits 0..2 hold its dimension minus one. Present
//! channels are stored back to back in ascending channel order, each
//! `dimension * vertex_count` floats long.
//!
//! When `uv_info` is zero (or the schema has no such word) the stream
//! uses the legacy layout: channel 0 as 2 floats per vertex, optionally
//! followed by channel 1 in the same shape.

use tracing::warn;

use crate::MAX_UV_CHANNELS;
use crate::error::{CodecError, CodecResult};
use crate::mesh::UvChannel;
use crate::packed::PackedFloatVector;

const INFO_BITS_PER_CHANNEL: u32 = 4;
const DIMENSION_MASK: u32 = 0b0011;
const CHANNEL_EXISTS: u32 = 0b0100;
const CHANNEL_MASK: u32 = (1 << INFO_BITS_PER_CHANNEL) - 1;

pub type UvChannels = [Option<UvChannel>; MAX_UV_CHANNELS];

/// Decode `(exists, dimension)` of channel `index`.
pub fn channel_info(uv_info: u32, index: usize) -> CodecResult<(bool, u8)> {
    if index >= MAX_UV_CHANNELS {
        return Err(CodecError::ChannelOutOfRange(index));
    }
    let bits = (uv_info >> (index as u32 * INFO_BITS_PER_CHANNEL)) & CHANNEL_MASK;
    Ok((bits & CHANNEL_EXISTS != 0, 1 + (bits & DIMENSION_MASK) as u8))
}

/// Return `uv_info` with the field of channel `index` replaced.
pub fn set_channel_info(
    uv_info: u32,
    index: usize,
    exists: bool,
    dimension: u8,
) -> CodecResult<u32> {
    if index >= MAX_UV_CHANNELS {
        return Err(CodecError::ChannelOutOfRange(index));
    }
    if !(1..=4).contains(&dimension) {
        return Err(CodecError::InvalidArgument(format!(
            "UV dimension {dimension} is outside 1..=4"
        )));
    }
    let offset = index as u32 * INFO_BITS_PER_CHANNEL;
    let bits = (if exists { CHANNEL_EXISTS } else { 0 }) | (dimension as u32 - 1);
    Ok((uv_info & !(CHANNEL_MASK << offset)) | (bits << offset))
}

pub fn read_uv_channels(
    uv: &PackedFloatVector,
    uv_info: u32,
    has_uv_info: bool,
    vertex_count: usize,
) -> CodecResult<UvChannels> {
    let mut out = UvChannels::default();
    if uv.is_empty() {
        return Ok(out);
    }

    if !has_uv_info || uv_info == 0 {
        out[0] = Some(UvChannel::new(2, uv.unpack_floats(2, 2, 0, vertex_count)?));
        if vertex_count > 0 && uv.len() >= vertex_count * 4 {
            let data = uv.unpack_floats(2, 2, vertex_count * 2, vertex_count)?;
            out[1] = Some(UvChannel::new(2, data));
        }
        return Ok(out);
    }

    let mut offset = 0;
    for (i, slot) in out.iter_mut().enumerate() {
        let (exists, dimension) = channel_info(uv_info, i)?;
        if !exists {
            continue;
        }
        let d = dimension as usize;
        *slot = Some(UvChannel::new(
            dimension,
            uv.unpack_floats(d, d, offset, vertex_count)?,
        ));
        offset += d * vertex_count;
    }
    Ok(out)
}

/// Build the packed UV stream and its `uv_info` word.
pub fn write_uv_channels(
    channels: &UvChannels,
    has_uv_info: bool,
    bit_size: u8,
) -> CodecResult<(PackedFloatVector, u32)> {
    let populated: Vec<Option<&UvChannel>> = channels
        .iter()
        .map(|c| c.as_ref().filter(|c| !c.is_empty()))
        .collect();

    let mut n_vertices = None;
    for (i, channel) in populated.iter().enumerate() {
        let Some(channel) = channel else { continue };
        if !(1..=4).contains(&channel.dimension)
            || channel.data.len() % channel.dimension as usize != 0
        {
            return Err(CodecError::InvalidArgument(format!(
                "UV channel {i} has dimension {} and {} floats",
                channel.dimension,
                channel.data.len()
            )));
        }
        let n = channel.n_vertices();
        match n_vertices {
            None => n_vertices = Some(n),
            Some(first) if first != n => {
                return Err(CodecError::LengthMismatch {
                    what: "UV channel vertex counts",
                    left: first,
                    right: n,
                });
            }
            Some(_) => {}
        }
    }

    let has_high = populated[2..].iter().any(Option::is_some);
    let low_is_2d = populated[..2]
        .iter()
        .all(|c| c.is_none_or(|c| c.dimension == 2));
    let fits_legacy = !has_high
        && low_is_2d
        && (populated[0].is_some() || populated[1].is_none());

    let mut packed = PackedFloatVector::default();
    if !has_uv_info || fits_legacy {
        if has_high {
            warn!("Schema has no UV layout word, dropping UV channels 2..8");
        }
        match (populated[0], populated[1]) {
            (None, None) => {}
            (None, Some(_)) => {
                return Err(CodecError::InvalidArgument(
                    "UV channel 1 requires channel 0 in the legacy layout".into(),
                ));
            }
            (Some(uv0), uv1) => {
                for (i, c) in [(0, Some(uv0)), (1, uv1)] {
                    match c {
                        Some(c) if c.dimension != 2 => {
                            return Err(CodecError::InvalidArgument(format!(
                                "UV channel {i} must be 2D in the legacy layout, got {}",
                                c.dimension
                            )));
                        }
                        _ => {}
                    }
                }
                match uv1 {
                    None => packed.pack_floats(&uv0.data, bit_size)?,
                    Some(uv1) => {
                        let mut scratch =
                            Vec::with_capacity(uv0.data.len() + uv1.data.len());
                        scratch.extend_from_slice(&uv0.data);
                        scratch.extend_from_slice(&uv1.data);
                        packed.pack_floats(&scratch, bit_size)?;
                    }
                }
            }
        }
        return Ok((packed, 0));
    }

    let total: usize = populated.iter().flatten().map(|c| c.data.len()).sum();
    let mut scratch = Vec::with_capacity(total);
    let mut uv_info = 0;
    for (i, channel) in populated.iter().enumerate() {
        if let Some(channel) = channel {
            uv_info = set_channel_info(uv_info, i, true, channel.dimension)?;
            scratch.extend_from_slice(&channel.data);
        }
    }
    packed.pack_floats(&scratch, bit_size)?;
    Ok((packed, uv_info))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize, base: f32) -> Vec<f32> {
        (0..n).map(|i| base + i as f32 * 0.125).collect()
    }

    fn assert_close(a: &[f32], b: &[f32]) {
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b) {
            assert!((x - y).abs() < 1e-4, "{x} vs {y}");
        }
    }

    #[test]
    fn channel_info_bits() {
        let info = set_channel_info(0, 2, true, 3).unwrap();
        assert_eq!(info, 0b0110 << 8);
        assert_eq!(channel_info(info, 2).unwrap(), (true, 3));
        assert_eq!(channel_info(info, 1).unwrap(), (false, 1));
        let cleared = set_channel_info(info, 2, false, 1).unwrap();
        assert_eq!(cleared, 0);
    }

    #[test]
    fn channel_info_rejects_bad_arguments() {
        assert_eq!(channel_info(0, 8), Err(CodecError::ChannelOutOfRange(8)));
        assert_eq!(
            set_channel_info(0, 9, true, 2),
            Err(CodecError::ChannelOutOfRange(9))
        );
        assert!(matches!(
            set_channel_info(0, 0, true, 5),
            Err(CodecError::InvalidArgument(_))
        ));
        assert!(matches!(
            set_channel_info(0, 0, true, 0),
            Err(CodecError::InvalidArgument(_))
        ));
    }

    #[test]
    fn sparse_channels_are_packed_back_to_back() {
        let vc = 4;
        let mut channels = UvChannels::default();
        channels[0] = Some(UvChannel::new(2, ramp(2 * vc, 0.0)));
        channels[2] = Some(UvChannel::new(3, ramp(3 * vc, 10.0)));
        let (packed, info) = write_uv_channels(&channels, true, 20).unwrap();
        assert_eq!(packed.len(), 5 * vc);
        assert_eq!(channel_info(info, 0).unwrap(), (true, 2));
        assert!(!channel_info(info, 1).unwrap().0);
        assert_eq!(channel_info(info, 2).unwrap(), (true, 3));

        let decoded = read_uv_channels(&packed, info, true, vc).unwrap();
        assert!(decoded[1].is_none());
        let uv2 = decoded[2].as_ref().unwrap();
        assert_eq!(uv2.dimension, 3);
        assert_eq!(uv2.n_vertices(), vc);
        assert_close(&uv2.data, &ramp(3 * vc, 10.0));
        // channel 2 starts right after channel 0's 2 * vc floats
        let direct = packed.unpack_floats(3, 3, 2 * vc, vc).unwrap();
        assert_eq!(direct, uv2.data);
    }

    #[test]
    fn legacy_layout_with_two_channels() {
        let vc = 3;
        let mut packed = PackedFloatVector::default();
        packed.pack_floats(&ramp(4 * vc, 0.0), 16).unwrap();
        let decoded = read_uv_channels(&packed, 0, true, vc).unwrap();
        assert_eq!(decoded[0].as_ref().unwrap().n_vertices(), vc);
        assert_eq!(decoded[1].as_ref().unwrap().n_vertices(), vc);
        assert_close(&decoded[1].as_ref().unwrap().data, &ramp(4 * vc, 0.0)[2 * vc..]);
        assert!(decoded[2..].iter().all(Option::is_none));
    }

    #[test]
    fn legacy_layout_with_one_channel() {
        let vc = 3;
        let mut packed = PackedFloatVector::default();
        packed.pack_floats(&ramp(2 * vc, 0.0), 16).unwrap();
        // a stray info word is ignored when the schema lacks it
        let decoded = read_uv_channels(&packed, 0xffff_ffff, false, vc).unwrap();
        assert_eq!(decoded[0].as_ref().unwrap().n_vertices(), vc);
        assert!(decoded[1].is_none());
    }

    #[test]
    fn low_channels_only_use_legacy_layout() {
        let mut channels = UvChannels::default();
        channels[0] = Some(UvChannel::new(2, ramp(4, 0.0)));
        channels[1] = Some(UvChannel::new(2, ramp(4, 1.0)));
        let (packed, info) = write_uv_channels(&channels, true, 16).unwrap();
        assert_eq!(info, 0);
        assert_eq!(packed.len(), 8);
    }

    #[test]
    fn mismatched_legacy_channels_fail() {
        let mut channels = UvChannels::default();
        channels[0] = Some(UvChannel::new(2, ramp(4, 0.0)));
        channels[1] = Some(UvChannel::new(2, ramp(6, 0.0)));
        let err = write_uv_channels(&channels, false, 16).unwrap_err();
        assert!(matches!(err, CodecError::LengthMismatch { left: 2, right: 3, .. }));
    }

    #[test]
    fn high_channels_are_dropped_without_layout_word() {
        let mut channels = UvChannels::default();
        channels[0] = Some(UvChannel::new(2, ramp(4, 0.0)));
        channels[5] = Some(UvChannel::new(2, ramp(4, 0.0)));
        let (packed, info) = write_uv_channels(&channels, false, 16).unwrap();
        assert_eq!(info, 0);
        assert_eq!(packed.len(), 4);
    }

    #[test]
    fn short_stream_is_out_of_range() {
        let mut packed = PackedFloatVector::default();
        packed.pack_floats(&ramp(5, 0.0), 16).unwrap();
        let info = set_channel_info(0, 0, true, 2).unwrap();
        let err = read_uv_channels(&packed, info, true, 3).unwrap_err();
        assert!(err.is_out_of_range());
    }
}
