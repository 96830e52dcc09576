//! Bit-packed integer and quantized float streams.

use crate::bits::{self, bit_width, byte_len, check_bit_size, max_code};
use crate::error::{CodecError, CodecResult};

/// A fixed count of fixed-width integers stored contiguously.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackedBitVector {
    pub num_items: u32,
    pub bit_size: u8,
    pub data: Vec<u8>,
}

/// A [`PackedBitVector`] whose codes are quantized floats in
/// `start..=start + range`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackedFloatVector {
    pub range: f32,
    pub start: f32,
    pub bits: PackedBitVector,
}

impl PackedBitVector {
    pub fn is_empty(&self) -> bool {
        self.num_items == 0
    }

    pub fn len(&self) -> usize {
        self.num_items as usize
    }

    pub fn reset(&mut self) {
        self.num_items = 0;
        self.bit_size = 0;
        self.data.clear();
    }

    pub fn unpack_uints(&self) -> CodecResult<Vec<u32>> {
        self.unpack_uints_as(self.len(), self.bit_size)
    }

    pub fn unpack_ints(&self) -> CodecResult<Vec<i32>> {
        Ok(self.unpack_uints()?.into_iter().map(|v| v as i32).collect())
    }

    /// Read the buffer as `num_items` codes of `bit_size` bits, ignoring
    /// the stored metadata. The vector itself is left untouched.
    pub fn unpack_uints_as(
        &self,
        num_items: usize,
        bit_size: u8,
    ) -> CodecResult<Vec<u32>> {
        if num_items == 0 {
            return Ok(vec![]);
        }
        let mut out = Vec::with_capacity(num_items);
        bits::unpack_bits(&self.data, bit_size, 0, num_items, &mut out)?;
        Ok(out)
    }

    /// Unpack `count` codes starting at item `first`, bounded by
    /// `num_items` rather than by the buffer length alone.
    pub(crate) fn unpack_range(
        &self,
        first: usize,
        count: usize,
        out: &mut Vec<u32>,
    ) -> CodecResult<()> {
        let available = self.len();
        if first.saturating_add(count) > available {
            return Err(CodecError::OutOfRange { first, count, available });
        }
        bits::unpack_bits(&self.data, self.bit_size, first, count, out)
    }

    /// Pack with the narrowest width that holds the largest value.
    pub fn pack_uints(&mut self, values: &[u32]) -> CodecResult<()> {
        let max = values.iter().copied().max().unwrap_or(0);
        self.pack_uints_with_bit_size(values, bit_width(max))
    }

    /// Negative values are stored in two's complement and need all 32 bits.
    pub fn pack_ints(&mut self, values: &[i32]) -> CodecResult<()> {
        let values: Vec<u32> = values.iter().map(|&v| v as u32).collect();
        self.pack_uints(&values)
    }

    pub fn pack_uints_with_bit_size(
        &mut self,
        values: &[u32],
        bit_size: u8,
    ) -> CodecResult<()> {
        if values.is_empty() {
            self.reset();
            return Ok(());
        }
        check_bit_size(bit_size)?;
        let limit = max_code(bit_size);
        if let Some(v) = values.iter().find(|&&v| v as u64 > limit) {
            return Err(CodecError::InvalidArgument(format!(
                "value {v} does not fit in {bit_size} bits"
            )));
        }
        let num_items = u32::try_from(values.len()).map_err(|_| {
            CodecError::InvalidArgument(format!(
                "{} items exceed the stream capacity",
                values.len()
            ))
        })?;
        let mut data = Vec::with_capacity(byte_len(values.len(), bit_size));
        bits::pack_bits(values, bit_size, &mut data)?;
        debug_assert_eq!(data.len(), byte_len(values.len(), bit_size));
        *self = Self {
            num_items,
            bit_size,
            data,
        };
        Ok(())
    }
}

impl PackedFloatVector {
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn reset(&mut self) {
        self.range = 0.0;
        self.start = 0.0;
        self.bits.reset();
    }

    /// Read `count` groups of `dimension` floats. Group `g` begins at flat
    /// item `offset + g * stride`.
    pub fn unpack_floats(
        &self,
        dimension: usize,
        stride: usize,
        offset: usize,
        count: usize,
    ) -> CodecResult<Vec<f32>> {
        if dimension == 0 || stride < dimension {
            return Err(CodecError::InvalidArgument(format!(
                "dimension {dimension} with stride {stride}"
            )));
        }
        if count == 0 {
            return Ok(vec![]);
        }
        let span = (count - 1)
            .checked_mul(stride)
            .and_then(|n| n.checked_add(dimension))
            .ok_or(CodecError::OutOfRange {
                first: offset,
                count: usize::MAX,
                available: self.len(),
            })?;

        let mut codes = Vec::with_capacity(count * dimension);
        if stride == dimension {
            self.bits.unpack_range(offset, span, &mut codes)?;
        } else {
            if offset.saturating_add(span) > self.len() {
                return Err(CodecError::OutOfRange {
                    first: offset,
                    count: span,
                    available: self.len(),
                });
            }
            for g in 0..count {
                self.bits.unpack_range(offset + g * stride, dimension, &mut codes)?;
            }
        }
        Ok(self.dequantize(&codes))
    }

    /// Every complete group of `dimension` floats in the stream.
    pub fn unpack_all(&self, dimension: usize) -> CodecResult<Vec<f32>> {
        let count = if dimension == 0 { 0 } else { self.len() / dimension };
        self.unpack_floats(dimension, dimension, 0, count)
    }

    fn dequantize(&self, codes: &[u32]) -> Vec<f32> {
        let scale = self.range as f64 / max_code(self.bits.bit_size) as f64;
        let start = self.start as f64;
        codes
            .iter()
            .map(|&q| (start + q as f64 * scale) as f32)
            .collect()
    }

    /// Quantize `values` to `bit_size` bits over their own min..max range.
    pub fn pack_floats(&mut self, values: &[f32], bit_size: u8) -> CodecResult<()> {
        if values.is_empty() {
            self.reset();
            return Ok(());
        }
        check_bit_size(bit_size)?;
        if let Some(v) = values.iter().find(|v| !v.is_finite()) {
            return Err(CodecError::InvalidArgument(format!(
                "cannot quantize non-finite value {v}"
            )));
        }
        let (min, max) = values
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        let range = max as f64 - min as f64;
        if range > f32::MAX as f64 {
            return Err(CodecError::InvalidArgument(format!(
                "value range {min}..{max} does not fit in an f32"
            )));
        }
        let max_q = max_code(bit_size) as f64;
        let codes: Vec<u32> = if range > 0.0 {
            let inv = max_q / range;
            values
                .iter()
                .map(|&v| {
                    let q = ((v as f64 - min as f64) * inv).round();
                    q.clamp(0.0, max_q) as u32
                })
                .collect()
        } else {
            vec![0; values.len()]
        };

        let mut bits = PackedBitVector::default();
        bits.pack_uints_with_bit_size(&codes, bit_size)?;
        *self = Self {
            range: range as f32,
            start: min,
            bits,
        };
        Ok(())
    }
}
