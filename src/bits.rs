//! LSB-first bit stream primitives.
//!
//! Codes of `bit_size` bits are stored back to back with no padding
//! between them: the first code occupies the lowest bits of the first
//! byte, and a code that does not fit in the remainder of a byte spills
//! into the low bits of the next one.

use crate::error::{CodecError, CodecResult};

/// Largest supported width of a single code.
pub const MAX_BIT_SIZE: u8 = 32;

/// Largest value representable with `bit_size` bits.
#[inline]
pub const fn max_code(bit_size: u8) -> u64 {
    (1u64 << bit_size) - 1
}

/// Minimal number of bits needed to store `max`. Never less than 1.
#[inline]
pub const fn bit_width(max: u32) -> u8 {
    let w = (u32::BITS - max.leading_zeros()) as u8;
    if w == 0 { 1 } else { w }
}

/// Number of bytes occupied by `num_items` codes of `bit_size` bits.
#[inline]
pub const fn byte_len(num_items: usize, bit_size: u8) -> usize {
    (num_items * bit_size as usize).div_ceil(8)
}

pub(crate) fn check_bit_size(bit_size: u8) -> CodecResult<()> {
    if bit_size == 0 || bit_size > MAX_BIT_SIZE {
        return Err(CodecError::InvalidArgument(format!(
            "bit size {bit_size} is outside 1..={MAX_BIT_SIZE}"
        )));
    }
    Ok(())
}

/// Append `values` to `out`, `bit_size` bits each.
///
/// Every value must fit in `bit_size` bits; higher bits are discarded.
pub fn pack_bits(values: &[u32], bit_size: u8, out: &mut Vec<u8>) -> CodecResult<()> {
    check_bit_size(bit_size)?;
    let bits = bit_size as u32;
    let mask = max_code(bit_size);
    out.reserve(byte_len(values.len(), bit_size));

    let mut acc: u64 = 0;
    let mut acc_bits: u32 = 0;
    for &value in values {
        acc |= (value as u64 & mask) << acc_bits;
        acc_bits += bits;
        while acc_bits >= 8 {
            out.push(acc as u8);
            acc >>= 8;
            acc_bits -= 8;
        }
    }
    if acc_bits > 0 {
        out.push(acc as u8);
    }
    Ok(())
}

/// Read `count` codes of `bit_size` bits, starting at code index `first`.
///
/// The whole range must lie inside `data`; nothing past the last byte is
/// assumed to be zero.
pub fn unpack_bits(
    data: &[u8],
    bit_size: u8,
    first: usize,
    count: usize,
    out: &mut Vec<u32>,
) -> CodecResult<()> {
    check_bit_size(bit_size)?;
    if count == 0 {
        return Ok(());
    }
    let bits = bit_size as usize;
    let available = data.len() * 8 / bits;
    let end = first.checked_add(count).ok_or(CodecError::OutOfRange {
        first,
        count,
        available,
    })?;
    if end > available {
        return Err(CodecError::OutOfRange { first, count, available });
    }

    out.reserve(count);
    let mask = max_code(bit_size);
    let start_bit = first * bits;
    let mut byte_idx = start_bit / 8;
    let mut acc: u64 = 0;
    let mut acc_bits: usize = 0;
    let skip = start_bit % 8;
    if skip > 0 {
        acc = (data[byte_idx] >> skip) as u64;
        acc_bits = 8 - skip;
        byte_idx += 1;
    }
    for _ in 0..count {
        while acc_bits < bits {
            acc |= (data[byte_idx] as u64) << acc_bits;
            acc_bits += 8;
            byte_idx += 1;
        }
        out.push((acc & mask) as u32);
        acc >>= bits;
        acc_bits -= bits;
    }
    Ok(())
}
