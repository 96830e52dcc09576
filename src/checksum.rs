/// Content hash of one packed stream, covering its metadata.
#[inline(always)]
pub fn checksum_stream(
    num_items: u32,
    bit_size: u8,
    data: &[u8],
) -> u64 {
    let hasher = rapidhash::RapidInlineHasher::default_const();
    let hasher = hasher.write_const(&num_items.to_le_bytes());
    let hasher = hasher.write_const(&[bit_size]);
    let hasher = hasher.write_const(data);
    hasher.finish_const()
}

#[inline(always)]
pub fn checksum_data(data: &[u8]) -> u64 {
    rapidhash::rapidhash_inline(data, rapidhash::RAPID_SEED)
}
