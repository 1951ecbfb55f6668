/// 16 bit additive checksum as used by rdm.
#[inline]
pub(crate) fn calculate_checksum(data: &[u8]) -> u16 {
    let mut checksum = 0u16;

    for byte in data {
        checksum = checksum.wrapping_add(*byte as u16);
    }

    checksum
}

/// Encode bytes for a discovery response. Every byte is sent twice, once or-ed with `0xAA`
/// and once or-ed with `0x55`, so that a collision on the bus corrupts the response.
/// The destination has to be at least twice the size of the source.
pub(crate) fn encode_disc_unique(src: &[u8], dest: &mut [u8]) {
    debug_assert!(dest.len() >= src.len() * 2);

    for (byte, chunk) in src.iter().zip(dest.chunks_exact_mut(2)) {
        chunk[0] = byte | 0xAA;
        chunk[1] = byte | 0x55;
    }
}
