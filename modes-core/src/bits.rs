//! Bitfield extraction and gray-code helpers.
//!
//! Mode S fields are numbered MSB-first. [`extract`] works on arbitrary byte
//! slices with 0-based offsets; [`me_field`] works on the 56-bit ME word with
//! the 1-based bit numbering used by the DO-260B field tables, so decoders can
//! be checked against the tables line by line.

use crate::types::{ModesError, Result};

/// Width of an extended squitter ME (and Comm-B MB) field.
pub const ME_BITS: u32 = 56;

/// Extract `len` bits (at most 64) starting at bit `start` of `data`.
///
/// Bit 0 is the most significant bit of `data[0]`. Fails with
/// [`ModesError::BadFormat`] if the field would run past the end of `data`.
pub fn extract(data: &[u8], start: usize, len: usize) -> Result<u64> {
    if len > 64 {
        return Err(ModesError::BadFormat(format!(
            "cannot extract {len} bits into a 64-bit word"
        )));
    }
    let end = start + len;
    if end > data.len() * 8 {
        return Err(ModesError::BadFormat(format!(
            "bits {start}..{end} exceed {}-bit frame",
            data.len() * 8
        )));
    }

    let mut value = 0u64;
    for pos in start..end {
        let bit = (data[pos / 8] >> (7 - pos % 8)) & 1;
        value = (value << 1) | bit as u64;
    }
    Ok(value)
}

/// Single bit at `pos` (0-based, MSB first).
pub fn flag(data: &[u8], pos: usize) -> Result<bool> {
    Ok(extract(data, pos, 1)? == 1)
}

/// Pack a 7-byte ME/MB field into the low 56 bits of a `u64`.
pub fn me_word(me: &[u8]) -> Result<u64> {
    if me.len() != 7 {
        return Err(ModesError::BadFormat(format!(
            "application field must be 7 bytes, got {}",
            me.len()
        )));
    }
    let mut buf = [0u8; 8];
    buf[1..8].copy_from_slice(me);
    Ok(u64::from_be_bytes(buf))
}

/// Field of `len` bits starting at DO-260B bit number `first` (1..=56) of an
/// ME word built by [`me_word`].
pub fn me_field(me: u64, first: u32, len: u32) -> u32 {
    debug_assert!(first >= 1 && len >= 1 && len <= 32 && first + len - 1 <= ME_BITS);
    let shift = ME_BITS - (first - 1) - len;
    ((me >> shift) & ((1u64 << len) - 1)) as u32
}

/// Single DO-260B numbered bit of an ME word.
pub fn me_flag(me: u64, bit: u32) -> bool {
    me_field(me, bit, 1) == 1
}

/// Convert a reflected binary (gray) code of `width` bits to binary.
pub fn gray_to_binary(gray: u32, width: u32) -> u32 {
    let mut bin = 0u32;
    let mut prev = 0u32;
    for i in (0..width).rev() {
        let bit = ((gray >> i) & 1) ^ prev;
        bin |= bit << i;
        prev = bit;
    }
    bin
}

/// Convert binary to reflected binary (gray) code.
pub fn binary_to_gray(bin: u32) -> u32 {
    bin ^ (bin >> 1)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
