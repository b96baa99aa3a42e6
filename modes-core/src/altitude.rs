//! Altitude and identity (Mode A) code decoding.
//!
//! Two altitude field widths exist on the wire:
//! - 13 bits (AC) in DF0/4/16/20 replies: C1 A1 C2 A2 C4 A4 M B1 Q B2 D2 B4 D4
//! - 12 bits in extended squitter airborne position: same, with M removed
//!
//! The Q-bit selects 25-ft binary encoding; otherwise the field carries a
//! 100-ft Gillham (reflected gray) code.

use crate::bits::gray_to_binary;

const Q_BIT_12: u16 = 0x010;
const M_BIT_13: u16 = 0x040;

/// Bit masks of the 12-bit altitude field, named after the Mode C pulses.
mod ac12 {
    pub const C1: u16 = 0x800;
    pub const A1: u16 = 0x400;
    pub const C2: u16 = 0x200;
    pub const A2: u16 = 0x100;
    pub const C4: u16 = 0x080;
    pub const A4: u16 = 0x040;
    pub const B1: u16 = 0x020;
    pub const B2: u16 = 0x008;
    pub const D2: u16 = 0x004;
    pub const B4: u16 = 0x002;
    pub const D4: u16 = 0x001;
}

/// Gillham pulses regrouped into the two gray-coded counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct GillhamGroups {
    /// D2 D4 A1 A2 A4 B1 B2 B4, counting 500-ft steps.
    five_hundreds: u32,
    /// C1 C2 C4, counting 100-ft steps within a 500-ft band.
    hundreds: u32,
}

impl GillhamGroups {
    fn from_ac12(code: u16) -> Self {
        let bit = |mask: u16| u32::from(code & mask != 0);
        let five_hundreds = bit(ac12::D2) << 7
            | bit(ac12::D4) << 6
            | bit(ac12::A1) << 5
            | bit(ac12::A2) << 4
            | bit(ac12::A4) << 3
            | bit(ac12::B1) << 2
            | bit(ac12::B2) << 1
            | bit(ac12::B4);
        let hundreds = bit(ac12::C1) << 2 | bit(ac12::C2) << 1 | bit(ac12::C4);
        GillhamGroups {
            five_hundreds,
            hundreds,
        }
    }
}

/// Decode the 12-bit altitude field of an airborne position message, in feet.
///
/// Returns `None` when the field is all zeros (altitude unavailable) or when
/// it holds an illegal Gillham code.
pub fn decode_ac12(code: u16) -> Option<i32> {
    let code = code & 0x0FFF;
    if code == 0 {
        return None;
    }

    if code & Q_BIT_12 != 0 {
        // 25-ft resolution: drop the Q-bit, join both halves
        let n = (code & 0x000F) | ((code & 0x0FE0) >> 1);
        Some(i32::from(n) * 25 - 1000)
    } else {
        decode_gillham(code)
    }
}

/// Decode the 13-bit AC field of a surveillance or ACAS reply, in feet.
///
/// Metric altitudes (M-bit set) are not decoded and return `None`; callers
/// can tell them apart with [`is_metric_ac13`].
pub fn decode_ac13(code: u16) -> Option<i32> {
    let code = code & 0x1FFF;
    if code == 0 || is_metric_ac13(code) {
        return None;
    }
    decode_ac12(((code & 0x1F80) >> 1) | (code & 0x003F))
}

/// True if the M-bit of a 13-bit altitude code is set.
pub fn is_metric_ac13(code: u16) -> bool {
    code & M_BIT_13 != 0
}

/// 100-ft Gillham decoding.
///
/// Valid hundreds groups are 001, 011, 010, 110, 100 (binary 1, 2, 3, 4, 7).
/// 000, 111 and 101 never occur in a real encoder and are rejected before the
/// 7 -> 5 fold and the odd-band reflection are applied.
fn decode_gillham(code: u16) -> Option<i32> {
    let groups = GillhamGroups::from_ac12(code);

    let n500 = gray_to_binary(groups.five_hundreds, 8) as i32;
    let c_bin = gray_to_binary(groups.hundreds, 3) as i32;
    if matches!(c_bin, 0 | 5 | 6) {
        return None;
    }

    let mut n100 = c_bin - 1;
    if n100 == 6 {
        n100 = 4;
    }
    // hundreds count runs backwards in odd 500-ft bands
    if n500 % 2 != 0 {
        n100 = 4 - n100;
    }

    Some(-1200 + n500 * 500 + n100 * 100)
}

// ---------------------------------------------------------------------------
// Identity (Mode A) code
// ---------------------------------------------------------------------------

/// Decode 13-bit identity code into 4-digit octal squawk.
///
/// Bits are labeled C1 A1 C2 A2 C4 A4 X B1 D1 B2 D2 B4 D4
pub fn decode_identity(id_code: u16) -> String {
    let id_code = u32::from(id_code);
    let c1 = (id_code >> 12) & 1;
    let a1 = (id_code >> 11) & 1;
    let c2 = (id_code >> 10) & 1;
    let a2 = (id_code >> 9) & 1;
    let c4 = (id_code >> 8) & 1;
    let a4 = (id_code >> 7) & 1;
    // bit 6 is X (SPI in some contexts)
    let b1 = (id_code >> 5) & 1;
    let d1 = (id_code >> 4) & 1;
    let b2 = (id_code >> 3) & 1;
    let d2 = (id_code >> 2) & 1;
    let b4 = (id_code >> 1) & 1;
    let d4 = id_code & 1;

    let a = a4 * 4 + a2 * 2 + a1;
    let b = b4 * 4 + b2 * 2 + b1;
    let c = c4 * 4 + c2 * 2 + c1;
    let d = d4 * 4 + d2 * 2 + d1;

    format!("{a}{b}{c}{d}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::binary_to_gray;

    /// Independent Gillham encoder, built from the altitude formula rather
    /// than from the decoder's group layout.
    fn encode_gillham(alt: i32) -> u16 {
        let x = alt + 1300;
        let n500 = (x - 100) / 500;
        let n100 = (x - 500 * n500) / 100;
        let raw = if n500 % 2 != 0 { 6 - n100 } else { n100 };
        let c_bin = if raw == 5 { 7 } else { raw };

        let g500 = binary_to_gray(n500 as u32);
        let gc = binary_to_gray(c_bin as u32);
        let b = |v: u32, i: u32| ((v >> i) & 1) as u16;

        b(gc, 2) << 11 // C1
            | b(g500, 5) << 10 // A1
            | b(gc, 1) << 9 // C2
            | b(g500, 4) << 8 // A2
            | b(gc, 0) << 7 // C4
            | b(g500, 3) << 6 // A4
            | b(g500, 2) << 5 // B1
            | b(g500, 1) << 3 // B2
            | b(g500, 7) << 2 // D2
            | b(g500, 0) << 1 // B4
            | b(g500, 6) // D4
    }

    fn encode_q25(alt: i32) -> u16 {
        let n = ((alt + 1000) / 25) as u16;
        ((n & 0x7F0) << 1) | Q_BIT_12 | (n & 0x00F)
    }

    #[test]
    fn test_decode_ac12_zero_is_unavailable() {
        assert_eq!(decode_ac12(0x000), None);
    }

    #[test]
    fn test_decode_ac12_q_bit_n40_is_zero_feet() {
        assert_eq!(decode_ac12(encode_q25(0)), Some(0));
        // n = 40 = 0b000_0010_1000 -> upper 7 bits 0b0000010, lower 4 0b1000
        assert_eq!(decode_ac12(0b0000010_1_1000), Some(0));
    }

    #[test]
    fn test_decode_ac12_25ft_exact_value() {
        // 1560 * 25 - 1000 = 38000 (1090 MHz Riddle example)
        assert_eq!(decode_ac12(0xC38), Some(38000));
    }

    #[test]
    fn test_decode_ac12_q_bit_range() {
        for alt in (-1000..=50175).step_by(25) {
            assert_eq!(decode_ac12(encode_q25(alt)), Some(alt), "alt={alt}");
        }
    }

    #[test]
    fn test_gillham_even_band() {
        // N500 = 38 (even), C group 001 -> N100 = 0
        assert_eq!(decode_ac12(0x5A2), Some(17800));
    }

    #[test]
    fn test_gillham_odd_band_applies_complement() {
        // N500 = 5 (odd), C group 110 -> binary 4 -> N100 = 3 -> 4 - 3 = 1
        assert_eq!(decode_ac12(0xA2A), Some(1400));
        // same band, C group 010 -> binary 3 -> N100 = 2 -> stays 2
        assert_eq!(decode_ac12(0x22A), Some(1500));
    }

    #[test]
    fn test_gillham_matches_independent_encoder() {
        for alt in (-1200..=126700).step_by(100) {
            let code = encode_gillham(alt);
            assert_eq!(code & Q_BIT_12, 0);
            assert_eq!(decode_ac12(code), Some(alt), "alt={alt} code=0x{code:03X}");
        }
    }

    #[test]
    fn test_gillham_exhaustive_codes_stay_on_grid() {
        let mut valid = 0;
        for code in 1..0x1000u16 {
            if code & Q_BIT_12 != 0 {
                continue;
            }
            if let Some(alt) = decode_ac12(code) {
                assert_eq!(alt % 100, 0, "code 0x{code:03X} gave {alt}");
                assert!(
                    (-1200..=126700).contains(&alt),
                    "code 0x{code:03X} gave {alt} out of range"
                );
                valid += 1;
            }
        }
        // 256 five-hundreds values x 5 legal hundreds groups
        assert_eq!(valid, 256 * 5);
    }

    #[test]
    fn test_gillham_illegal_c_groups() {
        // C group 000
        assert_eq!(decode_ac12(ac12::A1), None);
        // C group 111
        assert_eq!(decode_ac12(ac12::C1 | ac12::C2 | ac12::C4), None);
        // C group 101
        assert_eq!(decode_ac12(ac12::C1 | ac12::C4 | ac12::B1), None);
    }

    #[test]
    fn test_decode_ac13() {
        assert_eq!(decode_ac13(0), None);
        // n = 40 with M-bit slot inserted
        let n = 40u16;
        let ac13 = ((n << 2) & 0x1F80) | ((n << 1) & 0x0020) | (n & 0x000F) | 0x0010;
        assert_eq!(decode_ac13(ac13), Some(0));
    }

    #[test]
    fn test_decode_ac13_metric() {
        assert!(is_metric_ac13(0x0040));
        assert_eq!(decode_ac13(0x0040 | 0x0010), None);
    }

    #[test]
    fn test_decode_ac13_gillham_matches_ac12() {
        for alt in (-1200..=126700).step_by(500) {
            let ac12 = encode_gillham(alt);
            let ac13 = ((ac12 & 0x0FC0) << 1) | (ac12 & 0x003F);
            assert_eq!(decode_ac13(ac13), Some(alt));
        }
    }

    #[test]
    fn test_decode_identity_7500() {
        // 7500 = A=7, B=5, C=0, D=0
        let id_code = 0b0_1_0_1_0_1_0_1_0_0_0_1_0;
        assert_eq!(decode_identity(id_code), "7500");
    }

    #[test]
    fn test_decode_identity_7700() {
        // Bit layout: C1 A1 C2 A2 C4 A4 X B1 D1 B2 D2 B4 D4
        let id_code = 0b0_1_0_1_0_1_0_1_0_1_0_1_0;
        assert_eq!(decode_identity(id_code), "7700");
    }

    #[test]
    fn test_decode_identity_1200() {
        // A=1 (A1), B=2 (B2), C=0, D=0
        let id_code = 0b0_1_0_0_0_0_0_0_0_1_0_0_0;
        assert_eq!(decode_identity(id_code), "1200");
    }
}
