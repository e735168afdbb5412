//! Gamma 2.2 luminance lookup table.
//!
//! `G22[g]` is `(g / 255)^2.2` scaled to `G22_SCALE`. Brightness levels below
//! the panel maximum are reached by finding, for each anchor gray, the gray
//! whose luminance on the full-brightness curve matches the dimmed target.

/// Luminance of gray 255.
pub const G22_SCALE: u32 = 1 << 20;

/// 256-entry table; index with the 8-bit gray level. Strictly increasing.
#[rustfmt::skip]
const G22: [u32; 256] = [
    0, 5, 24, 60, 112, 184, 274, 385,
    516, 669, 844, 1041, 1260, 1503, 1769, 2059,
    2373, 2711, 3075, 3463, 3877, 4316, 4781, 5272,
    5790, 6334, 6905, 7503, 8128, 8780, 9460, 10167,
    10903, 11667, 12458, 13279, 14128, 15006, 15912, 16848,
    17813, 18808, 19832, 20885, 21969, 23082, 24226, 25400,
    26604, 27838, 29104, 30399, 31726, 33084, 34473, 35893,
    37344, 38827, 40342, 41888, 43465, 45075, 46717, 48391,
    50097, 51835, 53605, 55408, 57244, 59113, 61014, 62948,
    64915, 66915, 68948, 71014, 73114, 75247, 77414, 79614,
    81848, 84116, 86418, 88753, 91123, 93526, 95964, 98436,
    100942, 103483, 106058, 108668, 111313, 113992, 116706, 119455,
    122239, 125057, 127911, 130800, 133725, 136684, 139679, 142710,
    145776, 148877, 152014, 155187, 158396, 161640, 164921, 168237,
    171590, 174978, 178403, 181864, 185361, 188895, 192465, 196072,
    199715, 203395, 207111, 210864, 214654, 218481, 222345, 226245,
    230183, 234158, 238170, 242219, 246306, 250429, 254590, 258789,
    263025, 267299, 271610, 275959, 280345, 284770, 289232, 293732,
    298270, 302845, 307459, 312111, 316802, 321530, 326296, 331101,
    335944, 340826, 345746, 350704, 355701, 360737, 365811, 370924,
    376076, 381266, 386496, 391764, 397071, 402417, 407802, 413226,
    418689, 424192, 429733, 435314, 440935, 446594, 452293, 458031,
    463809, 469627, 475484, 481380, 487316, 493292, 499308, 505364,
    511459, 517594, 523769, 529984, 536239, 542535, 548870, 555245,
    561661, 568117, 574613, 581149, 587726, 594343, 601001, 607699,
    614437, 621216, 628036, 634896, 641797, 648739, 655721, 662745,
    669809, 676914, 684060, 691246, 698474, 705743, 713053, 720404,
    727796, 735230, 742704, 750220, 757777, 765375, 773015, 780696,
    788419, 796183, 803989, 811836, 819725, 827655, 835628, 843641,
    851697, 859794, 867933, 876114, 884337, 892602, 900909, 909258,
    917648, 926081, 934556, 943073, 951632, 960234, 968877, 977563,
    986291, 995062, 1003875, 1012730, 1021628, 1030568, 1039551, 1048576,
];

#[inline(always)]
pub fn luminance(gray: u8) -> u32 {
    G22[gray as usize]
}

/// Largest gray whose luminance does not exceed `target`.
pub fn gray_at_or_below(target: u32) -> u8 {
    // G22[0] == 0, so at least one entry always qualifies.
    let count = G22.partition_point(|&l| l <= target);
    (count - 1) as u8
}

/// Gray on the full-brightness curve that reproduces `gray` dimmed to
/// `candela / max_candela` of its luminance.
pub fn dimmed_gray(gray: u8, candela: u16, max_candela: u16) -> u8 {
    if candela >= max_candela || max_candela == 0 {
        return gray;
    }
    let target = luminance(gray) as u64 * candela as u64 / max_candela as u64;
    gray_at_or_below(target as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_strictly_increasing() {
        assert_eq!(luminance(0), 0);
        assert_eq!(luminance(255), G22_SCALE);
        for g in 0..255u8 {
            assert!(luminance(g) < luminance(g + 1), "gray {g}");
        }
    }

    #[test]
    fn floor_search_hits_exact_entries() {
        for g in 0..=255u8 {
            assert_eq!(gray_at_or_below(luminance(g)), g);
        }
        assert_eq!(gray_at_or_below(luminance(100) - 1), 99);
        assert_eq!(gray_at_or_below(u32::MAX), 255);
    }

    #[test]
    fn dimming_scales_luminance() {
        assert_eq!(dimmed_gray(255, 300, 300), 255);
        assert_eq!(dimmed_gray(0, 20, 300), 0);
        // half the luminance sits at (0.5)^(1/2.2) of full scale
        assert_eq!(dimmed_gray(255, 150, 300), 186);
        assert_eq!(dimmed_gray(171, 20, 300), 49);
        for g in 0..=255u8 {
            assert!(dimmed_gray(g, 100, 300) <= g);
        }
    }
}
