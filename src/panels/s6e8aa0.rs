//! S6E8AA0 AMOLED driver IC tables.
//!
//! Revision A panels program all eight anchors; revision C leaves IV0 at the
//! IC's reset value and only takes the remaining 21 bytes.
//!
//! NOTE: these tables are a self-consistent model of the IC (every default
//! anchor voltage is exactly one DAC code), not values lifted from a
//! datasheet. Check them against the panel vendor's tuning data before
//! shipping.

use rgb::RGB;

use crate::channel::{AD_IV_MAX, AdPoint, Voltage};
use crate::tables::{AdjustTable, CalibrationTables, CandelaProfile, DacTable, GammaCurve, TableInfo};

const fn rgb(r: Voltage, g: Voltage, b: Voltage) -> RGB<Voltage> {
    RGB { r, g, b }
}

pub static DAC: [DacTable; AD_IV_MAX] = [
    DacTable::linear(4_000_000, 3_000),  // IV0
    DacTable::linear(3_900_000, 3_200),  // IV1
    DacTable::linear(3_000_000, 6_800),  // IV15
    DacTable::linear(2_600_000, 8_400),  // IV35
    DacTable::linear(2_200_000, 10_000), // IV59
    DacTable::linear(1_800_000, 11_600), // IV87
    DacTable::linear(1_200_000, 13_900), // IV171
    DacTable::linear(800_000, 15_600),   // IV255
];

#[rustfmt::skip]
const OFFSET_2_15: [u16; 14] = [
    23, 44, 64, 83, 102, 120, 138, 156, 173, 190, 207, 223,
    240, 256,
];

#[rustfmt::skip]
const OFFSET_16_35: [u16; 20] = [
    14, 27, 41, 54, 67, 80, 93, 106, 119, 132, 145, 157,
    170, 182, 195, 207, 219, 232, 244, 256,
];

#[rustfmt::skip]
const OFFSET_36_59: [u16; 24] = [
    11, 22, 33, 44, 55, 66, 77, 88, 98, 109, 120, 130,
    141, 152, 162, 173, 183, 194, 204, 215, 225, 235, 246, 256,
];

#[rustfmt::skip]
const OFFSET_60_87: [u16; 28] = [
    9, 19, 28, 38, 47, 56, 65, 75, 84, 93, 102, 112,
    121, 130, 139, 148, 157, 166, 175, 184, 193, 202, 211, 220,
    229, 238, 247, 256,
];

#[rustfmt::skip]
const OFFSET_88_171: [u16; 84] = [
    13, 26, 39, 51, 64, 77, 90, 102, 115, 128, 141, 153,
    166, 178, 191, 204, 216, 229, 241, 254, 266, 279, 291, 304,
    316, 328, 341, 353, 366, 378, 390, 402, 415, 427, 439, 452,
    464, 476, 488, 500, 513, 525, 537, 549, 561, 573, 585, 597,
    609, 622, 634, 646, 658, 670, 682, 694, 706, 717, 729, 741,
    753, 765, 777, 789, 801, 813, 824, 836, 848, 860, 872, 883,
    895, 907, 919, 930, 942, 954, 966, 977, 989, 1001, 1012, 1024,
];

#[rustfmt::skip]
const OFFSET_172_255: [u16; 84] = [
    13, 25, 38, 50, 63, 75, 88, 100, 113, 125, 138, 150,
    163, 175, 188, 200, 212, 225, 237, 250, 262, 274, 287, 299,
    311, 324, 336, 348, 361, 373, 385, 397, 410, 422, 434, 446,
    459, 471, 483, 495, 507, 520, 532, 544, 556, 568, 580, 593,
    605, 617, 629, 641, 653, 665, 677, 689, 701, 713, 725, 737,
    749, 762, 774, 786, 798, 809, 821, 833, 845, 857, 869, 881,
    893, 905, 917, 929, 941, 953, 965, 977, 988, 1000, 1012, 1024,
];

const fn seg(
    start: u8,
    end: u8,
    low: AdPoint,
    high: AdPoint,
    offset_table: &'static [u16],
    rv: u32,
) -> TableInfo<'static> {
    TableInfo {
        start,
        end,
        low,
        high,
        offset_table,
        rv,
    }
}

pub const SEGMENTS: [TableInfo<'static>; 8] = [
    seg(0, 0, AdPoint::Iv0, AdPoint::Iv0, &[1], 1),
    seg(1, 1, AdPoint::Iv0, AdPoint::Iv1, &[1], 1),
    seg(2, 15, AdPoint::Iv1, AdPoint::Iv15, &OFFSET_2_15, 256),
    seg(16, 35, AdPoint::Iv15, AdPoint::Iv35, &OFFSET_16_35, 256),
    seg(36, 59, AdPoint::Iv35, AdPoint::Iv59, &OFFSET_36_59, 256),
    seg(60, 87, AdPoint::Iv59, AdPoint::Iv87, &OFFSET_60_87, 256),
    seg(88, 171, AdPoint::Iv87, AdPoint::Iv171, &OFFSET_88_171, 1024),
    seg(172, 255, AdPoint::Iv171, AdPoint::Iv255, &OFFSET_172_255, 1024),
];

pub static DEFAULT_GAMMA_A: GammaCurve = GammaCurve([
    rgb(4_600_000, 4_600_000, 4_600_000), // IV0
    rgb(4_498_400, 4_492_000, 4_508_000), // IV1
    rgb(4_088_000, 4_074_400, 4_122_000), // IV15
    rgb(3_692_000, 3_675_200, 3_725_600), // IV35
    rgb(3_300_000, 3_280_000, 3_340_000), // IV59
    rgb(2_960_000, 2_936_800, 3_006_400), // IV87
    rgb(2_200_800, 2_173_000, 2_256_400), // IV171
    rgb(1_299_200, 1_268_000, 1_361_600), // IV255
]);

pub static DEFAULT_GAMMA_C: GammaCurve = GammaCurve([
    rgb(4_600_000, 4_600_000, 4_600_000), // IV0
    rgb(4_492_000, 4_488_800, 4_501_600), // IV1
    rgb(4_074_400, 4_067_600, 4_101_600), // IV15
    rgb(3_675_200, 3_666_800, 3_700_400), // IV35
    rgb(3_290_000, 3_270_000, 3_320_000), // IV59
    rgb(2_948_400, 2_925_200, 2_983_200), // IV87
    rgb(2_186_900, 2_159_100, 2_228_600), // IV171
    rgb(1_283_600, 1_252_400, 1_330_400), // IV255
]);

// Low-brightness compensation, rows R, G, B, columns IV0..IV255.
#[rustfmt::skip]
const ADJUST_A_20: AdjustTable = AdjustTable([
    [0, 3, 4, 3, 2, 1, 0, 0],
    [0, 2, 3, 2, 1, 0, 0, 0],
    [0, 5, 6, 4, 3, 2, 1, 0],
]);
#[rustfmt::skip]
const ADJUST_A_30: AdjustTable = AdjustTable([
    [0, 2, 3, 2, 1, 1, 0, 0],
    [0, 1, 2, 1, 1, 0, 0, 0],
    [0, 4, 4, 3, 2, 1, 1, 0],
]);
#[rustfmt::skip]
const ADJUST_A_40: AdjustTable = AdjustTable([
    [0, 1, 2, 1, 1, 0, 0, 0],
    [0, 1, 1, 1, 0, 0, 0, 0],
    [0, 3, 3, 2, 1, 1, 0, 0],
]);
#[rustfmt::skip]
const ADJUST_A_50: AdjustTable = AdjustTable([
    [0, 0, 1, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0],
    [0, 2, 2, 1, 1, 0, 0, 0],
]);

#[rustfmt::skip]
const ADJUST_C_20: AdjustTable = AdjustTable([
    [0, -2, 1, 2, 2, 1, 0, 0],
    [0, -3, 0, 1, 1, 0, 0, 0],
    [0,  1, 4, 3, 2, 1, 0, 0],
]);
#[rustfmt::skip]
const ADJUST_C_30: AdjustTable = AdjustTable([
    [0, -1, 1, 1, 1, 0, 0, 0],
    [0, -2, 0, 1, 0, 0, 0, 0],
    [0,  1, 3, 2, 1, 1, 0, 0],
]);

const fn flat(candela: u16) -> CandelaProfile {
    CandelaProfile::new(candela, AdjustTable::ZERO)
}

pub static CANDELAS_A: [CandelaProfile; 25] = [
    CandelaProfile::new(20, ADJUST_A_20),
    CandelaProfile::new(30, ADJUST_A_30),
    CandelaProfile::new(40, ADJUST_A_40),
    CandelaProfile::new(50, ADJUST_A_50),
    flat(60),
    flat(70),
    flat(80),
    flat(90),
    flat(100),
    flat(110),
    flat(120),
    flat(130),
    flat(140),
    flat(150),
    flat(160),
    flat(170),
    flat(180),
    flat(190),
    flat(200),
    flat(210),
    flat(220),
    flat(230),
    flat(240),
    flat(250),
    flat(300),
];

pub static CANDELAS_C: [CandelaProfile; 14] = [
    CandelaProfile::new(20, ADJUST_C_20),
    CandelaProfile::new(30, ADJUST_C_30),
    flat(40),
    flat(50),
    flat(60),
    flat(80),
    flat(100),
    flat(120),
    flat(150),
    flat(180),
    flat(200),
    flat(230),
    flat(260),
    flat(300),
];

pub static ORDER_A: [AdPoint; 8] = AdPoint::ALL;

pub static ORDER_C: [AdPoint; 7] = [
    AdPoint::Iv1,
    AdPoint::Iv15,
    AdPoint::Iv35,
    AdPoint::Iv59,
    AdPoint::Iv87,
    AdPoint::Iv171,
    AdPoint::Iv255,
];

pub static REV_A: CalibrationTables<'static> = CalibrationTables {
    name: "s6e8aa0-a",
    default_gamma: &DEFAULT_GAMMA_A,
    mtp_lsb_uv: 3_000,
    segments: &SEGMENTS,
    dac: &DAC,
    candelas: &CANDELAS_A,
    register_order: &ORDER_A,
};

pub static REV_C: CalibrationTables<'static> = CalibrationTables {
    name: "s6e8aa0-c",
    default_gamma: &DEFAULT_GAMMA_C,
    mtp_lsb_uv: 2_500,
    segments: &SEGMENTS,
    dac: &DAC,
    candelas: &CANDELAS_C,
    register_order: &ORDER_C,
};
