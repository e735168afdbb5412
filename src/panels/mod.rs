//! Compiled-in panel families.

pub mod s6e8aa0;

use crate::calibration::PanelId;
use crate::tables::CalibrationTables;

/// Known panel ids, sorted for binary search.
pub static PANELS: &[(PanelId, &CalibrationTables<'static>)] = &[
    (PanelId::UNPROGRAMMED, &s6e8aa0::REV_A),
    (PanelId([0xa2, 0x14, 0x44]), &s6e8aa0::REV_A),
    (PanelId([0xa2, 0x14, 0x45]), &s6e8aa0::REV_A),
    (PanelId([0xa2, 0x24, 0x46]), &s6e8aa0::REV_C),
];

pub static DEFAULT: &CalibrationTables<'static> = &s6e8aa0::REV_A;
