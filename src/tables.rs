//! Per-panel-family constant tables and the store that selects them by
//! panel id.

use log::warn;
use rgb::RGB;

use crate::calibration::PanelId;
use crate::channel::{AD_IV_MAX, AdPoint, CI_MAX, Channel, Voltage};
use crate::error::{Error, Result};
use crate::panels;

pub const MAX_SEGMENTS: usize = 20;
pub const DAC_CODES: usize = 256;

/// One interpolation segment covering grays `start..=end`.
///
/// `high` is the anchor at `end` and `low` the anchor right before it, so a
/// gray inside the segment is placed between the two by
/// `offset_table[gray - start] / rv`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableInfo<'a> {
    pub start: u8,
    pub end: u8,
    pub low: AdPoint,
    pub high: AdPoint,
    pub offset_table: &'a [u16],
    pub rv: u32,
}

impl TableInfo<'_> {
    #[inline(always)]
    pub fn contains(&self, gray: u8) -> bool {
        (self.start..=self.end).contains(&gray)
    }

    #[inline(always)]
    pub fn weight(&self, gray: u8) -> u16 {
        self.offset_table[(gray - self.start) as usize]
    }
}

/// Checks that `segments` tile `0..=255` in order and that every segment is
/// internally consistent.
pub fn validate_segments(segments: &[TableInfo<'_>]) -> Result<()> {
    if segments.is_empty() {
        return Err(Error::InvalidSegments("no segments"));
    }
    if segments.len() > MAX_SEGMENTS {
        return Err(Error::InvalidSegments("too many segments"));
    }
    let mut next_start = 0u16;
    for seg in segments {
        if seg.start as u16 != next_start || seg.end < seg.start {
            return Err(Error::InvalidSegments("segments not contiguous"));
        }
        if AdPoint::at_gray(seg.end) != Some(seg.high) {
            return Err(Error::InvalidSegments("segment does not end on its anchor"));
        }
        let expected_low = seg.high.prev().unwrap_or(AdPoint::Iv0);
        let low_ok = if seg.start == 0 {
            seg.low == AdPoint::Iv0 && seg.high == AdPoint::Iv0
        } else {
            seg.low == expected_low && seg.low.gray() as u16 + 1 == seg.start as u16
        };
        if !low_ok {
            return Err(Error::InvalidSegments("segment does not start after its low anchor"));
        }
        if seg.offset_table.len() != (seg.end - seg.start) as usize + 1 {
            return Err(Error::InvalidSegments("offset table length mismatch"));
        }
        if seg.rv == 0 {
            return Err(Error::InvalidSegments("zero ratio denominator"));
        }
        if seg.offset_table.windows(2).any(|w| w[0] > w[1]) {
            return Err(Error::InvalidSegments("offset table not monotonic"));
        }
        if seg.offset_table.last().map(|&w| w as u32) != Some(seg.rv) {
            return Err(Error::InvalidSegments("offset table does not end at rv"));
        }
        next_start = seg.end as u16 + 1;
    }
    if next_start != 256 {
        return Err(Error::InvalidSegments("segments do not reach gray 255"));
    }
    Ok(())
}

/// DAC transfer of one anchor point: output voltage for every register code,
/// ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DacTable([Voltage; DAC_CODES]);

impl DacTable {
    pub const fn linear(base: Voltage, step: Voltage) -> Self {
        let mut codes = [0; DAC_CODES];
        let mut i = 0;
        while i < DAC_CODES {
            codes[i] = base + step * i as Voltage;
            i += 1;
        }
        Self(codes)
    }

    pub fn from_codes(codes: [Voltage; DAC_CODES]) -> Result<Self> {
        if codes.windows(2).any(|w| w[0] >= w[1]) {
            return Err(Error::InvalidTables("DAC table not strictly ascending"));
        }
        Ok(Self(codes))
    }

    #[inline(always)]
    pub fn voltage(&self, code: u8) -> Voltage {
        self.0[code as usize]
    }

    pub fn codes(&self) -> &[Voltage; DAC_CODES] {
        &self.0
    }

    /// Step size if the table is an evenly spaced ramp.
    pub fn linear_step(&self) -> Option<Voltage> {
        let step = self.0[1].checked_sub(self.0[0])?;
        self.0
            .windows(2)
            .all(|w| w[1].checked_sub(w[0]) == Some(step))
            .then_some(step)
    }

    /// Largest code whose output does not exceed `voltage`, `None` when even
    /// code 0 is above it.
    pub fn floor_code(&self, voltage: Voltage) -> Option<u8> {
        match self.0.partition_point(|&v| v <= voltage) {
            0 => None,
            n => Some((n - 1) as u8),
        }
    }

    fn is_ascending(&self) -> bool {
        self.0.windows(2).all(|w| w[0] < w[1])
    }
}

/// Uncalibrated anchor voltages of a panel family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GammaCurve(pub [RGB<Voltage>; AD_IV_MAX]);

impl GammaCurve {
    #[inline(always)]
    pub fn at(&self, point: AdPoint) -> RGB<Voltage> {
        self.0[point as usize]
    }

    pub fn base_voltage(&self, point: AdPoint, channel: Channel) -> Voltage {
        channel.of(&self.at(point))
    }

    /// True when every correctable anchor stays representable across the
    /// full MTP range at `lsb` microvolts per step.
    fn corrections_fit(&self, lsb: Voltage) -> bool {
        AdPoint::ALL.into_iter().all(|point| {
            let Some(iv) = point.iv() else {
                return true;
            };
            let (min, max) = iv.mtp_range();
            Channel::ALL.into_iter().all(|c| {
                let base = self.base_voltage(point, c) as i64;
                [min, max]
                    .into_iter()
                    .all(|m| Voltage::try_from(base + m as i64 * lsb as i64).is_ok())
            })
        })
    }

    fn is_non_increasing(&self) -> bool {
        self.0.windows(2).all(|w| {
            Channel::ALL
                .into_iter()
                .all(|c| c.of(&w[1]) <= c.of(&w[0]))
        })
    }
}

/// Additive register correction per channel per anchor, in register codes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdjustTable(pub [[i16; AD_IV_MAX]; CI_MAX]);

impl AdjustTable {
    pub const ZERO: AdjustTable = AdjustTable([[0; AD_IV_MAX]; CI_MAX]);

    #[inline(always)]
    pub fn get(&self, channel: Channel, point: AdPoint) -> i16 {
        self.0[channel as usize][point as usize]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandelaProfile {
    pub candela: u16,
    pub adjust: AdjustTable,
}

impl CandelaProfile {
    pub const fn new(candela: u16, adjust: AdjustTable) -> Self {
        Self { candela, adjust }
    }
}

/// Everything that parameterizes the engine for one panel family.
#[derive(Debug, Clone, Copy)]
pub struct CalibrationTables<'a> {
    pub name: &'a str,
    pub default_gamma: &'a GammaCurve,
    /// Voltage of one MTP LSB.
    pub mtp_lsb_uv: Voltage,
    pub segments: &'a [TableInfo<'a>],
    pub dac: &'a [DacTable; AD_IV_MAX],
    /// Supported brightness levels, ascending.
    pub candelas: &'a [CandelaProfile],
    /// Anchors in the order their bytes are sent to the panel.
    pub register_order: &'a [AdPoint],
}

impl<'a> CalibrationTables<'a> {
    pub fn validate(&self) -> Result<()> {
        validate_segments(self.segments)?;
        if self.candelas.is_empty() {
            return Err(Error::NoCandelaProfiles);
        }
        if self.candelas.windows(2).any(|w| w[0].candela >= w[1].candela) {
            return Err(Error::InvalidTables("candela profiles not ascending"));
        }
        if self.mtp_lsb_uv <= 0 {
            return Err(Error::InvalidTables("MTP LSB must be positive"));
        }
        if !self.default_gamma.corrections_fit(self.mtp_lsb_uv) {
            return Err(Error::InvalidTables("MTP LSB too large for the default gamma"));
        }
        if !self.dac.iter().all(DacTable::is_ascending) {
            return Err(Error::InvalidTables("DAC table not strictly ascending"));
        }
        if !self.default_gamma.is_non_increasing() {
            return Err(Error::InvalidTables("default gamma rises with gray level"));
        }
        if self.register_order.is_empty() || self.register_order.len() > AD_IV_MAX {
            return Err(Error::InvalidTables("register order length"));
        }
        for (i, point) in self.register_order.iter().enumerate() {
            if self.register_order[..i].contains(point) {
                return Err(Error::InvalidTables("duplicate anchor in register order"));
            }
        }
        Ok(())
    }

    pub fn max_candela(&self) -> u16 {
        self.candelas.last().map(|p| p.candela).unwrap_or(0)
    }

    /// Profile for `candela`, or the closest supported level below it. Levels
    /// under the lowest profile get the lowest one.
    pub fn resolve_candela(&self, candela: u16) -> Option<&'a CandelaProfile> {
        let idx = self.candelas.partition_point(|p| p.candela <= candela);
        let profile = match idx {
            0 => self.candelas.first()?,
            n => &self.candelas[n - 1],
        };
        if profile.candela != candela {
            warn!(
                "{}: {candela}cd not supported, using {}cd",
                self.name, profile.candela
            );
        }
        Some(profile)
    }
}

pub trait CalibrationStore {
    fn tables_for(&self, panel_id: PanelId) -> Option<CalibrationTables<'_>>;
}

impl<S: CalibrationStore + ?Sized> CalibrationStore for &S {
    fn tables_for(&self, panel_id: PanelId) -> Option<CalibrationTables<'_>> {
        (**self).tables_for(panel_id)
    }
}

/// Tries the first store, then the second. Lets a calibration file extend
/// or override the compiled-in panels.
impl<A: CalibrationStore, B: CalibrationStore> CalibrationStore for (A, B) {
    fn tables_for(&self, panel_id: PanelId) -> Option<CalibrationTables<'_>> {
        self.0
            .tables_for(panel_id)
            .or_else(|| self.1.tables_for(panel_id))
    }
}

/// Tables compiled into the crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinStore;

impl BuiltinStore {
    /// Family used when a panel can't be identified.
    pub fn uncalibrated() -> CalibrationTables<'static> {
        *panels::DEFAULT
    }

    pub fn panel_ids() -> impl Iterator<Item = PanelId> {
        panels::PANELS.iter().map(|(id, _)| *id)
    }
}

impl CalibrationStore for BuiltinStore {
    fn tables_for(&self, panel_id: PanelId) -> Option<CalibrationTables<'_>> {
        panels::PANELS
            .binary_search_by_key(&panel_id, |(id, _)| *id)
            .ok()
            .map(|idx| *panels::PANELS[idx].1)
    }
}
