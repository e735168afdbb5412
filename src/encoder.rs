//! Voltages back to the driver IC's gamma register bytes.

use core::fmt;

use heapless::Vec;
use log::{error, warn};
use rgb::RGB;

use crate::channel::{AD_IV_MAX, AdPoint, CI_MAX, Channel, Voltage};
use crate::g22;
use crate::tables::{AdjustTable, CalibrationTables, CandelaProfile};

pub const MAX_GAMMA_REGS: usize = AD_IV_MAX * CI_MAX;

/// Target luminance in cd/m².
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CandelaSetting(pub u16);

impl From<u16> for CandelaSetting {
    fn from(candela: u16) -> Self {
        CandelaSetting(candela)
    }
}

impl fmt::Display for CandelaSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}cd", self.0)
    }
}

/// Register bytes for one brightness level, R, G, B per anchor in the
/// family's register order. Written to the panel verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GammaRegisterSet {
    candela: CandelaSetting,
    order: Vec<AdPoint, AD_IV_MAX>,
    bytes: Vec<u8, MAX_GAMMA_REGS>,
}

impl GammaRegisterSet {
    /// Level the bytes were computed for, after resolving to a supported one.
    pub fn candela(&self) -> CandelaSetting {
        self.candela
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn get(&self, point: AdPoint, channel: Channel) -> Option<u8> {
        let idx = self.order.iter().position(|&p| p == point)?;
        self.bytes.get(idx * CI_MAX + channel as usize).copied()
    }

    pub fn anchors(&self) -> impl Iterator<Item = (AdPoint, RGB<u8>)> + '_ {
        self.order
            .iter()
            .zip(self.bytes.chunks_exact(CI_MAX))
            .map(|(&p, c)| (p, RGB::new(c[0], c[1], c[2])))
    }
}

impl AsRef<[u8]> for GammaRegisterSet {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl fmt::Display for GammaRegisterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, b) in self.bytes.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

/// Gray level on the calibrated curve to read each anchor's voltage from for
/// `profile`'s brightness.
pub fn sample_grays(tables: &CalibrationTables<'_>, profile: &CandelaProfile) -> [u8; AD_IV_MAX] {
    let max = tables.max_candela();
    AdPoint::ALL.map(|p| g22::dimmed_gray(p.gray(), profile.candela, max))
}

/// Register code for one channel of one anchor.
pub fn encode_channel(
    tables: &CalibrationTables<'_>,
    point: AdPoint,
    channel: Channel,
    voltage: Voltage,
    adjust: &AdjustTable,
) -> u8 {
    let dac = &tables.dac[point as usize];
    let code = match dac.floor_code(voltage) {
        Some(code) => {
            let top = dac.voltage(255);
            let step = top as i64 - dac.voltage(254) as i64;
            if code == 255 && voltage as i64 - top as i64 > step {
                warn!(
                    "{}: {} {} {voltage}uV above DAC range",
                    tables.name,
                    point.name(),
                    channel.name()
                );
            }
            code as i32
        }
        None => {
            warn!(
                "{}: {} {} {voltage}uV below DAC range",
                tables.name,
                point.name(),
                channel.name()
            );
            0
        }
    };
    let adjusted = code + adjust.get(channel, point) as i32;
    if !(0..=255).contains(&adjusted) {
        warn!(
            "{}: {} {} register {adjusted} out of range, clamping",
            tables.name,
            point.name(),
            channel.name()
        );
    }
    adjusted.clamp(0, 255) as u8
}

/// Encodes anchor voltages (indexed by [`AdPoint`]) with `profile`'s
/// adjustment.
pub fn encode_profile(
    tables: &CalibrationTables<'_>,
    voltages: &[RGB<Voltage>; AD_IV_MAX],
    profile: &CandelaProfile,
) -> GammaRegisterSet {
    let mut order = Vec::new();
    let mut bytes = Vec::new();
    for &point in tables.register_order {
        let v = voltages[point as usize];
        let triple =
            Channel::ALL.map(|c| encode_channel(tables, point, c, c.of(&v), &profile.adjust));
        if order.push(point).is_err() || bytes.extend_from_slice(&triple).is_err() {
            error!(
                "{}: register order longer than {AD_IV_MAX} anchors, truncating",
                tables.name
            );
            break;
        }
    }
    GammaRegisterSet {
        candela: CandelaSetting(profile.candela),
        order,
        bytes,
    }
}

/// Encodes anchor voltages for `candela`. Unsupported levels use the closest
/// supported one below.
pub fn encode(
    tables: &CalibrationTables<'_>,
    voltages: &[RGB<Voltage>; AD_IV_MAX],
    candela: CandelaSetting,
) -> GammaRegisterSet {
    match tables.resolve_candela(candela.0) {
        Some(profile) => encode_profile(tables, voltages, profile),
        None => {
            error!("{}: no candela profiles, encoding unadjusted", tables.name);
            encode_profile(tables, voltages, &CandelaProfile::new(candela.0, AdjustTable::ZERO))
        }
    }
}
