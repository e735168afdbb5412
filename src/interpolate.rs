//! Fills in gray levels between calibrated anchors.

use rgb::RGB;

use crate::channel::{AdPoint, Channel, Voltage};
use crate::error::Error;
use crate::tables::TableInfo;
use crate::voltage::VoltageTable;

pub const GRAY_LEVELS: usize = 256;

/// A gray level known to be in `0..=255`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Gray(pub u8);

impl Gray {
    /// For callers that computed a gray level themselves. Out-of-range values
    /// are a bug upstream: debug builds stop, release builds clamp so the
    /// panel keeps showing something.
    pub fn clamped(gray: i32) -> Gray {
        debug_assert!((0..=255).contains(&gray), "gray level {gray} out of range");
        Gray(gray.clamp(0, 255) as u8)
    }
}

impl TryFrom<i32> for Gray {
    type Error = Error;

    fn try_from(gray: i32) -> Result<Self, Self::Error> {
        u8::try_from(gray)
            .map(Gray)
            .map_err(|_| Error::GrayOutOfRange(gray))
    }
}

impl From<u8> for Gray {
    fn from(gray: u8) -> Self {
        Gray(gray)
    }
}

fn segment_for<'s, 'a>(segments: &'s [TableInfo<'a>], gray: u8) -> Option<&'s TableInfo<'a>> {
    // At most MAX_SEGMENTS entries.
    segments.iter().find(|seg| seg.contains(gray))
}

#[inline(always)]
fn weighted(low: Voltage, high: Voltage, weight: u16, rv: u32) -> Voltage {
    // i64 keeps the product exact; `/` truncates toward zero like the
    // calibration tooling does.
    let delta = (high as i64 - low as i64) * weight as i64 / rv as i64;
    (low as i64 + delta) as Voltage
}

/// Voltage of every channel at `gray`.
pub fn interpolate(table: &VoltageTable<'_>, gray: u8) -> RGB<Voltage> {
    if let Some(point) = AdPoint::at_gray(gray) {
        return table.anchor(point);
    }
    let Some(seg) = segment_for(table.segments(), gray) else {
        unreachable!("segments are validated to cover every gray level");
    };
    let low = table.anchor(seg.low);
    let high = table.anchor(seg.high);
    let weight = seg.weight(gray);
    let mut out = low;
    for channel in Channel::ALL {
        *channel.of_mut(&mut out) = weighted(channel.of(&low), channel.of(&high), weight, seg.rv);
    }
    out
}

/// The full per-gray voltage table of a panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoltageCurve([RGB<Voltage>; GRAY_LEVELS]);

impl VoltageCurve {
    #[inline(always)]
    pub fn get(&self, gray: u8) -> RGB<Voltage> {
        self.0[gray as usize]
    }

    pub fn levels(&self) -> &[RGB<Voltage>; GRAY_LEVELS] {
        &self.0
    }

    pub fn channel(&self, channel: Channel) -> impl Iterator<Item = Voltage> + '_ {
        self.0.iter().map(move |v| channel.of(v))
    }
}

impl VoltageTable<'_> {
    pub fn interpolate(&self, gray: u8) -> RGB<Voltage> {
        interpolate(self, gray)
    }

    pub fn curve(&self) -> VoltageCurve {
        let mut levels = [RGB::default(); GRAY_LEVELS];
        for (gray, level) in levels.iter_mut().enumerate() {
            *level = interpolate(self, gray as u8);
        }
        VoltageCurve(levels)
    }
}
