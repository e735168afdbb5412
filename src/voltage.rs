//! Calibrated anchor voltages for one panel.

use log::{debug, warn};
use rgb::RGB;

use crate::calibration::{MtpOffsets, PanelCalibration, PanelId};
use crate::channel::{AD_IV_MAX, AdPoint, Channel, Voltage};
use crate::error::{Error, Result};
use crate::tables::{CalibrationStore, CalibrationTables, TableInfo};

/// Anchor voltages of one panel after MTP correction, plus the segment layout
/// used to fill in the gray levels between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoltageTable<'a> {
    panel_id: PanelId,
    anchors: [RGB<Voltage>; AD_IV_MAX],
    segments: &'a [TableInfo<'a>],
}

/// Looks up the panel's family in `store` and builds its table.
pub fn build_voltage_table<'s, S: CalibrationStore + ?Sized>(
    calibration: &PanelCalibration,
    store: &'s S,
) -> Result<VoltageTable<'s>> {
    let tables = store
        .tables_for(calibration.panel_id)
        .ok_or(Error::UnknownPanelType(calibration.panel_id))?;
    VoltageTable::build(calibration, &tables)
}

impl<'a> VoltageTable<'a> {
    pub fn build(calibration: &PanelCalibration, tables: &CalibrationTables<'a>) -> Result<Self> {
        tables.validate()?;
        calibration.mtp.validate()?;

        // An unprogrammed panel carries whatever the MTP happens to hold.
        let mtp = if calibration.panel_id.is_unprogrammed() {
            debug!("{}: unprogrammed panel id, ignoring MTP", tables.name);
            MtpOffsets::ZERO
        } else {
            calibration.mtp
        };

        let mut anchors = tables.default_gamma.0;
        for point in AdPoint::ALL {
            let Some(iv) = point.iv() else {
                continue;
            };
            for channel in Channel::ALL {
                let base = tables.default_gamma.base_voltage(point, channel) as i64;
                let correction = mtp.get(channel, iv) as i64 * tables.mtp_lsb_uv as i64;
                *channel.of_mut(&mut anchors[point as usize]) = Voltage::try_from(base + correction)
                    .map_err(|_| Error::InvalidTables("calibrated voltage out of range"))?;
            }
        }

        // Voltage must not rise with gray level. A correction that would make
        // it do so is pinned to the anchor below.
        for idx in 1..AD_IV_MAX {
            let below = anchors[idx - 1];
            for channel in Channel::ALL {
                let v = channel.of_mut(&mut anchors[idx]);
                let limit = channel.of(&below);
                if *v > limit {
                    warn!(
                        "{}: {} {} calibrated to {}uV above {} ({}uV), clamping",
                        calibration.panel_id,
                        AdPoint::ALL[idx].name(),
                        channel.name(),
                        *v,
                        AdPoint::ALL[idx - 1].name(),
                        limit
                    );
                    *v = limit;
                }
            }
        }

        Ok(Self {
            panel_id: calibration.panel_id,
            anchors,
            segments: tables.segments,
        })
    }

    /// Table of the family's default curve, without any correction.
    pub(crate) fn uncalibrated(panel_id: PanelId, tables: &CalibrationTables<'a>) -> Self {
        Self {
            panel_id,
            anchors: tables.default_gamma.0,
            segments: tables.segments,
        }
    }

    pub fn panel_id(&self) -> PanelId {
        self.panel_id
    }

    #[inline(always)]
    pub fn anchor(&self, point: AdPoint) -> RGB<Voltage> {
        self.anchors[point as usize]
    }

    pub fn anchors(&self) -> &[RGB<Voltage>; AD_IV_MAX] {
        &self.anchors
    }

    pub fn segments(&self) -> &'a [TableInfo<'a>] {
        self.segments
    }
}
