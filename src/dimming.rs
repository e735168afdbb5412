//! Per-panel dimming session.
//!
//! A display driver probes the panel once at init, keeps the resulting
//! [`SmartDimming`] for the life of the panel and asks it for register bytes
//! whenever the backlight level changes.

use log::{debug, trace, warn};
use rgb::RGB;

use crate::calibration::{PanelCalibration, PanelCalibrationSource};
use crate::channel::{AD_IV_MAX, AdPoint, Voltage};
use crate::encoder::{self, CandelaSetting, GammaRegisterSet};
use crate::error::{Error, Result};
use crate::interpolate::{Gray, VoltageCurve};
use crate::tables::{AdjustTable, BuiltinStore, CalibrationStore, CalibrationTables, CandelaProfile};
use crate::voltage::VoltageTable;

#[derive(Debug, Clone)]
pub struct SmartDimming<'a> {
    tables: CalibrationTables<'a>,
    table: VoltageTable<'a>,
    curve: VoltageCurve,
    calibrated: bool,
}

impl<'a> SmartDimming<'a> {
    /// Session for a panel whose family tables are already known.
    pub fn new(calibration: &PanelCalibration, tables: CalibrationTables<'a>) -> Result<Self> {
        let table = VoltageTable::build(calibration, &tables)?;
        Ok(Self::with_table(tables, table, true))
    }

    pub fn probe<S: CalibrationStore + ?Sized>(
        store: &'a S,
        calibration: &PanelCalibration,
    ) -> Result<Self> {
        let tables = store
            .tables_for(calibration.panel_id)
            .ok_or(Error::UnknownPanelType(calibration.panel_id))?;
        debug!("{}: using {} tables", calibration.panel_id, tables.name);
        Self::new(calibration, tables)
    }

    /// Like [`SmartDimming::probe`], but a panel that can't be calibrated
    /// still gets the built-in default curve.
    pub fn probe_or_default<S: CalibrationStore + ?Sized>(
        store: &'a S,
        calibration: &PanelCalibration,
    ) -> Self {
        match Self::probe(store, calibration) {
            Ok(dimming) => dimming,
            Err(e) => {
                warn!("{}: {e}, falling back to uncalibrated gamma", calibration.panel_id);
                let tables = BuiltinStore::uncalibrated();
                let table = VoltageTable::uncalibrated(calibration.panel_id, &tables);
                Self::with_table(tables, table, false)
            }
        }
    }

    pub fn from_source<S, P>(store: &'a S, source: &mut P) -> core::result::Result<Self, P::Error>
    where
        S: CalibrationStore + ?Sized,
        P: PanelCalibrationSource,
        P::Error: From<Error>,
    {
        let calibration = source.read_mtp()?;
        Ok(Self::probe(store, &calibration)?)
    }

    fn with_table(tables: CalibrationTables<'a>, table: VoltageTable<'a>, calibrated: bool) -> Self {
        let curve = table.curve();
        Self {
            tables,
            table,
            curve,
            calibrated,
        }
    }

    /// Rebuilds the cached tables from new calibration of the same panel.
    /// A session on the fallback curve stays there:
    /// [`Error::UnknownPanelType`].
    pub fn recalibrate(&mut self, calibration: &PanelCalibration) -> Result<()> {
        if !self.calibrated {
            return Err(Error::UnknownPanelType(calibration.panel_id));
        }
        let expected = self.table.panel_id();
        if calibration.panel_id != expected {
            return Err(Error::PanelMismatch {
                expected,
                found: calibration.panel_id,
            });
        }
        let table = VoltageTable::build(calibration, &self.tables)?;
        if table != self.table {
            *self = Self::with_table(self.tables, table, true);
        }
        Ok(())
    }

    fn profile(&self, candela: CandelaSetting) -> CandelaProfile {
        self.tables
            .resolve_candela(candela.0)
            .copied()
            .unwrap_or(CandelaProfile::new(candela.0, AdjustTable::ZERO))
    }

    /// Voltage the panel should drive at each anchor for `candela`, sampled
    /// from the calibrated curve.
    pub fn anchor_voltages(&self, candela: CandelaSetting) -> [RGB<Voltage>; AD_IV_MAX] {
        self.anchors_for(&self.profile(candela))
    }

    fn anchors_for(&self, profile: &CandelaProfile) -> [RGB<Voltage>; AD_IV_MAX] {
        encoder::sample_grays(&self.tables, profile).map(|g| self.curve.get(g))
    }

    pub fn gamma_for(&self, candela: CandelaSetting) -> GammaRegisterSet {
        let profile = self.profile(candela);
        let voltages = self.anchors_for(&profile);
        let regs = encoder::encode_profile(&self.tables, &voltages, &profile);
        trace!("{}: {} -> {regs}", self.table.panel_id(), regs.candela());
        regs
    }

    pub fn voltage_at(&self, gray: Gray) -> RGB<Voltage> {
        self.curve.get(gray.0)
    }

    pub fn anchor(&self, point: AdPoint) -> RGB<Voltage> {
        self.table.anchor(point)
    }

    pub fn curve(&self) -> &VoltageCurve {
        &self.curve
    }

    pub fn table(&self) -> &VoltageTable<'a> {
        &self.table
    }

    pub fn tables(&self) -> &CalibrationTables<'a> {
        &self.tables
    }

    /// False when running on the fallback curve.
    pub fn is_calibrated(&self) -> bool {
        self.calibrated
    }

    pub fn candelas(&self) -> impl Iterator<Item = CandelaSetting> + '_ {
        self.tables.candelas.iter().map(|p| CandelaSetting(p.candela))
    }
}
