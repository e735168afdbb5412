//! Smart-dimming gamma engine for AMOLED panels.
//!
//! Turns a panel's factory calibration (MTP corrections read over the panel
//! bus) into the gamma register bytes the display controller needs for a
//! given brightness:
//!
//! 1. [`voltage`] applies the MTP corrections to the family's default anchor
//!    voltages.
//! 2. [`interpolate`] fills in the 256 gray levels between the anchors.
//! 3. [`encoder`] samples that curve for the target brightness and converts
//!    voltages back into DAC register codes.
//!
//! Per-family constants live in a [`CalibrationStore`]; [`BuiltinStore`]
//! carries the compiled-in panels and, with the `file-store` feature,
//! [`store_file::FileStore`] loads more from a TOML file.
//!
//! ```
//! use smartdim::{BuiltinStore, CandelaSetting, MtpDump, PanelId, SmartDimming};
//!
//! let mtp = [0u8; smartdim::MTP_LENGTH];
//! let mut source = MtpDump::new(PanelId([0xa2, 0x14, 0x44]), &mtp);
//! let dimming = SmartDimming::from_source(&BuiltinStore, &mut source)?;
//! let regs = dimming.gamma_for(CandelaSetting(300));
//! assert_eq!(regs.len(), 24);
//! # Ok::<(), smartdim::Error>(())
//! ```

#![cfg_attr(not(any(feature = "std", test)), no_std)]

pub mod calibration;
pub mod channel;
pub mod dimming;
pub mod encoder;
pub mod error;
pub mod g22;
pub mod interpolate;
pub mod panels;
#[cfg(feature = "file-store")]
pub mod store_file;
pub mod tables;
pub mod voltage;

pub use calibration::{
    MTP_LENGTH, MtpDump, MtpOffsets, PanelCalibration, PanelCalibrationSource, PanelId,
};
pub use channel::{AD_IV_MAX, AdPoint, CI_MAX, Channel, IV_MAX, IvPoint, Voltage};
pub use dimming::SmartDimming;
pub use encoder::{CandelaSetting, GammaRegisterSet, MAX_GAMMA_REGS, encode};
pub use error::{Error, Result};
pub use interpolate::{Gray, VoltageCurve, interpolate};
pub use tables::{BuiltinStore, CalibrationStore, CalibrationTables, TableInfo};
pub use voltage::{VoltageTable, build_voltage_table};
