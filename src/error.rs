use thiserror::Error;

use crate::calibration::PanelId;
use crate::channel::{Channel, IvPoint};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// No calibration tables for this panel. Callers fall back to the
    /// uncalibrated curve.
    #[error("unknown panel type {0}")]
    UnknownPanelType(PanelId),
    #[error("calibration is for panel {found}, session belongs to {expected}")]
    PanelMismatch { expected: PanelId, found: PanelId },
    #[error("gray level {0} outside 0..=255")]
    GrayOutOfRange(i32),
    #[error("MTP dump is {len} bytes, need {need}")]
    MtpTooShort { len: usize, need: usize },
    #[error("MTP correction {value} for {channel:?}/{point:?} is not representable")]
    MtpOutOfRange {
        channel: Channel,
        point: IvPoint,
        value: i16,
    },
    #[error("invalid segment table: {0}")]
    InvalidSegments(&'static str),
    #[error("invalid calibration tables: {0}")]
    InvalidTables(&'static str),
    #[error("panel family has no candela profiles")]
    NoCandelaProfiles,
}

pub type Result<T> = core::result::Result<T, Error>;
