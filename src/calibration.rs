//! Factory calibration read from the panel: its id and the MTP corrections.

use core::fmt;
use core::str::FromStr;

use crate::channel::{CI_MAX, Channel, IV_MAX, IvPoint};
use crate::error::{Error, Result};

/// Bytes of MTP data per panel, 8 per channel.
pub const MTP_LENGTH: usize = CI_MAX * MTP_BYTES_PER_CHANNEL;
const MTP_BYTES_PER_CHANNEL: usize = 8;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PanelId(pub [u8; 3]);

impl PanelId {
    /// Id reported by a panel whose OTP was never programmed.
    pub const UNPROGRAMMED: PanelId = PanelId([0, 0, 0]);

    pub fn is_unprogrammed(&self) -> bool {
        *self == Self::UNPROGRAMMED
    }
}

impl fmt::Display for PanelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}")
    }
}

/// `PanelId` text was not three `:`-separated hex bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePanelIdError;

impl fmt::Display for ParsePanelIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("panel id must look like a2:14:44")
    }
}

impl core::error::Error for ParsePanelIdError {}

impl FromStr for PanelId {
    type Err = ParsePanelIdError;

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        let mut id = [0u8; 3];
        let mut parts = s.split(':');
        for byte in id.iter_mut() {
            let part = parts.next().ok_or(ParsePanelIdError)?;
            if part.is_empty() || part.len() > 2 {
                return Err(ParsePanelIdError);
            }
            *byte = u8::from_str_radix(part, 16).map_err(|_| ParsePanelIdError)?;
        }
        if parts.next().is_some() {
            return Err(ParsePanelIdError);
        }
        Ok(PanelId(id))
    }
}

/// Signed MTP corrections, one per channel per reference point.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct MtpOffsets([[i16; IV_MAX]; CI_MAX]);

impl MtpOffsets {
    pub const ZERO: MtpOffsets = MtpOffsets([[0; IV_MAX]; CI_MAX]);

    pub const fn from_array(values: [[i16; IV_MAX]; CI_MAX]) -> Self {
        Self(values)
    }

    #[inline(always)]
    pub fn get(&self, channel: Channel, point: IvPoint) -> i16 {
        self.0[channel as usize][point as usize]
    }

    pub fn set(&mut self, channel: Channel, point: IvPoint, value: i16) {
        self.0[channel as usize][point as usize] = value;
    }

    pub fn validate(&self) -> Result<()> {
        for channel in Channel::ALL {
            for point in IvPoint::ALL {
                let value = self.get(channel, point);
                let (min, max) = point.mtp_range();
                if !(min..=max).contains(&value) {
                    return Err(Error::MtpOutOfRange {
                        channel,
                        point,
                        value,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Everything the engine needs from one physical panel. Read once at panel
/// init and never modified.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct PanelCalibration {
    pub panel_id: PanelId,
    pub mtp: MtpOffsets,
}

impl PanelCalibration {
    pub fn new(panel_id: PanelId, mtp: MtpOffsets) -> Result<Self> {
        mtp.validate()?;
        Ok(Self { panel_id, mtp })
    }

    pub fn uncalibrated(panel_id: PanelId) -> Self {
        Self {
            panel_id,
            mtp: MtpOffsets::ZERO,
        }
    }

    /*
     * MTP dump layout, 8 bytes per channel in R, G, B order:
     * | IV1 | IV15 | IV35 | IV59 | IV87 | IV171 | IV255 bit 8 | IV255 bits 0-7 |
     * IV1..IV171 are i8. IV255 is 9-bit two's complement, bit 8 in bit 0 of
     * byte 6. Trailing bytes past MTP_LENGTH are ignored.
     */
    pub fn from_mtp_bytes(panel_id: PanelId, bytes: &[u8]) -> Result<Self> {
        if bytes.len() < MTP_LENGTH {
            return Err(Error::MtpTooShort {
                len: bytes.len(),
                need: MTP_LENGTH,
            });
        }
        let mut mtp = MtpOffsets::ZERO;
        for (channel, chunk) in Channel::ALL
            .into_iter()
            .zip(bytes.chunks_exact(MTP_BYTES_PER_CHANNEL))
        {
            for point in &IvPoint::ALL[..IV_MAX - 1] {
                mtp.set(channel, *point, chunk[*point as usize] as i8 as i16);
            }
            let raw = (((chunk[6] & 0x01) as i16) << 8) | chunk[7] as i16;
            let iv255 = if raw & 0x100 != 0 { raw - 0x200 } else { raw };
            mtp.set(channel, IvPoint::Iv255, iv255);
        }
        Ok(Self { panel_id, mtp })
    }

    /// Inverse of [`PanelCalibration::from_mtp_bytes`].
    pub fn to_mtp_bytes(&self) -> Result<[u8; MTP_LENGTH]> {
        self.mtp.validate()?;
        let mut buf = [0u8; MTP_LENGTH];
        for (channel, chunk) in Channel::ALL
            .into_iter()
            .zip(buf.chunks_exact_mut(MTP_BYTES_PER_CHANNEL))
        {
            for point in &IvPoint::ALL[..IV_MAX - 1] {
                chunk[*point as usize] = self.mtp.get(channel, *point) as i8 as u8;
            }
            let iv255 = (self.mtp.get(channel, IvPoint::Iv255) as u16) & 0x1ff;
            chunk[6] = (iv255 >> 8) as u8;
            chunk[7] = iv255 as u8;
        }
        Ok(buf)
    }
}

/// Where calibration comes from. The board layer implements this over its
/// bus of choice; the engine only ever sees the decoded result.
pub trait PanelCalibrationSource {
    type Error;

    fn read_mtp(&mut self) -> core::result::Result<PanelCalibration, Self::Error>;
}

/// Calibration already read into memory, e.g. a dump captured over I2C.
#[derive(Debug, Clone, Copy)]
pub struct MtpDump<'a> {
    pub panel_id: PanelId,
    pub bytes: &'a [u8],
}

impl<'a> MtpDump<'a> {
    pub fn new(panel_id: PanelId, bytes: &'a [u8]) -> Self {
        Self { panel_id, bytes }
    }
}

impl PanelCalibrationSource for MtpDump<'_> {
    type Error = Error;

    fn read_mtp(&mut self) -> Result<PanelCalibration> {
        PanelCalibration::from_mtp_bytes(self.panel_id, self.bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: PanelId = PanelId([0xa2, 0x14, 0x44]);

    #[test]
    fn decodes_signed_bytes() {
        let mut dump = [0u8; MTP_LENGTH];
        // red IV1 = -1, green IV87 = 0x7f, blue IV171 = -128
        dump[0] = 0xff;
        dump[8 + 4] = 0x7f;
        dump[16 + 5] = 0x80;
        let cal = PanelCalibration::from_mtp_bytes(ID, &dump).unwrap();
        assert_eq!(cal.mtp.get(Channel::Red, IvPoint::Iv1), -1);
        assert_eq!(cal.mtp.get(Channel::Green, IvPoint::Iv87), 127);
        assert_eq!(cal.mtp.get(Channel::Blue, IvPoint::Iv171), -128);
        assert_eq!(cal.mtp.get(Channel::Red, IvPoint::Iv15), 0);
    }

    #[test]
    fn decodes_nine_bit_iv255() {
        let mut dump = [0u8; MTP_LENGTH];
        dump[6] = 0x01;
        dump[7] = 0x00; // -256
        dump[8 + 6] = 0x00;
        dump[8 + 7] = 0xff; // 255
        dump[16 + 6] = 0xff; // upper bits beyond bit 0 are not part of the value
        dump[16 + 7] = 0x9c; // 0x19c -> -100
        let cal = PanelCalibration::from_mtp_bytes(ID, &dump).unwrap();
        assert_eq!(cal.mtp.get(Channel::Red, IvPoint::Iv255), -256);
        assert_eq!(cal.mtp.get(Channel::Green, IvPoint::Iv255), 255);
        assert_eq!(cal.mtp.get(Channel::Blue, IvPoint::Iv255), -100);
    }

    #[test]
    fn short_dump_is_rejected() {
        let err = PanelCalibration::from_mtp_bytes(ID, &[0u8; 10]).unwrap_err();
        assert_eq!(err, Error::MtpTooShort { len: 10, need: 24 });
    }

    #[test]
    fn encode_matches_decode() {
        let mut mtp = MtpOffsets::ZERO;
        mtp.set(Channel::Red, IvPoint::Iv255, 100);
        mtp.set(Channel::Green, IvPoint::Iv1, -7);
        mtp.set(Channel::Blue, IvPoint::Iv255, -256);
        let cal = PanelCalibration::new(ID, mtp).unwrap();
        let bytes = cal.to_mtp_bytes().unwrap();
        assert_eq!(PanelCalibration::from_mtp_bytes(ID, &bytes).unwrap(), cal);
    }

    #[test]
    fn out_of_range_correction_is_rejected() {
        let mut mtp = MtpOffsets::ZERO;
        mtp.set(Channel::Green, IvPoint::Iv35, 200);
        assert_eq!(
            PanelCalibration::new(ID, mtp).unwrap_err(),
            Error::MtpOutOfRange {
                channel: Channel::Green,
                point: IvPoint::Iv35,
                value: 200,
            }
        );
        mtp.set(Channel::Green, IvPoint::Iv35, 0);
        mtp.set(Channel::Green, IvPoint::Iv255, 200);
        assert!(PanelCalibration::new(ID, mtp).is_ok());
    }

    #[test]
    fn dump_source_reads() {
        let dump = [0u8; MTP_LENGTH + 2];
        let mut source = MtpDump::new(ID, &dump);
        let cal = source.read_mtp().unwrap();
        assert_eq!(cal, PanelCalibration::uncalibrated(ID));
    }

    #[test]
    fn panel_id_display() {
        assert_eq!(ID.to_string(), "a2:14:44");
        assert_eq!("a2:14:44".parse(), Ok(ID));
        assert_eq!("0:0:0".parse(), Ok(PanelId::UNPROGRAMMED));
        for bad in ["a2:14", "a2:14:44:00", "a2::44", "a2:140:44", "zz:14:44"] {
            assert_eq!(bad.parse::<PanelId>(), Err(ParsePanelIdError), "{bad}");
        }
    }
}
