//! Color channels and the gray-level anchor points the panel is calibrated at.

use rgb::RGB;

/// Driving voltage in microvolts.
pub type Voltage = i32;

pub const CI_MAX: usize = 3;
pub const IV_MAX: usize = 7;
pub const AD_IV_MAX: usize = 8;

#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Channel {
    Red = 0,
    Green,
    Blue,
}

impl Channel {
    pub const ALL: [Channel; CI_MAX] = [Channel::Red, Channel::Green, Channel::Blue];

    #[inline(always)]
    pub fn of<T: Copy>(self, rgb: &RGB<T>) -> T {
        match self {
            Channel::Red => rgb.r,
            Channel::Green => rgb.g,
            Channel::Blue => rgb.b,
        }
    }

    #[inline(always)]
    pub fn of_mut<T>(self, rgb: &mut RGB<T>) -> &mut T {
        match self {
            Channel::Red => &mut rgb.r,
            Channel::Green => &mut rgb.g,
            Channel::Blue => &mut rgb.b,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Channel::Red => "R",
            Channel::Green => "G",
            Channel::Blue => "B",
        }
    }
}

/// The seven reference points that carry an MTP correction.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IvPoint {
    Iv1 = 0,
    Iv15,
    Iv35,
    Iv59,
    Iv87,
    Iv171,
    Iv255,
}

impl IvPoint {
    pub const ALL: [IvPoint; IV_MAX] = [
        IvPoint::Iv1,
        IvPoint::Iv15,
        IvPoint::Iv35,
        IvPoint::Iv59,
        IvPoint::Iv87,
        IvPoint::Iv171,
        IvPoint::Iv255,
    ];

    pub fn gray(self) -> u8 {
        self.anchor().gray()
    }

    /// Register anchor at the same gray level.
    pub fn anchor(self) -> AdPoint {
        AdPoint::ALL[self as usize + 1]
    }

    /// Representable MTP correction range. `Iv255` is stored on 9 bits.
    pub fn mtp_range(self) -> (i16, i16) {
        match self {
            IvPoint::Iv255 => (-256, 255),
            _ => (-128, 127),
        }
    }
}

/// The eight anchor points the gamma registers are programmed at.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AdPoint {
    Iv0 = 0,
    Iv1,
    Iv15,
    Iv35,
    Iv59,
    Iv87,
    Iv171,
    Iv255,
}

const AD_GRAYS: [u8; AD_IV_MAX] = [0, 1, 15, 35, 59, 87, 171, 255];

impl AdPoint {
    pub const ALL: [AdPoint; AD_IV_MAX] = [
        AdPoint::Iv0,
        AdPoint::Iv1,
        AdPoint::Iv15,
        AdPoint::Iv35,
        AdPoint::Iv59,
        AdPoint::Iv87,
        AdPoint::Iv171,
        AdPoint::Iv255,
    ];

    #[inline(always)]
    pub fn gray(self) -> u8 {
        AD_GRAYS[self as usize]
    }

    pub fn at_gray(gray: u8) -> Option<AdPoint> {
        AD_GRAYS
            .iter()
            .position(|&g| g == gray)
            .map(|idx| AdPoint::ALL[idx])
    }

    /// MTP reference point for this anchor; `Iv0` has none.
    pub fn iv(self) -> Option<IvPoint> {
        match self {
            AdPoint::Iv0 => None,
            p => Some(IvPoint::ALL[p as usize - 1]),
        }
    }

    /// Anchor directly below this one, `None` for `Iv0`.
    pub fn prev(self) -> Option<AdPoint> {
        match self {
            AdPoint::Iv0 => None,
            p => Some(AdPoint::ALL[p as usize - 1]),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AdPoint::Iv0 => "IV0",
            AdPoint::Iv1 => "IV1",
            AdPoint::Iv15 => "IV15",
            AdPoint::Iv35 => "IV35",
            AdPoint::Iv59 => "IV59",
            AdPoint::Iv87 => "IV87",
            AdPoint::Iv171 => "IV171",
            AdPoint::Iv255 => "IV255",
        }
    }

    /// Inverse of [`AdPoint::name`], case-insensitive.
    pub fn from_name(name: &str) -> Option<AdPoint> {
        AdPoint::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchors_map_both_ways() {
        for p in AdPoint::ALL {
            assert_eq!(AdPoint::at_gray(p.gray()), Some(p));
        }
        assert_eq!(AdPoint::at_gray(2), None);
        assert_eq!(AdPoint::at_gray(254), None);
    }

    #[test]
    fn names_parse_back() {
        for p in AdPoint::ALL {
            assert_eq!(AdPoint::from_name(p.name()), Some(p));
        }
        assert_eq!(AdPoint::from_name("iv171"), Some(AdPoint::Iv171));
        assert_eq!(AdPoint::from_name("IV2"), None);
    }

    #[test]
    fn iv_points_skip_black() {
        assert_eq!(AdPoint::Iv0.iv(), None);
        for iv in IvPoint::ALL {
            assert_eq!(iv.anchor().iv(), Some(iv));
        }
        assert_eq!(IvPoint::Iv255.gray(), 255);
        assert_eq!(IvPoint::Iv1.gray(), 1);
    }

    #[test]
    fn channel_indexes_rgb() {
        let mut px = RGB::new(1, 2, 3);
        assert_eq!(Channel::Green.of(&px), 2);
        *Channel::Blue.of_mut(&mut px) = 9;
        assert_eq!(px, RGB::new(1, 2, 9));
    }
}
