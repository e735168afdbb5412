//! Calibration tables loaded from a TOML file.
//!
//! New panel families can be brought up without rebuilding the firmware
//! image: the tables are read once, validated, and then served exactly like
//! the compiled-in ones.
//!
//! ```toml
//! [[family]]
//! name = "s6e8aa0-d"
//! panel_ids = ["a2:34:47"]
//! mtp_lsb_uv = 3000
//! register_order = ["IV1", "IV15", "IV35", "IV59", "IV87", "IV171", "IV255"]
//! # IV0..IV255, microvolts
//! default_gamma = [[4600000, 4600000, 4600000], ...]
//! dac = [{ base = 4000000, step = 3000 }, { codes = [...] }, ...]
//!
//! [[family.segment]]
//! start = 2
//! end = 15
//! offsets = [23, 44, ...]
//! rv = 256
//!
//! [[family.candela]]
//! cd = 20
//! adjust = [[0, 3, 4, 3, 2, 1, 0, 0], [...], [...]] # R, G, B
//! ```
//!
//! `register_order` defaults to all eight anchors. A candela without
//! `adjust` gets no correction.

use std::fs;
use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calibration::PanelId;
use crate::channel::{AD_IV_MAX, AdPoint, CI_MAX, Voltage};
use crate::error::Error;
use crate::tables::{
    AdjustTable, CalibrationStore, CalibrationTables, CandelaProfile, DAC_CODES, DacTable,
    GammaCurve, TableInfo,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("reading calibration file: {0}")]
    Io(#[from] std::io::Error),
    #[error("parsing calibration file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("writing calibration file: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("family {0}: {1}")]
    Invalid(String, #[source] Error),
    #[error("{0}")]
    Shape(String),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RawFile {
    #[serde(rename = "family", default)]
    families: Vec<RawFamily>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RawFamily {
    name: String,
    panel_ids: Vec<String>,
    mtp_lsb_uv: Voltage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    register_order: Option<Vec<String>>,
    default_gamma: Vec<[Voltage; CI_MAX]>,
    dac: Vec<RawDac>,
    #[serde(rename = "segment")]
    segments: Vec<RawSegment>,
    #[serde(rename = "candela")]
    candelas: Vec<RawCandela>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum RawDac {
    Linear { base: Voltage, step: Voltage },
    Codes { codes: Vec<Voltage> },
}

#[derive(Debug, Serialize, Deserialize)]
struct RawSegment {
    start: u8,
    end: u8,
    offsets: Vec<u16>,
    rv: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct RawCandela {
    cd: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    adjust: Option<[[i16; AD_IV_MAX]; CI_MAX]>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Segment {
    start: u8,
    end: u8,
    low: AdPoint,
    high: AdPoint,
    offsets: Vec<u16>,
    rv: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Family {
    name: String,
    panel_ids: Vec<PanelId>,
    mtp_lsb_uv: Voltage,
    default_gamma: GammaCurve,
    dac: Box<[DacTable; AD_IV_MAX]>,
    segments: Vec<Segment>,
    candelas: Vec<CandelaProfile>,
    register_order: Vec<AdPoint>,
}

impl Family {
    fn from_raw(raw: RawFamily) -> Result<Self, StoreError> {
        let name = raw.name;
        let shape = |what: String| StoreError::Shape(format!("family {name}: {what}"));

        let panel_ids = raw
            .panel_ids
            .iter()
            .map(|s| s.parse().map_err(|e| shape(format!("{s:?}: {e}"))))
            .collect::<Result<Vec<PanelId>, _>>()?;

        let register_order: Vec<AdPoint> = match raw.register_order {
            None => AdPoint::ALL.to_vec(),
            Some(names) => names
                .iter()
                .map(|n| AdPoint::from_name(n).ok_or_else(|| shape(format!("unknown anchor {n:?}"))))
                .collect::<Result<_, _>>()?,
        };

        let gamma: [[Voltage; CI_MAX]; AD_IV_MAX] = raw
            .default_gamma
            .try_into()
            .map_err(|v: Vec<_>| shape(format!("{} default_gamma entries, need {AD_IV_MAX}", v.len())))?;
        let default_gamma = GammaCurve(gamma.map(|[r, g, b]| rgb::RGB::new(r, g, b)));

        let dac = raw
            .dac
            .iter()
            .map(|d| d.to_table().map_err(&shape))
            .collect::<Result<Vec<_>, _>>()?;
        let dac: Box<[DacTable; AD_IV_MAX]> = dac
            .into_boxed_slice()
            .try_into()
            .map_err(|d: Box<[_]>| shape(format!("{} dac tables, need {AD_IV_MAX}", d.len())))?;

        let segments = raw
            .segments
            .into_iter()
            .map(|s| -> Result<Segment, StoreError> {
                let high = AdPoint::at_gray(s.end)
                    .ok_or_else(|| shape(format!("segment ending at {} is not an anchor", s.end)))?;
                let low = high.prev().unwrap_or(AdPoint::Iv0);
                Ok(Segment {
                    start: s.start,
                    end: s.end,
                    low,
                    high,
                    offsets: s.offsets,
                    rv: s.rv,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let candelas = raw
            .candelas
            .iter()
            .map(|c| CandelaProfile::new(c.cd, c.adjust.map(AdjustTable).unwrap_or(AdjustTable::ZERO)))
            .collect();

        Ok(Self {
            name,
            panel_ids,
            mtp_lsb_uv: raw.mtp_lsb_uv,
            default_gamma,
            dac,
            segments,
            candelas,
            register_order,
        })
    }

    fn from_tables(tables: &CalibrationTables<'_>, panel_ids: &[PanelId]) -> Self {
        Self {
            name: tables.name.to_string(),
            panel_ids: panel_ids.to_vec(),
            mtp_lsb_uv: tables.mtp_lsb_uv,
            default_gamma: *tables.default_gamma,
            dac: Box::new(tables.dac.clone()),
            segments: tables
                .segments
                .iter()
                .map(|s| Segment {
                    start: s.start,
                    end: s.end,
                    low: s.low,
                    high: s.high,
                    offsets: s.offset_table.to_vec(),
                    rv: s.rv,
                })
                .collect(),
            candelas: tables.candelas.to_vec(),
            register_order: tables.register_order.to_vec(),
        }
    }

    fn to_raw(&self) -> RawFamily {
        RawFamily {
            name: self.name.clone(),
            panel_ids: self.panel_ids.iter().map(PanelId::to_string).collect(),
            mtp_lsb_uv: self.mtp_lsb_uv,
            register_order: (self.register_order != AdPoint::ALL)
                .then(|| self.register_order.iter().map(|p| p.name().to_string()).collect()),
            default_gamma: self.default_gamma.0.iter().map(|v| [v.r, v.g, v.b]).collect(),
            dac: self.dac.iter().map(RawDac::from_table).collect(),
            segments: self
                .segments
                .iter()
                .map(|s| RawSegment {
                    start: s.start,
                    end: s.end,
                    offsets: s.offsets.clone(),
                    rv: s.rv,
                })
                .collect(),
            candelas: self
                .candelas
                .iter()
                .map(|c| RawCandela {
                    cd: c.candela,
                    adjust: (c.adjust != AdjustTable::ZERO).then_some(c.adjust.0),
                })
                .collect(),
        }
    }

    fn segment_infos(&self) -> Vec<TableInfo<'_>> {
        self.segments
            .iter()
            .map(|s| TableInfo {
                start: s.start,
                end: s.end,
                low: s.low,
                high: s.high,
                offset_table: &s.offsets,
                rv: s.rv,
            })
            .collect()
    }

    fn tables<'s>(&'s self, segments: &'s [TableInfo<'s>]) -> CalibrationTables<'s> {
        CalibrationTables {
            name: &self.name,
            default_gamma: &self.default_gamma,
            mtp_lsb_uv: self.mtp_lsb_uv,
            segments,
            dac: &self.dac,
            candelas: &self.candelas,
            register_order: &self.register_order,
        }
    }
}

impl RawDac {
    fn to_table(&self) -> Result<DacTable, String> {
        match self {
            RawDac::Linear { base, step } => {
                let top = step
                    .checked_mul(DAC_CODES as Voltage - 1)
                    .and_then(|span| base.checked_add(span));
                match top {
                    Some(_) if *step > 0 => Ok(DacTable::linear(*base, *step)),
                    _ => Err(format!("bad linear dac base {base} step {step}")),
                }
            }
            RawDac::Codes { codes } => {
                let codes: [Voltage; DAC_CODES] = codes
                    .as_slice()
                    .try_into()
                    .map_err(|_| format!("{} dac codes, need {DAC_CODES}", codes.len()))?;
                DacTable::from_codes(codes).map_err(|e| e.to_string())
            }
        }
    }

    fn from_table(dac: &DacTable) -> Self {
        match dac.linear_step() {
            Some(step) => RawDac::Linear {
                base: dac.voltage(0),
                step,
            },
            None => RawDac::Codes {
                codes: dac.codes().to_vec(),
            },
        }
    }
}

/// Parsed calibration file. Owns the table data; [`CalibrationFile::store`]
/// gives the lookup view the engine reads from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalibrationFile {
    families: Vec<Family>,
}

impl CalibrationFile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let file = Self::from_toml_str(&text)?;
        info!(
            "loaded {} panel families from {}",
            file.families.len(),
            path.display()
        );
        Ok(file)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, StoreError> {
        let raw: RawFile = toml::from_str(text)?;
        let families = raw
            .families
            .into_iter()
            .map(Family::from_raw)
            .collect::<Result<_, _>>()?;
        Ok(Self { families })
    }

    pub fn to_toml_string(&self) -> Result<String, StoreError> {
        let raw = RawFile {
            families: self.families.iter().map(Family::to_raw).collect(),
        };
        Ok(toml::to_string_pretty(&raw)?)
    }

    /// Adds a family, e.g. to export compiled-in tables for editing.
    pub fn push(&mut self, tables: &CalibrationTables<'_>, panel_ids: &[PanelId]) {
        self.families.push(Family::from_tables(tables, panel_ids));
    }

    pub fn family_names(&self) -> impl Iterator<Item = &str> {
        self.families.iter().map(|f| f.name.as_str())
    }

    /// Validates every family and indexes them by panel id.
    pub fn store(&self) -> Result<FileStore<'_>, StoreError> {
        let mut families = Vec::with_capacity(self.families.len());
        let mut index = Vec::new();
        for (idx, family) in self.families.iter().enumerate() {
            let segments = family.segment_infos();
            family
                .tables(&segments)
                .validate()
                .map_err(|e| StoreError::Invalid(family.name.clone(), e))?;
            index.extend(family.panel_ids.iter().map(|&id| (id, idx)));
            families.push((family, segments));
        }
        index.sort_unstable_by_key(|&(id, _)| id);
        if let Some(w) = index.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(StoreError::Shape(format!(
                "panel id {} listed by {} and {}",
                w[0].0, self.families[w[0].1].name, self.families[w[1].1].name
            )));
        }
        debug!("file store indexes {} panel ids", index.len());
        Ok(FileStore { families, index })
    }
}

/// Lookup view over a [`CalibrationFile`].
#[derive(Debug)]
pub struct FileStore<'f> {
    families: Vec<(&'f Family, Vec<TableInfo<'f>>)>,
    index: Vec<(PanelId, usize)>,
}

impl FileStore<'_> {
    pub fn panel_ids(&self) -> impl Iterator<Item = PanelId> + '_ {
        self.index.iter().map(|&(id, _)| id)
    }
}

impl CalibrationStore for FileStore<'_> {
    fn tables_for(&self, panel_id: PanelId) -> Option<CalibrationTables<'_>> {
        let pos = self
            .index
            .binary_search_by_key(&panel_id, |&(id, _)| id)
            .ok()?;
        let (family, segments) = &self.families[self.index[pos].1];
        Some(family.tables(segments))
    }
}
