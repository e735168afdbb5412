//! Dumps what the smart-dimming engine makes of a panel: the calibrated
//! voltage curve, per-brightness anchor voltages and gamma register bytes.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use log::info;
use smartdim::panels;
use smartdim::store_file::{CalibrationFile, FileStore};
use smartdim::{
    AdPoint, BuiltinStore, CalibrationStore, CalibrationTables, CandelaSetting, GammaRegisterSet,
    MtpDump, PanelCalibration, PanelCalibrationSource, PanelId, SmartDimming,
};

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_COMMIT_HASH"), ")");

#[derive(Parser, Debug)]
#[command(name = "gammadump", version = VERSION)]
#[command(about = "Inspect AMOLED smart-dimming gamma tables", long_about = None)]
struct Cli {
    /// Calibration file (TOML) consulted before the built-in tables
    #[arg(short, long)]
    store: Option<PathBuf>,

    /// Panel id as read from the panel, e.g. a2:14:44
    #[arg(short, long, default_value = "00:00:00")]
    panel_id: PanelId,

    /// MTP dump as hex bytes, separators allowed
    #[arg(long, conflicts_with = "mtp_file")]
    mtp: Option<String>,

    /// MTP dump as a raw binary file
    #[arg(long)]
    mtp_file: Option<PathBuf>,

    /// Fail instead of falling back to the uncalibrated curve
    #[arg(long)]
    strict: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Voltage of every gray level, in microvolts
    Curve,
    /// Anchor voltages sampled for a brightness level
    Anchors {
        #[arg(short, long, default_value_t = 300)]
        candela: u16,
    },
    /// Gamma register bytes, for one brightness level or all of them
    Encode {
        #[arg(short, long)]
        candela: Option<u16>,
    },
    /// Supported brightness levels
    Candelas,
    /// Known panel ids and their table family
    Panels,
    /// Write the built-in tables as a calibration file
    Export {
        /// Output path, stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn parse_hex(text: &str) -> anyhow::Result<Vec<u8>> {
    let digits: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, ':' | ',' | '-'))
        .collect();
    let digits = digits.strip_prefix("0x").unwrap_or(&digits);
    if !digits.is_ascii() || digits.len() % 2 != 0 {
        bail!("expected pairs of hex digits");
    }
    (0..digits.len())
        .step_by(2)
        .map(|i| {
            let pair = &digits[i..i + 2];
            u8::from_str_radix(pair, 16).with_context(|| format!("bad hex byte {pair:?}"))
        })
        .collect()
}

fn read_calibration(cli: &Cli) -> anyhow::Result<PanelCalibration> {
    let bytes = match (&cli.mtp, &cli.mtp_file) {
        (Some(hex), _) => parse_hex(hex).context("failed to parse --mtp")?,
        (None, Some(path)) => {
            fs::read(path).with_context(|| format!("failed to read {}", path.display()))?
        }
        (None, None) => {
            info!("no MTP dump given, assuming zero corrections");
            return Ok(PanelCalibration::uncalibrated(cli.panel_id));
        }
    };
    MtpDump::new(cli.panel_id, &bytes)
        .read_mtp()
        .context("failed to decode MTP dump")
}

fn print_regs(regs: &GammaRegisterSet) {
    println!("{:>6}: {regs}", regs.candela().to_string());
}

fn list_panels(store: &dyn CalibrationStore, file_store: Option<&FileStore<'_>>) {
    let mut ids: Vec<PanelId> = BuiltinStore::panel_ids()
        .chain(file_store.into_iter().flat_map(|s| s.panel_ids()))
        .collect();
    ids.sort_unstable();
    ids.dedup();
    for id in ids {
        if let Some(tables) = store.tables_for(id) {
            println!("{id} {}", tables.name);
        }
    }
}

fn export(output: Option<&Path>) -> anyhow::Result<()> {
    let mut families: Vec<(&CalibrationTables<'static>, Vec<PanelId>)> = Vec::new();
    for &(id, tables) in panels::PANELS {
        if id.is_unprogrammed() {
            continue;
        }
        match families.iter_mut().find(|(t, _)| t.name == tables.name) {
            Some((_, ids)) => ids.push(id),
            None => families.push((tables, vec![id])),
        }
    }
    let mut file = CalibrationFile::default();
    for (tables, ids) in &families {
        file.push(tables, ids);
    }
    let text = file.to_toml_string()?;
    match output {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
            info!("wrote {} families to {}", families.len(), path.display());
        }
        None => print!("{text}"),
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let file = cli
        .store
        .as_deref()
        .map(|path| {
            CalibrationFile::load(path)
                .with_context(|| format!("failed to load {}", path.display()))
        })
        .transpose()?;
    let file_store = file
        .as_ref()
        .map(CalibrationFile::store)
        .transpose()
        .context("invalid calibration file")?;

    let chained;
    let store: &dyn CalibrationStore = match &file_store {
        Some(from_file) => {
            chained = (from_file, BuiltinStore);
            &chained
        }
        None => &BuiltinStore,
    };

    match &cli.command {
        Command::Panels => {
            list_panels(store, file_store.as_ref());
            return Ok(());
        }
        Command::Export { output } => return export(output.as_deref()),
        _ => {}
    }

    let calibration = read_calibration(&cli)?;
    let dimming = if cli.strict {
        SmartDimming::probe(store, &calibration)
            .with_context(|| format!("no usable tables for panel {}", calibration.panel_id))?
    } else {
        SmartDimming::probe_or_default(store, &calibration)
    };
    info!(
        "panel {}: {} tables{}",
        calibration.panel_id,
        dimming.tables().name,
        if dimming.is_calibrated() { "" } else { " (uncalibrated)" }
    );

    match cli.command {
        Command::Curve => {
            for (gray, v) in dimming.curve().levels().iter().enumerate() {
                println!("{gray:3} {:8} {:8} {:8}", v.r, v.g, v.b);
            }
        }
        Command::Anchors { candela } => {
            let voltages = dimming.anchor_voltages(CandelaSetting(candela));
            for (point, v) in AdPoint::ALL.iter().zip(voltages) {
                println!("{:>5} {:8} {:8} {:8}", point.name(), v.r, v.g, v.b);
            }
        }
        Command::Encode { candela: Some(candela) } => {
            print_regs(&dimming.gamma_for(CandelaSetting(candela)));
        }
        Command::Encode { candela: None } => {
            for candela in dimming.candelas() {
                print_regs(&dimming.gamma_for(candela));
            }
        }
        Command::Candelas => {
            for candela in dimming.candelas() {
                println!("{candela}");
            }
        }
        Command::Panels | Command::Export { .. } => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_with_separators() {
        assert_eq!(parse_hex("ff 00:7f,80").unwrap(), [0xff, 0x00, 0x7f, 0x80]);
        assert_eq!(parse_hex("0x0a0B").unwrap(), [0x0a, 0x0b]);
        assert!(parse_hex("abc").is_err());
        assert!(parse_hex("zz").is_err());
    }

    #[test]
    fn cli_parses() {
        let cli = Cli::try_parse_from([
            "gammadump",
            "--panel-id",
            "a2:14:44",
            "--mtp",
            "00",
            "encode",
            "-c",
            "150",
        ])
        .unwrap();
        assert_eq!(cli.panel_id, PanelId([0xa2, 0x14, 0x44]));
        assert!(matches!(cli.command, Command::Encode { candela: Some(150) }));
        assert!(read_calibration(&cli).is_err());
    }

    #[test]
    fn version_carries_commit() {
        assert!(!env!("GIT_COMMIT_HASH").is_empty());
        let err = Cli::try_parse_from(["gammadump", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
        assert!(err.to_string().contains(VERSION), "{err}");
        assert!(VERSION.ends_with(&format!("({})", env!("GIT_COMMIT_HASH"))));
    }
}
