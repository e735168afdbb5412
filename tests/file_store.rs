use std::io::Write;

use smartdim::panels::s6e8aa0;
use smartdim::store_file::{CalibrationFile, StoreError};
use smartdim::{
    AdPoint, BuiltinStore, CalibrationStore, CandelaSetting, Channel, IvPoint, MtpOffsets,
    PanelCalibration, PanelId, SmartDimming,
};

const NEW_PANEL: PanelId = PanelId([0xa2, 0x34, 0x47]);

/// A family whose segments use plain linear weights and a single candela.
fn linear_family_toml() -> String {
    let segment = |start: u8, end: u8| {
        let n = end as u32 - start as u32 + 1;
        let offsets: Vec<String> = (1..=n).map(|i| i.to_string()).collect();
        format!(
            "[[family.segment]]\nstart = {start}\nend = {end}\noffsets = [{}]\nrv = {n}\n\n",
            offsets.join(", ")
        )
    };
    let mut text = String::from(
        r#"
[[family]]
name = "linear-test"
panel_ids = ["a2:34:47", "a2:34:48"]
mtp_lsb_uv = 4000
default_gamma = [
    [4600000, 4600000, 4600000],
    [4500000, 4500000, 4500000],
    [4100000, 4100000, 4100000],
    [3700000, 3700000, 3700000],
    [3300000, 3300000, 3300000],
    [3000000, 3000000, 3000000],
    [2200000, 2200000, 2200000],
    [1300000, 1300000, 1300000],
]
dac = [
    { base = 4000000, step = 3000 },
    { base = 3900000, step = 3200 },
    { base = 3000000, step = 6800 },
    { base = 2600000, step = 8400 },
    { base = 2200000, step = 10000 },
    { base = 1800000, step = 11600 },
    { base = 1200000, step = 13900 },
    { base = 800000, step = 15600 },
]

[[family.candela]]
cd = 200

"#,
    );
    // The [0, 0] segment maps gray 0 onto itself.
    text.push_str("[[family.segment]]\nstart = 0\nend = 0\noffsets = [1]\nrv = 1\n\n");
    for (start, end) in [(1, 1), (2, 15), (16, 35), (36, 59), (60, 87), (88, 171), (172, 255)] {
        text.push_str(&segment(start, end));
    }
    text
}

#[test]
fn loads_from_disk_and_drives_the_pipeline() {
    let mut tmp = tempfile::NamedTempFile::new().unwrap();
    tmp.write_all(linear_family_toml().as_bytes()).unwrap();

    let file = CalibrationFile::load(tmp.path()).unwrap();
    assert_eq!(file.family_names().collect::<Vec<_>>(), ["linear-test"]);
    let store = file.store().unwrap();
    assert_eq!(store.panel_ids().count(), 2);

    let mut mtp = MtpOffsets::ZERO;
    mtp.set(Channel::Red, IvPoint::Iv87, -10);
    let cal = PanelCalibration::new(NEW_PANEL, mtp).unwrap();
    let dimming = SmartDimming::probe(&store, &cal).unwrap();
    assert_eq!(dimming.anchor(AdPoint::Iv87).r, 3_000_000 - 10 * 4_000);

    // Linear weights put gray 129 halfway between IV87 and IV171 (42/84).
    let mid = dimming.voltage_at(129.into());
    assert_eq!(mid.g, 3_000_000 - (3_000_000 - 2_200_000) / 2);

    let regs = dimming.gamma_for(CandelaSetting(200));
    assert_eq!(regs.len(), 24);
    // 1300000uV on the IV255 DAC is 32 codes above base.
    assert_eq!(regs.get(AdPoint::Iv255, Channel::Blue), Some(32));
}

#[test]
fn file_extends_builtin_panels() {
    let file = CalibrationFile::from_toml_str(&linear_family_toml()).unwrap();
    let file_store = file.store().unwrap();
    let store = (&file_store, BuiltinStore);

    assert_eq!(store.tables_for(NEW_PANEL).map(|t| t.name), Some("linear-test"));
    assert_eq!(
        store.tables_for(PanelId([0xa2, 0x14, 0x44])).map(|t| t.name),
        Some("s6e8aa0-a")
    );
}

#[test]
fn exported_builtin_tables_behave_identically() {
    let mut file = CalibrationFile::default();
    file.push(&s6e8aa0::REV_C, &[NEW_PANEL]);
    let reloaded = CalibrationFile::from_toml_str(&file.to_toml_string().unwrap()).unwrap();
    let store = reloaded.store().unwrap();

    let mut mtp = MtpOffsets::ZERO;
    mtp.set(Channel::Green, IvPoint::Iv255, -120);
    mtp.set(Channel::Blue, IvPoint::Iv15, 33);
    let from_file =
        SmartDimming::probe(&store, &PanelCalibration::new(NEW_PANEL, mtp).unwrap()).unwrap();
    let builtin = SmartDimming::new(
        &PanelCalibration::new(NEW_PANEL, mtp).unwrap(),
        s6e8aa0::REV_C,
    )
    .unwrap();

    assert_eq!(from_file.curve(), builtin.curve());
    for cd in builtin.candelas() {
        assert_eq!(from_file.gamma_for(cd), builtin.gamma_for(cd), "{cd}");
    }
}

#[test]
fn bad_segments_fail_validation() {
    let text = linear_family_toml().replace("rv = 14", "rv = 15");
    let file = CalibrationFile::from_toml_str(&text).unwrap();
    match file.store() {
        Err(StoreError::Invalid(name, err)) => {
            assert_eq!(name, "linear-test");
            assert_eq!(err, smartdim::Error::InvalidSegments("offset table does not end at rv"));
        }
        other => panic!("expected invalid tables, got {other:?}"),
    }
}

#[test]
fn oversized_lsb_fails_validation() {
    let text = linear_family_toml().replace("mtp_lsb_uv = 4000", "mtp_lsb_uv = 20000000");
    let file = CalibrationFile::from_toml_str(&text).unwrap();
    match file.store() {
        Err(StoreError::Invalid(name, err)) => {
            assert_eq!(name, "linear-test");
            assert_eq!(
                err,
                smartdim::Error::InvalidTables("MTP LSB too large for the default gamma")
            );
        }
        other => panic!("expected invalid tables, got {other:?}"),
    }
}

#[test]
fn repeated_register_anchor_fails_validation() {
    let text = linear_family_toml().replace(
        "mtp_lsb_uv = 4000",
        "mtp_lsb_uv = 4000\nregister_order = [\"IV1\", \"IV255\", \"IV1\"]",
    );
    let file = CalibrationFile::from_toml_str(&text).unwrap();
    assert!(matches!(
        file.store(),
        Err(StoreError::Invalid(_, smartdim::Error::InvalidTables(
            "duplicate anchor in register order"
        )))
    ));
}

#[test]
fn missing_file() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        CalibrationFile::load(dir.path().join("nope.toml")),
        Err(StoreError::Io(_))
    ));
}
