use smartdim::{
    AdPoint, BuiltinStore, CalibrationStore, CandelaSetting, Channel, Error, IvPoint, MtpOffsets, PanelCalibration,
    PanelId, SmartDimming, Voltage, build_voltage_table, encode, interpolate,
};

const UNKNOWN: PanelId = PanelId([0xff, 0xff, 0xff]);

/// Corrections pulling every point in both directions, all representable.
fn busy_mtp() -> MtpOffsets {
    let mut mtp = MtpOffsets::ZERO;
    for (i, channel) in Channel::ALL.into_iter().enumerate() {
        for (j, point) in IvPoint::ALL.into_iter().enumerate() {
            let sign = if (i + j) % 2 == 0 { 1 } else { -1 };
            mtp.set(channel, point, sign * (10 + 7 * j as i16));
        }
    }
    mtp
}

fn calibrations() -> Vec<PanelCalibration> {
    let mut out = Vec::new();
    for id in BuiltinStore::panel_ids() {
        out.push(PanelCalibration::uncalibrated(id));
        out.push(PanelCalibration::new(id, busy_mtp()).unwrap());
    }
    out
}

#[test]
fn anchors_are_exact_for_every_panel() {
    for cal in calibrations() {
        let table = build_voltage_table(&cal, &BuiltinStore).unwrap();
        for point in AdPoint::ALL {
            assert_eq!(
                interpolate(&table, point.gray()),
                table.anchor(point),
                "{} {}",
                cal.panel_id,
                point.name()
            );
        }
    }
}

#[test]
fn curves_never_rise() {
    for cal in calibrations() {
        let curve = build_voltage_table(&cal, &BuiltinStore).unwrap().curve();
        for channel in Channel::ALL {
            let levels: Vec<Voltage> = curve.channel(channel).collect();
            if let Some(g) = levels.windows(2).position(|w| w[1] > w[0]) {
                panic!("{} {channel:?} rises at gray {}", cal.panel_id, g + 1);
            }
        }
    }
}

#[test]
fn every_gray_and_candela_encodes() {
    for cal in calibrations() {
        let tables = BuiltinStore.tables_for(cal.panel_id).unwrap();
        let table = build_voltage_table(&cal, &BuiltinStore).unwrap();
        for gray in 0..=255u8 {
            let v = interpolate(&table, gray);
            for profile in tables.candelas {
                let regs = encode(&tables, &[v; 8], CandelaSetting(profile.candela));
                assert_eq!(regs.len(), tables.register_order.len() * 3);
            }
        }
    }
}

#[test]
fn unprogrammed_panel_ignores_mtp() {
    let cal = PanelCalibration::new(PanelId::UNPROGRAMMED, busy_mtp()).unwrap();
    let table = build_voltage_table(&cal, &BuiltinStore).unwrap();
    let tables = BuiltinStore.tables_for(PanelId::UNPROGRAMMED).unwrap();
    assert_eq!(table.anchors(), &tables.default_gamma.0);
}

#[test]
fn iv255_correction_is_exact() {
    let id = PanelId([0xa2, 0x24, 0x46]);
    let tables = BuiltinStore.tables_for(id).unwrap();
    let mut mtp = MtpOffsets::ZERO;
    mtp.set(Channel::Red, IvPoint::Iv255, 100);
    let table = build_voltage_table(&PanelCalibration::new(id, mtp).unwrap(), &BuiltinStore).unwrap();
    assert_eq!(
        table.anchor(AdPoint::Iv255).r,
        tables.default_gamma.base_voltage(AdPoint::Iv255, Channel::Red) + 100 * tables.mtp_lsb_uv
    );
}

#[test]
fn unknown_panel_is_reported() {
    let cal = PanelCalibration::uncalibrated(UNKNOWN);
    assert_eq!(
        build_voltage_table(&cal, &BuiltinStore),
        Err(Error::UnknownPanelType(UNKNOWN))
    );
}

#[test]
fn rebuild_is_bit_identical() {
    for cal in calibrations() {
        let a = build_voltage_table(&cal, &BuiltinStore).unwrap();
        let b = build_voltage_table(&cal, &BuiltinStore).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.curve(), b.curve());
    }
}

#[test]
fn sessions_are_shared_across_threads() {
    let cal = PanelCalibration::new(PanelId([0xa2, 0x14, 0x45]), busy_mtp()).unwrap();
    let dimming = SmartDimming::probe(&BuiltinStore, &cal).unwrap();
    let expected: Vec<_> = dimming
        .candelas()
        .map(|cd| dimming.gamma_for(cd))
        .collect();

    std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                s.spawn(|| {
                    dimming
                        .candelas()
                        .map(|cd| dimming.gamma_for(cd))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), expected);
        }
    });
}

#[test]
fn brightness_is_monotonic_in_codes() {
    // Dimmer levels sample higher-voltage grays, so codes never go down as
    // candela drops (adjustments aside, which only touch the low levels).
    let cal = PanelCalibration::uncalibrated(PanelId([0xa2, 0x14, 0x44]));
    let dimming = SmartDimming::probe(&BuiltinStore, &cal).unwrap();
    let levels: Vec<_> = dimming.candelas().filter(|cd| cd.0 > 50).collect();
    for pair in levels.windows(2) {
        let dim = dimming.gamma_for(pair[0]);
        let bright = dimming.gamma_for(pair[1]);
        for (d, b) in dim.as_bytes().iter().zip(bright.as_bytes()) {
            assert!(d >= b, "{} vs {}", pair[0], pair[1]);
        }
    }
}
