use ecalcond_core::common::constants::{N_DCCS, N_SRPS, N_TCCS};
use ecalcond_core::domain::EcalErrorCategory;
use ecalcond_core::modules::srsettings::{FanOut, Granularity, read_srp_config};
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn repeated(value: &str, count: usize) -> String {
    vec![value; count].join(" ")
}

/// Configuration with whole-detector readout parameters and full hardware
/// mask tables, as downloaded from the online database.
fn whole_detector_config() -> String {
    let mut config = String::from(
        "# SRP configuration, physics run defaults\n\
         \n\
         DELTA_ETA 1\n\
         DELTA_PHI 1\n\
         ZS_FIRST_SAMPLE 3\n\
         ADC_TO_GEV 0.035 0.06\n\
         ZS_WEIGHTS 0 -0.374 -0.374 -0.3629 0.2721 0.4681 0.3707\n\
         SYMMETRIC_ZS 0\n\
         LOW_INTEREST_ZS 0.0225\n\
         HIGH_INTEREST_ZS 0.0225\n\
         ACTIONS 1 3 3 3\n",
    );
    let _ = writeln!(config, "TCC_MASKS {}", repeated("1", N_TCCS));
    for row in 0..N_SRPS {
        let _ = writeln!(config, "SRP_MASKS {} {}", row, repeated("1", 8));
    }
    let _ = writeln!(config, "DCC_MASKS {}", repeated("1", N_DCCS));
    let _ = writeln!(config, "SRF_MASKS {}", repeated("0", N_SRPS));
    for row in 0..N_SRPS {
        let _ = writeln!(config, "SUBSTITUTION_SRFS {} 0 0 0 0", row);
    }
    let _ = writeln!(config, "BX_OFFSETS {}", repeated("0", N_SRPS));
    config.push_str("TESTER_TCC_EMU 4 7\n");
    config.push_str("BX_GLOBAL_OFFSET 3490\n");
    config.push_str("AUTO_MASKS 1\n");
    config.push_str("AUTO_SRP_SELECT 1\n");
    config
}

/// Same configuration with per-DCC thresholds and weight sets.
fn per_dcc_config() -> String {
    let mut weight_rows = String::new();
    for row in 0..N_DCCS {
        let _ = writeln!(
            weight_rows,
            "ZS_WEIGHTS {} -0.374 -0.374 -0.3629 0.2721 0.4681 0.3707",
            row
        );
    }
    whole_detector_config()
        .replace(
            "ZS_WEIGHTS 0 -0.374 -0.374 -0.3629 0.2721 0.4681 0.3707\n",
            &weight_rows,
        )
        .replace(
            "LOW_INTEREST_ZS 0.0225",
            &format!("LOW_INTEREST_ZS {}", repeated("0.0225", N_DCCS)),
        )
}

fn stage_config(temp: &TempDir, contents: &str) -> PathBuf {
    let path = temp.path().join("srp-config.txt");
    fs::write(&path, contents).expect("config file should be written");
    path
}

#[test]
fn config_file_round_trips_through_the_reader() {
    let temp = TempDir::new().expect("tempdir should be created");
    let path = stage_config(&temp, &whole_detector_config());

    let file = fs::File::open(&path).expect("config file should open");
    let settings = read_srp_config(file, false).expect("config should parse");

    assert_eq!(settings.delta_eta, FanOut::WholeDetector(1));
    assert_eq!(settings.tcc_masks.len(), N_TCCS);
    assert_eq!(settings.srp_masks.len(), N_SRPS);
    assert_eq!(settings.tester_tcc_emu_srp_ids, vec![4, 7]);
    assert_eq!(settings.bx_global_offset, 3490);
    settings.check_validity(false).expect("offline validity");
    settings.check_validity(true).expect("emulator validity");
}

#[test]
fn per_dcc_configuration_parses_to_per_unit_granularity() {
    let settings = {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = stage_config(&temp, &per_dcc_config());
        let file = fs::File::open(&path).expect("config file should open");
        read_srp_config(file, false).expect("per-DCC config should parse")
    };

    assert_eq!(
        settings.dcc_normalized_weights.granularity(),
        Granularity::PerUnit
    );
    assert_eq!(settings.dcc_normalized_weights.element_count(), N_DCCS);
    assert_eq!(
        settings.low_interest_channel_zs.granularity(),
        Granularity::PerUnit
    );

    settings
        .check_validity(false)
        .expect("per-DCC granularity is valid offline");
    let error = settings
        .check_validity(true)
        .expect_err("per-DCC weights are not emulatable");
    assert_eq!(error.category(), EcalErrorCategory::ValidationError);
    assert!(error.message().contains("dcc_normalized_weights"));
}

#[test]
fn parsed_settings_serialize_wholesale() {
    let settings = ecalcond_core::modules::srsettings::parse_srp_config(
        &whole_detector_config(),
        false,
    )
    .expect("config should parse");

    let encoded = serde_json::to_string(&settings).expect("settings to JSON");
    let restored: ecalcond_core::modules::srsettings::SrSettings =
        serde_json::from_str(&encoded).expect("settings from JSON");
    assert_eq!(restored, settings);
}

#[test]
fn truncated_file_reports_the_missing_card() {
    let truncated = whole_detector_config()
        .lines()
        .filter(|line| !line.starts_with("DELTA_PHI"))
        .collect::<Vec<_>>()
        .join("\n");

    let error = ecalcond_core::modules::srsettings::parse_srp_config(&truncated, false)
        .expect_err("DELTA_PHI is required");
    assert_eq!(error.category(), EcalErrorCategory::InputParseError);
    assert!(error.message().contains("DELTA_PHI"));
}
