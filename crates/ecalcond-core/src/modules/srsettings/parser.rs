use std::io::Read;

use super::model::{FanOut, SrSettings, ZsWeightTaps};
use crate::common::constants::{N_DCCS, N_SRPS, ZS_FIR_TAP_COUNT};
use crate::domain::{EcalError, ParserResult};

/// Token separators of the configuration file format.
const DELIMITERS: [char; 3] = [' ', '\t', ','];

/// Cards that must appear in every configuration file. The testers, the
/// global offset and the automatic switches default to empty/zero when
/// omitted.
const REQUIRED_CARDS: [&str; 15] = [
    "DELTA_ETA",
    "DELTA_PHI",
    "ZS_FIRST_SAMPLE",
    "ADC_TO_GEV",
    "ZS_WEIGHTS",
    "SYMMETRIC_ZS",
    "LOW_INTEREST_ZS",
    "HIGH_INTEREST_ZS",
    "ACTIONS",
    "TCC_MASKS",
    "SRP_MASKS",
    "DCC_MASKS",
    "SRF_MASKS",
    "SUBSTITUTION_SRFS",
    "BX_OFFSETS",
];

const KNOWN_CARDS: [&str; 22] = [
    "DELTA_ETA",
    "DELTA_PHI",
    "ZS_FIRST_SAMPLE",
    "ADC_TO_GEV",
    "ZS_WEIGHTS",
    "SYMMETRIC_ZS",
    "LOW_INTEREST_ZS",
    "HIGH_INTEREST_ZS",
    "ACTIONS",
    "TCC_MASKS",
    "SRP_MASKS",
    "DCC_MASKS",
    "SRF_MASKS",
    "SUBSTITUTION_SRFS",
    "TESTER_TCC_EMU",
    "TESTER_SRP_EMU",
    "TESTER_DCC_TEST",
    "TESTER_SRP_TEST",
    "BX_OFFSETS",
    "BX_GLOBAL_OFFSET",
    "AUTO_MASKS",
    "AUTO_SRP_SELECT",
];

/// Splits a line on the delimiter set. Runs of consecutive delimiters
/// collapse, so no empty tokens are produced.
pub fn tokenize(line: &str) -> Vec<&str> {
    line.split(DELIMITERS)
        .filter(|token| !token.is_empty())
        .collect()
}

/// Reads a whole configuration stream and parses it.
pub fn read_srp_config(mut reader: impl Read, debug: bool) -> ParserResult<SrSettings> {
    let mut source = String::new();
    reader.read_to_string(&mut source).map_err(|source| {
        EcalError::io_system(
            "IO.SRP_CONFIG_READ",
            format!("failed to read SRP configuration stream: {}", source),
        )
    })?;
    parse_srp_config(&source, debug)
}

/// Parses the card-per-line SRP configuration table.
///
/// Empty lines and `#` comments are skipped. Each remaining line starts
/// with a card keyword followed by its values; the indexed cards
/// (`ZS_WEIGHTS`, `SRP_MASKS`, `SUBSTITUTION_SRFS`) repeat one row per
/// group with a leading dense row index. With `debug` every accepted card
/// is echoed through the logging layer; parsed values are unaffected.
pub fn parse_srp_config(source: &str, debug: bool) -> ParserResult<SrSettings> {
    let mut settings = SrSettings::default();
    let mut seen: Vec<&'static str> = Vec::new();

    let mut zs_weight_rows: Vec<ZsWeightTaps> = Vec::new();
    let mut srp_mask_rows: Vec<Vec<i16>> = Vec::new();
    let mut substitution_rows: Vec<Vec<i16>> = Vec::new();

    for (line_index, raw_line) in source.lines().enumerate() {
        let line_no = line_index + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let tokens = tokenize(line);
        let Some((&keyword, values)) = tokens.split_first() else {
            continue;
        };

        if debug {
            tracing::debug!(line = line_no, card = keyword, "parsed card: {}", line);
        }

        let card =
            canonical_card(keyword).ok_or_else(|| card_error(keyword, line_no, "unknown card"))?;
        let indexed = matches!(card, "ZS_WEIGHTS" | "SRP_MASKS" | "SUBSTITUTION_SRFS");
        if !indexed && seen.contains(&card) {
            return Err(card_error(card, line_no, "duplicate card"));
        }
        if !seen.contains(&card) {
            seen.push(card);
        }

        match card {
            "DELTA_ETA" => {
                settings.delta_eta =
                    FanOut::from_values("delta_eta", parse_list(values, card, line_no)?, N_SRPS)?;
            }
            "DELTA_PHI" => {
                settings.delta_phi =
                    FanOut::from_values("delta_phi", parse_list(values, card, line_no)?, N_SRPS)?;
            }
            "ZS_FIRST_SAMPLE" => {
                settings.dcc_zs_first_sample = FanOut::from_values(
                    "dcc_zs_first_sample",
                    parse_list(values, card, line_no)?,
                    N_DCCS,
                )?;
            }
            "ADC_TO_GEV" => {
                let scales: Vec<f64> = parse_list(values, card, line_no)?;
                let [eb, ee] = scales.as_slice() else {
                    return Err(card_error(card, line_no, "expects exactly 2 values (EB, EE)"));
                };
                settings.eb_dcc_adc_to_gev = *eb;
                settings.ee_dcc_adc_to_gev = *ee;
            }
            "ZS_WEIGHTS" => {
                let (row_no, taps) = parse_indexed_row::<f64>(values, card, line_no)?;
                require_dense_index(card, line_no, row_no, zs_weight_rows.len())?;
                let taps: ZsWeightTaps = taps.as_slice().try_into().map_err(|_| {
                    card_error(
                        card,
                        line_no,
                        format!(
                            "weight row has {} tap(s); expected exactly {}",
                            taps.len(),
                            ZS_FIR_TAP_COUNT
                        ),
                    )
                })?;
                zs_weight_rows.push(taps);
            }
            "SYMMETRIC_ZS" => {
                settings.symmetric_zs = FanOut::from_values(
                    "symmetric_zs",
                    parse_list(values, card, line_no)?,
                    N_DCCS,
                )?;
            }
            "LOW_INTEREST_ZS" => {
                settings.low_interest_channel_zs = FanOut::from_values(
                    "low_interest_channel_zs",
                    parse_list(values, card, line_no)?,
                    N_DCCS,
                )?;
            }
            "HIGH_INTEREST_ZS" => {
                settings.high_interest_channel_zs = FanOut::from_values(
                    "high_interest_channel_zs",
                    parse_list(values, card, line_no)?,
                    N_DCCS,
                )?;
            }
            "ACTIONS" => settings.actions = parse_list(values, card, line_no)?,
            "TCC_MASKS" => settings.tcc_masks = parse_list(values, card, line_no)?,
            "SRP_MASKS" => {
                let (row_no, masks) = parse_indexed_row::<i16>(values, card, line_no)?;
                require_dense_index(card, line_no, row_no, srp_mask_rows.len())?;
                srp_mask_rows.push(masks);
            }
            "DCC_MASKS" => settings.dcc_masks = parse_list(values, card, line_no)?,
            "SRF_MASKS" => settings.srf_masks = parse_list(values, card, line_no)?,
            "SUBSTITUTION_SRFS" => {
                let (row_no, flags) = parse_indexed_row::<i16>(values, card, line_no)?;
                require_dense_index(card, line_no, row_no, substitution_rows.len())?;
                substitution_rows.push(flags);
            }
            "TESTER_TCC_EMU" => {
                settings.tester_tcc_emu_srp_ids = parse_list(values, card, line_no)?;
            }
            "TESTER_SRP_EMU" => {
                settings.tester_srp_emu_srp_ids = parse_list(values, card, line_no)?;
            }
            "TESTER_DCC_TEST" => {
                settings.tester_dcc_test_srp_ids = parse_list(values, card, line_no)?;
            }
            "TESTER_SRP_TEST" => {
                settings.tester_srp_test_srp_ids = parse_list(values, card, line_no)?;
            }
            "BX_OFFSETS" => settings.bx_offsets = parse_list(values, card, line_no)?,
            "BX_GLOBAL_OFFSET" => {
                settings.bx_global_offset = parse_scalar(values, card, line_no)?;
            }
            "AUTO_MASKS" => settings.automatic_masks = parse_scalar(values, card, line_no)?,
            "AUTO_SRP_SELECT" => {
                settings.automatic_srp_select = parse_scalar(values, card, line_no)?;
            }
            _ => return Err(card_error(card, line_no, "unknown card")),
        }
    }

    for required in REQUIRED_CARDS {
        if !seen.contains(&required) {
            return Err(EcalError::parse(
                "PARSE.MISSING_CARD",
                format!("required card '{}' is absent", required),
            ));
        }
    }

    settings.dcc_normalized_weights =
        FanOut::from_values("dcc_normalized_weights", zs_weight_rows, N_DCCS)?;
    settings.srp_masks = srp_mask_rows;
    settings.substitution_srfs = substitution_rows;

    Ok(settings)
}

fn canonical_card(keyword: &str) -> Option<&'static str> {
    KNOWN_CARDS
        .into_iter()
        .find(|candidate| *candidate == keyword)
}

fn parse_list<T: std::str::FromStr>(
    tokens: &[&str],
    card: &'static str,
    line_no: usize,
) -> ParserResult<Vec<T>> {
    tokens
        .iter()
        .map(|token| parse_value(token, card, line_no))
        .collect()
}

fn parse_scalar<T: std::str::FromStr>(
    tokens: &[&str],
    card: &'static str,
    line_no: usize,
) -> ParserResult<T> {
    let [token] = tokens else {
        return Err(card_error(card, line_no, "expects exactly 1 value"));
    };
    parse_value(token, card, line_no)
}

/// Indexed cards carry a leading row number before the row payload.
fn parse_indexed_row<T: std::str::FromStr>(
    tokens: &[&str],
    card: &'static str,
    line_no: usize,
) -> ParserResult<(usize, Vec<T>)> {
    let Some((index_token, payload)) = tokens.split_first() else {
        return Err(card_error(card, line_no, "expects a row index"));
    };
    let row_no: usize = parse_value(index_token, card, line_no)?;
    Ok((row_no, parse_list(payload, card, line_no)?))
}

fn require_dense_index(
    card: &'static str,
    line_no: usize,
    row_no: usize,
    expected: usize,
) -> ParserResult<()> {
    if row_no == expected {
        return Ok(());
    }
    Err(card_error(
        card,
        line_no,
        format!("row index {} out of order, expected {}", row_no, expected),
    ))
}

fn parse_value<T: std::str::FromStr>(
    token: &str,
    card: &'static str,
    line_no: usize,
) -> ParserResult<T> {
    token.trim().parse().map_err(|_| {
        EcalError::parse(
            "PARSE.NUMERIC",
            format!(
                "card '{}' at line {}: token '{}' is not a valid {}",
                card,
                line_no,
                token,
                std::any::type_name::<T>()
            ),
        )
    })
}

fn card_error(card: &str, line_no: usize, detail: impl Into<String>) -> EcalError {
    EcalError::parse(
        "PARSE.CARD",
        format!("card '{}' at line {}: {}", card, line_no, detail.into()),
    )
}

#[cfg(test)]
mod tests {
    use super::{parse_srp_config, tokenize};
    use crate::common::constants::{N_DCCS, N_SRPS, N_TCCS};
    use crate::domain::EcalErrorCategory;
    use crate::modules::srsettings::model::FanOut;
    use std::fmt::Write;

    #[test]
    fn tokenizer_collapses_consecutive_delimiters() {
        assert_eq!(tokenize("1  2\t3"), vec!["1", "2", "3"]);
        assert_eq!(tokenize("a,b,,c"), vec!["a", "b", "c"]);
        assert_eq!(tokenize("  abc  "), vec!["abc"]);
        assert_eq!(tokenize(""), Vec::<&str>::new());
        assert_eq!(tokenize(" \t, "), Vec::<&str>::new());
    }

    fn repeated(value: &str, count: usize) -> String {
        vec![value; count].join(" ")
    }

    /// A complete whole-detector configuration with every mask card at its
    /// hardware cardinality.
    fn minimal_config() -> String {
        let mut config = String::from("# whole-detector configuration\n\n");
        config.push_str("DELTA_ETA 1\n");
        config.push_str("DELTA_PHI 1\n");
        config.push_str("ZS_FIRST_SAMPLE 3\n");
        config.push_str("ADC_TO_GEV 0.035 0.06\n");
        config.push_str("ZS_WEIGHTS 0 -0.374 -0.374 -0.3629 0.2721 0.4681 0.3707\n");
        config.push_str("SYMMETRIC_ZS 0\n");
        config.push_str("LOW_INTEREST_ZS 0.0225\n");
        config.push_str("HIGH_INTEREST_ZS 0.0225\n");
        config.push_str("ACTIONS 1 3 3 3\n");
        let _ = writeln!(config, "TCC_MASKS {}", repeated("1", N_TCCS));
        for row in 0..N_SRPS {
            let _ = writeln!(config, "SRP_MASKS {} {}", row, repeated("1", 8));
        }
        let _ = writeln!(config, "DCC_MASKS {}", repeated("1", N_DCCS));
        let _ = writeln!(config, "SRF_MASKS {}", repeated("0", N_SRPS));
        for row in 0..N_SRPS {
            let _ = writeln!(config, "SUBSTITUTION_SRFS {} 0 0", row);
        }
        let _ = writeln!(config, "BX_OFFSETS {}", repeated("0", N_SRPS));
        config.push_str("BX_GLOBAL_OFFSET 3490\n");
        config.push_str("AUTO_MASKS 1\n");
        config.push_str("AUTO_SRP_SELECT 1\n");
        config
    }

    #[test]
    fn minimal_config_parses_and_validates() {
        let settings = parse_srp_config(&minimal_config(), false).expect("config should parse");

        assert_eq!(settings.delta_eta, FanOut::WholeDetector(1));
        assert_eq!(settings.dcc_zs_first_sample, FanOut::WholeDetector(3));
        assert_eq!(settings.eb_dcc_adc_to_gev, 0.035);
        assert_eq!(settings.ee_dcc_adc_to_gev, 0.06);
        assert_eq!(settings.actions, vec![1, 3, 3, 3]);
        assert_eq!(settings.tcc_masks.len(), N_TCCS);
        assert_eq!(settings.srp_masks.len(), N_SRPS);
        assert_eq!(settings.srp_masks[0].len(), 8);
        assert_eq!(settings.bx_global_offset, 3490);
        assert_eq!(settings.automatic_masks, 1);
        match &settings.dcc_normalized_weights {
            FanOut::WholeDetector(taps) => assert_eq!(taps[0], -0.374),
            other => panic!("expected whole-detector weights, got {:?}", other),
        }

        settings.check_validity(false).expect("offline validity");
        settings.check_validity(true).expect("emulator validity");
    }

    #[test]
    fn debug_echo_does_not_alter_parsed_values() {
        let config = minimal_config();
        let plain = parse_srp_config(&config, false).expect("plain parse");
        let echoed = parse_srp_config(&config, true).expect("debug parse");
        assert_eq!(plain, echoed);
    }

    #[test]
    fn missing_required_card_is_a_parse_error() {
        let truncated = minimal_config()
            .lines()
            .filter(|line| !line.starts_with("ACTIONS"))
            .collect::<Vec<_>>()
            .join("\n");

        let error = parse_srp_config(&truncated, false).expect_err("ACTIONS card is required");
        assert_eq!(error.category(), EcalErrorCategory::InputParseError);
        assert_eq!(error.code(), "PARSE.MISSING_CARD");
        assert!(error.message().contains("ACTIONS"));
    }

    #[test]
    fn non_numeric_token_is_a_parse_error() {
        let broken = minimal_config().replace("BX_GLOBAL_OFFSET 3490", "BX_GLOBAL_OFFSET many");
        let error = parse_srp_config(&broken, false).expect_err("non-numeric offset");
        assert_eq!(error.code(), "PARSE.NUMERIC");
        assert!(error.message().contains("'many'"));
    }

    #[test]
    fn wrong_tap_count_is_a_parse_error() {
        let broken = minimal_config().replace(
            "ZS_WEIGHTS 0 -0.374 -0.374 -0.3629 0.2721 0.4681 0.3707",
            "ZS_WEIGHTS 0 -0.374 -0.374",
        );
        let error = parse_srp_config(&broken, false).expect_err("two taps instead of six");
        assert_eq!(error.code(), "PARSE.CARD");
        assert!(error.message().contains("expected exactly 6"));
    }

    #[test]
    fn unknown_card_is_a_parse_error() {
        let broken = format!("{}NO_SUCH_CARD 1\n", minimal_config());
        let error = parse_srp_config(&broken, false).expect_err("unknown keyword");
        assert_eq!(error.code(), "PARSE.CARD");
        assert!(error.message().contains("NO_SUCH_CARD"));
    }

    #[test]
    fn duplicate_card_is_a_parse_error() {
        let broken = format!("{}DELTA_ETA 2\n", minimal_config());
        let error = parse_srp_config(&broken, false).expect_err("DELTA_ETA appears twice");
        assert_eq!(error.code(), "PARSE.CARD");
        assert!(error.message().contains("duplicate"));
    }

    #[test]
    fn out_of_order_row_index_is_a_parse_error() {
        let broken = minimal_config().replace("SRP_MASKS 4 ", "SRP_MASKS 7 ");
        let error = parse_srp_config(&broken, false).expect_err("row 4 missing");
        assert_eq!(error.code(), "PARSE.CARD");
        assert!(error.message().contains("out of order"));
    }

    #[test]
    fn scalar_card_rejects_extra_values() {
        let broken = minimal_config().replace("AUTO_MASKS 1", "AUTO_MASKS 1 0");
        let error = parse_srp_config(&broken, false).expect_err("two values for a switch");
        assert_eq!(error.code(), "PARSE.CARD");
        assert!(error.message().contains("exactly 1 value"));
    }

    #[test]
    fn comma_and_tab_delimiters_are_equivalent_to_spaces() {
        let reshaped = minimal_config()
            .replace("ADC_TO_GEV 0.035 0.06", "ADC_TO_GEV,0.035,\t0.06")
            .replace("ACTIONS 1 3 3 3", "ACTIONS\t1,3  3,,3");
        let settings = parse_srp_config(&reshaped, false).expect("reshaped config should parse");
        assert_eq!(settings.eb_dcc_adc_to_gev, 0.035);
        assert_eq!(settings.actions, vec![1, 3, 3, 3]);
    }

    #[test]
    fn optional_cards_default_when_absent() {
        let pruned = minimal_config()
            .lines()
            .filter(|line| {
                !line.starts_with("BX_GLOBAL_OFFSET")
                    && !line.starts_with("AUTO_MASKS")
                    && !line.starts_with("AUTO_SRP_SELECT")
            })
            .collect::<Vec<_>>()
            .join("\n");

        let settings = parse_srp_config(&pruned, false).expect("optional cards may be absent");
        assert_eq!(settings.bx_global_offset, 0);
        assert_eq!(settings.automatic_masks, 0);
        assert_eq!(settings.automatic_srp_select, 0);
        assert!(settings.tester_tcc_emu_srp_ids.is_empty());
    }
}
