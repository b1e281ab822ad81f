use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::common::constants::{
    ACTION_COUNT, CHANNEL_COUNT, EB_CHANNEL_COUNT, HW_WEIGHT_BITS, HW_WEIGHT_SCALE, N_DCCS,
    N_SRPS, N_TCCS, ZS_FIR_TAP_COUNT,
};
use crate::domain::{CondResult, EcalError};

/// One set of zero-suppression FIR weights, normalized representation.
pub type ZsWeightTaps = [f64; ZS_FIR_TAP_COUNT];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Granularity {
    WholeDetector,
    PerRegion,
    PerUnit,
    PerChannel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Barrel,
    Endcap,
}

/// Scope of a selective-readout setting. The database encodes the scope in
/// the element count of each stored vector:
///   - 1 element applies to the whole detector,
///   - 2 elements split barrel (element 0) and endcap (element 1),
///   - one element per card applies card-by-card,
///   - one element per crystal applies channel-by-channel (weights only).
/// `from_values` keeps that length-based dispatch for input compatibility;
/// everything downstream works on the explicit variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FanOut<T> {
    WholeDetector(T),
    PerRegion { barrel: T, endcap: T },
    PerUnit(Vec<T>),
    PerChannel(Vec<T>),
}

impl<T> FanOut<T> {
    /// Dispatches a raw value vector on its length. `unit_count` is the
    /// per-unit cardinality of the target field (cards or DCCs).
    pub fn from_values(
        field: &'static str,
        mut values: Vec<T>,
        unit_count: usize,
    ) -> CondResult<Self> {
        match values.len() {
            1 => Ok(Self::WholeDetector(values.remove(0))),
            2 => {
                let barrel = values.remove(0);
                let endcap = values.remove(0);
                Ok(Self::PerRegion { barrel, endcap })
            }
            n if n == unit_count => Ok(Self::PerUnit(values)),
            n if n == CHANNEL_COUNT => Ok(Self::PerChannel(values)),
            n => Err(EcalError::validation(
                "VALID.FANOUT",
                format!(
                    "field '{}' has {} element(s); allowed lengths are 1, 2, {} or {}",
                    field, n, unit_count, CHANNEL_COUNT
                ),
            )),
        }
    }

    pub const fn granularity(&self) -> Granularity {
        match self {
            Self::WholeDetector(_) => Granularity::WholeDetector,
            Self::PerRegion { .. } => Granularity::PerRegion,
            Self::PerUnit(_) => Granularity::PerUnit,
            Self::PerChannel(_) => Granularity::PerChannel,
        }
    }

    pub fn element_count(&self) -> usize {
        match self {
            Self::WholeDetector(_) => 1,
            Self::PerRegion { .. } => 2,
            Self::PerUnit(values) | Self::PerChannel(values) => values.len(),
        }
    }

    /// Resolves the value applying to one unit of the given region.
    /// Per-channel settings carry no per-unit view.
    pub fn value_for_unit(&self, region: Region, unit: usize) -> Option<&T> {
        match self {
            Self::WholeDetector(value) => Some(value),
            Self::PerRegion { barrel, endcap } => Some(match region {
                Region::Barrel => barrel,
                Region::Endcap => endcap,
            }),
            Self::PerUnit(values) => values.get(unit),
            Self::PerChannel(_) => None,
        }
    }

    /// Resolves the value applying to one crystal, addressed by dense index.
    pub fn value_for_channel(&self, dense_index: usize) -> Option<&T> {
        match self {
            Self::WholeDetector(value) => Some(value),
            Self::PerRegion { barrel, endcap } => {
                if dense_index < EB_CHANNEL_COUNT {
                    Some(barrel)
                } else if dense_index < CHANNEL_COUNT {
                    Some(endcap)
                } else {
                    None
                }
            }
            Self::PerUnit(_) => None,
            Self::PerChannel(values) => values.get(dense_index),
        }
    }
}

/// Selective-readout processor settings.
///
/// Populated either from the configuration file stored in the online
/// database (`parse_srp_config`) or from a partial profile
/// (`import_profile`), then checked with `check_validity` and read-only
/// afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SrSettings {
    /// Neighborhood eta half-width; the readout window around a trigger
    /// tower spans (2*delta_eta+1)*(2*delta_phi+1) towers.
    pub delta_eta: FanOut<i32>,
    /// Neighborhood phi half-width.
    pub delta_phi: FanOut<i32>,
    /// Index of the time sample (counting from 1) the first ZS FIR weight
    /// applies to.
    pub dcc_zs_first_sample: FanOut<i32>,

    /// ADC to GeV conversion factor used in the ZS filter, barrel.
    pub eb_dcc_adc_to_gev: f64,
    /// ADC to GeV conversion factor used in the ZS filter, endcap.
    pub ee_dcc_adc_to_gev: f64,

    /// ZS FIR weights, normalized representation. The hardware transmits
    /// each set rounded so that the integer weights sum to zero.
    pub dcc_normalized_weights: FanOut<ZsWeightTaps>,

    /// Symmetric zero suppression switch (cut on absolute value), stored as
    /// integer for wire compatibility: 0 off, anything else on. Study mode
    /// only, real data always runs with 0.
    pub symmetric_zs: FanOut<i32>,

    /// ZS energy threshold in GeV for low interest channels.
    pub low_interest_channel_zs: FanOut<f64>,
    /// ZS energy threshold in GeV for high interest channels.
    pub high_interest_channel_zs: FanOut<f64>,

    /// Readout action per selective-readout flag value.
    pub actions: Vec<i32>,

    /// Masks for the TCC inputs of the SRP cards, one element per TCC.
    pub tcc_masks: Vec<i16>,
    /// Masks for the SRP-SRP cross inputs, one inner vector per card.
    pub srp_masks: Vec<Vec<i16>>,
    /// Masks for the DCC outputs, one element per DCC.
    pub dcc_masks: Vec<i16>,
    /// Pattern-test enable masks, one element per card. Typical value 0.
    pub srf_masks: Vec<i16>,
    /// Substitution flags used in pattern mode, one inner vector per card.
    pub substitution_srfs: Vec<Vec<i16>>,

    /// Card ids running TCC emulation in tester mode.
    pub tester_tcc_emu_srp_ids: Vec<i32>,
    /// Card ids running SRP emulation in tester mode.
    pub tester_srp_emu_srp_ids: Vec<i32>,
    pub tester_dcc_test_srp_ids: Vec<i32>,
    pub tester_srp_test_srp_ids: Vec<i32>,

    /// Per-card bunch crossing counter offset, added to the global offset.
    pub bx_offsets: Vec<i16>,
    /// System-wide bunch crossing counter offset.
    pub bx_global_offset: i16,

    /// Automatic masking of TCC inputs of excluded FEDs: 0 off, 1 on.
    pub automatic_masks: i32,
    /// Automatic exclusion of cards whose FEDs are all excluded: 0 off, 1 on.
    pub automatic_srp_select: i32,
}

impl Default for SrSettings {
    fn default() -> Self {
        Self {
            delta_eta: FanOut::WholeDetector(0),
            delta_phi: FanOut::WholeDetector(0),
            dcc_zs_first_sample: FanOut::WholeDetector(0),
            eb_dcc_adc_to_gev: 0.0,
            ee_dcc_adc_to_gev: 0.0,
            dcc_normalized_weights: FanOut::WholeDetector([0.0; ZS_FIR_TAP_COUNT]),
            symmetric_zs: FanOut::WholeDetector(0),
            low_interest_channel_zs: FanOut::WholeDetector(0.0),
            high_interest_channel_zs: FanOut::WholeDetector(0.0),
            actions: vec![0; ACTION_COUNT],
            tcc_masks: vec![0; N_TCCS],
            srp_masks: vec![Vec::new(); N_SRPS],
            dcc_masks: vec![0; N_DCCS],
            srf_masks: vec![0; N_SRPS],
            substitution_srfs: vec![Vec::new(); N_SRPS],
            tester_tcc_emu_srp_ids: Vec::new(),
            tester_srp_emu_srp_ids: Vec::new(),
            tester_dcc_test_srp_ids: Vec::new(),
            tester_srp_test_srp_ids: Vec::new(),
            bx_offsets: vec![0; N_SRPS],
            bx_global_offset: 0,
            automatic_masks: 0,
            automatic_srp_select: 0,
        }
    }
}

const FULL_SCOPE: [Granularity; 3] = [
    Granularity::WholeDetector,
    Granularity::PerRegion,
    Granularity::PerUnit,
];
const WEIGHT_SCOPE: [Granularity; 4] = [
    Granularity::WholeDetector,
    Granularity::PerRegion,
    Granularity::PerUnit,
    Granularity::PerChannel,
];
const EMULATOR_SINGLE: [Granularity; 1] = [Granularity::WholeDetector];
const EMULATOR_REGION: [Granularity; 2] = [Granularity::WholeDetector, Granularity::PerRegion];

impl SrSettings {
    /// Converts a hardware weight (integer representation used by the DCC
    /// firmware and the online database) into the normalized offline
    /// representation. Total and linear over all integers.
    pub fn normalize_weight(hw_weight: i32) -> f64 {
        f64::from(hw_weight) / HW_WEIGHT_SCALE
    }

    /// Decodes the raw register field carrying a hardware weight. The field
    /// is 12 bits wide, two's complement; bits above the field width are
    /// ignored.
    pub fn sign_extend_weight(raw: u16) -> i32 {
        let masked = i32::from(raw) & ((1 << HW_WEIGHT_BITS) - 1);
        if masked & (1 << (HW_WEIGHT_BITS - 1)) != 0 {
            masked - (1 << HW_WEIGHT_BITS)
        } else {
            masked
        }
    }

    /// Checks cardinalities and scalar invariants, reporting the first
    /// violation. With `for_emulator` the scope sets shrink to what the
    /// selective-readout emulation supports: whole-detector only for the
    /// neighborhood, first-sample and symmetric-ZS settings, whole-detector
    /// or barrel/endcap for thresholds and weights.
    pub fn check_validity(&self, for_emulator: bool) -> CondResult<()> {
        let neighborhood_scope: &[Granularity] = if for_emulator {
            &EMULATOR_SINGLE
        } else {
            &FULL_SCOPE
        };
        let threshold_scope: &[Granularity] = if for_emulator {
            &EMULATOR_REGION
        } else {
            &FULL_SCOPE
        };
        let weight_scope: &[Granularity] = if for_emulator {
            &EMULATOR_REGION
        } else {
            &WEIGHT_SCOPE
        };

        check_fan_out("delta_eta", &self.delta_eta, N_SRPS, neighborhood_scope)?;
        check_fan_out("delta_phi", &self.delta_phi, N_SRPS, neighborhood_scope)?;
        check_fan_out(
            "dcc_zs_first_sample",
            &self.dcc_zs_first_sample,
            N_DCCS,
            neighborhood_scope,
        )?;
        check_positive("eb_dcc_adc_to_gev", self.eb_dcc_adc_to_gev)?;
        check_positive("ee_dcc_adc_to_gev", self.ee_dcc_adc_to_gev)?;
        check_fan_out(
            "dcc_normalized_weights",
            &self.dcc_normalized_weights,
            N_DCCS,
            weight_scope,
        )?;
        check_fan_out("symmetric_zs", &self.symmetric_zs, N_DCCS, neighborhood_scope)?;
        check_fan_out(
            "low_interest_channel_zs",
            &self.low_interest_channel_zs,
            N_DCCS,
            threshold_scope,
        )?;
        check_fan_out(
            "high_interest_channel_zs",
            &self.high_interest_channel_zs,
            N_DCCS,
            threshold_scope,
        )?;
        check_exact_len("actions", &self.actions, ACTION_COUNT)?;
        check_exact_len("tcc_masks", &self.tcc_masks, N_TCCS)?;
        check_exact_len("srp_masks", &self.srp_masks, N_SRPS)?;
        check_exact_len("dcc_masks", &self.dcc_masks, N_DCCS)?;
        check_exact_len("srf_masks", &self.srf_masks, N_SRPS)?;
        check_exact_len("substitution_srfs", &self.substitution_srfs, N_SRPS)?;
        check_exact_len("bx_offsets", &self.bx_offsets, N_SRPS)?;
        Ok(())
    }
}

fn expected_len(granularity: Granularity, unit_count: usize) -> usize {
    match granularity {
        Granularity::WholeDetector => 1,
        Granularity::PerRegion => 2,
        Granularity::PerUnit => unit_count,
        Granularity::PerChannel => CHANNEL_COUNT,
    }
}

fn check_fan_out<T>(
    field: &'static str,
    value: &FanOut<T>,
    unit_count: usize,
    legal: &[Granularity],
) -> CondResult<()> {
    let granularity = value.granularity();
    let actual = value.element_count();
    let shape_ok =
        legal.contains(&granularity) && actual == expected_len(granularity, unit_count);
    if shape_ok {
        return Ok(());
    }

    let allowed = legal
        .iter()
        .map(|granularity| expected_len(*granularity, unit_count).to_string())
        .collect::<Vec<_>>()
        .join(", ");
    Err(EcalError::validation(
        "VALID.FANOUT",
        format!(
            "field '{}' has {} element(s); allowed lengths are {{{}}}",
            field, actual, allowed
        ),
    ))
}

fn check_exact_len<T>(field: &'static str, items: &[T], expected: usize) -> CondResult<()> {
    if items.len() == expected {
        return Ok(());
    }
    Err(EcalError::validation(
        "VALID.FIXED_LEN",
        format!(
            "field '{}' has {} element(s); expected exactly {}",
            field,
            items.len(),
            expected
        ),
    ))
}

fn check_positive(field: &'static str, value: f64) -> CondResult<()> {
    if value > 0.0 {
        return Ok(());
    }
    Err(EcalError::validation(
        "VALID.ADC_TO_GEV",
        format!("field '{}' must be positive, got {}", field, value),
    ))
}

impl<T: Display> Display for FanOut<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WholeDetector(value) => write!(f, "{} (whole detector)", value),
            Self::PerRegion { barrel, endcap } => write!(f, "EB {} EE {}", barrel, endcap),
            Self::PerUnit(values) => {
                let rendered = values
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(" ");
                write!(f, "{}", rendered)
            }
            Self::PerChannel(values) => write!(f, "{} per-channel values", values.len()),
        }
    }
}

impl Display for SrSettings {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "# selective readout settings")?;
        writeln!(f, "deltaEta: {}", self.delta_eta)?;
        writeln!(f, "deltaPhi: {}", self.delta_phi)?;
        writeln!(f, "ecalDccZs1stSample: {}", self.dcc_zs_first_sample)?;
        writeln!(f, "ebDccAdcToGeV: {}", self.eb_dcc_adc_to_gev)?;
        writeln!(f, "eeDccAdcToGeV: {}", self.ee_dcc_adc_to_gev)?;
        write_weights(f, &self.dcc_normalized_weights)?;
        writeln!(f, "symmetricZS: {}", self.symmetric_zs)?;
        writeln!(f, "lowInterestChannelZS: {}", self.low_interest_channel_zs)?;
        writeln!(f, "highInterestChannelZS: {}", self.high_interest_channel_zs)?;
        writeln!(f, "actions: {}", join_items(&self.actions))?;
        writeln!(f, "tccMasks: {}", join_items(&self.tcc_masks))?;
        write_rows(f, "srpMasks", &self.srp_masks)?;
        writeln!(f, "dccMasks: {}", join_items(&self.dcc_masks))?;
        writeln!(f, "srfMasks: {}", join_items(&self.srf_masks))?;
        write_rows(f, "substitutionSrfs", &self.substitution_srfs)?;
        writeln!(
            f,
            "testerTccEmuSrpIds: {}",
            join_items(&self.tester_tcc_emu_srp_ids)
        )?;
        writeln!(
            f,
            "testerSrpEmuSrpIds: {}",
            join_items(&self.tester_srp_emu_srp_ids)
        )?;
        writeln!(
            f,
            "testerDccTestSrpIds: {}",
            join_items(&self.tester_dcc_test_srp_ids)
        )?;
        writeln!(
            f,
            "testerSrpTestSrpIds: {}",
            join_items(&self.tester_srp_test_srp_ids)
        )?;
        writeln!(f, "bxOffsets: {}", join_items(&self.bx_offsets))?;
        writeln!(f, "bxGlobalOffset: {}", self.bx_global_offset)?;
        writeln!(f, "automaticMasks: {}", self.automatic_masks)?;
        writeln!(f, "automaticSrpSelect: {}", self.automatic_srp_select)
    }
}

fn join_items<T: Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

fn write_rows(f: &mut Formatter<'_>, label: &str, rows: &[Vec<i16>]) -> std::fmt::Result {
    for (index, row) in rows.iter().enumerate() {
        writeln!(f, "{}[{}]: {}", label, index, join_items(row))?;
    }
    Ok(())
}

fn write_weights(f: &mut Formatter<'_>, weights: &FanOut<ZsWeightTaps>) -> std::fmt::Result {
    match weights {
        FanOut::WholeDetector(taps) => {
            writeln!(f, "dccNormalizedWeights: {} (whole detector)", join_items(taps))
        }
        FanOut::PerRegion { barrel, endcap } => {
            writeln!(f, "dccNormalizedWeights[EB]: {}", join_items(barrel))?;
            writeln!(f, "dccNormalizedWeights[EE]: {}", join_items(endcap))
        }
        FanOut::PerUnit(rows) => {
            for (index, taps) in rows.iter().enumerate() {
                writeln!(f, "dccNormalizedWeights[{}]: {}", index, join_items(taps))?;
            }
            Ok(())
        }
        FanOut::PerChannel(rows) => {
            writeln!(f, "dccNormalizedWeights: {} per-channel weight sets", rows.len())
        }
    }
}
