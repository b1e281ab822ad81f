use serde::{Deserialize, Serialize};

use super::model::{FanOut, SrSettings, ZsWeightTaps};
use crate::common::constants::{N_DCCS, N_SRPS, ZS_FIR_TAP_COUNT};
use crate::domain::{CondResult, EcalError};

/// Partial settings profile, typically carried as JSON by the job
/// configuration. Every field is optional: a profile covers only part of
/// the configuration, mainly what the selective-readout emulation needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SrSettingsProfile {
    pub delta_eta: Option<Vec<i32>>,
    pub delta_phi: Option<Vec<i32>>,
    pub dcc_zs_first_sample: Option<Vec<i32>>,
    pub eb_dcc_adc_to_gev: Option<f64>,
    pub ee_dcc_adc_to_gev: Option<f64>,
    pub dcc_normalized_weights: Option<Vec<Vec<f64>>>,
    pub symmetric_zs: Option<Vec<i32>>,
    pub low_interest_channel_zs: Option<Vec<f64>>,
    pub high_interest_channel_zs: Option<Vec<f64>>,
    pub actions: Option<Vec<i32>>,
    pub tcc_masks: Option<Vec<i16>>,
    pub srp_masks: Option<Vec<Vec<i16>>>,
    pub dcc_masks: Option<Vec<i16>>,
    pub srf_masks: Option<Vec<i16>>,
    pub substitution_srfs: Option<Vec<Vec<i16>>>,
    pub tester_tcc_emu_srp_ids: Option<Vec<i32>>,
    pub tester_srp_emu_srp_ids: Option<Vec<i32>>,
    pub tester_dcc_test_srp_ids: Option<Vec<i32>>,
    pub tester_srp_test_srp_ids: Option<Vec<i32>>,
    pub bx_offsets: Option<Vec<i16>>,
    pub bx_global_offset: Option<i16>,
    pub automatic_masks: Option<i32>,
    pub automatic_srp_select: Option<i32>,
}

impl SrSettings {
    /// Copies the fields present in `profile` over the current values,
    /// leaving absent fields untouched. Fan-out fields re-dispatch on their
    /// length; nothing else is checked here, `check_validity` is the
    /// explicit separate step.
    pub fn import_profile(&mut self, profile: &SrSettingsProfile) -> CondResult<()> {
        if let Some(values) = &profile.delta_eta {
            self.delta_eta = FanOut::from_values("delta_eta", values.clone(), N_SRPS)?;
        }
        if let Some(values) = &profile.delta_phi {
            self.delta_phi = FanOut::from_values("delta_phi", values.clone(), N_SRPS)?;
        }
        if let Some(values) = &profile.dcc_zs_first_sample {
            self.dcc_zs_first_sample =
                FanOut::from_values("dcc_zs_first_sample", values.clone(), N_DCCS)?;
        }
        if let Some(value) = profile.eb_dcc_adc_to_gev {
            self.eb_dcc_adc_to_gev = value;
        }
        if let Some(value) = profile.ee_dcc_adc_to_gev {
            self.ee_dcc_adc_to_gev = value;
        }
        if let Some(rows) = &profile.dcc_normalized_weights {
            self.dcc_normalized_weights =
                FanOut::from_values("dcc_normalized_weights", coerce_weight_rows(rows)?, N_DCCS)?;
        }
        if let Some(values) = &profile.symmetric_zs {
            self.symmetric_zs = FanOut::from_values("symmetric_zs", values.clone(), N_DCCS)?;
        }
        if let Some(values) = &profile.low_interest_channel_zs {
            self.low_interest_channel_zs =
                FanOut::from_values("low_interest_channel_zs", values.clone(), N_DCCS)?;
        }
        if let Some(values) = &profile.high_interest_channel_zs {
            self.high_interest_channel_zs =
                FanOut::from_values("high_interest_channel_zs", values.clone(), N_DCCS)?;
        }
        if let Some(values) = &profile.actions {
            self.actions = values.clone();
        }
        if let Some(values) = &profile.tcc_masks {
            self.tcc_masks = values.clone();
        }
        if let Some(rows) = &profile.srp_masks {
            self.srp_masks = rows.clone();
        }
        if let Some(values) = &profile.dcc_masks {
            self.dcc_masks = values.clone();
        }
        if let Some(values) = &profile.srf_masks {
            self.srf_masks = values.clone();
        }
        if let Some(rows) = &profile.substitution_srfs {
            self.substitution_srfs = rows.clone();
        }
        if let Some(values) = &profile.tester_tcc_emu_srp_ids {
            self.tester_tcc_emu_srp_ids = values.clone();
        }
        if let Some(values) = &profile.tester_srp_emu_srp_ids {
            self.tester_srp_emu_srp_ids = values.clone();
        }
        if let Some(values) = &profile.tester_dcc_test_srp_ids {
            self.tester_dcc_test_srp_ids = values.clone();
        }
        if let Some(values) = &profile.tester_srp_test_srp_ids {
            self.tester_srp_test_srp_ids = values.clone();
        }
        if let Some(values) = &profile.bx_offsets {
            self.bx_offsets = values.clone();
        }
        if let Some(value) = profile.bx_global_offset {
            self.bx_global_offset = value;
        }
        if let Some(value) = profile.automatic_masks {
            self.automatic_masks = value;
        }
        if let Some(value) = profile.automatic_srp_select {
            self.automatic_srp_select = value;
        }
        Ok(())
    }
}

fn coerce_weight_rows(rows: &[Vec<f64>]) -> CondResult<Vec<ZsWeightTaps>> {
    let mut coerced = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        let taps: ZsWeightTaps = row.as_slice().try_into().map_err(|_| {
            EcalError::parse(
                "PARSE.WEIGHT_ROW",
                format!(
                    "weight set {} has {} tap(s); expected exactly {}",
                    index,
                    row.len(),
                    ZS_FIR_TAP_COUNT
                ),
            )
        })?;
        coerced.push(taps);
    }
    Ok(coerced)
}
