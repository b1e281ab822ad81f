use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Rows of the amplitude weight matrices, one per estimated quantity
/// (amplitude, pedestal, jitter).
pub const AMPLITUDE_WEIGHT_ROWS: usize = 3;
/// Digitized time samples per frame.
pub const SAMPLE_COUNT: usize = 10;

/// Pedestal baseline of one channel: mean and rms in ADC counts for each
/// MGPA gain.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EcalPedestal {
    pub mean_x12: f64,
    pub rms_x12: f64,
    pub mean_x6: f64,
    pub rms_x6: f64,
    pub mean_x1: f64,
    pub rms_x1: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EcalPedestals {
    items: BTreeMap<u32, EcalPedestal>,
}

impl EcalPedestals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_value(&mut self, id: u32, pedestal: EcalPedestal) {
        self.items.insert(id, pedestal);
    }

    pub fn value(&self, id: u32) -> Option<&EcalPedestal> {
        self.items.get(&id)
    }

    pub fn map(&self) -> &BTreeMap<u32, EcalPedestal> {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Gain ratios of the multi-gain preamplifier of one channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EcalMgpaGainRatio {
    pub gain12_over_6: f64,
    pub gain6_over_1: f64,
}

impl Default for EcalMgpaGainRatio {
    fn default() -> Self {
        // nominal MGPA ratios
        Self {
            gain12_over_6: 2.0,
            gain6_over_1: 6.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EcalGainRatios {
    items: BTreeMap<u32, EcalMgpaGainRatio>,
}

impl EcalGainRatios {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_value(&mut self, id: u32, ratio: EcalMgpaGainRatio) {
        self.items.insert(id, ratio);
    }

    pub fn value(&self, id: u32) -> Option<&EcalMgpaGainRatio> {
        self.items.get(&id)
    }

    pub fn map(&self) -> &BTreeMap<u32, EcalMgpaGainRatio> {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Per-channel energy scale correction factors, dimensionless.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EcalIntercalibConstants {
    items: BTreeMap<u32, f32>,
}

impl EcalIntercalibConstants {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_value(&mut self, id: u32, constant: f32) {
        self.items.insert(id, constant);
    }

    pub fn value(&self, id: u32) -> Option<f32> {
        self.items.get(&id).copied()
    }

    pub fn map(&self) -> &BTreeMap<u32, f32> {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Global ADC count to GeV conversion, one factor per detector part.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EcalAdcToGevConstant {
    pub eb_value: f64,
    pub ee_value: f64,
}

impl EcalAdcToGevConstant {
    pub fn new(eb_value: f64, ee_value: f64) -> Self {
        Self { eb_value, ee_value }
    }
}

/// Weight group a crystal belongs to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct EcalXtalGroupId(pub u32);

/// TDC phase bin a weight set was derived for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct EcalTdcId(pub u32);

/// Amplitude reconstruction weights of one group: weight matrices applied
/// before and after the gain switch, plus the corresponding chi-square
/// matrices.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EcalWeightSet {
    pub wgt_before_switch: [[f64; SAMPLE_COUNT]; AMPLITUDE_WEIGHT_ROWS],
    pub wgt_after_switch: [[f64; SAMPLE_COUNT]; AMPLITUDE_WEIGHT_ROWS],
    pub chi2_before_switch: [[f64; SAMPLE_COUNT]; SAMPLE_COUNT],
    pub chi2_after_switch: [[f64; SAMPLE_COUNT]; SAMPLE_COUNT],
}

/// Crystal id to weight group assignment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EcalWeightXtalGroups {
    items: BTreeMap<u32, EcalXtalGroupId>,
}

impl EcalWeightXtalGroups {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_value(&mut self, id: u32, group: EcalXtalGroupId) {
        self.items.insert(id, group);
    }

    pub fn value(&self, id: u32) -> Option<EcalXtalGroupId> {
        self.items.get(&id).copied()
    }

    pub fn map(&self) -> &BTreeMap<u32, EcalXtalGroupId> {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Test-beam weight sets, keyed by weight group and TDC phase bin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EcalTbWeights {
    items: BTreeMap<EcalXtalGroupId, BTreeMap<EcalTdcId, EcalWeightSet>>,
}

impl EcalTbWeights {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_value(&mut self, group: EcalXtalGroupId, tdc: EcalTdcId, weights: EcalWeightSet) {
        self.items.entry(group).or_default().insert(tdc, weights);
    }

    pub fn value(&self, group: EcalXtalGroupId, tdc: EcalTdcId) -> Option<&EcalWeightSet> {
        self.items.get(&group).and_then(|by_tdc| by_tdc.get(&tdc))
    }

    pub fn map(&self) -> &BTreeMap<EcalXtalGroupId, BTreeMap<EcalTdcId, EcalWeightSet>> {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
