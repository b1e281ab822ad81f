//! Calibration condition containers: pedestals, MGPA gain ratios,
//! intercalibration constants, ADC-to-GeV scales and reconstruction
//! weight matrices. Plain data keyed by the raw 32-bit detector id,
//! populated once and read thereafter.

mod model;

pub use model::{
    AMPLITUDE_WEIGHT_ROWS, EcalAdcToGevConstant, EcalGainRatios, EcalIntercalibConstants,
    EcalMgpaGainRatio, EcalPedestal, EcalPedestals, EcalTbWeights, EcalTdcId, EcalWeightSet,
    EcalWeightXtalGroups, EcalXtalGroupId, SAMPLE_COUNT,
};
