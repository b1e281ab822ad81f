//! ECAL readout geometry and hardware representation constants.

/// Selective-readout processor cards.
pub const N_SRPS: usize = 12;
/// Data concentrator cards, barrel plus both endcaps.
pub const N_DCCS: usize = 54;
/// Trigger concentrator cards.
pub const N_TCCS: usize = 108;

/// Barrel crystals, covered by the dense-index range `0..EB_CHANNEL_COUNT`.
pub const EB_CHANNEL_COUNT: usize = 61200;
/// Endcap crystals, dense indices continue after the barrel range.
pub const EE_CHANNEL_COUNT: usize = 14648;
/// Length of a per-channel fan-out vector.
pub const CHANNEL_COUNT: usize = EB_CHANNEL_COUNT + EE_CHANNEL_COUNT;

/// Selective-readout flag values, one action per flag.
pub const ACTION_COUNT: usize = 4;
/// Taps of the DCC zero-suppression FIR filter.
pub const ZS_FIR_TAP_COUNT: usize = 6;

/// Fixed-point scale of hardware FIR weights: a normalized weight w is
/// transmitted as round(w * 1024).
pub const HW_WEIGHT_SCALE: f64 = 1024.0;
/// Width of the hardware weight register field, two's complement.
pub const HW_WEIGHT_BITS: u32 = 12;
