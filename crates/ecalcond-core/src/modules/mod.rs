pub mod calib;
pub mod srsettings;
