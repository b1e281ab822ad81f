pub mod errors;

pub use errors::{CondResult, EcalError, EcalErrorCategory, ParserResult};
