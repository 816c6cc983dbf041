pub mod ifc;
pub mod step;

pub use crate::error::ParseError;
pub use ifc::{load_model, model_from_str};
pub use step::{StepEntity, StepFile, StepValue};
