pub mod api;
pub mod models;
pub mod status;

pub use models::{ApplicationStatus, ParseEnumError, Role, UNKNOWN_LABEL};
pub use status::{Transition, TransitionError};
