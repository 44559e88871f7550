//! Wire shapes exchanged with the conversational platform.

pub mod actions;
pub mod validation;
