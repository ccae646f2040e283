//! Domain layer - the intake vocabulary and conversation rules.

pub mod foundation;
pub mod profile;
