//! Handlers for the verbs that do not drive CMake directly.

pub mod generate;
pub mod verify;
