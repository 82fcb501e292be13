//! Debouncing of mechanical key contacts.
mod timed;

pub use timed::*;
