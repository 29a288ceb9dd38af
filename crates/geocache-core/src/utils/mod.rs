//! Utility functions for formatting.

pub mod format;

pub use format::age_display;
