//! Miscellaneous utility functions for iaseek.
//!
//! [cli] holds the command line definition, [helpers] the small shared functions
//! (colour parsing, entity decoding, home path handling, row clamping).

pub mod cli;
pub mod helpers;

pub use helpers::{
    clamp_rows, decode_html_entities, expand_home_path, parse_color, shorten_home_path,
};
