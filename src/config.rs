//! Configuration for iaseek.
//!
//! [load] reads `iaseek.toml` into a [RawConfig] and converts it into the validated [Config].
//! The sections live in their own modules:
//! - [general]: search defaults and file list presentation
//! - [download]: destination and downloader selection
//! - [display]: borders, titles and theme colours
//! - [input]: key bindings

pub mod display;
pub mod download;
pub mod general;
pub mod input;
pub mod load;

pub use display::{BorderShape, Display, Theme};
pub use download::{Download, InternalDownload};
pub use general::{General, InternalGeneral};
pub use input::Keys;
pub use load::{Config, ConfigError, RawConfig};
