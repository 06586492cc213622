//! Subtitle direction core.
//!
//! Four pure stages turn timed speech into a scene timeline:
//! - line splitting ([`splitter`])
//! - overflow resolution ([`overflow`])
//! - placement direction ([`direction`])
//! - timeline assembly ([`timeline`])
//!
//! None of them performs I/O. [`ass`] renders a finished timeline for FFmpeg.

pub mod ass;
pub mod direction;
pub mod emphasis;
pub mod overflow;
pub mod presets;
pub mod splitter;
pub mod style;
pub mod timeline;
pub mod types;

