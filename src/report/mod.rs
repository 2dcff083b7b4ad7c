//! Report renderers for detection results.
//!
//! - [`terminal`] — colored summary box, services table and the advisories
//!   gathered during compile; respects `--quiet`.
//!
//! JSON output is produced directly from [`crate::models::Compiled`] with `serde_json`.

pub mod terminal;
