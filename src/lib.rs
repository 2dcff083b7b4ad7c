//! Stack detection and Dockerfile generation.
//!
//! - [`pack`] — one [`pack::StackPack`] per supported stack and the
//!   [`pack::PackRegistry`] that picks the one matching a project.
//! - [`manifest`] — parsers for dependency manifests and the best-effort [`manifest::probe`].
//! - [`models`] — the [`models::DeploymentContext`] every pack produces.
//! - [`writer`] — renders a pack's Dockerfile template and writes it.
//! - [`config`], [`logging`], [`prompt`], [`report`] — the pieces the CLI wires together.

pub mod config;
pub mod error;
pub mod facts;
pub mod logging;
pub mod manifest;
pub mod models;
pub mod pack;
pub mod prompt;
pub mod report;
pub mod writer;
