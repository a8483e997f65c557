//! Time-block planning on a 24-hour dial.
//!
//! The library holds the dial math ([`timemath`], [`geometry`]) and the
//! stores for today's blocks, templates and weekday schedules, all persisted
//! through a [`storage::KeyValueStore`]. The `dayring` binary puts a CLI and
//! a terminal dial on top.

pub mod blocks;
pub mod commands;
pub mod error;
pub mod geometry;
pub mod models;
pub mod pomodoro;
pub mod schedules;
pub mod session;
pub mod storage;
pub mod templates;
pub mod ticker;
pub mod timemath;
pub mod tui;

pub use error::{Error, Result};
