//! Gallery position and focus restoration across page navigations.
//!
//! This module provides:
//! - `SessionStorage`: tab-scoped key/value storage, with in-memory and file backends
//! - `ScrollManager`: per-path position records and a read-once focus index
//! - `restore_position`: the on-mount restoration routine used by galleries
//!
//! Positions live in a single JSON blob under one storage key; the focus
//! index lives under its own key.

pub mod restore;
pub mod scroll;
pub mod storage;

pub use restore::{restore_position, RestoreOutcome, RestorePolicy};
pub use scroll::{PositionRecord, ScrollManager, FOCUS_KEY, POSITIONS_KEY};
pub use storage::{FileStorage, MemoryStorage, SessionStorage, StorageError};
