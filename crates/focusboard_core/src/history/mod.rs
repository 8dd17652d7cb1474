//! Linear undo/redo history.
//!
//! # Responsibility
//! - Record reversible task commands.
//! - Walk a single cursor backwards (undo) and forwards (redo).
//!
//! # Invariants
//! - The cursor always addresses `-1..=len-1` in the (-1 based) index view.
//! - Recording after an undo permanently drops the redo branch.
//! - Undo/redo never record new entries.

pub mod action;
pub mod timeline;
