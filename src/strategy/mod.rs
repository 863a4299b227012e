//! Evaluation Strategies
//!
//! Queries run sequentially through [`Cursor::select`](crate::cursor::Cursor::select).
//! This module adds Rayon-backed fan-out for many cursors or documents.

pub mod parallel;

pub use parallel::{select_documents, select_parallel};
