//! XML Reader Module
//!
//! Turns decoded text into a stream of events:
//! - SliceReader: Zero-copy slice parser
//! - Events: XML event types for pull parsing
//! - Buffered: Read sources into an owned buffer

pub mod buffered;
pub mod events;
pub mod slice;

pub use events::{EndElement, StartElement, XmlEvent};
pub use slice::SliceReader;
