//! Core XML parsing primitives
//!
//! This module contains the fundamental building blocks for XML parsing:
//! - Encoding: UTF-8/16/32 detection and conversion to UTF-8
//! - Unicode: XML 1.0 Unicode character class validation
//! - Scanner: SIMD-accelerated delimiter detection using memchr
//! - Tokenizer: State machine for XML token extraction
//! - Entities: XML entity decoding with Cow (zero-copy when possible)
//! - Attributes: Attribute parsing and extraction
//! - DTD: DOCTYPE parsing and internal entity declarations

pub mod attributes;
pub mod dtd;
pub mod encoding;
pub mod entities;
pub mod scanner;
pub mod tokenizer;
pub mod unicode;
