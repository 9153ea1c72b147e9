//! Parsers for the store's text formats.

pub mod patch_parser;
