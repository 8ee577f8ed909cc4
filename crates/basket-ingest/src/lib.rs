//! Tabular ingestion for basket.
//!
//! Turns uploaded bytes into a typed [`basket_core::RawTable`]: lossy UTF-8
//! decoding, RFC 4180 quoting, and delimiter sniffing over a configured list
//! of candidates. Format detection (which columns hold items) is left to the
//! encoder in `basket-mining`.

pub mod reader;
