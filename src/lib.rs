//! The `bulkcsv` crate provides a high-throughput CSV parser for bulk
//! ingestion of large delimited text files.
//!
//! Its distinguishing engineering is a zero-copy, SIMD-accelerated
//! tokenizer that scans input 16 bytes at a time using vectorized character
//! classification, exposes each row as a lazy view over an underlying
//! buffer, and streams rows without per-row heap allocation.
//!
//! # Primary Focuses
//!
//! - **Vectorized**: the tokenizer classifies input 16 bytes at a time using SSE2/NEON, falling back to a scalar scan elsewhere.
//! - **Zero copy by default**: a [`RowView`]'s cells borrow directly from the current window; allocation only happens when a quoted cell is unescaped, or when a row is explicitly materialized.
//! - **Lazy decoding**: a cell's content is not unescaped until [`Cell::bytes`] is called on it.
//! - **Bulk-ingestion oriented**: [`Reader`] accepts memory-mapped files, buffered file descriptors, pull-iterators, and in-memory buffers as sources, and streams rows of any input size through a fixed-size window.
//!
//! # Supported dialect
//!
//! `bulkcsv` primarily supports a subset of [RFC 4180](https://datatracker.ietf.org/doc/html/rfc4180) with minor extensions.
//!
//! ## According to RFC 4180:
//!
//! - No escape mechanisms other than quoting are supported.
//! - Padding cells with whitespace is not allowed.
//! - Using double quotes without quoting is not allowed.
//! - Quotes must always appear at the very beginning of a cell.
//!
//! ## Additional restrictions:
//!
//! - Only single-byte delimiter and quote characters are supported; the parser is byte-oriented, not Unicode-aware.
//!
//! ## Additional supports:
//!
//! - `\r`, `\n`, and `\r\n` are all accepted as row terminators.
//! - The delimiter is configurable, and quoting can be disabled entirely.
//!
//! # Examples
//!
//! ```
//! # #[cfg(feature = "alloc")]
//! # fn run() -> Result<(), bulkcsv::Error> {
//! use bulkcsv::{ConfigBuilder, Reader};
//!
//! let config = ConfigBuilder::new().header(true).build()?;
//! let mut reader = Reader::from_bytes(b"id,name\n1,alice\n2,bob\n", config)?;
//!
//! while let Some(row) = reader.next_row() {
//!     let row = row?;
//!     println!("{:?}", &*row.get_by_name(b"name")?.bytes());
//! }
//! # Ok(())
//! # }
//! # #[cfg(feature = "alloc")]
//! # run().unwrap();
//! ```
//!
//! # Crate features
//!
//! * **std** - When enabled (the default), this permits features specific to the standard
//!   library: [`Reader::from_file`], and `std::error::Error` for [`Error`].
//! * **alloc** - When enabled (the default), this enables the whole of [`Reader`], which
//!   requires allocation for its window buffer, row-offset table, and unescape scratch space.
//! * **mmap** - Enables [`Reader::from_path`], which memory-maps the input file. Implies `std`.
//! * **tracing** - Instruments `Reader`'s internal refills and source-exhaustion events with
//!   `tracing` spans and events. Adds no dependency edge and no codegen unless enabled.

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(missing_docs)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "alloc")]
mod classifier;
#[cfg(feature = "alloc")]
mod cursor;
#[cfg(feature = "alloc")]
mod error;
#[cfg(feature = "alloc")]
mod row;
#[cfg(feature = "alloc")]
mod reader;
#[cfg(feature = "alloc")]
mod tokenizer;

#[cfg(feature = "alloc")]
pub use error::{Error, Result};
#[cfg(feature = "alloc")]
pub use reader::{Config, ConfigBuilder, Reader};
#[cfg(feature = "alloc")]
pub use row::{Cell, CellBytes, RowView};
