//! The reader façade ("E" in the design): ties the cursor, the tokenizer,
//! and the row view together behind a handful of construction entry points,
//! one per input shape.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::cell::RefCell;

use crate::classifier::Specials;
use crate::cursor::{BytesPull, IterPull, Pull, StreamCursor};
#[cfg(feature = "mmap")]
use crate::cursor::MmapCursor;
use crate::error::{Error, FatalError, Result};
use crate::row::{unescape_into, HeaderIndex, RowView};
use crate::tokenizer::{self, CellOffset, RowOffsets, RowOutcome};

/// Dialect and behavior settings for a [`Reader`]. Build one with
/// [`ConfigBuilder`].
#[derive(Clone, Copy, Debug)]
pub struct Config {
    delimiter: u8,
    quote: Option<u8>,
    header: bool,
    trailing_flush: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            delimiter: b',',
            quote: Some(b'"'),
            header: false,
            trailing_flush: true,
        }
    }
}

/// Builds a [`Config`], validating field combinations that [`Reader`]
/// construction could otherwise fail on much later and less clearly.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Starts a builder from the default configuration (`,` delimiter, `"`
    /// quote, no header, trailing-row flush enabled).
    pub fn new() -> Self {
        ConfigBuilder::default()
    }

    /// The byte that separates cells. Defaults to `,`.
    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.config.delimiter = delimiter;
        self
    }

    /// The byte that opens and closes a quoted cell, or `None` to disable
    /// quoting entirely (every cell is scanned as if unquoted). Defaults to
    /// `Some(b'"')`.
    pub fn quote(mut self, quote: Option<u8>) -> Self {
        self.config.quote = quote;
        self
    }

    /// Whether the first row is a header, consumed during construction and
    /// made available for [`RowView::get_by_name`] instead of being yielded
    /// from [`Reader::next_row`]. Defaults to `false`.
    pub fn header(mut self, header: bool) -> Self {
        self.config.header = header;
        self
    }

    /// Whether a final row with no trailing terminator is still emitted.
    /// Defaults to `true`.
    pub fn trailing_flush(mut self, trailing_flush: bool) -> Self {
        self.config.trailing_flush = trailing_flush;
        self
    }

    pub fn build(self) -> Result<Config> {
        let config = self.config;
        if matches!(config.delimiter, b'\r' | b'\n') {
            return Err(Error::InvalidConfig("delimiter cannot be CR or LF"));
        }
        if let Some(quote) = config.quote {
            if matches!(quote, b'\r' | b'\n') {
                return Err(Error::InvalidConfig("quote cannot be CR or LF"));
            }
            if quote == config.delimiter {
                return Err(Error::InvalidConfig("quote and delimiter must be different bytes"));
            }
        }
        Ok(config)
    }
}

/// A windowed, lazily-decoding CSV reader over one of four input shapes
/// ([`Reader::from_path`], [`Reader::from_file`], [`Reader::from_iter`],
/// [`Reader::from_bytes`]).
///
/// Call [`Reader::next_row`] to pull rows one at a time. Each [`RowView`] it
/// returns borrows the reader, so it must be dropped (or its contents
/// copied out) before the next call — the same constraint the design
/// describes, enforced here at compile time rather than by a debug
/// assertion.
pub struct Reader<'a> {
    cursor: StreamCursor<'a>,
    specials: Specials,
    trailing_flush: bool,
    cells: RowOffsets,
    header: Option<HeaderIndex>,
    pending_advance: usize,
    fatal: Option<FatalError>,
    scratch: RefCell<Vec<u8>>,
}

impl<'a> Reader<'a> {
    /// Memory-maps the file at `path`. Requires the `mmap` feature.
    #[cfg(feature = "mmap")]
    pub fn from_path(path: impl AsRef<std::path::Path>, config: Config) -> Result<Reader<'static>> {
        let file = std::fs::File::open(path)?;
        // SAFETY: per memmap2's own contract, the caller must not have the
        // file truncated or otherwise mutated by another process while the
        // mapping is alive; this crate has no way to enforce that itself.
        let mmap = unsafe { memmap2::Mmap::map(&file)? };
        Reader::finish_construction(StreamCursor::from_mmap(MmapCursor::new(mmap)), config)
    }

    /// Reads from an already-open file through a windowed buffer, without
    /// memory-mapping it. Requires the `std` feature.
    #[cfg(feature = "std")]
    pub fn from_file(file: std::fs::File, config: Config) -> Result<Reader<'static>> {
        Reader::finish_construction(StreamCursor::from_pull(Pull::File(file)), config)
    }

    /// Reads from a producer of byte chunks, e.g. network response bodies
    /// arriving incrementally. Requires the `alloc` feature.
    pub fn from_iter(producer: impl Iterator<Item = Vec<u8>> + 'a, config: Config) -> Result<Reader<'a>> {
        Reader::finish_construction(StreamCursor::from_pull(Pull::Iter(IterPull::new(producer))), config)
    }

    /// Reads from an in-memory byte slice. Requires the `alloc` feature.
    pub fn from_bytes(buf: &'a [u8], config: Config) -> Result<Reader<'a>> {
        Reader::finish_construction(StreamCursor::from_pull(Pull::Bytes(BytesPull::new(buf))), config)
    }

    fn finish_construction(cursor: StreamCursor<'a>, config: Config) -> Result<Reader<'a>> {
        let mut reader = Reader {
            cursor,
            specials: Specials {
                delimiter: config.delimiter,
                quote: config.quote,
            },
            trailing_flush: config.trailing_flush,
            cells: RowOffsets::new(),
            header: None,
            pending_advance: 0,
            fatal: None,
            scratch: RefCell::new(Vec::new()),
        };

        if config.header {
            if reader.advance_and_scan()?.is_some() {
                let window = reader.cursor.window();
                let names = reader
                    .cells
                    .iter()
                    .map(|c| header_name(window, c, config.quote))
                    .collect::<Vec<_>>();
                reader.header = Some(HeaderIndex::build(names.into_iter()));
            }
        }

        Ok(reader)
    }

    /// Applies any deferred advance from the previous row, then tokenizes
    /// the next one. Returns the number of bytes the row (plus its
    /// terminator) spans, or `None` once the input is exhausted.
    fn advance_and_scan(&mut self) -> Result<Option<usize>> {
        if self.pending_advance > 0 {
            self.cursor.advance(self.pending_advance);
            self.pending_advance = 0;
        }
        match tokenizer::scan_row(&mut self.cursor, self.specials, self.trailing_flush, &mut self.cells)? {
            RowOutcome::Done => Ok(None),
            RowOutcome::Row { consumed } => {
                self.pending_advance = consumed;
                Ok(Some(consumed))
            }
        }
    }

    /// Returns the next row, or `None` once the input is exhausted.
    ///
    /// Once this returns `Some(Err(_))` for a fatal error ([`Error::is_fatal`]),
    /// every subsequent call returns an equivalent error without attempting
    /// to read further.
    pub fn next_row(&mut self) -> Option<Result<RowView<'_, 'a>>> {
        if let Some(fatal) = self.fatal {
            return Some(Err(fatal.into_error()));
        }
        match self.advance_and_scan() {
            Ok(Some(_)) => Some(Ok(RowView::new(self))),
            Ok(None) => None,
            Err(err) => {
                self.fatal = FatalError::from_error(&err);
                Some(Err(err))
            }
        }
    }

    pub(crate) fn row_cells(&self) -> &[CellOffset] {
        &self.cells
    }

    pub(crate) fn cursor_window(&self) -> &[u8] {
        self.cursor.window()
    }

    pub(crate) fn quote_byte(&self) -> u8 {
        self.specials.quote.unwrap_or(0)
    }

    pub(crate) fn scratch(&self) -> &RefCell<Vec<u8>> {
        &self.scratch
    }

    pub(crate) fn header(&self) -> Option<&HeaderIndex> {
        self.header.as_ref()
    }
}

fn header_name(window: &[u8], cell: &CellOffset, quote: Option<u8>) -> Box<[u8]> {
    let raw = &window[cell.start as usize..(cell.start + cell.len) as usize];
    if cell.quoted {
        let mut buf = Vec::new();
        unescape_into(raw, quote.unwrap_or(b'"'), &mut buf);
        buf.into_boxed_slice()
    } else {
        raw.to_vec().into_boxed_slice()
    }
}
