//! The row view ("D" in the design): a borrowed handle onto one tokenized
//! row, plus lazy, on-demand unescaping and optional header-keyed access.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::cell::{Ref, RefCell};
use core::ops::Deref;

use crate::error::{Error, Result};
use crate::reader::Reader;
use crate::tokenizer::CellOffset;

/// Maps header column names to their position, built once from a reader's
/// first row when constructed with a header.
pub(crate) struct HeaderIndex {
    by_name: BTreeMap<Box<[u8]>, u32>,
}

impl HeaderIndex {
    pub(crate) fn build(names: impl Iterator<Item = Box<[u8]>>) -> Self {
        let mut by_name = BTreeMap::new();
        for (i, name) in names.enumerate() {
            by_name.insert(name, i as u32);
        }
        HeaderIndex { by_name }
    }

    fn index_of(&self, name: &[u8]) -> Option<u32> {
        self.by_name.get(name).copied()
    }
}

/// A cell's content, as returned by [`Cell::bytes`]: either a direct borrow
/// of the input (the common, zero-copy case) or a borrow of the reader's
/// shared unescape scratch buffer.
///
/// The `Scratch` variant borrows through a [`Ref`], so the dynamic borrow
/// tracking built into [`RefCell`] — not `unsafe` — is what prevents two
/// unescaped cells from aliasing the same buffer at once: holding one
/// `CellBytes::Scratch` while requesting another panics rather than handing
/// back stale or overlapping data.
pub enum CellBytes<'r, 'c> {
    /// The cell needed no unescaping; borrowed straight from the window.
    Borrowed(&'r [u8]),
    /// The cell was unescaped into the reader's shared scratch buffer.
    Scratch(Ref<'c, [u8]>),
}

impl Deref for CellBytes<'_, '_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            CellBytes::Borrowed(b) => b,
            CellBytes::Scratch(r) => r,
        }
    }
}

impl PartialEq<[u8]> for CellBytes<'_, '_> {
    fn eq(&self, other: &[u8]) -> bool {
        &**self == other
    }
}

impl PartialEq<&[u8]> for CellBytes<'_, '_> {
    fn eq(&self, other: &&[u8]) -> bool {
        &**self == *other
    }
}

/// Collapses `""` escape sequences to a single quote and drops the
/// surrounding quote byte. Bytes after a true closing quote (the lenient
/// trailing-garbage case) are copied through unchanged.
pub(crate) fn unescape_into(raw: &[u8], quote: u8, out: &mut Vec<u8>) {
    debug_assert_eq!(raw.first().copied(), Some(quote));
    let mut in_quotes = true;
    let mut i = 1;
    while i < raw.len() {
        let b = raw[i];
        if in_quotes && b == quote {
            if raw.get(i + 1) == Some(&quote) {
                out.push(quote);
                i += 2;
                continue;
            }
            in_quotes = false;
            i += 1;
            continue;
        }
        out.push(b);
        i += 1;
    }
}

/// One cell within a [`RowView`].
pub struct Cell<'r> {
    raw: &'r [u8],
    quoted: bool,
    quote: u8,
    scratch: &'r RefCell<Vec<u8>>,
}

impl<'r> Cell<'r> {
    /// The cell's raw bytes exactly as they appear in the input: for a
    /// quoted cell this includes the surrounding quotes and any `""`
    /// escapes, unlike [`Cell::bytes`].
    pub fn raw(&self) -> &'r [u8] {
        self.raw
    }

    /// Whether the cell opened with the dialect's quote byte.
    pub fn is_quoted(&self) -> bool {
        self.quoted
    }

    /// The cell's logical content: unquoted cells borrow directly from the
    /// input at no cost, quoted cells are unescaped into a scratch buffer
    /// shared by the reader.
    pub fn bytes<'c>(&'c self) -> CellBytes<'r, 'c> {
        if !self.quoted {
            return CellBytes::Borrowed(self.raw);
        }
        let mut scratch = self.scratch.borrow_mut();
        scratch.clear();
        unescape_into(self.raw, self.quote, &mut scratch);
        drop(scratch);
        CellBytes::Scratch(Ref::map(self.scratch.borrow(), Vec::as_slice))
    }
}

/// A single tokenized row, borrowed from the [`Reader`] that produced it.
///
/// Borrowing `&'r Reader` rather than copying its contents means a second
/// call to [`Reader::next_row`] — which needs `&mut Reader` — cannot happen
/// while a `RowView` from the previous call is still alive: the compiler
/// enforces the one-row-at-a-time contract, rather than a runtime
/// assertion checking it after the fact.
pub struct RowView<'r, 'a> {
    pub(crate) reader: &'r Reader<'a>,
}

impl<'r, 'a> RowView<'r, 'a> {
    pub(crate) fn new(reader: &'r Reader<'a>) -> Self {
        RowView { reader }
    }

    /// Number of cells in this row.
    pub fn len(&self) -> usize {
        self.reader.row_cells().len()
    }

    /// Whether this row has no cells.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn cell_at(&self, offset: &CellOffset) -> Cell<'r> {
        let window = self.reader.cursor_window();
        let start = offset.start as usize;
        let end = start + offset.len as usize;
        Cell {
            raw: &window[start..end],
            quoted: offset.quoted,
            quote: self.reader.quote_byte(),
            scratch: self.reader.scratch(),
        }
    }

    /// Positional access. Negative indices count from the end, as in
    /// `get(-1)` for the last cell. Out-of-range indices, in either
    /// direction, are [`Error::IndexOutOfRange`].
    pub fn get(&self, index: isize) -> Result<Cell<'r>> {
        let cells = self.reader.row_cells();
        let len = cells.len();
        let resolved = if index < 0 {
            index.checked_add(len as isize)
        } else {
            Some(index)
        };
        match resolved {
            Some(i) if i >= 0 && (i as usize) < len => Ok(self.cell_at(&cells[i as usize])),
            _ => Err(Error::IndexOutOfRange { index, len }),
        }
    }

    /// Keyed access by header column name. Requires the reader to have been
    /// constructed with `header: true`.
    pub fn get_by_name(&self, name: &[u8]) -> Result<Cell<'r>> {
        let header = self.reader.header().ok_or(Error::HeaderRequired)?;
        let index = header
            .index_of(name)
            .ok_or_else(|| Error::UnknownColumn(name.to_vec().into_boxed_slice()))?;
        self.get(index as isize)
    }

    /// An iterator over this row's cells in order.
    pub fn iter(&self) -> impl Iterator<Item = Cell<'r>> + '_ {
        self.reader.row_cells().iter().map(move |c| self.cell_at(c))
    }

    /// Materializes every cell's unescaped content into a fresh `Vec`.
    pub fn as_list(&self) -> Vec<Vec<u8>> {
        self.iter().map(|c| c.bytes().to_vec()).collect()
    }

    /// Materializes this row as header-name to cell-content pairs. Requires
    /// the reader to have been constructed with `header: true`.
    pub fn as_map(&self) -> Result<BTreeMap<Box<[u8]>, Vec<u8>>> {
        let header = self.reader.header().ok_or(Error::HeaderRequired)?;
        let mut map = BTreeMap::new();
        for (name, &index) in &header.by_name {
            if let Some(offset) = self.reader.row_cells().get(index as usize) {
                map.insert(name.clone(), self.cell_at(offset).bytes().to_vec());
            }
        }
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unescape_plain_quoted_cell() {
        let mut out = Vec::new();
        unescape_into(br#""hello""#, b'"', &mut out);
        assert_eq!(out, b"hello");
    }

    #[test]
    fn unescape_collapses_escaped_quotes() {
        let mut out = Vec::new();
        unescape_into(br#""a""b""#, b'"', &mut out);
        assert_eq!(out, b"a\"b");
    }

    #[test]
    fn unescape_keeps_lenient_trailing_garbage() {
        let mut out = Vec::new();
        unescape_into(br#""ab"cd"#, b'"', &mut out);
        assert_eq!(out, b"abcd");
    }
}
