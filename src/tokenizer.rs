//! The vectorized tokenizer state machine ("C" in the design): consumes
//! lanes from a `StreamCursor`, driven by [`classify_lane`] bitmasks, to
//! find cell boundaries for one row at a time.
//!
//! Every position tracked here (`pos`, a cell's `start`/`len`) is relative to
//! the cursor's *current* base, i.e. to `cursor.window()[0]`. That stays
//! true across a mid-row refill: `StreamCursor::ensure_lookahead` only
//! ever moves the unconsumed tail — which, mid-row, starts exactly at the
//! row's first byte, since [`scan_row`] defers `advance()` until the row has
//! been fully committed — so a relative offset denotes the same logical byte
//! before and after the move.

use alloc::vec::Vec;

use crate::classifier::{classify_lane, Specials, LANE};
use crate::cursor::{StreamCursor, WINDOW};
use crate::error::{Error, Result};

/// One cell's span within the row currently being assembled, relative to the
/// window base at the time of emission.
#[derive(Clone, Copy, Debug)]
pub(crate) struct CellOffset {
    pub(crate) start: u32,
    pub(crate) len: u32,
    /// Set iff the cell opened with the quote byte. Such a cell's raw span
    /// includes both surrounding quotes and must be unescaped before use.
    pub(crate) quoted: bool,
}

/// The reusable per-row cell table the design calls `RowOffsets`.
pub(crate) type RowOffsets = Vec<CellOffset>;

/// Outcome of [`scan_row`].
pub(crate) enum RowOutcome {
    /// A row was fully tokenized into `cells`; `consumed` bytes (including
    /// its terminator, if any) should be advanced past before the next call.
    Row { consumed: usize },
    /// The underlying input is exhausted and no row remains to emit.
    Done,
}

/// How a cell's scan ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CellEnd {
    Delimiter,
    Cr,
    CrLf,
    Lf,
    /// The underlying input ended mid-cell, with no terminator.
    Eof,
}

/// Confirms a real byte is available at relative offset `at`, refilling the
/// cursor if needed. Returns `Ok(false)` only once the input is exhausted
/// with nothing left at `at`; returns `Err(RowTooLarge)` if satisfying the
/// request would require growing the row past one window.
fn ensure_byte(cursor: &mut StreamCursor<'_>, at: usize) -> Result<bool> {
    loop {
        cursor.ensure_lookahead()?;
        if at < cursor.remaining() {
            return Ok(true);
        }
        if at >= WINDOW {
            return Err(Error::RowTooLarge { window: WINDOW });
        }
        if cursor.is_terminal() {
            return Ok(false);
        }
        // Buffered + not terminal but `at` still isn't covered: the refill
        // above is a no-op until remaining() drops below WINDOW/2, so loop
        // again; `ensure_lookahead` guarantees remaining() == WINDOW here
        // once it does refill, which the `at >= WINDOW` check above catches.
    }
}

/// Scans forward from `*pos` for the next byte the dialect considers
/// special (delimiter, quote, CR, or LF) that also satisfies `interesting`.
/// Special bytes that don't satisfy `interesting` are literal in the current
/// scanning context (e.g. a quote byte while scanning for cell structure) and
/// are skipped without interrupting the lane fast path.
fn scan_for(
    cursor: &mut StreamCursor<'_>,
    pos: &mut usize,
    specials: Specials,
    interesting: impl Fn(u8) -> bool,
) -> Result<Option<u8>> {
    loop {
        if !ensure_byte(cursor, *pos)? {
            // Real input ends strictly before *pos can land on a lane
            // boundary; clamp back to the true logical end so the caller
            // never treats guard-zone zeros as row content.
            *pos = cursor.remaining();
            return Ok(None);
        }
        let window = cursor.window();
        debug_assert!(*pos + LANE <= window.len());
        let lane: [u8; LANE] = window[*pos..*pos + LANE].try_into().unwrap();
        let mut mask = classify_lane(&lane, specials);
        if mask == 0 {
            *pos += LANE;
            continue;
        }
        while mask != 0 {
            let bit = mask.trailing_zeros() as usize;
            let byte = lane[bit];
            if interesting(byte) {
                *pos += bit;
                return Ok(Some(byte));
            }
            mask &= mask - 1;
        }
        *pos += LANE;
    }
}

fn is_structural(specials: Specials) -> impl Fn(u8) -> bool {
    move |b| b == specials.delimiter || b == b'\r' || b == b'\n'
}

/// Resolves a quoted cell's closing quote, consuming escaped `""` pairs
/// along the way. Leaves `*pos` positioned right after the true closing
/// quote (or at the input's real end, if the quote was never closed).
fn resolve_quote_close(cursor: &mut StreamCursor<'_>, pos: &mut usize, specials: Specials) -> Result<()> {
    let quote = specials.quote.expect("resolve_quote_close called without a configured quote");
    loop {
        match scan_for(cursor, pos, specials, |b| b == quote)? {
            None => return Ok(()), // truncated: no closing quote before EOF
            Some(_) => {
                let after = *pos + 1;
                if ensure_byte(cursor, after)? && cursor.window()[after] == quote {
                    // Escaped quote: consume both, keep scanning inside the quoted section.
                    *pos = after + 1;
                    continue;
                }
                *pos = after;
                return Ok(());
            }
        }
    }
}

/// Scans exactly one cell starting at `*pos`, returning its offsets and how
/// it ended, or `None` if the input is already exhausted at `*pos` (no cell
/// to scan at all).
fn scan_cell(
    cursor: &mut StreamCursor<'_>,
    pos: &mut usize,
    specials: Specials,
) -> Result<Option<(CellOffset, CellEnd)>> {
    let start = *pos;
    if !ensure_byte(cursor, start)? {
        return Ok(None);
    }

    let quoted = specials.quote == Some(cursor.window()[start]);
    if quoted {
        *pos = start + 1;
        resolve_quote_close(cursor, pos, specials)?;
    }

    // Whether the cell opened quoted or not, the remaining scan for its
    // terminator is identical: a quote byte is never structural here (a
    // quote inside an unquoted cell is literal per the dialect, and a
    // quoted cell's own closing quote has already been consumed above —
    // anything after it, clean terminator or lenient trailing garbage, is
    // scanned the same way as plain unquoted content).
    let term = scan_for(cursor, pos, specials, is_structural(specials))?;

    let (end, cell_end, extra) = match term {
        Some(b'\r') => {
            let after = *pos + 1;
            if ensure_byte(cursor, after)? && cursor.window()[after] == b'\n' {
                (*pos, CellEnd::CrLf, 2)
            } else {
                (*pos, CellEnd::Cr, 1)
            }
        }
        Some(b'\n') => (*pos, CellEnd::Lf, 1),
        Some(_) => (*pos, CellEnd::Delimiter, 1),
        None => (*pos, CellEnd::Eof, 0),
    };

    let cell = CellOffset {
        start: start as u32,
        len: (end - start) as u32,
        quoted,
    };
    *pos = end + extra;
    Ok(Some((cell, cell_end)))
}

/// Tokenizes the next row, skipping rows that consist solely of a
/// terminator (they are never surfaced), and applying the trailing-row
/// flush policy at end of input.
pub(crate) fn scan_row(
    cursor: &mut StreamCursor<'_>,
    specials: Specials,
    trailing_flush: bool,
    cells: &mut RowOffsets,
) -> Result<RowOutcome> {
    'row: loop {
        cells.clear();
        let mut pos = 0usize;
        let mut any_cell = false;

        loop {
            let before = pos;
            let Some((cell, end)) = scan_cell(cursor, &mut pos, specials)? else {
                // Real EOF right at a cell's start: if a delimiter already
                // opened this cell (e.g. a trailing `a,` with no final
                // newline), the dialect still owes an empty last field.
                if any_cell && trailing_flush {
                    cells.push(CellOffset { start: pos as u32, len: 0, quoted: false });
                    return Ok(RowOutcome::Row { consumed: pos });
                }
                return Ok(RowOutcome::Done);
            };

            match end {
                CellEnd::Delimiter => {
                    cells.push(cell);
                    any_cell = true;
                }
                CellEnd::Cr | CellEnd::CrLf | CellEnd::Lf => {
                    if !any_cell && before == 0 && cell.len == 0 {
                        // A row consisting solely of a terminator: consume it
                        // (so scanning makes progress) but don't emit it.
                        cursor.advance(pos);
                        continue 'row;
                    }
                    cells.push(cell);
                    return Ok(RowOutcome::Row { consumed: pos });
                }
                CellEnd::Eof => {
                    if trailing_flush {
                        cells.push(cell);
                        return Ok(RowOutcome::Row { consumed: pos });
                    }
                    return Ok(RowOutcome::Done);
                }
            }
        }
    }
}
