//! The byte-stream source abstraction ("A" in the design): presents an
//! arbitrary input as a contiguous window with trailing guard bytes, safe to
//! overread by up to [`GUARD`] bytes at any offset, and refills that window
//! from the underlying input as the tokenizer consumes it.

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::classifier::LANE;

/// Minimum window size, in bytes. A single logical row must fit within one
/// window; exceeding it is the fatal `RowTooLarge` condition.
pub const WINDOW: usize = 64 * 1024;

/// Trailing guard region, in bytes. Must be at least [`LANE`] so that the
/// tokenizer's 16-byte lane loads never read past the end of the buffer.
pub const GUARD: usize = LANE;

/// A contiguous byte-stream source, dispatched by a small tagged variant
/// rather than a trait object — the source *kind* is decided once per
/// `Reader`, so this match costs nothing in the hot per-lane loop, unlike a
/// `dyn Source` call would.
pub(crate) enum StreamCursor<'a> {
    /// The whole file is resident via `mmap`; there is effectively one
    /// window spanning the entire input, refilled only in the sense of
    /// advancing within already-resident memory.
    #[cfg(feature = "mmap")]
    Mmap(MmapCursor),
    /// A `WINDOW + GUARD` owned buffer, periodically refilled from a pull
    /// source (a file descriptor, a pull-iterator, or an in-memory slice).
    Buffered(BufferedCursor, Pull<'a>),
}

impl<'a> StreamCursor<'a> {
    #[cfg(feature = "mmap")]
    pub(crate) fn from_mmap(mmap: MmapCursor) -> Self {
        StreamCursor::Mmap(mmap)
    }

    pub(crate) fn from_pull(pull: Pull<'a>) -> Self {
        StreamCursor::Buffered(BufferedCursor::new(), pull)
    }

    /// Tops up the window if fewer than `WINDOW / 2` real bytes remain. A
    /// no-op once the underlying input is exhausted.
    pub(crate) fn ensure_lookahead(&mut self) -> crate::error::Result<()> {
        match self {
            #[cfg(feature = "mmap")]
            StreamCursor::Mmap(_) => Ok(()),
            StreamCursor::Buffered(cursor, pull) => cursor.ensure_lookahead(pull),
        }
    }

    /// The currently loaded window: real, unconsumed bytes followed by at
    /// least `GUARD` safely-readable bytes (zero-filled past logical EOF).
    pub(crate) fn window(&self) -> &[u8] {
        match self {
            #[cfg(feature = "mmap")]
            StreamCursor::Mmap(cursor) => cursor.window(),
            StreamCursor::Buffered(cursor, _) => cursor.window(),
        }
    }

    /// Number of real (non-guard) bytes left in the window.
    pub(crate) fn remaining(&self) -> usize {
        match self {
            #[cfg(feature = "mmap")]
            StreamCursor::Mmap(cursor) => cursor.remaining(),
            StreamCursor::Buffered(cursor, _) => cursor.remaining(),
        }
    }

    /// True once the underlying input is exhausted (no further refill can
    /// produce more real bytes).
    pub(crate) fn is_terminal(&self) -> bool {
        match self {
            #[cfg(feature = "mmap")]
            StreamCursor::Mmap(cursor) => cursor.is_terminal(),
            StreamCursor::Buffered(cursor, _) => cursor.terminal,
        }
    }

    /// Moves the window's base forward by `n`, which must be `<= remaining()`.
    pub(crate) fn advance(&mut self, n: usize) {
        match self {
            #[cfg(feature = "mmap")]
            StreamCursor::Mmap(cursor) => cursor.advance(n),
            StreamCursor::Buffered(cursor, _) => cursor.advance(n),
        }
    }
}

/// The shared owned-buffer cursor used by the file, iterator, and in-memory
/// sources. All three reduce to "pull more bytes into a fixed-capacity
/// buffer"; only how they produce those bytes differs ([`Pull`]).
pub(crate) struct BufferedCursor {
    buf: Box<[u8]>,
    base: usize,
    end: usize,
    terminal: bool,
}

impl BufferedCursor {
    fn new() -> Self {
        BufferedCursor {
            buf: alloc::vec![0u8; WINDOW + GUARD].into_boxed_slice(),
            base: 0,
            end: 0,
            terminal: false,
        }
    }

    fn remaining(&self) -> usize {
        self.end - self.base
    }

    fn window(&self) -> &[u8] {
        &self.buf[self.base..]
    }

    fn advance(&mut self, n: usize) {
        debug_assert!(self.base + n <= self.end);
        self.base += n;
    }

    fn ensure_lookahead(&mut self, pull: &mut Pull<'_>) -> crate::error::Result<()> {
        if self.terminal || self.remaining() >= WINDOW / 2 {
            return Ok(());
        }

        self.buf.copy_within(self.base..self.end, 0);
        self.end -= self.base;
        self.base = 0;

        while self.end < WINDOW {
            let n = pull.pull(&mut self.buf[self.end..WINDOW])?;
            if n == 0 {
                self.terminal = true;
                for b in &mut self.buf[self.end..self.end + GUARD] {
                    *b = 0;
                }
                #[cfg(feature = "tracing")]
                tracing::trace!(real_bytes = self.end, "stream cursor reached end of input");
                break;
            }
            self.end += n;
            #[cfg(feature = "tracing")]
            tracing::trace!(read = n, total = self.end, "stream cursor refilled");
        }
        Ok(())
    }
}

/// The three pull-based sources: a buffered file descriptor, a pull
/// iterator, and an in-memory buffer.
pub(crate) enum Pull<'a> {
    #[cfg(feature = "std")]
    File(std::fs::File),
    Iter(IterPull<'a>),
    Bytes(BytesPull<'a>),
}

impl Pull<'_> {
    fn pull(&mut self, dest: &mut [u8]) -> crate::error::Result<usize> {
        match self {
            #[cfg(feature = "std")]
            Pull::File(file) => {
                use std::io::Read;
                file.read(dest).map_err(Into::into)
            }
            Pull::Iter(iter) => Ok(iter.pull(dest)),
            Pull::Bytes(bytes) => Ok(bytes.pull(dest)),
        }
    }
}

/// Adapts a producer of byte chunks into the `pull(dest)` shape the
/// [`BufferedCursor`] expects, fragmenting a chunk across calls when it
/// exceeds the remaining destination capacity.
pub(crate) struct IterPull<'a> {
    producer: Box<dyn Iterator<Item = Vec<u8>> + 'a>,
    pending: Vec<u8>,
    pending_pos: usize,
}

impl<'a> IterPull<'a> {
    pub(crate) fn new(producer: impl Iterator<Item = Vec<u8>> + 'a) -> Self {
        IterPull {
            producer: Box::new(producer),
            pending: Vec::new(),
            pending_pos: 0,
        }
    }

    fn pull(&mut self, dest: &mut [u8]) -> usize {
        let mut written = 0;
        while written < dest.len() {
            if self.pending_pos >= self.pending.len() {
                match self.producer.next() {
                    Some(chunk) => {
                        self.pending = chunk;
                        self.pending_pos = 0;
                        if self.pending.is_empty() {
                            continue;
                        }
                    }
                    None => break,
                }
            }
            let avail = self.pending.len() - self.pending_pos;
            let want = dest.len() - written;
            let n = avail.min(want);
            dest[written..written + n]
                .copy_from_slice(&self.pending[self.pending_pos..self.pending_pos + n]);
            self.pending_pos += n;
            written += n;
        }
        written
    }
}

/// Hands out an in-memory slice through the same windowed refill machinery
/// as the file and iterator sources, so a buffer larger than `WINDOW` is
/// still processed incrementally rather than requiring its own guard
/// headroom up front.
pub(crate) struct BytesPull<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> BytesPull<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        BytesPull { buf, pos: 0 }
    }

    fn pull(&mut self, dest: &mut [u8]) -> usize {
        let n = (self.buf.len() - self.pos).min(dest.len());
        dest[..n].copy_from_slice(&self.buf[self.pos..self.pos + n]);
        self.pos += n;
        n
    }
}

/// The memory-mapped file source. The kernel zero-fills the unused tail of
/// the last mapped page, but only when the file length isn't an exact
/// multiple of the page size — in the worst case there is no slack page at
/// all, so reading even one byte past EOF would fault. Detecting the exact
/// page size portably needs a platform call this crate would rather not
/// add just for this; instead, whenever the scan position enters the final
/// `GUARD`-sized stretch of the file, the cursor unconditionally switches to
/// a small zero-padded private copy of that stretch. This gives up zero-copy
/// for at most the last 16 bytes of the file, never for anything else.
#[cfg(feature = "mmap")]
pub(crate) struct MmapCursor {
    mmap: memmap2::Mmap,
    tail: Box<[u8]>,
    pos: usize,
}

#[cfg(feature = "mmap")]
impl MmapCursor {
    pub(crate) fn new(mmap: memmap2::Mmap) -> Self {
        let len = mmap.len();
        // Holds the final `WINDOW + GUARD` bytes of the file (or all of it,
        // if shorter), zero-padded by another GUARD bytes past the real
        // end. A single row never exceeds WINDOW bytes, so once the real
        // slice remaining after `pos` drops to `WINDOW + GUARD` or below,
        // every lane the current (or any later) row could possibly read —
        // up to WINDOW bytes of row content plus a GUARD-sized lookahead —
        // fits inside this copy.
        let tail_start = len.saturating_sub(WINDOW + GUARD);
        let mut tail = alloc::vec![0u8; WINDOW + 2 * GUARD];
        tail[..len - tail_start].copy_from_slice(&mmap[tail_start..]);
        #[cfg(feature = "tracing")]
        tracing::trace!(len, "mmap cursor created");
        MmapCursor {
            mmap,
            tail: tail.into_boxed_slice(),
            pos: 0,
        }
    }

    fn remaining(&self) -> usize {
        self.mmap.len() - self.pos
    }

    fn is_terminal(&self) -> bool {
        true
    }

    fn advance(&mut self, n: usize) {
        debug_assert!(self.pos + n <= self.mmap.len());
        self.pos += n;
    }

    fn window(&self) -> &[u8] {
        let len = self.mmap.len();
        if len - self.pos <= WINDOW + GUARD {
            #[cfg(feature = "tracing")]
            tracing::trace!(pos = self.pos, "mmap cursor switched to tail guard copy");
            let tail_start = len.saturating_sub(WINDOW + GUARD);
            &self.tail[self.pos - tail_start..]
        } else {
            // More than a full window plus guard of real data follows
            // `pos`, including past wherever the current row's lane reads
            // could land, so those reads never reach the unmapped region
            // beyond the file's last page.
            &self.mmap[self.pos..]
        }
    }
}
