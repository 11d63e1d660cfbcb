//! The abstract output collaborator the driver writes the listing
//! through (§4.6 of the design notes) — keeps the run loop decoupled
//! from a concrete stdout handle, so it can be pointed at a file or an
//! in-memory buffer (as the unit tests below do) without touching the
//! loop itself.

use std::io::{self, Write};

/// Destination for the textual listing. The executable's `main` builds
/// the only stdout-backed instance; nothing else in this crate
/// constructs one.
pub trait Sink {
    /// Writes `text` verbatim — callers include their own line endings.
    fn emit(&mut self, text: &str) -> io::Result<()>;
}

/// Adapts any [`Write`] into a [`Sink`].
pub struct WriteSink<W: Write>(pub W);

impl<W: Write> Sink for WriteSink<W> {
    fn emit(&mut self, text: &str) -> io::Result<()> {
        self.0.write_all(text.as_bytes())
    }
}
