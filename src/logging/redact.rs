//! Phone-number masking for log output.
//!
//! Any run of 10 or more ASCII digits keeps its first 6 digits and the rest
//! is replaced with [`MASK`]. This is a best-effort filter: long digit runs
//! that are not identities (order numbers, epoch millis) get masked too, and
//! identities shorter than 10 digits pass through untouched.

use std::borrow::Cow;
use std::io::{self, Write};
use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::{Level, Metadata};
use tracing_subscriber::fmt::MakeWriter;

/// Replacement for the hidden tail of a digit run.
pub const MASK: &str = "****";

const VISIBLE_DIGITS: usize = 6;

static DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]{10,}").expect("failed to compile digit-run regex"));

/// Mask long digit runs in `text`. Borrows when nothing matched.
pub fn redact(text: &str) -> Cow<'_, str> {
    DIGIT_RUN.replace_all(text, |caps: &Captures<'_>| {
        let run = &caps[0];
        format!("{}{}", &run[..VISIBLE_DIGITS], MASK)
    })
}

/// [`MakeWriter`] that redacts INFO, WARN and ERROR lines.
///
/// DEBUG and TRACE go through unchanged so local troubleshooting still
/// sees full identities.
#[derive(Debug, Clone)]
pub struct RedactingMakeWriter<M> {
    inner: M,
}

impl<M> RedactingMakeWriter<M> {
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

impl<'a, M> MakeWriter<'a> for RedactingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = RedactingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter {
            inner: self.inner.make_writer(),
            redact: true,
        }
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        RedactingWriter {
            inner: self.inner.make_writer_for(meta),
            redact: *meta.level() <= Level::INFO,
        }
    }
}

/// Writer produced by [`RedactingMakeWriter`].
///
/// The fmt layer hands over each formatted event in a single write, so a
/// digit run is never split across calls.
pub struct RedactingWriter<W> {
    inner: W,
    redact: bool,
}

impl<W: Write> Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.redact {
            return self.inner.write(buf);
        }

        match std::str::from_utf8(buf) {
            Ok(text) => {
                self.inner.write_all(redact(text).as_bytes())?;
                Ok(buf.len())
            }
            Err(_) => self.inner.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
