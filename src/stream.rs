//! Incremental delivery of synthesized audio.

use crate::wave::Wave;

/// Samples that must be pending before a chunk is handed out.
pub const DEFAULT_MIN_BUFFSIZE: usize = 256;

/// What a sink wants the synthesizer to do after taking a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamAction {
    Continue,
    Stop,
}

/// Receives audio while it is being synthesized.
///
/// `deliver` is called synchronously from inside the synthesis loop with the
/// wave built so far and the range of samples not yet delivered.
pub trait StreamingSink {
    /// Minimum number of undelivered samples that triggers a delivery.
    fn min_buffsize(&self) -> usize {
        DEFAULT_MIN_BUFFSIZE
    }

    /// Takes `wave.samples()[start..start + len]`. `last` is set on the
    /// final flush, whose return value is ignored.
    fn deliver(&mut self, wave: &Wave, start: usize, len: usize, last: bool) -> StreamAction;
}

/// A sink backed by a closure.
pub struct CallbackSink<F> {
    callback: F,
    min_buffsize: usize,
}

impl<F> CallbackSink<F>
where
    F: FnMut(&Wave, usize, usize, bool) -> StreamAction,
{
    pub fn new(callback: F) -> Self {
        Self::with_min_buffsize(callback, DEFAULT_MIN_BUFFSIZE)
    }

    pub fn with_min_buffsize(callback: F, min_buffsize: usize) -> Self {
        CallbackSink {
            callback,
            min_buffsize,
        }
    }
}

impl<F> StreamingSink for CallbackSink<F>
where
    F: FnMut(&Wave, usize, usize, bool) -> StreamAction,
{
    fn min_buffsize(&self) -> usize {
        self.min_buffsize
    }

    fn deliver(&mut self, wave: &Wave, start: usize, len: usize, last: bool) -> StreamAction {
        (self.callback)(wave, start, len, last)
    }
}
