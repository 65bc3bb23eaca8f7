//! Host adapter that also forwards device motion as length-prefixed frames.
//!
//! Every [`CanonicalEvent::DeviceMotion`] queued on the wrapped host is
//! additionally written to the sink as one frame holding its record chain.
//! A failing sink is logged and never stops delivery to the host.

use std::io::Write;

use multihead_types::{encode_frame, CanonicalEvent, MotionRecord};
use tracing::{trace, warn};

use crate::error::InputError;
use crate::HostQueue;

pub struct FrameForwarder<H, W> {
    inner: H,
    sink: W,
    frames: u64,
}

impl<H, W> FrameForwarder<H, W>
where
    H: HostQueue,
    W: Write + Send + 'static,
{
    pub fn new(inner: H, sink: W) -> Self {
        Self {
            inner,
            sink,
            frames: 0,
        }
    }

    /// Frames successfully written so far.
    pub fn frames_written(&self) -> u64 {
        self.frames
    }

    pub fn sink(&self) -> &W {
        &self.sink
    }

    fn forward(&mut self, records: &[MotionRecord]) -> Result<(), InputError> {
        let frame = encode_frame(records)?;
        self.sink.write_all(&frame)?;
        self.frames += 1;
        trace!(records = records.len(), bytes = frame.len(), "forwarded motion frame");
        Ok(())
    }
}

impl<H, W> HostQueue for FrameForwarder<H, W>
where
    H: HostQueue,
    W: Write + Send + 'static,
{
    fn queue(&mut self, event: CanonicalEvent) {
        if let CanonicalEvent::DeviceMotion { device, records } = &event {
            if let Err(e) = self.forward(records) {
                warn!(%device, error = %e, "failed to forward device motion");
            }
        }
        self.inner.queue(event);
    }

    fn pointer_screen(&self) -> Option<usize> {
        self.inner.pointer_screen()
    }

    fn set_pointer_screen(&mut self, screen: usize, x: i32, y: i32) {
        self.inner.set_pointer_screen(screen, x, y);
    }

    fn flush(&mut self) {
        self.inner.flush();
        if let Err(e) = self.sink.flush() {
            warn!(error = %e, "failed to flush frame sink");
        }
    }

    fn process_input_events(&mut self) {
        self.inner.process_input_events();
    }
}
