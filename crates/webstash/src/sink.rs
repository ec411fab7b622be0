//! # Payload Sinks
//!
//! The delivery seam between the engine and whatever consumes the fetched
//! bytes (an image surface, a material, a plain callback). A sink is a single
//! capability selected once at request construction; the coordinator never
//! inspects what is behind it.

use crate::request::Payload;

/// Consumer of a delivered payload.
pub trait PayloadSink: Send + Sync {
    fn apply(&self, payload: &Payload);
}

/// Sink adapter wrapping a plain closure.
pub struct CallbackSink<F>(F);

impl<F> CallbackSink<F>
where
    F: Fn(&Payload) + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> PayloadSink for CallbackSink<F>
where
    F: Fn(&Payload) + Send + Sync,
{
    fn apply(&self, payload: &Payload) {
        (self.0)(payload)
    }
}
