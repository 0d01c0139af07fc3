//! Scoped native event subscriptions.
//!
//! A `Subscriptions` value owns the handles it acquired from the
//! [`EventSource`]. Releasing unsubscribes every handle exactly once; dropping
//! the value releases it. Owners decide the scope: the controller for
//! lifecycle signals, an open session for progress, the motion listener for
//! activity transitions.

use std::sync::Arc;

use crate::native::{EventChannel, EventSource, NativeError};

pub struct Subscriptions {
    source: Arc<dyn EventSource>,
    handles: Vec<(EventChannel, u64)>,
}

impl Subscriptions {
    pub fn new(source: Arc<dyn EventSource>) -> Self {
        Self {
            source,
            handles: Vec::new(),
        }
    }

    /// Subscribes to `channel` unless a handle for it is already held.
    pub fn acquire(&mut self, channel: EventChannel) -> Result<(), NativeError> {
        if self.is_subscribed(channel) {
            return Ok(());
        }
        let handle = self.source.subscribe(channel)?;
        tracing::debug!(?channel, handle, "Subscribed to native events");
        self.handles.push((channel, handle));
        Ok(())
    }

    pub fn is_subscribed(&self, channel: EventChannel) -> bool {
        self.handles.iter().any(|(held, _)| *held == channel)
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Unsubscribes every held handle. Later calls are no-ops.
    pub fn release(&mut self) {
        for (channel, handle) in self.handles.drain(..) {
            if let Err(err) = self.source.unsubscribe(handle) {
                tracing::warn!(?channel, handle, error = %err, "Failed to unsubscribe");
            }
        }
    }
}

impl Drop for Subscriptions {
    fn drop(&mut self) {
        self.release();
    }
}
