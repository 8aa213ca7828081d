use std::marker::PhantomData;

use log::trace;
use ocl::{Buffer, Event};

/// A device-resident, logically typed array paired with a readiness event.
///
/// `Chunk` is single-owner: it is deliberately not `Clone`. Its last
/// consumer calls [`close`](Chunk::close) explicitly; `Drop` releases the
/// buffer as a backstop if that was skipped, which is logged at `trace`
/// level as a reminder the explicit path was missed.
#[derive(Debug)]
pub struct Chunk<T> {
    elems: usize,
    space: usize,
    handle: Option<Buffer<u8>>,
    ready: Event,
    _marker: PhantomData<T>,
}

impl<T> Chunk<T> {
    pub(crate) fn new(elems: usize, space: usize, handle: Buffer<u8>, ready: Event) -> Self {
        Chunk {
            elems,
            space,
            handle: Some(handle),
            ready,
            _marker: PhantomData,
        }
    }

    /// Number of logical elements held.
    pub fn elems(&self) -> usize {
        self.elems
    }

    /// Allocated byte capacity of the underlying buffer.
    pub fn space(&self) -> usize {
        self.space
    }

    /// The event that fires once the chunk's contents are ready to read.
    pub fn ready(&self) -> &Event {
        &self.ready
    }

    pub(crate) fn handle(&self) -> &Buffer<u8> {
        self.handle.as_ref().expect("chunk already closed")
    }

    /// Consumes the chunk, handing back its raw parts. Used by the map
    /// engine's in-place path, which reuses the handle under a new element
    /// type without an intervening retain.
    pub(crate) fn into_parts(mut self) -> (usize, usize, Buffer<u8>, Event) {
        let handle = self.handle.take().expect("chunk already closed");
        let ready = std::mem::replace(&mut self.ready, Event::empty());
        (self.elems, self.space, handle, ready)
    }

    /// Releases the device buffer. Idempotent.
    pub fn close(&mut self) {
        if let Some(handle) = self.handle.take() {
            drop(handle);
            trace!("chunk closed ({} elems)", self.elems);
        }
    }
}

impl<T> Drop for Chunk<T> {
    fn drop(&mut self) {
        if self.handle.is_some() {
            trace!("chunk dropped without explicit close");
        }
        self.close();
    }
}
