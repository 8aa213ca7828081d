use std::marker::PhantomData;

use log::trace;
use ocl::{flags, MemMap};

use crate::chunk::Chunk;
use crate::codec::ElementCodec;
use crate::error::{Error, Result};
use crate::session::Session;

/// A finite, non-restartable walk over a chunk's contents via sliding host
/// mappings.
///
/// At most one window (`Session`'s configured `map_window`, 64 MiB by
/// default) is mapped at a time. Must be closed explicitly; `Drop` is a
/// backstop only.
pub struct ChunkIter<T, C> {
    chunk: Option<Chunk<T>>,
    window_bytes: usize,
    cursor: usize,
    window: Option<MemMap<u8>>,
    window_offset: usize,
    _marker: PhantomData<C>,
}

impl<T, C: ElementCodec<T>> ChunkIter<T, C> {
    pub(crate) fn new(session: &Session, chunk: Chunk<T>) -> Self {
        ChunkIter {
            chunk: Some(chunk),
            window_bytes: session.config().map_window,
            cursor: 0,
            window: None,
            window_offset: 0,
            _marker: PhantomData,
        }
    }

    fn ensure_window(&mut self, idx: usize) -> Result<()> {
        let elem_size = C::size_of();
        let elems_per_window = self.window_bytes / elem_size;
        let needed_offset = (idx / elems_per_window) * elems_per_window;

        if self.window.is_some() && self.window_offset == needed_offset {
            return Ok(());
        }

        self.window.take();

        let chunk = self.chunk.as_ref().expect("chunk iterator already closed");
        let byte_offset = needed_offset * elem_size;
        let remaining_elems = chunk.elems().saturating_sub(needed_offset);
        let window_elems = elems_per_window.min(remaining_elems);
        let byte_len = window_elems * elem_size;

        let map: MemMap<u8> = unsafe {
            chunk
                .handle()
                .cmd()
                .map()
                .offset(byte_offset)
                .len(byte_len)
                .flags(flags::MAP_READ)
                .ewait(chunk.ready())
                .enq()
                .map_err(|e| Error::device(e, "chunk iterator map"))?
        };

        trace!(
            "chunk iterator: mapped window at elem offset {} ({} elems)",
            needed_offset,
            window_elems
        );
        self.window = Some(map);
        self.window_offset = needed_offset;
        Ok(())
    }

    /// Unmaps the current window (if any) and releases the chunk. Idempotent.
    pub fn close(&mut self) {
        self.window.take();
        if let Some(mut chunk) = self.chunk.take() {
            chunk.close();
        }
    }
}

impl<T, C: ElementCodec<T>> Iterator for ChunkIter<T, C> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let chunk_elems = self.chunk.as_ref()?.elems();
        if self.cursor >= chunk_elems {
            return None;
        }

        if let Err(e) = self.ensure_window(self.cursor) {
            return Some(Err(e));
        }

        let elem_size = C::size_of();
        let local_idx = self.cursor - self.window_offset;
        let start = local_idx * elem_size;
        let window = self.window.as_ref().expect("window just ensured");
        let value = C::decode(local_idx, &window[start..start + elem_size]);
        self.cursor += 1;
        Some(Ok(value))
    }
}

impl<T, C: ElementCodec<T>> Drop for ChunkIter<T, C> {
    fn drop(&mut self) {
        if self.chunk.is_some() {
            trace!("chunk iterator dropped without explicit close");
        }
        self.close();
    }
}
