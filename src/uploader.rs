use std::iter::Peekable;
use std::marker::PhantomData;

use log::trace;
use ocl::{flags, Buffer, Event};

use crate::chunk::Chunk;
use crate::codec::ElementCodec;
use crate::error::{Error, Result};
use crate::session::Session;

/// The chunk sizes `Uploader` would produce for `total_elems` logical
/// elements given a per-chunk cap of `cap_elems`: every chunk but the last
/// is exactly `cap_elems`, and the last holds whatever remains.
pub(crate) fn chunk_sizes(total_elems: usize, cap_elems: usize) -> Vec<usize> {
    if cap_elems == 0 || total_elems == 0 {
        return Vec::new();
    }
    let mut sizes = Vec::new();
    let mut remaining = total_elems;
    while remaining > 0 {
        let take = remaining.min(cap_elems);
        sizes.push(take);
        remaining -= take;
    }
    sizes
}

/// Lazily turns a host element sequence into device-resident [`Chunk`]s.
///
/// Each `next()` call allocates a host-visible staging buffer, encodes as
/// many elements as fit (or as many as the source has left), and either
/// hands that buffer straight to the caller (unified policy) or stages a
/// copy into a freshly allocated device-only buffer (staged policy). See
/// `Session::unified_policy` for which branch a given device takes.
pub struct Uploader<T, C, I: Iterator<Item = T>> {
    session: Session,
    host_seq: Peekable<I>,
    group_size: usize,
    _marker: PhantomData<(T, C)>,
}

impl<T, C, I> Uploader<T, C, I>
where
    C: ElementCodec<T>,
    I: Iterator<Item = T>,
{
    pub(crate) fn new(session: Session, host_seq: I, group_size: usize) -> Self {
        Uploader {
            session,
            host_seq: host_seq.peekable(),
            group_size,
            _marker: PhantomData,
        }
    }

    fn next_chunk(&mut self) -> Result<Option<Chunk<T>>> {
        if self.host_seq.peek().is_none() {
            return Ok(None);
        }

        let elem_size = C::size_of();
        let cap_elems = self.group_size / elem_size;

        let host_buf = Buffer::<u8>::builder()
            .queue(self.session.queue().clone())
            .flags(flags::MEM_READ_WRITE | flags::MEM_ALLOC_HOST_PTR)
            .len(self.group_size)
            .build()
            .map_err(|e| Error::device(e, "uploader host buffer allocation"))?;

        let mut map = unsafe {
            host_buf
                .cmd()
                .map()
                .flags(flags::MAP_WRITE_INVALIDATE_REGION)
                .enq()
                .map_err(|e| Error::device(e, "uploader map"))?
        };

        let mut copied = 0usize;
        while copied < cap_elems {
            match self.host_seq.next() {
                Some(value) => {
                    let start = copied * elem_size;
                    C::encode(copied, &mut map[start..start + elem_size], value);
                    copied += 1;
                }
                None => break,
            }
        }

        let mut unmap_event = Event::empty();
        map.unmap()
            .enew(&mut unmap_event)
            .enq()
            .map_err(|e| Error::device(e, "uploader unmap"))?;

        if self.session.unified_policy() {
            trace!("uploader: unified chunk of {} elems", copied);
            return Ok(Some(Chunk::new(copied, self.group_size, host_buf, unmap_event)));
        }

        let device_buf = Buffer::<u8>::builder()
            .queue(self.session.queue().clone())
            .flags(flags::MEM_READ_ONLY)
            .len(copied * elem_size)
            .build()
            .map_err(|e| Error::device(e, "uploader device buffer allocation"))?;

        let mut ready = Event::empty();
        unsafe {
            host_buf
                .cmd()
                .copy(&device_buf, None, Some(copied * elem_size))
                .ewait(&unmap_event)
                .enew(&mut ready)
                .enq()
                .map_err(|e| Error::device(e, "uploader staging copy"))?;
        }

        trace!("uploader: staged chunk of {} elems", copied);
        Ok(Some(Chunk::new(copied, copied * elem_size, device_buf, ready)))
    }
}

impl<T, C, I> Iterator for Uploader<T, C, I>
where
    C: ElementCodec<T>,
    I: Iterator<Item = T>,
{
    type Item = Result<Chunk<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_chunk().transpose()
    }
}
