use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_queue::ArrayQueue;
use log::trace;
use ocl::{Buffer, Queue};

use crate::error::{Error, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A dust buffer checked out from a [`DustPool`].
///
/// Returns itself to the pool on drop; there is no explicit `put` — the
/// pool's `get`/`Drop` pair is the entire interface, giving a blocking
/// acquire paired with a release that can't fail and so has nothing for a
/// fallible `put` to report.
#[derive(Debug)]
pub struct DustBuf {
    buffer: Option<Buffer<u8>>,
    pool: Arc<ArrayQueue<Buffer<u8>>>,
}

impl DustBuf {
    pub(crate) fn as_buffer(&self) -> &Buffer<u8> {
        self.buffer.as_ref().expect("dust buffer already returned")
    }
}

impl Drop for DustBuf {
    fn drop(&mut self) {
        if let Some(buf) = self.buffer.take() {
            if self.pool.push(buf).is_err() {
                trace!("dust pool full on return; dropping buffer instead");
            }
        }
    }
}

/// Bounded freelist of small, fixed-size device buffers.
///
/// Sized once at construction; the engine never grows or shrinks it.
#[derive(Debug, Clone)]
pub struct DustPool {
    queue: Arc<ArrayQueue<Buffer<u8>>>,
    dust_size: usize,
}

impl DustPool {
    pub(crate) fn new(queue: &Queue, dust_size: usize, count: usize) -> Result<DustPool> {
        let pool = ArrayQueue::new(count);
        for _ in 0..count {
            let buf = Buffer::<u8>::builder()
                .queue(queue.clone())
                .flags(ocl::flags::MEM_READ_WRITE)
                .len(dust_size)
                .build()
                .map_err(|e| Error::device(e, "dust pool buffer allocation"))?;
            // `count` buffers into a queue of capacity `count` never fails.
            let _ = pool.push(buf);
        }
        Ok(DustPool {
            queue: Arc::new(pool),
            dust_size,
        })
    }

    pub(crate) fn dust_size(&self) -> usize {
        self.dust_size
    }

    /// Number of buffers currently idle in the pool. Test/diagnostic use.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Blocks until a buffer is available.
    pub(crate) fn get(&self) -> DustBuf {
        loop {
            if let Ok(buf) = self.queue.pop() {
                return DustBuf {
                    buffer: Some(buf),
                    pool: self.queue.clone(),
                };
            }
            trace!("dust pool exhausted, waiting");
            thread::sleep(POLL_INTERVAL);
        }
    }
}
