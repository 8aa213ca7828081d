use std::os::raw::c_void;
use std::thread;
use std::time::Duration;

use futures::sync::oneshot;
use futures::{Async, Future, Poll};
use log::trace;
use ocl::core::{self, CommandExecutionStatus, Status};
use ocl::ffi::cl_event;
use ocl::{DeviceType, Event, EventList, SpatialDims};

use crate::chunk::Chunk;
use crate::codec::ElementCodec;
use crate::dispatch::call_kernel;
use crate::dust_pool::DustBuf;
use crate::error::{Error, Result};
use crate::session::Session;
use crate::source_key::SourceKey;

/// Halves `n_groups` until its stage-1 partial array fits in a dust buffer.
/// Returns `None` if even a single group's result doesn't fit.
pub(crate) fn shrink_n_groups(mut n_groups: usize, elem_size: usize, dust_size: usize) -> Option<usize> {
    while n_groups > 1 && n_groups * elem_size > dust_size {
        n_groups /= 2;
    }
    if n_groups * elem_size > dust_size {
        None
    } else {
        Some(n_groups)
    }
}

/// Future returned by [`Session::reduce_chunk`](crate::Session::reduce_chunk).
///
/// Resolves once the final read-back's completion callback decodes the
/// result. Dropping this future before it resolves does not cancel the
/// in-flight device work: the callback is the sole releaser of the dust
/// buffers it holds, and runs regardless of whether anything is still
/// listening for its result.
pub struct ReduceFuture<B> {
    rx: oneshot::Receiver<Result<B>>,
}

const ASYNC_BLOCK_POLL_INTERVAL: Duration = Duration::from_millis(1);

impl<B> Future for ReduceFuture<B> {
    type Item = B;
    type Error = Error;

    fn poll(&mut self) -> Poll<Self::Item, Self::Error> {
        loop {
            match self.rx.poll() {
                Ok(Async::Ready(Ok(value))) => return Ok(Async::Ready(value)),
                Ok(Async::Ready(Err(e))) => return Err(e),
                Ok(Async::NotReady) => {
                    if !cfg!(feature = "async_block") {
                        return Ok(Async::NotReady);
                    }
                    thread::sleep(ASYNC_BLOCK_POLL_INTERVAL);
                }
                Err(canceled) => return Err(canceled.into()),
            }
        }
    }
}

struct CallbackCtx<B> {
    host_window: Vec<u8>,
    tx: oneshot::Sender<Result<B>>,
    decode: fn(&[u8]) -> B,
    // Held only to return to the pool when this context drops.
    _reduce_buf: DustBuf,
    _res_buf: DustBuf,
}

extern "C" fn resolve_reduce<B>(_event_ptr: cl_event, status: i32, user_data: *mut c_void) {
    let ctx = unsafe { Box::from_raw(user_data as *mut CallbackCtx<B>) };
    let result = if status == CommandExecutionStatus::Complete as i32 {
        Ok((ctx.decode)(&ctx.host_window))
    } else {
        let desc = match Status::from_i32(status) {
            Some(status) => format!("{:?}", status),
            None => format!("unrecognized status {}", status),
        };
        let source: ocl::Error = core::Error::from(desc).into();
        Err(Error::device(source, "reduce read-back completion callback"))
    };
    let _ = ctx.tx.send(result);
    // `ctx` drops here: `_reduce_buf`/`_res_buf` return to the dust pool.
}

/// Two-stage tree reduction: stage 1 folds the chunk into `n_groups`
/// partials, stage 2 folds those into a single result, which is read back
/// non-blockingly and decoded once the read-back completes.
pub(crate) fn reduce_chunk<B, CB, K>(
    session: &Session,
    chunk: &Chunk<B>,
    kernel_name: &str,
    source_key: &K,
    decode: fn(&[u8]) -> B,
) -> Result<ReduceFuture<B>>
where
    CB: ElementCodec<B>,
    K: SourceKey,
    B: Send + 'static,
{
    let elem_size = CB::size_of();
    let dust_size = session.dust_pool().dust_size();

    let (mut n_groups, n_local) = if session.device_type() == DeviceType::CPU {
        (session.config().n_groups_cpu, session.config().n_local_cpu)
    } else {
        (session.config().n_groups_gpu, session.config().n_local_gpu)
    };

    let n_groups = match shrink_n_groups(n_groups, elem_size, dust_size) {
        Some(n) => n,
        None => {
            return Err(Error::Precondition(format!(
                "dust buffer ({} bytes) too small to hold even one reduce group result ({} bytes)",
                dust_size, elem_size
            )))
        }
    };

    let reduce_buf = session.dust_pool().get();
    let res_buf = session.dust_pool().get();

    let program1 = session.program_cache().get_or_build(source_key)?;
    let stage2_key = source_key.stage2();
    let program2 = session.program_cache().get_or_build(&stage2_key)?;

    let elems = chunk.elems() as u32;
    let input_handle = chunk.handle().clone();
    let reduce_handle = reduce_buf.as_buffer().clone();
    let reduce_handle_stage1 = reduce_handle.clone();

    let wait1: EventList = chunk.ready().clone().into();
    let gws1 = SpatialDims::One(n_local * n_groups);
    let lws = SpatialDims::One(n_local);
    let local_scratch_bytes = n_local * elem_size;

    let ready1 = call_kernel(
        &program1,
        session.queue(),
        kernel_name,
        move |b| {
            b.arg(&input_handle);
            b.arg(&reduce_handle_stage1);
            b.arg_local::<u8>(local_scratch_bytes);
            b.arg(&elems);
            Ok(())
        },
        &wait1,
        gws1,
        Some(lws),
        session.exec_ns(),
    )?;

    let res_handle = res_buf.as_buffer().clone();
    let n_groups_u32 = n_groups as u32;
    let wait2: EventList = ready1.into();
    let gws2 = SpatialDims::One(n_local);

    let ready2 = call_kernel(
        &program2,
        session.queue(),
        kernel_name,
        move |b| {
            b.arg(&reduce_handle);
            b.arg(&res_handle);
            b.arg_local::<u8>(local_scratch_bytes);
            b.arg(&n_groups_u32);
            Ok(())
        },
        &wait2,
        gws2,
        Some(lws),
        session.exec_ns(),
    )?;

    let mut host_window = vec![0u8; elem_size];
    let mut finished = Event::empty();
    unsafe {
        res_buf
            .as_buffer()
            .cmd()
            .read(&mut host_window)
            .ewait(&ready2)
            .enew(&mut finished)
            .block(false)
            .enq()
            .map_err(|e| Error::device(e, "reduce read-back"))?;
    }

    let (tx, rx) = oneshot::channel();
    let ctx = Box::new(CallbackCtx {
        host_window,
        tx,
        decode,
        _reduce_buf: reduce_buf,
        _res_buf: res_buf,
    });

    unsafe {
        core::set_event_callback(
            &finished,
            CommandExecutionStatus::Complete,
            Some(resolve_reduce::<B>),
            Box::into_raw(ctx) as *mut c_void,
        )
        .map_err(|e| Error::device(e.into(), "reduce callback registration"))?;
    }

    trace!(
        "reduce_chunk: dispatched {} groups x {} local over {} elems",
        n_groups,
        n_local,
        elems
    );

    Ok(ReduceFuture { rx })
}
