use std::os::raw::c_void;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::trace;
use ocl::core::{self, CommandExecutionStatus, Event as EventCore, ProfilingInfo, ProfilingInfoResult};
use ocl::ffi::cl_event;
use ocl::{builders::KernelBuilder, Event, EventList, Kernel, Program, Queue, SpatialDims};

use crate::error::{Error, Result};

fn box_raw_void<T>(item: T) -> *mut c_void {
    Box::into_raw(Box::new(item)) as *mut c_void
}

/// Folds `end - queued` for the just-completed event into the session's
/// `execution_time_ns` counter. Runs on a binding-internal callback thread.
extern "C" fn accumulate_exec_time(event_ptr: cl_event, status: i32, user_data: *mut c_void) {
    let counter = unsafe { Box::from_raw(user_data as *mut Arc<AtomicU64>) };
    if status != CommandExecutionStatus::Complete as i32 {
        return;
    }
    let event = match unsafe { EventCore::from_raw_copied_ptr(event_ptr) } {
        Ok(event) => event,
        Err(_) => return,
    };
    let queued = core::get_event_profiling_info(&event, ProfilingInfo::Queued);
    let end = core::get_event_profiling_info(&event, ProfilingInfo::End);
    if let (Ok(ProfilingInfoResult::Queued(queued)), Ok(ProfilingInfoResult::End(end))) =
        (queued, end)
    {
        counter.fetch_add(end.saturating_sub(queued), Ordering::Relaxed);
    }
}

/// Resolves a program, sets arguments via `configure`, enqueues an N-D
/// range kernel launch dependent on `wait_events`, and wires a completion
/// callback that profiles the launch into `exec_ns`.
pub(crate) fn call_kernel<F>(
    program: &Program,
    queue: &Queue,
    kernel_name: &str,
    configure: F,
    wait_events: &EventList,
    gws: SpatialDims,
    lws: Option<SpatialDims>,
    exec_ns: &Arc<AtomicU64>,
) -> Result<Event>
where
    F: FnOnce(&mut KernelBuilder) -> Result<()>,
{
    let mut builder = Kernel::builder();
    builder
        .program(program)
        .name(kernel_name)
        .queue(queue.clone())
        .global_work_size(gws);
    if let Some(lws) = lws {
        builder.local_work_size(lws);
    }
    configure(&mut builder)?;

    let kernel = builder
        .build()
        .map_err(|e| Error::device(e, "kernel build"))?;

    if cfg!(feature = "kernel_debug_print") {
        println!(
            "call_kernel('{}'): gws: {:?}, lws: {:?}, wait_events: {}",
            kernel_name,
            gws,
            lws,
            wait_events.len()
        );
    }

    let mut new_event = Event::empty();
    unsafe {
        kernel
            .cmd()
            .ewait(wait_events)
            .enew(&mut new_event)
            .enq()
            .map_err(|e| Error::device(e, "kernel enqueue"))?;
    }
    trace!("enqueued kernel '{}'", kernel_name);

    let counter = box_raw_void(exec_ns.clone());
    unsafe {
        core::set_event_callback(
            &new_event,
            CommandExecutionStatus::Complete,
            Some(accumulate_exec_time),
            counter,
        )
        .map_err(|e| Error::device(e.into(), "profiling callback registration"))?;
    }

    Ok(new_event)
}
