use log::trace;
use ocl::{flags, Buffer, Event, EventList, SpatialDims};

use crate::chunk::Chunk;
use crate::codec::ElementCodec;
use crate::dispatch::call_kernel;
use crate::error::{Error, Result};
use crate::session::Session;
use crate::source_key::SourceKey;

/// One-to-one kernel dispatch over a chunk.
///
/// `destructive && CA::size_of() == CB::size_of()` reuses the input handle
/// in place, moving the input `Chunk` into the returned one (there is never
/// a second owner of that handle to double-release). Otherwise a fresh
/// output buffer is allocated and, if `destructive`, the input is closed
/// once the kernel has been enqueued — on the success path and the failure
/// path alike, matching the non-destructive contract of leaving a
/// non-destructive call's input untouched.
pub(crate) fn map_chunk<A, B, CA, CB, K>(
    session: &Session,
    mut input: Chunk<A>,
    kernel_name: &str,
    source_key: &K,
    destructive: bool,
) -> Result<Chunk<B>>
where
    CA: ElementCodec<A>,
    CB: ElementCodec<B>,
    K: SourceKey,
{
    let in_place = destructive && CA::size_of() == CB::size_of();
    let elems = input.elems();
    let gws = SpatialDims::One(elems);
    let program = session.program_cache().get_or_build(source_key)?;

    if in_place {
        let (elems, space, handle, ready) = input.into_parts();
        let wait: EventList = ready.into();
        let arg_handle = handle.clone();

        let new_event = call_kernel(
            &program,
            session.queue(),
            kernel_name,
            move |b| {
                b.arg(&arg_handle);
                Ok(())
            },
            &wait,
            gws,
            None,
            session.exec_ns(),
        )?;

        trace!("map_chunk: in-place dispatch over {} elems", elems);
        return Ok(Chunk::new(elems, space, handle, new_event));
    }

    let out_space = elems * CB::size_of();
    let output = Buffer::<u8>::builder()
        .queue(session.queue().clone())
        .flags(flags::MEM_READ_WRITE)
        .len(out_space)
        .build()
        .map_err(|e| Error::device(e, "map_chunk output allocation"))?;

    let input_handle = input.handle().clone();
    let output_arg = output.clone();
    let wait: EventList = input.ready().clone().into();

    let dispatch_result = call_kernel(
        &program,
        session.queue(),
        kernel_name,
        move |b| {
            b.arg(&input_handle);
            b.arg(&output_arg);
            Ok(())
        },
        &wait,
        gws,
        None,
        session.exec_ns(),
    );

    if destructive {
        input.close();
    }

    let new_event: Event = dispatch_result?;
    trace!("map_chunk: new-buffer dispatch over {} elems", elems);
    Ok(Chunk::new(elems, out_space, output, new_event))
}
