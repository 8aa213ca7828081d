use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::debug;
use ocl::enums::{DeviceInfo, DeviceInfoResult};
use ocl::{Context, Device, DeviceType, Queue};

use crate::chunk::Chunk;
use crate::chunk_iter::ChunkIter;
use crate::codec::ElementCodec;
use crate::config::SessionConfig;
use crate::dust_pool::DustPool;
use crate::error::{Error, Result};
use crate::program_cache::ProgramCache;
use crate::reduce_engine::ReduceFuture;
use crate::source_key::SourceKey;
use crate::uploader::Uploader;
use crate::{map_engine, reduce_engine};

pub(crate) fn decide_unified(host_unified: bool, vendor: &str) -> bool {
    host_unified || vendor.to_lowercase().contains("nvidia")
}

fn unified_policy(device: &Device) -> Result<bool> {
    let host_unified = match device.info(DeviceInfo::HostUnifiedMemory) {
        Ok(DeviceInfoResult::HostUnifiedMemory(b)) => b,
        Ok(_) => false,
        Err(e) => return Err(Error::device(e, "query HostUnifiedMemory")),
    };
    let vendor = device
        .vendor()
        .map_err(|e| Error::device(e, "query device vendor"))?;
    Ok(decide_unified(host_unified, &vendor))
}

struct Inner {
    context: Context,
    queue: Queue,
    device: Device,
    device_type: DeviceType,
    config: SessionConfig,
    program_cache: ProgramCache,
    dust_pool: DustPool,
    exec_ns: Arc<AtomicU64>,
    unified: bool,
}

/// Owns the context/queue/device triple, the program cache, the dust pool,
/// and the profiling counter; the entry point for every engine operation.
///
/// Cheaply `Clone`-able (an `Arc`-shared inner), so it can be handed to
/// closures invoked from completion callbacks.
#[derive(Clone)]
pub struct Session {
    inner: Arc<Inner>,
}

impl Session {
    /// Builds a session atop caller-supplied context/queue/device handles.
    ///
    /// Computes the unified-vs-staged upload policy once, here, by querying
    /// the device; that decision does not change for the session's life.
    pub fn new(context: Context, queue: Queue, device: Device, config: SessionConfig) -> Result<Session> {
        let unified = unified_policy(&device)?;
        let device_type = match device.info(DeviceInfo::Type) {
            Ok(DeviceInfoResult::Type(t)) => t,
            Ok(_) => return Err(Error::Precondition("unexpected DeviceInfo::Type result".into())),
            Err(e) => return Err(Error::device(e, "query device type")),
        };

        debug!(
            "session: unified={} device_type={:?} dust_count={} dust_size={}",
            unified, device_type, config.dust_count, config.dust_size
        );

        let program_cache = ProgramCache::new(
            context.clone(),
            device.clone(),
            config.program_cache_capacity,
            config.build_options,
        );
        let dust_pool = DustPool::new(&queue, config.dust_size, config.dust_count)?;

        Ok(Session {
            inner: Arc::new(Inner {
                context,
                queue,
                device,
                device_type,
                config,
                program_cache,
                dust_pool,
                exec_ns: Arc::new(AtomicU64::new(0)),
                unified,
            }),
        })
    }

    /// Cumulative device execution time (end minus queued, across every
    /// kernel this session has dispatched), accumulated from completion
    /// callbacks.
    pub fn execution_time_ns(&self) -> u64 {
        self.inner.exec_ns.load(Ordering::Relaxed)
    }

    /// Lazily streams `host_seq` into device-resident chunks of roughly
    /// `group_size` bytes each.
    pub fn stream<T, C, I>(&self, host_seq: I, group_size: usize) -> Uploader<T, C, I>
    where
        C: ElementCodec<T>,
        I: Iterator<Item = T>,
    {
        Uploader::new(self.clone(), host_seq, group_size)
    }

    /// Dispatches a one-to-one kernel over `input`.
    pub fn map_chunk<A, B, CA, CB, K>(
        &self,
        input: Chunk<A>,
        kernel_name: &str,
        source_key: &K,
        destructive: bool,
    ) -> Result<Chunk<B>>
    where
        CA: ElementCodec<A>,
        CB: ElementCodec<B>,
        K: SourceKey,
    {
        map_engine::map_chunk::<A, B, CA, CB, K>(self, input, kernel_name, source_key, destructive)
    }

    /// Dispatches a two-stage tree reduction over `chunk`, returning a
    /// future that resolves once the result is read back and decoded.
    pub fn reduce_chunk<B, CB, K>(
        &self,
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
        reduce_engine::reduce_chunk::<B, CB, K>(self, chunk, kernel_name, source_key, decode)
    }

    /// Hands back an iterator that walks `chunk`'s contents host-side
    /// through sliding mapped windows.
    pub fn iterate<T, C>(&self, chunk: Chunk<T>) -> ChunkIter<T, C>
    where
        C: ElementCodec<T>,
    {
        ChunkIter::new(self, chunk)
    }

    pub(crate) fn queue(&self) -> &Queue {
        &self.inner.queue
    }

    pub(crate) fn context(&self) -> &Context {
        &self.inner.context
    }

    pub(crate) fn device(&self) -> &Device {
        &self.inner.device
    }

    pub(crate) fn device_type(&self) -> DeviceType {
        self.inner.device_type
    }

    pub(crate) fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    pub(crate) fn program_cache(&self) -> &ProgramCache {
        &self.inner.program_cache
    }

    pub(crate) fn dust_pool(&self) -> &DustPool {
        &self.inner.dust_pool
    }

    pub(crate) fn unified_policy(&self) -> bool {
        self.inner.unified
    }

    pub(crate) fn exec_ns(&self) -> &Arc<AtomicU64> {
        &self.inner.exec_ns
    }
}
