//! Chunked streaming, kernel dispatch, and two-stage reduction engine for
//! GPU compute sessions.
//!
//! This crate sits on top of [`ocl`], which supplies the context/queue/
//! device/buffer/event/program/kernel types and their reference-counted
//! lifetime discipline. What's built here is the layer above that: a
//! [`Session`] owning a program cache and a small-buffer pool, an uploader
//! that turns a host element stream into device-resident [`Chunk`]s, a map
//! and two-stage reduce engine, and a windowed host-side [`ChunkIter`].
//!
//! Nothing here creates a platform, device, or context — callers bootstrap
//! those with `ocl` directly and hand them to [`Session::new`].

pub extern crate ocl;

mod chunk;
mod chunk_iter;
mod codec;
mod config;
mod dispatch;
mod dust_pool;
pub mod error;
mod map_engine;
mod program_cache;
mod reduce_engine;
mod session;
mod source_key;
mod uploader;

pub use crate::chunk::Chunk;
pub use crate::chunk_iter::ChunkIter;
pub use crate::codec::ElementCodec;
pub use crate::config::SessionConfig;
pub use crate::error::{Error, Result};
pub use crate::reduce_engine::ReduceFuture;
pub use crate::session::Session;
pub use crate::source_key::SourceKey;
pub use crate::uploader::Uploader;

#[cfg(test)]
mod tests;
