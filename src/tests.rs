//! Test suite split by what each layer needs to exercise it.
//!
//! `chunking` and `codec_and_keys` cover pure host-side logic and need no
//! device at all. `device` drives a real session end-to-end against
//! whatever OpenCL platform the test machine exposes.

mod chunking;
mod codec_and_keys;
