use std::collections::HashMap;
use std::sync::{Condvar, Mutex};

use log::{debug, trace};
use ocl::{Context, Device, Program};

use crate::error::{Error, Result};
use crate::source_key::SourceKey;

enum Slot {
    Building,
    Built(Program),
}

struct Inner {
    capacity: usize,
    map: HashMap<String, Slot>,
}

/// Bounded source-key → compiled-program cache.
///
/// A concurrent miss on the same key compiles exactly once; other callers
/// block on the condvar until the in-progress build resolves.
pub(crate) struct ProgramCache {
    context: Context,
    device: Device,
    build_options: &'static str,
    inner: Mutex<Inner>,
    cond: Condvar,
}

impl ProgramCache {
    pub(crate) fn new(
        context: Context,
        device: Device,
        capacity: usize,
        build_options: &'static str,
    ) -> ProgramCache {
        ProgramCache {
            context,
            device,
            build_options,
            inner: Mutex::new(Inner {
                capacity,
                map: HashMap::new(),
            }),
            cond: Condvar::new(),
        }
    }

    pub(crate) fn get_or_build<K: SourceKey>(&self, key: &K) -> Result<Program> {
        let cache_key = key.cache_key();

        let mut guard = self.inner.lock().unwrap();
        loop {
            match guard.map.get(&cache_key) {
                Some(Slot::Built(program)) => return Ok(program.clone()),
                Some(Slot::Building) => {
                    guard = self.cond.wait(guard).unwrap();
                }
                None => {
                    guard.map.insert(cache_key.clone(), Slot::Building);
                    break;
                }
            }
        }
        drop(guard);

        trace!("compiling program for source key {}", cache_key);
        let fragments = key.generate_source();
        let src = fragments.join("\n");

        let build_result = Program::builder()
            .src(src)
            .devices(self.device.clone())
            .cmplr_opt(self.build_options)
            .build(&self.context);

        let mut guard = self.inner.lock().unwrap();
        let result = match build_result {
            Ok(program) => {
                if guard.map.len() >= guard.capacity {
                    debug!(
                        "program cache holds {} entries, at or over its {}-entry capacity; \
                         not evicting since in-flight programs must stay retained",
                        guard.map.len(),
                        guard.capacity
                    );
                }
                guard.map.insert(cache_key.clone(), Slot::Built(program.clone()));
                Ok(program)
            }
            Err(e) => {
                guard.map.remove(&cache_key);
                Err(Error::compile(&cache_key, e.to_string()))
            }
        };
        self.cond.notify_all();
        result
    }
}
