//! Element codec and source-key contracts. Both traits are pure host-side
//! logic with no device involvement.

use crate::{ElementCodec, SourceKey};

struct F32Codec;

impl ElementCodec<f32> for F32Codec {
    fn size_of() -> usize {
        4
    }

    fn encode(_idx: usize, window: &mut [u8], value: f32) {
        window.copy_from_slice(&value.to_le_bytes());
    }

    fn decode(_idx: usize, window: &[u8]) -> f32 {
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(window);
        f32::from_le_bytes(bytes)
    }
}

#[test]
fn codec_round_trips_a_value() {
    let mut window = [0u8; 4];
    F32Codec::encode(0, &mut window, 3.5);
    assert_eq!(F32Codec::decode(0, &window), 3.5);
}

#[test]
fn codec_size_of_matches_window_size() {
    assert_eq!(F32Codec::size_of(), 4);
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct SumKey {
    op: &'static str,
}

impl SourceKey for SumKey {
    fn generate_source(&self) -> Vec<String> {
        vec![format!("__kernel void reduce_{}() {{}}", self.op)]
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct TwoPhaseKey {
    stage1: &'static str,
    stage2: &'static str,
}

impl SourceKey for TwoPhaseKey {
    fn generate_source(&self) -> Vec<String> {
        vec![self.stage1.to_string()]
    }

    fn stage2(&self) -> Self {
        TwoPhaseKey {
            stage1: self.stage2,
            stage2: self.stage2,
        }
    }
}

#[test]
fn source_key_stage2_defaults_to_self() {
    let key = SumKey { op: "add" };
    assert_eq!(key.stage2(), key);
}

#[test]
fn source_key_stage2_can_be_overridden() {
    let key = TwoPhaseKey {
        stage1: "__kernel void a() {}",
        stage2: "__kernel void b() {}",
    };
    assert_eq!(key.stage2().stage1, "__kernel void b() {}");
}

#[test]
fn source_key_cache_key_defaults_to_debug_and_distinguishes_fields() {
    let add = SumKey { op: "add" };
    let mul = SumKey { op: "mul" };
    assert_ne!(add.cache_key(), mul.cache_key());
    assert_eq!(add.cache_key(), format!("{:?}", add));
}

#[test]
fn source_key_cache_key_is_stable_for_equal_keys() {
    let a = SumKey { op: "add" };
    let b = SumKey { op: "add" };
    assert_eq!(a.cache_key(), b.cache_key());
}
