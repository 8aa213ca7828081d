//! Pure arithmetic used by the uploader and reduce engine. No device needed.

use crate::reduce_engine::shrink_n_groups;
use crate::session::decide_unified;
use crate::uploader::chunk_sizes;

#[test]
fn chunk_sizes_single_chunk_when_everything_fits() {
    // 1_000_000 elements at a 4 MiB group / 4-byte codec cap (1_048_576
    // elements/chunk) fit in one chunk.
    assert_eq!(chunk_sizes(1_000_000, 1_048_576), vec![1_000_000]);
}

#[test]
fn chunk_sizes_62_chunks_at_16384_per_chunk() {
    // 64 KiB groups / 4-byte codec = 16_384 elements per chunk; 1_000_000 /
    // 16_384 = 61 full chunks (999_424 elements) plus a remainder of 576.
    let sizes = chunk_sizes(1_000_000, 16_384);
    assert_eq!(sizes.len(), 62);
    assert!(sizes[..61].iter().all(|&n| n == 16_384));
    assert_eq!(sizes[61], 576);
    assert_eq!(sizes.iter().sum::<usize>(), 1_000_000);
}

#[test]
fn chunk_sizes_empty_sequence_yields_no_chunks() {
    assert_eq!(chunk_sizes(0, 16_384), Vec::<usize>::new());
}

#[test]
fn chunk_sizes_exact_multiple_has_no_short_last_chunk() {
    let sizes = chunk_sizes(32_768, 16_384);
    assert_eq!(sizes, vec![16_384, 16_384]);
}

#[test]
fn shrink_n_groups_leaves_groups_that_already_fit() {
    // 128 groups * 4 bytes = 512 bytes, well under a 64 KiB dust buffer.
    assert_eq!(shrink_n_groups(128, 4, 64 * 1024), Some(128));
}

#[test]
fn shrink_n_groups_halves_until_it_fits() {
    // 8192 groups * 4 bytes = 32 KiB > a hypothetical 4 KiB dust buffer;
    // halving to 1024 groups brings it to 4 KiB, which fits exactly.
    assert_eq!(shrink_n_groups(8192, 4, 4 * 1024), Some(1024));
}

#[test]
fn shrink_n_groups_gives_up_when_even_one_group_overflows() {
    // A single group's partial (4 KiB) can't fit in a 1 KiB dust buffer.
    assert_eq!(shrink_n_groups(8192, 4 * 1024, 1024), None);
}

#[test]
fn shrink_n_groups_is_idempotent_at_one() {
    assert_eq!(shrink_n_groups(1, 4, 64 * 1024), Some(1));
}

#[test]
fn unified_policy_true_on_host_unified_memory_flag() {
    assert!(decide_unified(true, "Intel(R) Corporation"));
}

#[test]
fn unified_policy_true_on_nvidia_vendor_string_regardless_of_flag() {
    assert!(decide_unified(false, "NVIDIA Corporation"));
}

#[test]
fn unified_policy_nvidia_match_is_case_insensitive() {
    assert!(decide_unified(false, "nVIDIA"));
}

#[test]
fn unified_policy_false_on_discrete_non_nvidia_device() {
    assert!(!decide_unified(false, "Advanced Micro Devices, Inc."));
}
