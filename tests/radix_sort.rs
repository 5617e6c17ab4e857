mod common;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sorted_splats::SortError;
use sorted_splats::gpu::GpuContext;
use sorted_splats::gpu::buffer::{BufferUsageHint, DeviceBuffer, identity_indices};
use sorted_splats::gpu::radix_sort::RadixSorter;
use sorted_splats::gpu::readback::read_buffer;
use wgpu::BufferUsages;

struct Pairs {
    keys: DeviceBuffer<u32>,
    values: DeviceBuffer<u32>,
}

fn upload(gpu: &GpuContext, keys: &[u32]) -> Pairs {
    let usage = BufferUsages::STORAGE | BufferUsages::COPY_SRC;
    Pairs {
        keys: DeviceBuffer::new(&gpu.device, "test keys", BufferUsageHint::Dynamic, usage, keys),
        values: DeviceBuffer::new(
            &gpu.device,
            "test values",
            BufferUsageHint::Dynamic,
            usage,
            &identity_indices(keys.len()),
        ),
    }
}

fn sort(gpu: &GpuContext, sorter: &RadixSorter, keys: &[u32]) -> (Vec<u32>, Vec<u32>) {
    let pairs = upload(gpu, keys);
    sorter
        .sort(
            &gpu.device,
            &gpu.queue,
            pairs.keys.buffer(),
            pairs.values.buffer(),
            keys.len() as u32,
        )
        .unwrap();
    let sorted_keys =
        read_buffer(&gpu.device, &gpu.queue, pairs.keys.buffer(), keys.len()).unwrap();
    let sorted_values =
        read_buffer(&gpu.device, &gpu.queue, pairs.values.buffer(), keys.len()).unwrap();
    (sorted_keys, sorted_values)
}

fn assert_sorted_permutation(input: &[u32], keys: &[u32], values: &[u32]) {
    assert!(keys.windows(2).all(|w| w[0] <= w[1]), "keys not ascending");
    let mut seen = values.to_vec();
    seen.sort_unstable();
    assert_eq!(seen, identity_indices(input.len()), "values are not a permutation");
    for (key, value) in keys.iter().zip(values) {
        assert_eq!(*key, input[*value as usize]);
    }
}

fn random_keys(len: usize, seed: u64) -> Vec<u32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| rng.r#gen()).collect()
}

#[test]
fn sorts_a_partial_block() {
    let Some(gpu) = common::gpu() else { return };
    let input = random_keys(1000, 1);
    let sorter = RadixSorter::new(&gpu.device, 1000, None).unwrap();
    let (keys, values) = sort(&gpu, &sorter, &input);
    assert_sorted_permutation(&input, &keys, &values);
}

#[test]
fn sorts_many_blocks() {
    let Some(gpu) = common::gpu() else { return };
    let input = random_keys(100_003, 2);
    let sorter = RadixSorter::new(&gpu.device, 100_003, None).unwrap();
    let (keys, values) = sort(&gpu, &sorter, &input);
    assert_sorted_permutation(&input, &keys, &values);
}

#[test]
fn extreme_keys_sort_to_the_ends() {
    let Some(gpu) = common::gpu() else { return };
    let input = vec![7, u32::MAX, 0, 1 << 31, 255, 256];
    let sorter = RadixSorter::new(&gpu.device, 16, None).unwrap();
    let (keys, values) = sort(&gpu, &sorter, &input);
    assert_eq!(keys, [0, 7, 255, 256, 1 << 31, u32::MAX]);
    assert_eq!(values, [2, 0, 4, 5, 3, 1]);
}

#[test]
fn equal_keys_keep_every_value_once() {
    let Some(gpu) = common::gpu() else { return };
    let input = vec![42u32; 600];
    let sorter = RadixSorter::new(&gpu.device, 600, None).unwrap();
    let (keys, values) = sort(&gpu, &sorter, &input);
    assert_sorted_permutation(&input, &keys, &values);
}

#[test]
fn count_equal_to_capacity_sorts() {
    let Some(gpu) = common::gpu() else { return };
    let input = random_keys(300, 3);
    let sorter = RadixSorter::new(&gpu.device, 300, None).unwrap();
    let (keys, values) = sort(&gpu, &sorter, &input);
    assert_sorted_permutation(&input, &keys, &values);
}

#[test]
fn count_over_capacity_fails_before_encoding() {
    let Some(gpu) = common::gpu() else { return };
    let pairs = upload(&gpu, &random_keys(301, 4));
    let sorter = RadixSorter::new(&gpu.device, 300, None).unwrap();
    let err = sorter
        .sort(
            &gpu.device,
            &gpu.queue,
            pairs.keys.buffer(),
            pairs.values.buffer(),
            301,
        )
        .unwrap_err();
    assert_eq!(
        err,
        SortError::CapacityExceeded {
            count: 301,
            capacity: 300
        }
    );
}

#[test]
fn count_over_bound_buffers_fails() {
    let Some(gpu) = common::gpu() else { return };
    let pairs = upload(&gpu, &random_keys(10, 5));
    let sorter = RadixSorter::new(&gpu.device, 100, None).unwrap();
    let err = sorter
        .sort(&gpu.device, &gpu.queue, pairs.keys.buffer(), pairs.values.buffer(), 11)
        .unwrap_err();
    assert_eq!(
        err,
        SortError::CapacityExceeded {
            count: 11,
            capacity: 10
        }
    );
}

#[test]
fn zero_count_leaves_buffers_untouched() {
    let Some(gpu) = common::gpu() else { return };
    let input = vec![3u32, 2, 1];
    let pairs = upload(&gpu, &input);
    let sorter = RadixSorter::new(&gpu.device, 0, None).unwrap();
    assert_eq!(sorter.capacity(), 0);
    sorter
        .sort(&gpu.device, &gpu.queue, pairs.keys.buffer(), pairs.values.buffer(), 0)
        .unwrap();
    let keys: Vec<u32> = read_buffer(&gpu.device, &gpu.queue, pairs.keys.buffer(), 3).unwrap();
    assert_eq!(keys, input);
}

#[test]
fn repeated_sorts_are_deterministic() {
    let Some(gpu) = common::gpu() else { return };
    let mut rng = StdRng::seed_from_u64(6);
    // Few distinct keys so ties are common.
    let input: Vec<u32> = (0..2000).map(|_| rng.gen_range(0..8)).collect();
    let sorter = RadixSorter::new(&gpu.device, 2000, None).unwrap();
    let first = sort(&gpu, &sorter, &input);
    let second = sort(&gpu, &sorter, &input);
    assert_eq!(first, second);
    assert_sorted_permutation(&input, &first.0, &first.1);
}
