#![allow(dead_code)]
use hvg::reference::naive_edges;
use hvg::{Hvg, HvgConfig, HvgError, MergeTree};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub type BuildFn = fn(&Hvg<f64>) -> Result<MergeTree<f64>, HvgError>;

const CHUNK_SIZES: [usize; 5] = [1, 2, 3, 7, 64];

pub fn pairs(tree: &MergeTree<f64>) -> Vec<(usize, usize)> {
    tree.edges().map(|edge| edge.pair()).collect()
}

pub fn reference_pairs(values: &[f64]) -> Vec<(usize, usize)> {
    naive_edges(values).iter().map(|edge| edge.pair()).collect()
}

/// Random series of length `n`. With `levels` set, values are quantized to that many levels
/// so that ties are frequent.
pub fn random_series(rng: &mut StdRng, n: usize, levels: Option<u32>) -> Vec<f64> {
    (0..n)
        .map(|_| match levels {
            Some(levels) => rng.gen_range(0..levels) as f64,
            None => rng.gen::<f64>(),
        })
        .collect()
}

fn build_with(build_fn: BuildFn, values: &[f64], chunk_size: usize) -> MergeTree<f64> {
    let config = HvgConfig::builder()
        .chunk_size(chunk_size)
        .verify_invariants(true)
        .build();
    build_fn(&Hvg::new(values, config)).unwrap()
}

pub fn test_example_fixture(build_fn: BuildFn) {
    let values = [1.0, 5.0, 3.0, 7.0, 2.0];
    for chunk_size in CHUNK_SIZES {
        let tree = build_with(build_fn, &values, chunk_size);
        assert_eq!(vec![(0, 1), (1, 2), (1, 3), (2, 3), (3, 4)], pairs(&tree));
    }
}

pub fn test_empty_series(build_fn: BuildFn) {
    let tree = build_with(build_fn, &[], 4);
    assert!(tree.is_empty());
    assert_eq!(None, tree.root());
    assert_eq!(0, tree.edges().count());
}

pub fn test_single_sample(build_fn: BuildFn) {
    let tree = build_with(build_fn, &[3.5], 4);
    assert_eq!(1, tree.len());
    assert_eq!(Some(3.5), tree.max_value());
    assert_eq!(0, tree.edges().count());
}

pub fn test_monotone_and_flat_series(build_fn: BuildFn) {
    let n = 500;
    let increasing: Vec<f64> = (0..n).map(|i| i as f64).collect();
    let decreasing: Vec<f64> = increasing.iter().rev().copied().collect();
    let flat = vec![1.25; n];
    let neighbours: Vec<_> = (0..n - 1).map(|i| (i, i + 1)).collect();
    for values in [increasing, decreasing, flat] {
        for chunk_size in CHUNK_SIZES {
            let tree = build_with(build_fn, &values, chunk_size);
            assert_eq!(neighbours, pairs(&tree));
        }
    }
}

pub fn test_matches_reference(build_fn: BuildFn) {
    let mut rng = StdRng::seed_from_u64(2024);
    for round in 0..300 {
        let n = rng.gen_range(0..300);
        let levels = if round % 2 == 0 { Some(rng.gen_range(1..8)) } else { None };
        let values = random_series(&mut rng, n, levels);
        let chunk_size = rng.gen_range(1..40);
        let tree = build_with(build_fn, &values, chunk_size);
        assert_eq!(reference_pairs(&values), pairs(&tree), "series {values:?}");
    }
}

pub fn test_clearances_match_reference(build_fn: BuildFn) {
    let mut rng = StdRng::seed_from_u64(99);
    for _ in 0..50 {
        let values = random_series(&mut rng, 120, Some(20));
        let tree = build_with(build_fn, &values, 16);
        let edges: Vec<_> = tree.edges().collect();
        assert_eq!(naive_edges(&values), edges);
    }
}

pub fn test_nan_value(build_fn: BuildFn) {
    let values = [1.0, 2.0, f64::NAN];
    let result = build_fn(&Hvg::default_config(&values));
    assert!(matches!(result, Err(HvgError::NanValue { position: 2 })));
}

pub fn test_shifted_start(build_fn: BuildFn) {
    let values = [4.0, 1.0, 3.0, 2.0, 5.0];
    let config = HvgConfig::builder().chunk_size(2).build();
    let tree = build_fn(&Hvg::new(&values, config).starting_at(1_000)).unwrap();
    let shifted: Vec<_> = reference_pairs(&values)
        .into_iter()
        .map(|(i, j)| (i + 1_000, j + 1_000))
        .collect();
    assert_eq!(shifted, pairs(&tree));
    assert_eq!(Some(1_000), tree.min_position());
    assert_eq!(Some(1_004), tree.max_position());
}

pub fn test_same_tree_as_appending(build_fn: BuildFn) {
    let mut rng = StdRng::seed_from_u64(5);
    for _ in 0..50 {
        let values = random_series(&mut rng, 200, Some(4));
        let appended = MergeTree::from_values(0, &values, &mut hvg::Discard).unwrap();
        let tree = build_with(build_fn, &values, rng.gen_range(1..50));
        assert_eq!(appended, tree);
    }
}
