//! Benchmarks for deep merge and map splitting.
//!
//! Merging runs for every inheritance step (environment scopes, super-roles,
//! variants), so these cover wide maps, deep maps and merge-token lists.

use confgen::merge::{merge, split_map, strip_merge_tokens, MERGE_TOKEN};
use confgen::value::{ConfigMap, ConfigValue};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

/// A flat map with `width` scalar keys.
fn wide_map(width: usize, offset: usize) -> ConfigMap {
    (0..width)
        .map(|i| (format!("key{}", i), ConfigValue::from(i + offset)))
        .collect()
}

/// A map nested `depth` levels deep with a few keys per level.
fn deep_map(depth: usize, tag: &str) -> ConfigMap {
    let mut map = ConfigMap::new();
    map.insert("tag".to_string(), ConfigValue::from(tag));
    map.insert("level".to_string(), ConfigValue::from(depth));
    if depth > 0 {
        map.insert("child".to_string(), ConfigValue::Map(deep_map(depth - 1, tag)));
    }
    map
}

fn token_lists(len: usize) -> (ConfigMap, ConfigMap) {
    let mut base_items: Vec<ConfigValue> = (0..len).map(|i| ConfigValue::from(format!("b{}", i))).collect();
    base_items.insert(len / 2, ConfigValue::from(MERGE_TOKEN));
    let over_items: Vec<ConfigValue> = (0..len).map(|i| ConfigValue::from(format!("o{}", i))).collect();

    let mut base = ConfigMap::new();
    base.insert("items".to_string(), ConfigValue::List(base_items));
    let mut over = ConfigMap::new();
    over.insert("items".to_string(), ConfigValue::List(over_items));
    (base, over)
}

fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge");

    let base = wide_map(500, 0);
    let over = wide_map(500, 1000);
    group.bench_function("wide_500", |b| {
        b.iter(|| merge(black_box(Some(&base)), black_box(Some(&over))))
    });

    let base = deep_map(32, "base");
    let over = deep_map(32, "over");
    group.bench_function("deep_32", |b| {
        b.iter(|| merge(black_box(Some(&base)), black_box(Some(&over))))
    });

    let (base, over) = token_lists(200);
    group.bench_function("merge_token_200", |b| {
        b.iter(|| merge(black_box(Some(&base)), black_box(Some(&over))))
    });

    // Chain of inheritance steps, as for a role with several ancestors
    let layers: Vec<ConfigMap> = (0..10).map(|i| wide_map(100, i * 100)).collect();
    group.bench_function("chain_10x100", |b| {
        b.iter(|| {
            layers
                .iter()
                .fold(ConfigMap::new(), |acc, layer| merge(Some(&acc), Some(layer)))
        })
    });

    group.finish();
}

fn bench_split(c: &mut Criterion) {
    let mut group = c.benchmark_group("split");

    let mut map = wide_map(200, 0);
    map.insert("nested".to_string(), ConfigValue::Map(deep_map(16, "x")));

    group.bench_function("by_key_prefix", |b| {
        b.iter(|| split_map(black_box(&map), |path, _| path.starts_with("key1")))
    });

    group.bench_function("by_type", |b| {
        b.iter(|| split_map(black_box(&map), |_, value| matches!(value, ConfigValue::String(_))))
    });

    let (base, _) = token_lists(200);
    group.bench_function("strip_merge_tokens", |b| {
        b.iter(|| strip_merge_tokens(black_box(&base)))
    });

    group.finish();
}

criterion_group!(benches, bench_merge, bench_split);
criterion_main!(benches);
