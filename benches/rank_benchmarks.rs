use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use wabi_rank::{LeaderboardConfig, RankEngine, TreeIndex};

const N: usize = 10_000;

// ─── Helper functions to generate workloads ─────────────────────────────────

/// `(player, delta)` pairs from a deterministic pseudo-random sequence.
fn random_updates(n: usize, players: usize) -> Vec<(String, i64)> {
    // Use a simple LCG for deterministic pseudo-random sequence
    let mut updates = Vec::with_capacity(n);
    let mut x: u64 = 12345;
    for _ in 0..n {
        x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
        let player = (x >> 33) as usize % players;
        let delta = (x >> 17) % 100;
        updates.push((format!("player-{player}"), delta as i64));
    }
    updates
}

fn populated(n: usize) -> RankEngine {
    let engine = RankEngine::new(TreeIndex::with_capacity(n));
    for (timestamp, (player, delta)) in random_updates(n * 4, n).into_iter().enumerate() {
        engine.update_score(&player, delta, timestamp as i64).unwrap();
    }
    engine
}

// ─── Update Benchmarks ──────────────────────────────────────────────────────

fn bench_update_score(c: &mut Criterion) {
    let mut group = c.benchmark_group("update_score");
    let updates = random_updates(N, N / 10);

    group.bench_function(BenchmarkId::new("fresh", N), |b| {
        b.iter(|| {
            let engine = RankEngine::in_memory();
            for (timestamp, (player, delta)) in updates.iter().enumerate() {
                engine.update_score(player, *delta, timestamp as i64).unwrap();
            }
            engine
        });
    });

    let engine = populated(N);
    group.bench_function(BenchmarkId::new("populated", N), |b| {
        let mut timestamp = 1_000_000;
        b.iter(|| {
            timestamp += 1;
            black_box(engine.update_score("player-17", 1, timestamp).unwrap())
        });
    });

    group.finish();
}

// ─── Query Benchmarks ───────────────────────────────────────────────────────

fn bench_queries(c: &mut Criterion) {
    let engine = populated(N);
    let mut group = c.benchmark_group("queries");

    group.bench_function(BenchmarkId::new("get_player_rank", N), |b| {
        b.iter(|| black_box(engine.get_player_rank(black_box("player-4242")).unwrap()));
    });

    group.bench_function(BenchmarkId::new("get_player_rank_dense", N), |b| {
        b.iter(|| black_box(engine.get_player_rank_dense(black_box("player-4242")).unwrap()));
    });

    for n in [10, 100] {
        group.bench_function(BenchmarkId::new("get_top_n", n), |b| {
            b.iter(|| black_box(engine.get_top_n(n).unwrap()));
        });
        group.bench_function(BenchmarkId::new("get_top_n_dense", n), |b| {
            b.iter(|| black_box(engine.get_top_n_dense(n).unwrap()));
        });
    }

    group.bench_function(BenchmarkId::new("get_player_rank_range", 20), |b| {
        b.iter(|| black_box(engine.get_player_rank_range(black_box("player-4242"), 20).unwrap()));
    });

    group.finish();
}

fn bench_dense_page_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("get_top_n_dense_page_size");

    for page in [10, 100, 1_000] {
        let engine = RankEngine::with_config(
            TreeIndex::with_capacity(N),
            LeaderboardConfig::default().with_scan_page_size(page),
        )
        .unwrap();
        for (timestamp, (player, delta)) in random_updates(N * 4, N).into_iter().enumerate() {
            engine.update_score(&player, delta, timestamp as i64).unwrap();
        }
        group.bench_function(BenchmarkId::new("top_50", page), |b| {
            b.iter(|| black_box(engine.get_top_n_dense(50).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_update_score, bench_queries, bench_dense_page_size);
criterion_main!(benches);
