use cohort::algo::{partition, LouvainConfig};
use cohort::embed::hashing::HashingBackend;
use cohort::vector::{build_index, normalize_or_zero, IndexKind};
use cohort::{NeighborStrategy, SimilarityGraph};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

const MAJORS: [&str; 6] = ["History", "Economics", "Biology", "Physics", "Music", "Computer Science"];
const CITIES: [&str; 5] = ["Boston", "Denver", "London", "Austin", "Seattle"];
const INDUSTRIES: [&str; 4] = ["Finance", "Healthcare", "Education", "Software"];

fn descriptors(n: usize) -> Vec<String> {
    (0..n)
        .map(|i| {
            format!(
                "major: {} city: {} industry: {} class_year: {}",
                MAJORS[i % MAJORS.len()],
                CITIES[(i / 3) % CITIES.len()],
                INDUSTRIES[(i / 7) % INDUSTRIES.len()],
                2000 + i % 20
            )
        })
        .collect()
}

fn embeddings(n: usize) -> Vec<Vec<f32>> {
    let backend = HashingBackend::new(384);
    descriptors(n)
        .iter()
        .map(|d| normalize_or_zero(&backend.embed_one(d)))
        .collect()
}

/// Benchmark top-k queries against flat and HNSW indexes
fn bench_index_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_query");

    for size in [1_000, 10_000].iter() {
        let vectors = embeddings(*size);
        let query = vectors[size / 2].clone();

        for kind in [IndexKind::Flat, IndexKind::Hnsw] {
            let index = build_index(kind, &vectors).unwrap();
            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", kind), size),
                size,
                |b, _| b.iter(|| index.search(black_box(&query), 5).unwrap()),
            );
        }
    }
    group.finish();
}

/// Benchmark complete vs nearest-neighbour graph construction
fn bench_graph_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("similarity_graph");
    group.sample_size(20);

    for size in [100, 500].iter() {
        let vectors = embeddings(*size);
        group.bench_with_input(BenchmarkId::new("complete", size), size, |b, _| {
            b.iter(|| SimilarityGraph::from_embeddings(black_box(&vectors), NeighborStrategy::Complete).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("nearest_10", size), size, |b, _| {
            b.iter(|| {
                SimilarityGraph::from_embeddings(black_box(&vectors), NeighborStrategy::Nearest { k: 10 })
                    .unwrap()
            })
        });
    }
    group.finish();
}

/// Benchmark Louvain on a complete similarity graph
fn bench_louvain(c: &mut Criterion) {
    let mut group = c.benchmark_group("louvain");
    group.sample_size(20);

    for size in [100, 300].iter() {
        let graph = SimilarityGraph::from_embeddings(&embeddings(*size), NeighborStrategy::Complete).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| partition(black_box(&graph), &LouvainConfig::default()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_index_query, bench_graph_build, bench_louvain);
criterion_main!(benches);
