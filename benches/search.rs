use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use tesuji::game::Color;
use tesuji::games::go::Board;
use tesuji::mcts::{SearchConfig, Searcher};

fn ponder(c: &mut Criterion) {
    let mut group = c.benchmark_group("search-5x5");
    for n in [250, 500, 1000] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let mut searcher = Searcher::new(
                    SearchConfig::default()
                        .iterations(n)
                        .playout_depth(60)
                        .seed(1),
                );
                searcher.search(&Board::new(5), Color::Black)
            });
        });
    }
    group.finish();

    let mut group = c.benchmark_group("search-9x9-threads");
    group.sample_size(10);
    for threads in [1, 2, 4] {
        group.bench_with_input(
            BenchmarkId::from_parameter(threads),
            &threads,
            |b, &threads| {
                b.iter(|| {
                    let mut searcher = Searcher::new(
                        SearchConfig::default()
                            .iterations(500)
                            .playout_depth(40)
                            .thread_count(threads)
                            .seed(1),
                    );
                    searcher.search(&Board::new(9), Color::Black)
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, ponder);
criterion_main!(benches);
