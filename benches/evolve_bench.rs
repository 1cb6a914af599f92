//! Criterion benchmarks for u-evolve operators and the population driver.
//!
//! Uses synthetic evaluators so the numbers measure operator overhead
//! independent of any simulator.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::Rng;
use u_evolve::genotype::tree::build::ramped_half_and_half;
use u_evolve::genotype::tree::variation::{subtree_crossover, subtree_mutation};
use u_evolve::multi_objective::{hypervolume, non_dominated_sort};
use u_evolve::random::create_rng;
use u_evolve::{
    Evaluation, EvolutionRunner, Individual, LinearParams, Layout, PopulationConfig, Result,
    Selection, Tree, TreeParams, Variation,
};

// ===========================================================================
// Fixtures
// ===========================================================================

fn scored_population(n: usize, rng: &mut StdRng) -> Vec<Individual<()>> {
    (0..n)
        .map(|_| {
            let mut ind = Individual::new(());
            ind.apply(Evaluation::new(rng.random_range(0.0..100.0)));
            ind
        })
        .collect()
}

fn random_objectives(n: usize, m: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
    (0..n)
        .map(|_| (0..m).map(|_| rng.random_range(0.0..1.0)).collect())
        .collect()
}

// ===========================================================================
// Benchmarks
// ===========================================================================

fn bench_selection(c: &mut Criterion) {
    let mut group = c.benchmark_group("selection");
    let mut rng = create_rng(42);
    let population = scored_population(1_000, &mut rng);

    for selection in [
        Selection::KTournament(5),
        Selection::KTournamentWithoutReplacement(5),
        Selection::FitnessProportionate,
        Selection::StochasticUniversalSampling,
        Selection::Truncation,
    ] {
        group.bench_with_input(
            BenchmarkId::from_parameter(selection),
            &selection,
            |b, sel| b.iter(|| black_box(sel.select(&population, 500, &mut rng).unwrap())),
        );
    }
    group.finish();
}

fn bench_tree_variation(c: &mut Criterion) {
    let mut group = c.benchmark_group("tree_variation");
    let mut rng = create_rng(42);

    for depth in [4usize, 6, 8] {
        let params = TreeParams::default().with_max_depth(depth);
        let trees: Vec<Tree> = ramped_half_and_half(64, &params, &mut rng);

        group.bench_with_input(BenchmarkId::new("crossover", depth), &trees, |b, trees| {
            b.iter(|| {
                let i = rng.random_range(0..trees.len());
                let j = rng.random_range(0..trees.len());
                black_box(subtree_crossover(&trees[i], &trees[j], &params, &mut rng).unwrap())
            })
        });
        group.bench_with_input(BenchmarkId::new("mutation", depth), &trees, |b, trees| {
            b.iter(|| {
                let i = rng.random_range(0..trees.len());
                black_box(subtree_mutation(&trees[i], &params, &mut rng).unwrap())
            })
        });
    }
    group.finish();
}

fn bench_ranking(c: &mut Criterion) {
    let mut group = c.benchmark_group("ranking");
    group.sample_size(20);
    let mut rng = create_rng(42);

    for n in [100usize, 400] {
        let objectives = random_objectives(n, 2, &mut rng);
        group.bench_with_input(
            BenchmarkId::new("non_dominated_sort", n),
            &objectives,
            |b, objs| b.iter(|| black_box(non_dominated_sort(objs).unwrap())),
        );
    }

    let front = random_objectives(30, 3, &mut rng);
    let front: Vec<Vec<f64>> = non_dominated_sort(&front).unwrap().fronts[0]
        .iter()
        .map(|&i| front[i].clone())
        .collect();
    group.bench_function("hypervolume_3d", |b| {
        b.iter(|| black_box(hypervolume(&front, None).unwrap()))
    });
    group.finish();
}

fn bench_runner(c: &mut Criterion) {
    let mut group = c.benchmark_group("runner");
    group.sample_size(10);

    let layout_eval = |genes: &Layout, _: &mut StdRng| -> Result<Evaluation> {
        Ok(Evaluation::new(-genes.placements().iter().map(|p| (p.x + p.y) as f64).sum::<f64>()))
    };
    let config = PopulationConfig::default()
        .with_mu(100)
        .with_num_children(50)
        .with_max_evaluations(2_000)
        .with_seed(42);
    group.bench_function("linear_paired", |b| {
        b.iter(|| {
            let result = EvolutionRunner::run(&layout_eval, &LinearParams::new(20), black_box(&config));
            black_box(result.unwrap())
        })
    });

    let tree_eval = |genes: &Tree, _: &mut StdRng| -> Result<Evaluation> {
        Ok(Evaluation::new(-(genes.size() as f64)))
    };
    let config = config.clone().with_variation(Variation::Exclusive);
    group.bench_function("tree_exclusive", |b| {
        b.iter(|| {
            let result = EvolutionRunner::run(&tree_eval, &TreeParams::default(), black_box(&config));
            black_box(result.unwrap())
        })
    });
    group.finish();
}

criterion_group!(benches, bench_selection, bench_tree_variation, bench_ranking, bench_runner);
criterion_main!(benches);
