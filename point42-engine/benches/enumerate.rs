criterion::criterion_main!(benches);
criterion::criterion_group! {
    name = benches;
    config = criterion::Criterion::default()
        .without_plots()
        .noise_threshold(3.0)
        .significance_level(0.01)
        .sample_size(10)
        .measurement_time(std::time::Duration::from_secs(1));
    targets =
        enumerating_five_operand_problem,
        solving_classic_problem,
}

fn enumerating_five_operand_problem(c: &mut criterion::Criterion) {
    c.bench_function("enumerate all expressions over (3,4,6,7,12)", |b| {
        b.iter(|| point42_engine::enumerate(&[3, 4, 6, 7, 12]))
    });
}

fn solving_classic_problem(c: &mut criterion::Criterion) {
    use rand::SeedableRng;
    let problem = point42_engine::Problem::new(vec![3, 4, 6, 7, 12]).unwrap();
    c.bench_function("solve (3,4,6,7,12) for target 42", |b| {
        b.iter(|| {
            let mut rng = rand::rngs::SmallRng::seed_from_u64(0);
            point42_engine::solve_problem(&problem, 42, &mut rng)
        })
    });
}
