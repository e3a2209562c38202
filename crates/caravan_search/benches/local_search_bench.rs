use std::sync::Arc;

use caravan_search::{
    problem::{
        location::{Location, LocationBuilder},
        matrix::Matrix,
        problem_data::{ProblemData, ProblemDataBuilder},
        vehicle_type::VehicleTypeBuilder,
    },
    search::{
        CostEvaluator, LocalSearch, NeighbourhoodParams, SearchParams, Solution,
        compute_neighbours,
        ops::{Exchange10, Exchange11, Exchange20, MoveTwoClientsReversed, TwoOpt},
    },
};
use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};

/// A grid of clients around a central depot, Euclidean distances, uniform
/// demand against a capacity of ten.
fn grid_instance(side: usize) -> ProblemData {
    let mut coords = vec![(0i64, 0i64)];
    for x in 0..side {
        for y in 0..side {
            coords.push((x as i64 + 1, y as i64 + 1));
        }
    }

    let dim = coords.len();
    let rows = (0..dim)
        .map(|i| {
            (0..dim)
                .map(|j| {
                    let dx = (coords[i].0 - coords[j].0) as f64;
                    let dy = (coords[i].1 - coords[j].1) as f64;
                    (dx * dx + dy * dy).sqrt().round() as i64
                })
                .collect()
        })
        .collect();
    let matrix = Matrix::new(rows);

    let clients = coords[1..]
        .iter()
        .map(|&(x, y)| Location::client(x, y).set_delivery(1).build())
        .collect();

    let mut vehicle_type = VehicleTypeBuilder::default();
    vehicle_type
        .set_capacity(10)
        .set_num_available(dim.div_ceil(10));

    let mut builder = ProblemDataBuilder::default();
    builder.set_depots(vec![LocationBuilder::default().build()]);
    builder.set_clients(clients);
    builder.set_vehicle_types(vec![vehicle_type.build()]);
    builder.set_distances(matrix.clone());
    builder.set_durations(matrix);

    builder.build().unwrap()
}

fn initial_solution(data: &ProblemData) -> Solution {
    let mut lists: Vec<Vec<usize>> = Vec::new();
    for (index, client) in data.clients().enumerate() {
        if index % 10 == 0 {
            lists.push(Vec::new());
        }
        lists.last_mut().unwrap().push(client.get());
    }

    Solution::from_route_lists(data, &lists).unwrap()
}

fn bench_local_search(c: &mut Criterion) {
    let data = Arc::new(grid_instance(10));
    let neighbours = Arc::new(compute_neighbours(&data, &NeighbourhoodParams::default()));
    let cost_evaluator = CostEvaluator::new(20, 6);
    let solution = initial_solution(&data);

    c.bench_function("local_search_100_clients", |b| {
        b.iter(|| {
            let mut local_search = LocalSearch::with_params(
                Arc::clone(&data),
                Arc::clone(&neighbours),
                SearchParams::default(),
            );
            local_search.add_node_operator(Exchange10::new());
            local_search.add_node_operator(Exchange20::new());
            local_search.add_node_operator(Exchange11::new());
            local_search.add_node_operator(TwoOpt::new());
            local_search.add_node_operator(MoveTwoClientsReversed::new());

            black_box(local_search.search(&solution, &cost_evaluator))
        })
    });
}

criterion_group!(benches, bench_local_search);
criterion_main!(benches);
