use crate::{
    problem::{
        location::{Location, LocationBuilder, LocationIdx},
        matrix::Matrix,
        measure::Cost,
        problem_data::{ProblemData, ProblemDataBuilder},
        vehicle_type::VehicleTypeBuilder,
    },
    search::{
        cost_evaluator::CostEvaluator,
        neighbourhood::NeighbourLists,
        ops::operator::{NodeOperator, NodePos},
        working_solution::WorkingSolution,
    },
};

/// A square matrix where the entry for (i, j) is `|i - j|`.
pub fn line_matrix(dim: usize) -> Matrix {
    let rows = (0..dim)
        .map(|i| (0..dim).map(|j| (i as i64 - j as i64).abs()).collect())
        .collect();
    Matrix::new(rows)
}

/// A small four-client instance with known behaviour: one depot, time
/// windows, service durations, and three vehicles of capacity 10. Distance
/// equals duration.
pub fn ok_small() -> ProblemData {
    let depot = LocationBuilder::default()
        .set_coords(2334, 726)
        .set_time_window(0, 45_000)
        .build();

    let clients = vec![
        Location::client(226, 1297)
            .set_delivery(5)
            .set_time_window(15_600, 22_500)
            .set_service_duration(360)
            .build(),
        Location::client(590, 530)
            .set_delivery(5)
            .set_time_window(12_000, 19_500)
            .set_service_duration(360)
            .build(),
        Location::client(435, 718)
            .set_delivery(3)
            .set_time_window(8_400, 15_300)
            .set_service_duration(420)
            .build(),
        Location::client(1191, 639)
            .set_delivery(5)
            .set_time_window(12_000, 19_500)
            .set_service_duration(360)
            .build(),
    ];

    let matrix = Matrix::new(vec![
        vec![0, 1544, 1944, 1931, 1476],
        vec![1726, 0, 1992, 1427, 1593],
        vec![1965, 1975, 0, 621, 1090],
        vec![2063, 1433, 647, 0, 818],
        vec![1475, 1594, 1090, 828, 0],
    ]);

    let mut vehicle_type = VehicleTypeBuilder::default();
    vehicle_type.set_capacity(10).set_num_available(3);

    let mut builder = ProblemDataBuilder::default();
    builder.set_depots(vec![depot]);
    builder.set_clients(clients);
    builder.set_vehicle_types(vec![vehicle_type.build()]);
    builder.set_distances(matrix.clone());
    builder.set_durations(matrix);

    builder.build().unwrap()
}

/// One depot, two co-located demandless clients, all-zero matrices, and two
/// single-vehicle types differing only in fixed cost.
pub fn two_vehicle_types_zero_matrix(first_fixed: Cost, second_fixed: Cost) -> ProblemData {
    let mut first = VehicleTypeBuilder::default();
    first.set_fixed_cost(first_fixed);
    let mut second = VehicleTypeBuilder::default();
    second.set_fixed_cost(second_fixed);

    let mut builder = ProblemDataBuilder::default();
    builder.set_depots(vec![Location::depot(0, 0)]);
    builder.set_clients(vec![
        Location::client(1, 1).build(),
        Location::client(1, 0).build(),
    ]);
    builder.set_vehicle_types(vec![first.build(), second.build()]);
    builder.set_distances(Matrix::zeros(3));
    builder.set_durations(Matrix::zeros(3));

    builder.build().unwrap()
}

/// Three clients where the first picks up five units and the last delivers
/// five, against a vehicle capacity of five. Unit distances, zero durations.
pub fn spd_triangle() -> ProblemData {
    let distances = Matrix::new(vec![
        vec![0, 1, 1, 1],
        vec![1, 0, 1, 1],
        vec![1, 1, 0, 1],
        vec![1, 1, 1, 0],
    ]);

    let mut vehicle_type = VehicleTypeBuilder::default();
    vehicle_type.set_capacity(5);

    let mut builder = ProblemDataBuilder::default();
    builder.set_depots(vec![Location::depot(0, 0)]);
    builder.set_clients(vec![
        Location::client(1, 0).set_pickup(5).build(),
        Location::client(2, 0).build(),
        Location::client(2, 0).set_delivery(5).build(),
    ]);
    builder.set_vehicle_types(vec![vehicle_type.build()]);
    builder.set_distances(distances);
    builder.set_durations(Matrix::zeros(4));

    builder.build().unwrap()
}

/// Neighbour lists where every client sees every other client.
pub fn full_neighbours(data: &ProblemData) -> NeighbourLists {
    (0..data.num_locations())
        .map(|i| {
            let i = LocationIdx::new(i);
            if data.is_depot(i) {
                Vec::new()
            } else {
                data.clients().filter(|&j| j != i).collect()
            }
        })
        .collect()
}

/// The penalised cost of a working solution, summed over its used routes.
/// Matches what `CostEvaluator::penalised_cost` reports for the exported
/// snapshot.
pub fn working_cost(state: &WorkingSolution, cost_evaluator: &CostEvaluator) -> Cost {
    let mut cost = 0;

    for route in state.routes() {
        if route.is_empty() {
            continue;
        }

        cost += route.distance() * route.unit_distance_cost()
            + route.duration() * route.unit_duration_cost()
            + route.fixed_cost()
            + cost_evaluator.excess_load_penalty(route.excess_load())
            + cost_evaluator.tw_penalty(route.time_warp())
            - route.prizes();
    }

    cost
}

/// Applies a move and refreshes the touched routes, as the driver would.
pub fn apply_and_update(op: &dyn NodeOperator, u: NodePos, v: NodePos, state: &mut WorkingSolution) {
    op.apply(u, v, state);

    state.update_route(u.route);
    state.sync_assignment(u.route);
    if v.route != u.route {
        state.update_route(v.route);
        state.sync_assignment(v.route);
    }
}
