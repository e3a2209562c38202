pub mod exchange;
pub mod move_two_clients_reversed;
pub mod operator;
pub mod two_opt;

pub use exchange::{Exchange, Exchange10, Exchange11, Exchange20, Exchange21, Exchange22, Exchange30};
pub use move_two_clients_reversed::MoveTwoClientsReversed;
pub use operator::{NodeOperator, NodePos};
pub use two_opt::TwoOpt;

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use proptest::prelude::*;
    use rand::{SeedableRng, rngs::SmallRng, seq::SliceRandom};

    use super::*;
    use crate::{
        problem::{
            location::{Location, LocationBuilder, LocationIdx},
            matrix::Matrix,
            problem_data::{ProblemData, ProblemDataBuilder},
            vehicle_type::VehicleTypeBuilder,
        },
        search::{
            cost_evaluator::CostEvaluator, route::RouteIdx, working_solution::WorkingSolution,
        },
        test_utils::{apply_and_update, working_cost},
    };

    fn build_data(coords: &[(i64, i64)], attrs: &[(i64, i64, i64, i64, i64)]) -> ProblemData {
        let dimension = coords.len();

        let rows = (0..dimension)
            .map(|i| {
                (0..dimension)
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
            .zip(attrs)
            .map(|(&(x, y), &(delivery, pickup, early, width, service))| {
                Location::client(x, y)
                    .set_delivery(delivery)
                    .set_pickup(pickup)
                    .set_time_window(early, early + width)
                    .set_service_duration(service)
                    .build()
            })
            .collect();

        let mut vehicle_type = VehicleTypeBuilder::default();
        vehicle_type
            .set_capacity(10)
            .set_num_available(2)
            .set_fixed_cost(3)
            .set_max_duration(150);

        let mut builder = ProblemDataBuilder::default();
        builder.set_depots(vec![
            LocationBuilder::default()
                .set_coords(coords[0].0, coords[0].1)
                .set_time_window(0, 200)
                .build(),
        ]);
        builder.set_clients(clients);
        builder.set_vehicle_types(vec![vehicle_type.build()]);
        builder.set_distances(matrix.clone());
        builder.set_durations(matrix);

        builder.build().unwrap()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        // For every operator, an improving delta must equal exactly the
        // difference in penalised cost between the updated and the original
        // routes.
        #[test]
        fn prop_evaluate_matches_apply_and_recompute(
            coords in proptest::collection::vec((0i64..40, 0i64..40), 4..8),
            attrs in proptest::collection::vec((0i64..8, 0i64..8, 0i64..60, 1i64..60, 0i64..5), 7),
            split in 0usize..8,
            route_seed in any::<u64>(),
            u_raw in 0usize..16,
            v_raw in 0usize..16,
            op_idx in 0usize..6,
        ) {
            let num_clients = coords.len() - 1;
            let data = Arc::new(build_data(&coords, &attrs[..num_clients]));
            let cost_evaluator = CostEvaluator::new(7, 5);

            let mut order: Vec<LocationIdx> = data.clients().collect();
            order.shuffle(&mut SmallRng::seed_from_u64(route_seed));
            let split = split % (num_clients + 1);

            let mut state = WorkingSolution::new(Arc::clone(&data));
            for (index, &client) in order.iter().enumerate() {
                let route = RouteIdx::new(usize::from(index >= split));
                state.route_mut(route).push(client);
            }
            state.update_route(RouteIdx::new(0));
            state.update_route(RouteIdx::new(1));
            state.sync_assignment(RouteIdx::new(0));
            state.sync_assignment(RouteIdx::new(1));

            let ops: Vec<Box<dyn NodeOperator>> = vec![
                Box::new(Exchange10::new()),
                Box::new(Exchange20::new()),
                Box::new(Exchange11::new()),
                Box::new(Exchange21::new()),
                Box::new(MoveTwoClientsReversed::new()),
                Box::new(TwoOpt::new()),
            ];
            let op = &ops[op_idx];

            let u_route = RouteIdx::new(u_raw % 2);
            let v_route = RouteIdx::new(v_raw % 2);
            let u = NodePos::new(u_route, u_raw % (state.route(u_route).len() + 2));
            let v = NodePos::new(v_route, v_raw % (state.route(v_route).len() + 2));

            let delta = op.evaluate(u, v, &state, &cost_evaluator);

            if delta < 0 {
                let before = working_cost(&state, &cost_evaluator);
                apply_and_update(op.as_ref(), u, v, &mut state);
                let after = working_cost(&state, &cost_evaluator);

                prop_assert_eq!(after - before, delta);
            }
        }
    }
}
