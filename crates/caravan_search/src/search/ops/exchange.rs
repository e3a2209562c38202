use crate::{
    problem::{location::LocationIdx, measure::Cost},
    search::{
        cost_evaluator::CostEvaluator,
        distance_segment::DistanceSegment,
        duration_segment::DurationSegment,
        load_segment::LoadSegment,
        ops::operator::{NodeOperator, NodePos, delta_for_route, merge_dist, merge_dur, merge_load},
        route::Route,
        working_solution::WorkingSolution,
    },
};

/// **(N, M)-exchange**
///
/// Moves the segment of `N` consecutive clients starting at `U`, exchanging
/// it with the `M` consecutive clients starting at `V`. Covers relocation
/// (`M == 0`) and swaps as special cases.
///
/// ```text
/// Exchange<2, 0> (relocate a pair):
///    BEFORE: R1: ... (A) -> [U] -> [X] -> (B) ...    R2: ... (V) -> (Y) ...
///    AFTER:  R1: ... (A) -> (B) ...                  R2: ... (V) -> [U] -> [X] -> (Y) ...
/// ```
#[derive(Debug, Default)]
pub struct Exchange<const N: usize, const M: usize>;

pub type Exchange10 = Exchange<1, 0>;
pub type Exchange20 = Exchange<2, 0>;
pub type Exchange30 = Exchange<3, 0>;
pub type Exchange11 = Exchange<1, 1>;
pub type Exchange21 = Exchange<2, 1>;
pub type Exchange22 = Exchange<2, 2>;

fn contains_depot(route: &Route, position: usize, seg_length: usize) -> bool {
    // len() is the position of the last client, so the segment includes a
    // depot whenever it sticks out past it.
    position == 0 || position + seg_length - 1 > route.len()
}

impl<const N: usize, const M: usize> Exchange<N, M> {
    const VALID: () = assert!(N >= M && N > 0, "N < M or N == 0 does not make sense");

    pub fn new() -> Self {
        let () = Self::VALID;
        Exchange
    }

    fn overlap(u: NodePos, v: NodePos) -> bool {
        u.route == v.route
            && u.position <= v.position + M.max(1) - 1
            && v.position <= u.position + N - 1
    }

    fn adjacent(u: NodePos, v: NodePos) -> bool {
        u.route == v.route && (u.position + N == v.position || v.position + M == u.position)
    }

    fn eval_relocate(
        &self,
        u: NodePos,
        v: NodePos,
        solution: &WorkingSolution,
        cost_evaluator: &CostEvaluator,
    ) -> Cost {
        let data = solution.data();
        let u_route = solution.route(u.route);
        let v_route = solution.route(v.route);

        if u.route != v.route {
            let u_dist = DistanceSegment::merge(
                data.distance_matrix(),
                u_route.dist_before(u.position - 1),
                u_route.dist_after(u.position + N),
            );
            let u_ls = LoadSegment::merge(
                u_route.load_before(u.position - 1),
                u_route.load_after(u.position + N),
            );
            let u_ds = DurationSegment::merge(
                data.duration_matrix(),
                u_route.dur_before(u.position - 1),
                u_route.dur_after(u.position + N),
            );

            let segment_dist = u_route.dist_between(u.position, u.position + N - 1);
            let segment_ls = u_route.load_between(u.position, u.position + N - 1);
            let segment_ds = u_route.dur_between(data, u.position, u.position + N - 1);

            let v_dist = DistanceSegment::merge(
                data.distance_matrix(),
                DistanceSegment::merge(
                    data.distance_matrix(),
                    v_route.dist_before(v.position),
                    segment_dist,
                ),
                v_route.dist_after(v.position + 1),
            );
            let v_ls = LoadSegment::merge(
                LoadSegment::merge(v_route.load_before(v.position), segment_ls),
                v_route.load_after(v.position + 1),
            );
            let v_ds = DurationSegment::merge(
                data.duration_matrix(),
                DurationSegment::merge(
                    data.duration_matrix(),
                    v_route.dur_before(v.position),
                    segment_ds,
                ),
                v_route.dur_after(v.position + 1),
            );

            let mut delta = delta_for_route(
                cost_evaluator,
                u_route,
                u_dist.distance(),
                u_ds.duration(),
                u_ds.time_warp(u_route.max_duration()),
                u_ls.load(),
            );
            delta += delta_for_route(
                cost_evaluator,
                v_route,
                v_dist.distance(),
                v_ds.duration(),
                v_ds.time_warp(v_route.max_duration()),
                v_ls.load(),
            );

            // V's fixed cost starts counting if it is currently unused; U's
            // stops if this moves its entire client set out.
            if v_route.is_empty() {
                delta += v_route.fixed_cost();
            }
            if u_route.len() == N {
                delta -= u_route.fixed_cost();
            }

            delta
        } else {
            let route = u_route;
            let (dist, ls, ds) = if u.position < v.position {
                let dist = merge_dist(
                    data,
                    &[
                        route.dist_before(u.position - 1),
                        route.dist_between(u.position + N, v.position),
                        route.dist_between(u.position, u.position + N - 1),
                        route.dist_after(v.position + 1),
                    ],
                );
                let ls = merge_load(&[
                    route.load_before(u.position - 1),
                    route.load_between(u.position + N, v.position),
                    route.load_between(u.position, u.position + N - 1),
                    route.load_after(v.position + 1),
                ]);
                let ds = merge_dur(
                    data,
                    &[
                        route.dur_before(u.position - 1),
                        route.dur_between(data, u.position + N, v.position),
                        route.dur_between(data, u.position, u.position + N - 1),
                        route.dur_after(v.position + 1),
                    ],
                );
                (dist, ls, ds)
            } else {
                let dist = merge_dist(
                    data,
                    &[
                        route.dist_before(v.position),
                        route.dist_between(u.position, u.position + N - 1),
                        route.dist_between(v.position + 1, u.position - 1),
                        route.dist_after(u.position + N),
                    ],
                );
                let ls = merge_load(&[
                    route.load_before(v.position),
                    route.load_between(u.position, u.position + N - 1),
                    route.load_between(v.position + 1, u.position - 1),
                    route.load_after(u.position + N),
                ]);
                let ds = merge_dur(
                    data,
                    &[
                        route.dur_before(v.position),
                        route.dur_between(data, u.position, u.position + N - 1),
                        route.dur_between(data, v.position + 1, u.position - 1),
                        route.dur_after(u.position + N),
                    ],
                );
                (dist, ls, ds)
            };

            delta_for_route(
                cost_evaluator,
                route,
                dist.distance(),
                ds.duration(),
                ds.time_warp(route.max_duration()),
                ls.load(),
            )
        }
    }

    fn eval_swap(
        &self,
        u: NodePos,
        v: NodePos,
        solution: &WorkingSolution,
        cost_evaluator: &CostEvaluator,
    ) -> Cost {
        let data = solution.data();
        let u_route = solution.route(u.route);
        let v_route = solution.route(v.route);

        if u.route != v.route {
            let u_dist = merge_dist(
                data,
                &[
                    u_route.dist_before(u.position - 1),
                    v_route.dist_between(v.position, v.position + M - 1),
                    u_route.dist_after(u.position + N),
                ],
            );
            let u_ls = merge_load(&[
                u_route.load_before(u.position - 1),
                v_route.load_between(v.position, v.position + M - 1),
                u_route.load_after(u.position + N),
            ]);
            let u_ds = merge_dur(
                data,
                &[
                    u_route.dur_before(u.position - 1),
                    v_route.dur_between(data, v.position, v.position + M - 1),
                    u_route.dur_after(u.position + N),
                ],
            );

            let v_dist = merge_dist(
                data,
                &[
                    v_route.dist_before(v.position - 1),
                    u_route.dist_between(u.position, u.position + N - 1),
                    v_route.dist_after(v.position + M),
                ],
            );
            let v_ls = merge_load(&[
                v_route.load_before(v.position - 1),
                u_route.load_between(u.position, u.position + N - 1),
                v_route.load_after(v.position + M),
            ]);
            let v_ds = merge_dur(
                data,
                &[
                    v_route.dur_before(v.position - 1),
                    u_route.dur_between(data, u.position, u.position + N - 1),
                    v_route.dur_after(v.position + M),
                ],
            );

            delta_for_route(
                cost_evaluator,
                u_route,
                u_dist.distance(),
                u_ds.duration(),
                u_ds.time_warp(u_route.max_duration()),
                u_ls.load(),
            ) + delta_for_route(
                cost_evaluator,
                v_route,
                v_dist.distance(),
                v_ds.duration(),
                v_ds.time_warp(v_route.max_duration()),
                v_ls.load(),
            )
        } else {
            let route = u_route;
            let (dist, ls, ds) = if u.position < v.position {
                let dist = merge_dist(
                    data,
                    &[
                        route.dist_before(u.position - 1),
                        route.dist_between(v.position, v.position + M - 1),
                        route.dist_between(u.position + N, v.position - 1),
                        route.dist_between(u.position, u.position + N - 1),
                        route.dist_after(v.position + M),
                    ],
                );
                let ls = merge_load(&[
                    route.load_before(u.position - 1),
                    route.load_between(v.position, v.position + M - 1),
                    route.load_between(u.position + N, v.position - 1),
                    route.load_between(u.position, u.position + N - 1),
                    route.load_after(v.position + M),
                ]);
                let ds = merge_dur(
                    data,
                    &[
                        route.dur_before(u.position - 1),
                        route.dur_between(data, v.position, v.position + M - 1),
                        route.dur_between(data, u.position + N, v.position - 1),
                        route.dur_between(data, u.position, u.position + N - 1),
                        route.dur_after(v.position + M),
                    ],
                );
                (dist, ls, ds)
            } else {
                let dist = merge_dist(
                    data,
                    &[
                        route.dist_before(v.position - 1),
                        route.dist_between(u.position, u.position + N - 1),
                        route.dist_between(v.position + M, u.position - 1),
                        route.dist_between(v.position, v.position + M - 1),
                        route.dist_after(u.position + N),
                    ],
                );
                let ls = merge_load(&[
                    route.load_before(v.position - 1),
                    route.load_between(u.position, u.position + N - 1),
                    route.load_between(v.position + M, u.position - 1),
                    route.load_between(v.position, v.position + M - 1),
                    route.load_after(u.position + N),
                ]);
                let ds = merge_dur(
                    data,
                    &[
                        route.dur_before(v.position - 1),
                        route.dur_between(data, u.position, u.position + N - 1),
                        route.dur_between(data, v.position + M, u.position - 1),
                        route.dur_between(data, v.position, v.position + M - 1),
                        route.dur_after(u.position + N),
                    ],
                );
                (dist, ls, ds)
            };

            delta_for_route(
                cost_evaluator,
                route,
                dist.distance(),
                ds.duration(),
                ds.time_warp(route.max_duration()),
                ls.load(),
            )
        }
    }
}

impl<const N: usize, const M: usize> NodeOperator for Exchange<N, M> {
    fn name(&self) -> &'static str {
        match (N, M) {
            (1, 0) => "Exchange(1,0)",
            (2, 0) => "Exchange(2,0)",
            (3, 0) => "Exchange(3,0)",
            (1, 1) => "Exchange(1,1)",
            (2, 1) => "Exchange(2,1)",
            (2, 2) => "Exchange(2,2)",
            (3, 1) => "Exchange(3,1)",
            (3, 2) => "Exchange(3,2)",
            (3, 3) => "Exchange(3,3)",
            _ => "Exchange",
        }
    }

    fn evaluate(
        &self,
        u: NodePos,
        v: NodePos,
        solution: &WorkingSolution,
        cost_evaluator: &CostEvaluator,
    ) -> Cost {
        let () = Self::VALID;

        let u_route = solution.route(u.route);
        let v_route = solution.route(v.route);

        if contains_depot(u_route, u.position, N) || Self::overlap(u, v) {
            return 0;
        }

        if M > 0 && contains_depot(v_route, v.position, M) {
            return 0;
        }

        if M == 0 {
            // Inserting after the end depot is meaningless, and relocating
            // onto the own predecessor is a no-op.
            if v.position > v_route.len() {
                return 0;
            }
            if u.route == v.route && u.position == v.position + 1 {
                return 0;
            }

            self.eval_relocate(u, v, solution, cost_evaluator)
        } else {
            // Symmetric moves only need evaluating in one direction.
            if N == M && u_route.location(u.position) >= v_route.location(v.position) {
                return 0;
            }
            if Self::adjacent(u, v) {
                return 0;
            }

            self.eval_swap(u, v, solution, cost_evaluator)
        }
    }

    fn apply(&self, u: NodePos, v: NodePos, solution: &mut WorkingSolution) {
        if u.route != v.route {
            let (u_route, v_route) = solution.route_pair_mut(u.route, v.route);

            let u_seg: Vec<LocationIdx> =
                u_route.visits()[u.position - 1..u.position - 1 + N].to_vec();
            let v_seg: Vec<LocationIdx> = if M == 0 {
                Vec::new()
            } else {
                v_route.visits()[v.position - 1..v.position - 1 + M].to_vec()
            };

            u_route.replace(u.position, u.position + N, &v_seg);
            if M == 0 {
                v_route.replace(v.position + 1, v.position + 1, &u_seg);
            } else {
                v_route.replace(v.position, v.position + M, &u_seg);
            }
        } else {
            let route = solution.route_mut(u.route);
            let old = route.visits().to_vec();
            let u0 = u.position - 1;

            let mut new_visits: Vec<LocationIdx> = Vec::with_capacity(old.len());
            if M == 0 {
                if u.position < v.position {
                    new_visits.extend_from_slice(&old[..u0]);
                    new_visits.extend_from_slice(&old[u0 + N..v.position]);
                    new_visits.extend_from_slice(&old[u0..u0 + N]);
                    new_visits.extend_from_slice(&old[v.position..]);
                } else {
                    new_visits.extend_from_slice(&old[..v.position]);
                    new_visits.extend_from_slice(&old[u0..u0 + N]);
                    new_visits.extend_from_slice(&old[v.position..u0]);
                    new_visits.extend_from_slice(&old[u0 + N..]);
                }
            } else {
                let v0 = v.position - 1;
                if u.position < v.position {
                    new_visits.extend_from_slice(&old[..u0]);
                    new_visits.extend_from_slice(&old[v0..v0 + M]);
                    new_visits.extend_from_slice(&old[u0 + N..v0]);
                    new_visits.extend_from_slice(&old[u0..u0 + N]);
                    new_visits.extend_from_slice(&old[v0 + M..]);
                } else {
                    new_visits.extend_from_slice(&old[..v0]);
                    new_visits.extend_from_slice(&old[u0..u0 + N]);
                    new_visits.extend_from_slice(&old[v0 + M..u0]);
                    new_visits.extend_from_slice(&old[v0..v0 + M]);
                    new_visits.extend_from_slice(&old[u0 + N..]);
                }
            }

            route.replace(1, old.len() + 1, &new_visits);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        problem::vehicle_type::VehicleTypeIdx,
        search::{route::RouteIdx, solution::Solution, working_solution::WorkingSolution},
        test_utils::{self, apply_and_update, working_cost},
    };

    #[test]
    fn test_relocate_between_routes_matches_recompute() {
        let data = Arc::new(test_utils::ok_small());
        let solution = Solution::from_route_lists(&data, &[vec![1, 2], vec![3, 4]]).unwrap();
        let mut state =
            WorkingSolution::from_solution(Arc::clone(&data), &solution);

        let cost_evaluator = CostEvaluator::new(20, 6);
        let op = Exchange10::new();

        // Relocate client 2 after client 3 in the other route.
        let u = NodePos::new(RouteIdx::new(0), 2);
        let v = NodePos::new(RouteIdx::new(1), 1);

        let delta = op.evaluate(u, v, &state, &cost_evaluator);
        let before = working_cost(&state, &cost_evaluator);
        apply_and_update(&op, u, v, &mut state);
        let after = working_cost(&state, &cost_evaluator);

        assert_eq!(after - before, delta);
        assert_eq!(
            state.route(RouteIdx::new(0)).visits(),
            &[LocationIdx::new(1)]
        );
        assert_eq!(
            state
                .route(RouteIdx::new(1))
                .visits()
                .iter()
                .map(|c| c.get())
                .collect::<Vec<_>>(),
            vec![3, 2, 4]
        );
    }

    #[test]
    fn test_relocate_within_route_matches_recompute() {
        let data = Arc::new(test_utils::ok_small());
        let solution = Solution::from_route_lists(&data, &[vec![1, 2, 3, 4]]).unwrap();
        let mut state =
            WorkingSolution::from_solution(Arc::clone(&data), &solution);

        let cost_evaluator = CostEvaluator::new(20, 6);
        let op = Exchange10::new();

        // Move client 1 after client 3 (U before V).
        let u = NodePos::new(RouteIdx::new(0), 1);
        let v = NodePos::new(RouteIdx::new(0), 3);

        let delta = op.evaluate(u, v, &state, &cost_evaluator);
        let before = working_cost(&state, &cost_evaluator);
        apply_and_update(&op, u, v, &mut state);
        let after = working_cost(&state, &cost_evaluator);

        assert_eq!(after - before, delta);
        assert_eq!(
            state
                .route(RouteIdx::new(0))
                .visits()
                .iter()
                .map(|c| c.get())
                .collect::<Vec<_>>(),
            vec![2, 3, 1, 4]
        );

        // And V before U.
        let u = NodePos::new(RouteIdx::new(0), 3);
        let v = NodePos::new(RouteIdx::new(0), 1);

        let delta = op.evaluate(u, v, &state, &cost_evaluator);
        let before = working_cost(&state, &cost_evaluator);
        apply_and_update(&op, u, v, &mut state);
        let after = working_cost(&state, &cost_evaluator);

        assert_eq!(after - before, delta);
        assert_eq!(
            state
                .route(RouteIdx::new(0))
                .visits()
                .iter()
                .map(|c| c.get())
                .collect::<Vec<_>>(),
            vec![2, 1, 3, 4]
        );
    }

    #[test]
    fn test_relocate_rejects_depot_segments_and_no_ops() {
        let data = Arc::new(test_utils::ok_small());
        let solution = Solution::from_route_lists(&data, &[vec![1, 2, 3, 4]]).unwrap();
        let state =
            WorkingSolution::from_solution(Arc::clone(&data), &solution);

        let cost_evaluator = CostEvaluator::new(20, 6);
        let op = Exchange20::new();
        let route = RouteIdx::new(0);

        // The pair (4, depot) sticks out past the last client.
        assert_eq!(
            op.evaluate(NodePos::new(route, 4), NodePos::new(route, 1), &state, &cost_evaluator),
            0
        );
        // Overlapping segments.
        assert_eq!(
            op.evaluate(NodePos::new(route, 2), NodePos::new(route, 3), &state, &cost_evaluator),
            0
        );
        // Relocating directly after the own predecessor is a no-op.
        assert_eq!(
            op.evaluate(NodePos::new(route, 2), NodePos::new(route, 1), &state, &cost_evaluator),
            0
        );
    }

    #[test]
    fn test_swap_between_routes_matches_recompute() {
        let data = Arc::new(test_utils::ok_small());
        let solution = Solution::from_route_lists(&data, &[vec![1, 2], vec![3, 4]]).unwrap();
        let mut state =
            WorkingSolution::from_solution(Arc::clone(&data), &solution);

        let cost_evaluator = CostEvaluator::new(20, 6);
        let op = Exchange11::new();

        let u = NodePos::new(RouteIdx::new(0), 1);
        let v = NodePos::new(RouteIdx::new(1), 2);

        let delta = op.evaluate(u, v, &state, &cost_evaluator);
        assert_ne!(delta, 0);

        let before = working_cost(&state, &cost_evaluator);
        apply_and_update(&op, u, v, &mut state);
        let after = working_cost(&state, &cost_evaluator);

        assert_eq!(after - before, delta);
        assert_eq!(
            state
                .route(RouteIdx::new(0))
                .visits()
                .iter()
                .map(|c| c.get())
                .collect::<Vec<_>>(),
            vec![4, 2]
        );
        assert_eq!(
            state
                .route(RouteIdx::new(1))
                .visits()
                .iter()
                .map(|c| c.get())
                .collect::<Vec<_>>(),
            vec![3, 1]
        );
    }

    #[test]
    fn test_swap_symmetric_pairs_evaluate_once() {
        let data = Arc::new(test_utils::ok_small());
        let solution = Solution::from_route_lists(&data, &[vec![1, 2], vec![3, 4]]).unwrap();
        let state =
            WorkingSolution::from_solution(Arc::clone(&data), &solution);

        let cost_evaluator = CostEvaluator::new(20, 6);
        let op = Exchange11::new();

        // (4, 1) is the mirror of (1, 4) and must be skipped.
        let u = NodePos::new(RouteIdx::new(1), 2);
        let v = NodePos::new(RouteIdx::new(0), 1);
        assert_eq!(op.evaluate(u, v, &state, &cost_evaluator), 0);
    }

    #[test]
    fn test_unbalanced_swap_within_route_matches_recompute() {
        let data = Arc::new(test_utils::ok_small());
        let solution = Solution::from_route_lists(&data, &[vec![1, 2, 3, 4]]).unwrap();
        let mut state =
            WorkingSolution::from_solution(Arc::clone(&data), &solution);

        let cost_evaluator = CostEvaluator::new(20, 6);
        let op = Exchange21::new();

        // Swap the pair (1, 2) against the single client 4.
        let u = NodePos::new(RouteIdx::new(0), 1);
        let v = NodePos::new(RouteIdx::new(0), 4);

        let delta = op.evaluate(u, v, &state, &cost_evaluator);
        let before = working_cost(&state, &cost_evaluator);
        apply_and_update(&op, u, v, &mut state);
        let after = working_cost(&state, &cost_evaluator);

        assert_eq!(after - before, delta);
        assert_eq!(
            state
                .route(RouteIdx::new(0))
                .visits()
                .iter()
                .map(|c| c.get())
                .collect::<Vec<_>>(),
            vec![4, 3, 1, 2]
        );
    }

    #[test]
    fn test_relocate_into_empty_route_pays_fixed_cost() {
        let data = Arc::new(test_utils::two_vehicle_types_zero_matrix(7, 13));
        let solution = Solution::new(
            &data,
            vec![(
                vec![
                    LocationIdx::new(1),
                    LocationIdx::new(2),
                ],
                VehicleTypeIdx::new(0),
            )],
        )
        .unwrap();
        let mut state =
            WorkingSolution::from_solution(Arc::clone(&data), &solution);

        let cost_evaluator = CostEvaluator::new(0, 0);
        let op = Exchange20::new();

        // Moving both clients into the unused second vehicle trades fixed
        // cost 7 for 13.
        let u = NodePos::new(RouteIdx::new(0), 1);
        let v = NodePos::new(RouteIdx::new(1), 0);

        let delta = op.evaluate(u, v, &state, &cost_evaluator);
        assert_eq!(delta, 13 - 7);

        let before = working_cost(&state, &cost_evaluator);
        apply_and_update(&op, u, v, &mut state);
        let after = working_cost(&state, &cost_evaluator);
        assert_eq!(after - before, delta);
    }
}
