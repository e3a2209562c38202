use crate::{
    problem::{measure::Cost, problem_data::ProblemData},
    search::{
        cost_evaluator::CostEvaluator,
        distance_segment::DistanceSegment,
        duration_segment::DurationSegment,
        load_segment::LoadSegment,
        ops::operator::{
            NodeOperator, NodePos, delta_for_route, fixed_cost_delta, merge_dist, merge_dur,
            merge_load,
        },
        route::Route,
        working_solution::WorkingSolution,
    },
};

/// **2-opt**
///
/// Within one route, reverses the segment strictly between `U` and `V`.
/// Across two routes, exchanges the tails after `U` and after `V` (2-opt*).
///
/// ```text
/// WITHIN (U = 1, V = 4):
///    BEFORE: (D) -> [1] -> [2] -> [3] -> [4] -> (D)
///    AFTER:  (D) -> [1] -> [3] -> [2] -> [4] -> (D)
///
/// ACROSS:
///    BEFORE: R1: ... [U] -> (a) -> (b)      R2: ... [V] -> (x)
///    AFTER:  R1: ... [U] -> (x)             R2: ... [V] -> (a) -> (b)
/// ```
#[derive(Debug, Default)]
pub struct TwoOpt;

impl TwoOpt {
    pub fn new() -> Self {
        TwoOpt
    }

    fn eval_within(
        u: NodePos,
        v: NodePos,
        solution: &WorkingSolution,
        cost_evaluator: &CostEvaluator,
    ) -> Cost {
        let data = solution.data();
        let route = solution.route(u.route);

        let dist = merge_dist(
            data,
            &[
                route.dist_before(u.position),
                reversed_dist(data, route, u.position + 1, v.position),
                route.dist_after(v.position + 1),
            ],
        );
        let ls = merge_load(&[
            route.load_before(u.position),
            reversed_load(route, u.position + 1, v.position),
            route.load_after(v.position + 1),
        ]);
        let ds = merge_dur(
            data,
            &[
                route.dur_before(u.position),
                reversed_dur(data, route, u.position + 1, v.position),
                route.dur_after(v.position + 1),
            ],
        );

        delta_for_route(
            cost_evaluator,
            route,
            dist.distance(),
            ds.duration(),
            ds.time_warp(route.max_duration()),
            ls.load(),
        )
    }

    fn eval_across(
        u: NodePos,
        v: NodePos,
        solution: &WorkingSolution,
        cost_evaluator: &CostEvaluator,
    ) -> Cost {
        let data = solution.data();
        let u_route = solution.route(u.route);
        let v_route = solution.route(v.route);

        let u_dist = DistanceSegment::merge(
            data.distance_matrix(),
            u_route.dist_before(u.position),
            v_route.dist_after(v.position + 1),
        );
        let u_ls = LoadSegment::merge(
            u_route.load_before(u.position),
            v_route.load_after(v.position + 1),
        );
        let u_ds = DurationSegment::merge(
            data.duration_matrix(),
            u_route.dur_before(u.position),
            v_route.dur_after(v.position + 1),
        );

        let v_dist = DistanceSegment::merge(
            data.distance_matrix(),
            v_route.dist_before(v.position),
            u_route.dist_after(u.position + 1),
        );
        let v_ls = LoadSegment::merge(
            v_route.load_before(v.position),
            u_route.load_after(u.position + 1),
        );
        let v_ds = DurationSegment::merge(
            data.duration_matrix(),
            v_route.dur_before(v.position),
            u_route.dur_after(u.position + 1),
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

        let u_new_len = u.position + (v_route.len() - v.position);
        let v_new_len = v.position + (u_route.len() - u.position);
        delta += fixed_cost_delta(u_route, u_new_len);
        delta += fixed_cost_delta(v_route, v_new_len);

        delta
    }
}

fn reversed_dist(
    data: &ProblemData,
    route: &Route,
    start: usize,
    end: usize,
) -> DistanceSegment {
    let mut segment = DistanceSegment::at(route.location(end));
    for position in (start..end).rev() {
        segment = DistanceSegment::merge(
            data.distance_matrix(),
            segment,
            DistanceSegment::at(route.location(position)),
        );
    }
    segment
}

fn reversed_load(route: &Route, start: usize, end: usize) -> LoadSegment {
    let mut segment = route.load_at(end);
    for position in (start..end).rev() {
        segment = LoadSegment::merge(segment, route.load_at(position));
    }
    segment
}

fn reversed_dur(
    data: &ProblemData,
    route: &Route,
    start: usize,
    end: usize,
) -> DurationSegment {
    let mut segment = route.dur_at(end);
    for position in (start..end).rev() {
        segment = DurationSegment::merge(data.duration_matrix(), segment, route.dur_at(position));
    }
    segment
}

impl NodeOperator for TwoOpt {
    fn name(&self) -> &'static str {
        "2-Opt"
    }

    fn evaluate(
        &self,
        u: NodePos,
        v: NodePos,
        solution: &WorkingSolution,
        cost_evaluator: &CostEvaluator,
    ) -> Cost {
        let u_route = solution.route(u.route);
        let v_route = solution.route(v.route);

        if u.route == v.route {
            // Reversing fewer than two clients changes nothing.
            if v.position > u_route.len() || u.position + 1 >= v.position {
                return 0;
            }

            TwoOpt::eval_within(u, v, solution, cost_evaluator)
        } else {
            if u.position > u_route.len() || v.position > v_route.len() {
                return 0;
            }
            // Both tails empty: nothing to exchange.
            if u.position == u_route.len() && v.position == v_route.len() {
                return 0;
            }

            TwoOpt::eval_across(u, v, solution, cost_evaluator)
        }
    }

    fn apply(&self, u: NodePos, v: NodePos, solution: &mut WorkingSolution) {
        if u.route == v.route {
            let route = solution.route_mut(u.route);
            route.reverse(u.position + 1, v.position);
        } else {
            let (u_route, v_route) = solution.route_pair_mut(u.route, v.route);

            let u_tail = u_route.visits()[u.position..].to_vec();
            let v_tail = v_route.visits()[v.position..].to_vec();

            u_route.replace(u.position + 1, u_route.len() + 1, &v_tail);
            v_route.replace(v.position + 1, v_route.len() + 1, &u_tail);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        search::{route::RouteIdx, solution::Solution, working_solution::WorkingSolution},
        test_utils::{self, apply_and_update, working_cost},
    };

    #[test]
    fn test_within_route_reversal_matches_recompute() {
        let data = Arc::new(test_utils::ok_small());
        let solution = Solution::from_route_lists(&data, &[vec![1, 2, 3, 4]]).unwrap();
        let mut state = WorkingSolution::from_solution(Arc::clone(&data), &solution);

        let cost_evaluator = CostEvaluator::new(20, 6);
        let op = TwoOpt::new();
        let route = RouteIdx::new(0);

        let u = NodePos::new(route, 1);
        let v = NodePos::new(route, 4);

        let delta = op.evaluate(u, v, &state, &cost_evaluator);
        let before = working_cost(&state, &cost_evaluator);
        apply_and_update(&op, u, v, &mut state);
        let after = working_cost(&state, &cost_evaluator);

        assert_eq!(after - before, delta);
        assert_eq!(
            state
                .route(route)
                .visits()
                .iter()
                .map(|c| c.get())
                .collect::<Vec<_>>(),
            vec![1, 3, 2, 4]
        );
    }

    #[test]
    fn test_within_route_rejects_short_segments() {
        let data = Arc::new(test_utils::ok_small());
        let solution = Solution::from_route_lists(&data, &[vec![1, 2, 3, 4]]).unwrap();
        let state = WorkingSolution::from_solution(Arc::clone(&data), &solution);

        let cost_evaluator = CostEvaluator::new(20, 6);
        let op = TwoOpt::new();
        let route = RouteIdx::new(0);

        // Adjacent positions reverse a single client: a no-op.
        assert_eq!(
            op.evaluate(NodePos::new(route, 2), NodePos::new(route, 3), &state, &cost_evaluator),
            0
        );
        // V before U is the mirrored pair.
        assert_eq!(
            op.evaluate(NodePos::new(route, 3), NodePos::new(route, 1), &state, &cost_evaluator),
            0
        );
    }

    #[test]
    fn test_tail_exchange_matches_recompute() {
        let data = Arc::new(test_utils::ok_small());
        let solution = Solution::from_route_lists(&data, &[vec![1, 2], vec![3, 4]]).unwrap();
        let mut state = WorkingSolution::from_solution(Arc::clone(&data), &solution);

        let cost_evaluator = CostEvaluator::new(20, 6);
        let op = TwoOpt::new();

        let u = NodePos::new(RouteIdx::new(0), 1);
        let v = NodePos::new(RouteIdx::new(1), 1);

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
            vec![1, 4]
        );
        assert_eq!(
            state
                .route(RouteIdx::new(1))
                .visits()
                .iter()
                .map(|c| c.get())
                .collect::<Vec<_>>(),
            vec![3, 2]
        );
    }

    #[test]
    fn test_tail_exchange_into_empty_route() {
        let data = Arc::new(test_utils::ok_small());
        let solution = Solution::from_route_lists(&data, &[vec![1, 2, 3, 4]]).unwrap();
        let mut state = WorkingSolution::from_solution(Arc::clone(&data), &solution);

        let cost_evaluator = CostEvaluator::new(20, 6);
        let op = TwoOpt::new();

        // Move the tail (3, 4) onto the unused second vehicle.
        let u = NodePos::new(RouteIdx::new(0), 2);
        let v = NodePos::new(RouteIdx::new(1), 0);

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
            vec![1, 2]
        );
        assert_eq!(
            state
                .route(RouteIdx::new(1))
                .visits()
                .iter()
                .map(|c| c.get())
                .collect::<Vec<_>>(),
            vec![3, 4]
        );
    }
}
