use smallvec::SmallVec;

use crate::{
    problem::{location::LocationIdx, measure::Cost},
    search::{
        cost_evaluator::CostEvaluator,
        distance_segment::DistanceSegment,
        ops::operator::{NodeOperator, NodePos, delta_for_route, merge_dist, merge_dur, merge_load},
        working_solution::WorkingSolution,
    },
};

/// **Move two clients, reversed**
///
/// Removes the consecutive pair (`U`, `X` = `U`'s successor) from its route
/// and reinserts it directly after `V` in reversed order.
///
/// ```text
/// BEFORE:
///    R1: ... (A) -> [U] -> [X] -> (B) ...
///    R2: ... (V) -> (Y) ...
///
/// AFTER:
///    R1: ... (A) -> (B) ...
///    R2: ... (V) -> [X] -> [U] -> (Y) ...
/// ```
#[derive(Debug, Default)]
pub struct MoveTwoClientsReversed;

impl MoveTwoClientsReversed {
    pub fn new() -> Self {
        MoveTwoClientsReversed
    }
}

impl NodeOperator for MoveTwoClientsReversed {
    fn name(&self) -> &'static str {
        "MoveTwoClientsReversed"
    }

    fn evaluate(
        &self,
        u: NodePos,
        v: NodePos,
        solution: &WorkingSolution,
        cost_evaluator: &CostEvaluator,
    ) -> Cost {
        let data = solution.data();
        let u_route = solution.route(u.route);
        let v_route = solution.route(v.route);

        let x = u.position + 1;

        // U and its successor must both be clients, and V must be a node we
        // can insert after.
        if u.position == 0 || x > u_route.len() || v.position > v_route.len() {
            return 0;
        }

        if u.route == v.route {
            // V inside the moved pair, or directly before it (a degenerate
            // in-place case).
            if v.position == u.position || v.position == x || u.position == v.position + 1 {
                return 0;
            }
        }

        if u.route != v.route {
            let u_dist = merge_dist(
                data,
                &[
                    u_route.dist_before(u.position - 1),
                    u_route.dist_after(x + 1),
                ],
            );
            let u_ls = merge_load(&[
                u_route.load_before(u.position - 1),
                u_route.load_after(x + 1),
            ]);
            let u_ds = merge_dur(
                data,
                &[u_route.dur_before(u.position - 1), u_route.dur_after(x + 1)],
            );

            let v_dist = merge_dist(
                data,
                &[
                    v_route.dist_before(v.position),
                    DistanceSegment::at(u_route.location(x)),
                    DistanceSegment::at(u_route.location(u.position)),
                    v_route.dist_after(v.position + 1),
                ],
            );
            let v_ls = merge_load(&[
                v_route.load_before(v.position),
                u_route.load_at(x),
                u_route.load_at(u.position),
                v_route.load_after(v.position + 1),
            ]);
            let v_ds = merge_dur(
                data,
                &[
                    v_route.dur_before(v.position),
                    u_route.dur_at(x),
                    u_route.dur_at(u.position),
                    v_route.dur_after(v.position + 1),
                ],
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

            if v_route.is_empty() {
                delta += v_route.fixed_cost();
            }
            if u_route.len() == 2 {
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
                        route.dist_between(x + 1, v.position),
                        DistanceSegment::at(route.location(x)),
                        DistanceSegment::at(route.location(u.position)),
                        route.dist_after(v.position + 1),
                    ],
                );
                let ls = merge_load(&[
                    route.load_before(u.position - 1),
                    route.load_between(x + 1, v.position),
                    route.load_at(x),
                    route.load_at(u.position),
                    route.load_after(v.position + 1),
                ]);
                let ds = merge_dur(
                    data,
                    &[
                        route.dur_before(u.position - 1),
                        route.dur_between(data, x + 1, v.position),
                        route.dur_at(x),
                        route.dur_at(u.position),
                        route.dur_after(v.position + 1),
                    ],
                );
                (dist, ls, ds)
            } else {
                let dist = merge_dist(
                    data,
                    &[
                        route.dist_before(v.position),
                        DistanceSegment::at(route.location(x)),
                        DistanceSegment::at(route.location(u.position)),
                        route.dist_between(v.position + 1, u.position - 1),
                        route.dist_after(x + 1),
                    ],
                );
                let ls = merge_load(&[
                    route.load_before(v.position),
                    route.load_at(x),
                    route.load_at(u.position),
                    route.load_between(v.position + 1, u.position - 1),
                    route.load_after(x + 1),
                ]);
                let ds = merge_dur(
                    data,
                    &[
                        route.dur_before(v.position),
                        route.dur_at(x),
                        route.dur_at(u.position),
                        route.dur_between(data, v.position + 1, u.position - 1),
                        route.dur_after(x + 1),
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

    fn apply(&self, u: NodePos, v: NodePos, solution: &mut WorkingSolution) {
        let x = u.position + 1;

        if u.route != v.route {
            let (u_route, v_route) = solution.route_pair_mut(u.route, v.route);
            let pair: SmallVec<[LocationIdx; 2]> =
                SmallVec::from_slice(&[u_route.location(x), u_route.location(u.position)]);

            u_route.replace(u.position, x + 1, &[]);
            v_route.replace(v.position + 1, v.position + 1, &pair);
        } else {
            let route = solution.route_mut(u.route);
            let old = route.visits().to_vec();
            let u_client = old[u.position - 1];
            let x_client = old[u.position];

            let mut new_visits: Vec<LocationIdx> = Vec::with_capacity(old.len());
            for position in 0..=old.len() {
                if position >= 1 && position != u.position && position != x {
                    new_visits.push(old[position - 1]);
                }
                if position == v.position {
                    new_visits.push(x_client);
                    new_visits.push(u_client);
                }
            }

            route.replace(1, old.len() + 1, &new_visits);
        }
    }
}
