use crate::{
    problem::{
        measure::{Cost, Distance, Duration, Load},
        problem_data::ProblemData,
    },
    search::{
        cost_evaluator::CostEvaluator,
        distance_segment::DistanceSegment,
        duration_segment::DurationSegment,
        load_segment::LoadSegment,
        route::{Route, RouteIdx},
        working_solution::WorkingSolution,
    },
};

/// A resolved node reference: a route and a node position within it
/// (0 = start depot, 1..=len = clients, len + 1 = end depot).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodePos {
    pub route: RouteIdx,
    pub position: usize,
}

impl NodePos {
    pub fn new(route: RouteIdx, position: usize) -> Self {
        NodePos { route, position }
    }
}

/// A local move family. `evaluate` returns the marginal change in penalised
/// cost of the proposed edit without mutating anything; a negative value is
/// an improvement, and zero marks a structurally inapplicable pair. `apply`
/// performs the edit and leaves the touched routes' aggregates stale; the
/// caller must `update()` them before the next query.
///
/// For every valid pair, `evaluate` equals exactly the difference in
/// penalised cost that applying the move and updating would produce.
pub trait NodeOperator: Send + Sync {
    fn name(&self) -> &'static str;

    fn evaluate(
        &self,
        u: NodePos,
        v: NodePos,
        solution: &WorkingSolution,
        cost_evaluator: &CostEvaluator,
    ) -> Cost;

    fn apply(&self, u: NodePos, v: NodePos, solution: &mut WorkingSolution);
}

/// Marginal cost of replacing a route's measurements with new ones: travel
/// and duration at the route's unit costs, plus penalty differences.
pub(crate) fn delta_for_route(
    cost_evaluator: &CostEvaluator,
    route: &Route,
    new_distance: Distance,
    new_duration: Duration,
    new_time_warp: Duration,
    new_load: Load,
) -> Cost {
    let capacity = route.capacity();

    (new_distance - route.distance())
        .saturating_mul(route.unit_distance_cost())
        .saturating_add(
            (new_duration - route.duration()).saturating_mul(route.unit_duration_cost()),
        )
        .saturating_add(cost_evaluator.tw_penalty(new_time_warp))
        .saturating_sub(cost_evaluator.tw_penalty(route.time_warp()))
        .saturating_add(cost_evaluator.load_penalty(new_load, capacity))
        .saturating_sub(cost_evaluator.load_penalty(route.load(), capacity))
}

/// Fixed-cost change when a route's client count moves between zero and
/// non-zero.
pub(crate) fn fixed_cost_delta(route: &Route, new_len: usize) -> Cost {
    if route.is_empty() && new_len > 0 {
        route.fixed_cost()
    } else if !route.is_empty() && new_len == 0 {
        -route.fixed_cost()
    } else {
        0
    }
}

pub(crate) fn merge_dist(data: &ProblemData, segments: &[DistanceSegment]) -> DistanceSegment {
    let mut merged = segments[0];
    for &segment in &segments[1..] {
        merged = DistanceSegment::merge(data.distance_matrix(), merged, segment);
    }
    merged
}

pub(crate) fn merge_load(segments: &[LoadSegment]) -> LoadSegment {
    let mut merged = segments[0];
    for &segment in &segments[1..] {
        merged = LoadSegment::merge(merged, segment);
    }
    merged
}

pub(crate) fn merge_dur(data: &ProblemData, segments: &[DurationSegment]) -> DurationSegment {
    let mut merged = segments[0];
    for &segment in &segments[1..] {
        merged = DurationSegment::merge(data.duration_matrix(), merged, segment);
    }
    merged
}
