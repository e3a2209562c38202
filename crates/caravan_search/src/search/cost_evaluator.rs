use crate::{
    problem::measure::{Cost, Duration, Load},
    search::solution::Solution,
};

/// Maps raw route measurements to a penalized scalar cost. Stateless; one
/// instance is reused across many evaluations. All arithmetic saturates so
/// forbidden-arc sentinels cap the cost instead of wrapping.
#[derive(Debug, Clone, Copy)]
pub struct CostEvaluator {
    load_penalty: Cost,
    tw_penalty: Cost,
}

impl CostEvaluator {
    pub fn new(load_penalty: Cost, tw_penalty: Cost) -> Self {
        CostEvaluator {
            load_penalty,
            tw_penalty,
        }
    }

    /// Penalty for exceeding `capacity` with a peak load of `load`.
    pub fn load_penalty(&self, load: Load, capacity: Load) -> Cost {
        self.excess_load_penalty((load - capacity).max(0))
    }

    pub fn excess_load_penalty(&self, excess_load: Load) -> Cost {
        excess_load.saturating_mul(self.load_penalty)
    }

    pub fn tw_penalty(&self, time_warp: Duration) -> Cost {
        time_warp.saturating_mul(self.tw_penalty)
    }

    /// The penalized objective: travel and fixed costs plus load and
    /// time-warp penalties, minus collected prizes.
    pub fn penalised_cost(&self, solution: &Solution) -> Cost {
        let mut cost: Cost = 0;

        for route in solution.routes() {
            cost = cost
                .saturating_add(route.distance().saturating_mul(route.unit_distance_cost()))
                .saturating_add(route.duration().saturating_mul(route.unit_duration_cost()))
                .saturating_add(route.fixed_cost())
                .saturating_add(self.excess_load_penalty(route.excess_load()))
                .saturating_add(self.tw_penalty(route.time_warp()));
        }

        cost.saturating_sub(solution.prizes())
    }

    /// The unpenalized objective, for reporting feasible solutions.
    pub fn cost(&self, solution: &Solution) -> Cost {
        let mut cost: Cost = 0;

        for route in solution.routes() {
            cost = cost
                .saturating_add(route.distance().saturating_mul(route.unit_distance_cost()))
                .saturating_add(route.duration().saturating_mul(route.unit_duration_cost()))
                .saturating_add(route.fixed_cost());
        }

        cost.saturating_sub(solution.prizes())
    }
}
