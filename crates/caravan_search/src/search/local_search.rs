use std::{collections::VecDeque, sync::Arc};

use fixedbitset::FixedBitSet;
use jiff::{SignedDuration, Timestamp};
use rand::{SeedableRng, rngs::SmallRng, seq::SliceRandom};
use rayon::iter::{IndexedParallelIterator, IntoParallelRefIterator, ParallelIterator};
use smallvec::SmallVec;
use tracing::debug;

use crate::{
    problem::{
        location::LocationIdx,
        measure::Cost,
        problem_data::ProblemData,
        vehicle_type::VehicleTypeIdx,
    },
    search::{
        cost_evaluator::CostEvaluator,
        neighbourhood::NeighbourLists,
        ops::operator::{NodeOperator, NodePos},
        route::RouteIdx,
        search_params::{SearchParams, SearchStrategy},
        solution::Solution,
        working_solution::WorkingSolution,
    },
};

#[derive(Debug, Clone, Copy, Default)]
pub struct SearchStatistics {
    /// Dirty nodes processed.
    pub iterations: usize,
    pub moves_applied: usize,
    pub elapsed: SignedDuration,
    /// False when the run stopped on a budget rather than a local optimum.
    pub converged: bool,
}

/// Orchestrates the registered move operators over the granular
/// neighbourhood until no improving move remains, or the budget runs out.
///
/// One instance drives one solution at a time and owns all mutable search
/// state; the problem data and neighbour lists are shared read-only, so
/// independent instances can run concurrently (see [`search_in_parallel`]).
pub struct LocalSearch {
    data: Arc<ProblemData>,
    neighbours: Arc<NeighbourLists>,
    node_ops: Vec<Box<dyn NodeOperator>>,
    params: SearchParams,
    rng: SmallRng,
    queue: VecDeque<LocationIdx>,
    pending: FixedBitSet,
    statistics: SearchStatistics,
}

impl LocalSearch {
    pub fn new(data: Arc<ProblemData>, neighbours: impl Into<Arc<NeighbourLists>>) -> Self {
        Self::with_params(data, neighbours, SearchParams::default())
    }

    pub fn with_params(
        data: Arc<ProblemData>,
        neighbours: impl Into<Arc<NeighbourLists>>,
        params: SearchParams,
    ) -> Self {
        let num_locations = data.num_locations();
        let neighbours = neighbours.into();
        debug_assert_eq!(neighbours.len(), num_locations);

        LocalSearch {
            data,
            neighbours,
            node_ops: Vec::new(),
            rng: SmallRng::seed_from_u64(params.seed),
            params,
            queue: VecDeque::with_capacity(num_locations),
            pending: FixedBitSet::with_capacity(num_locations),
            statistics: SearchStatistics::default(),
        }
    }

    pub fn add_node_operator(&mut self, op: impl NodeOperator + 'static) {
        self.node_ops.push(Box::new(op));
    }

    pub fn num_node_operators(&self) -> usize {
        self.node_ops.len()
    }

    /// Statistics of the most recent [`LocalSearch::search`] run.
    pub fn statistics(&self) -> &SearchStatistics {
        &self.statistics
    }

    /// Improves the given solution until no registered operator finds an
    /// improving move within the neighbourhood, or the budget is exhausted.
    /// The returned solution is structurally valid either way.
    ///
    /// The search runs in two phases: moves into empty routes join only
    /// after the neighbourhood moves alone have run dry, mirroring the
    /// step-zero exclusion of route-opening moves in granular search.
    pub fn search(&mut self, solution: &Solution, cost_evaluator: &CostEvaluator) -> Solution {
        let started = Timestamp::now();
        let mut state = WorkingSolution::from_solution(Arc::clone(&self.data), solution);

        self.queue.clear();
        self.pending.clear();
        self.seed_queue(&state);

        let mut iterations = 0;
        let mut moves_applied = 0;
        let mut converged = true;
        let mut route_open_moves = false;

        'search: loop {
            while let Some(client) = self.queue.pop_front() {
                self.pending.set(client.get(), false);
                iterations += 1;

                let elapsed = Timestamp::now().duration_since(started);
                if self.params.budget.is_exhausted(iterations, elapsed) {
                    debug!("budget exhausted after {iterations} iterations");
                    converged = false;
                    break 'search;
                }

                if self.improve_node(&mut state, client, cost_evaluator, route_open_moves) {
                    moves_applied += 1;
                }
            }

            if route_open_moves {
                break;
            }

            route_open_moves = true;
            self.seed_queue(&state);
            if self.queue.is_empty() {
                break;
            }
        }

        self.statistics = SearchStatistics {
            iterations,
            moves_applied,
            elapsed: Timestamp::now().duration_since(started),
            converged,
        };

        debug!(
            iterations,
            moves_applied, converged, "local search finished"
        );

        state
            .to_solution()
            .expect("search keeps every client assigned")
    }

    /// Seeds the dirty queue with all assigned clients in shuffled order.
    fn seed_queue(&mut self, state: &WorkingSolution) {
        let mut order: Vec<LocationIdx> = self
            .data
            .clients()
            .filter(|&client| state.locate(client).is_some())
            .collect();
        order.shuffle(&mut self.rng);
        for client in order {
            self.enqueue(client);
        }
    }

    /// Tries all (neighbour, operator) pairs for one node; applies a move
    /// per the configured strategy. Returns whether a move was applied.
    fn improve_node(
        &mut self,
        state: &mut WorkingSolution,
        client: LocationIdx,
        cost_evaluator: &CostEvaluator,
        route_open_moves: bool,
    ) -> bool {
        let Some((u_route, u_position)) = state.locate(client) else {
            return false;
        };
        let u = NodePos::new(u_route, u_position);

        let mut anchors: Vec<NodePos> = Vec::with_capacity(
            self.neighbours[client.get()].len() + self.data.num_vehicle_types(),
        );
        for &neighbour in &self.neighbours[client.get()] {
            if let Some((route, position)) = state.locate(neighbour) {
                anchors.push(NodePos::new(route, position));
            }
        }
        // Empty-route anchors let moves open a new vehicle.
        if route_open_moves {
            for vehicle_type in 0..self.data.num_vehicle_types() {
                if let Some(route) = state.empty_route_of_type(VehicleTypeIdx::new(vehicle_type)) {
                    anchors.push(NodePos::new(route, 0));
                }
            }
        }

        let mut best: Option<(Cost, usize, NodePos)> = None;

        'outer: for &v in &anchors {
            for (op_idx, op) in self.node_ops.iter().enumerate() {
                let delta = op.evaluate(u, v, state, cost_evaluator);
                if delta >= 0 {
                    continue;
                }

                if best.is_none_or(|(best_delta, _, _)| delta < best_delta) {
                    best = Some((delta, op_idx, v));
                }

                if self.params.strategy == SearchStrategy::FirstImprovement {
                    break 'outer;
                }
            }
        }

        let Some((delta, op_idx, v)) = best else {
            return false;
        };

        debug!(
            "applying {} at ({}, {}) -> ({}, {}), delta {delta}",
            self.node_ops[op_idx].name(),
            u.route,
            u.position,
            v.route,
            v.position,
        );
        self.node_ops[op_idx].apply(u, v, state);

        let mut touched: SmallVec<[RouteIdx; 2]> = SmallVec::new();
        touched.push(u.route);
        if v.route != u.route {
            touched.push(v.route);
        }

        for &route in &touched {
            state.route_mut(route).update(&self.data);
            state.sync_assignment(route);
        }

        // Everything on a touched route is worth another look.
        for &route in &touched {
            for position in 0..state.route(route).len() {
                let affected = state.route(route).visits()[position];
                self.enqueue(affected);
            }
        }
        self.enqueue(client);

        true
    }

    fn enqueue(&mut self, client: LocationIdx) {
        if !self.pending.contains(client.get()) {
            self.pending.insert(client.get());
            self.queue.push_back(client);
        }
    }
}

/// Runs independent local searches over several candidate solutions on the
/// rayon pool. Each run owns its mutable state; the problem data and
/// neighbour lists are shared immutably. `register` installs the operator
/// set on each fresh driver.
pub fn search_in_parallel<F>(
    data: &Arc<ProblemData>,
    neighbours: &Arc<NeighbourLists>,
    solutions: &[Solution],
    cost_evaluator: &CostEvaluator,
    params: &SearchParams,
    register: F,
) -> Vec<Solution>
where
    F: Fn(&mut LocalSearch) + Sync,
{
    solutions
        .par_iter()
        .enumerate()
        .map(|(index, solution)| {
            let mut run_params = params.clone();
            run_params.seed = params.seed.wrapping_add(index as u64);

            let mut local_search =
                LocalSearch::with_params(Arc::clone(data), Arc::clone(neighbours), run_params);
            register(&mut local_search);
            local_search.search(solution, cost_evaluator)
        })
        .collect()
}
