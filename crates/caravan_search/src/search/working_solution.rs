use std::sync::Arc;

use crate::{
    problem::{location::LocationIdx, problem_data::ProblemData, vehicle_type::VehicleTypeIdx},
    search::{
        route::{Route, RouteIdx},
        solution::{Solution, SolutionError},
    },
};

/// The mutable counterpart of a [`Solution`] during one search run: one
/// route slot per vehicle (used or not) plus a client → route assignment.
/// Owned by a single search; never shared across threads.
#[derive(Debug, Clone)]
pub struct WorkingSolution {
    data: Arc<ProblemData>,
    routes: Vec<Route>,
    assignment: Vec<Option<RouteIdx>>,
}

impl WorkingSolution {
    pub fn new(data: Arc<ProblemData>) -> Self {
        let mut routes = Vec::with_capacity(data.num_vehicles());
        for (vehicle_type, vtype) in data.vehicle_types().iter().enumerate() {
            for _ in 0..vtype.num_available() {
                let idx = RouteIdx::new(routes.len());
                routes.push(Route::new(&data, idx, VehicleTypeIdx::new(vehicle_type)));
            }
        }

        let assignment = vec![None; data.num_locations()];

        WorkingSolution {
            data,
            routes,
            assignment,
        }
    }

    /// Loads a solution's routes into this state's vehicle slots. Each
    /// solution route occupies the next unused slot of its vehicle type.
    pub fn from_solution(data: Arc<ProblemData>, solution: &Solution) -> Self {
        let mut state = WorkingSolution::new(data);

        for solution_route in solution.routes() {
            let slot = state
                .routes
                .iter()
                .position(|route| {
                    route.is_empty() && route.vehicle_type() == solution_route.vehicle_type()
                })
                .expect("validated solutions fit the fleet");

            let slot = RouteIdx::new(slot);
            for &client in solution_route.visits() {
                state.routes[slot].push(client);
                state.assignment[client.get()] = Some(slot);
            }
        }

        for route in &mut state.routes {
            route.update(&state.data);
        }

        state
    }

    /// Exports the non-empty routes as an immutable snapshot.
    pub fn to_solution(&self) -> Result<Solution, SolutionError> {
        let routes = self
            .routes
            .iter()
            .filter(|route| !route.is_empty())
            .map(|route| (route.visits().to_vec(), route.vehicle_type()))
            .collect();

        Solution::new(&self.data, routes)
    }

    pub fn data(&self) -> &ProblemData {
        &self.data
    }

    pub fn num_routes(&self) -> usize {
        self.routes.len()
    }

    pub fn route(&self, idx: RouteIdx) -> &Route {
        &self.routes[idx]
    }

    pub fn route_mut(&mut self, idx: RouteIdx) -> &mut Route {
        &mut self.routes[idx]
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Both routes mutably; `first` and `second` must differ.
    pub fn route_pair_mut(&mut self, first: RouteIdx, second: RouteIdx) -> (&mut Route, &mut Route) {
        debug_assert_ne!(first, second);
        if first.get() < second.get() {
            let (head, tail) = self.routes.split_at_mut(second.get());
            (&mut head[first.get()], &mut tail[0])
        } else {
            let (head, tail) = self.routes.split_at_mut(first.get());
            (&mut tail[0], &mut head[second.get()])
        }
    }

    /// The route and node position currently holding `client`.
    pub fn locate(&self, client: LocationIdx) -> Option<(RouteIdx, usize)> {
        let route = self.assignment[client.get()]?;
        let position = self.routes[route].position_of(client)?;
        Some((route, position))
    }

    /// Recomputes one route's aggregates in place.
    pub fn update_route(&mut self, idx: RouteIdx) {
        self.routes[idx].update(&self.data);
    }

    /// Refreshes the client → route assignment for one route after its visit
    /// sequence changed.
    pub fn sync_assignment(&mut self, idx: RouteIdx) {
        for position in 0..self.routes[idx].len() {
            let client = self.routes[idx].visits()[position];
            self.assignment[client.get()] = Some(idx);
        }
    }

    /// First empty route slot of the given vehicle type, if any.
    pub fn empty_route_of_type(&self, vehicle_type: VehicleTypeIdx) -> Option<RouteIdx> {
        self.routes
            .iter()
            .position(|route| route.is_empty() && route.vehicle_type() == vehicle_type)
            .map(RouteIdx::new)
    }
}
