use serde::Serialize;

use crate::{
    problem::{
        location::LocationIdx,
        measure::{Cost, Distance, Duration, Load},
        problem_data::ProblemData,
        vehicle_type::VehicleTypeIdx,
    },
    search::route::{Route, RouteIdx},
};

#[derive(Debug, thiserror::Error)]
pub enum SolutionError {
    #[error("location {0} is not a client")]
    InvalidClient(usize),

    #[error("client {0} appears more than once")]
    DuplicateClient(LocationIdx),

    #[error("required client {0} is missing")]
    MissingRequiredClient(LocationIdx),

    #[error("routes must not be empty")]
    EmptyRoute,

    #[error("more routes of vehicle type {0} than vehicles available")]
    TooManyRoutes(VehicleTypeIdx),
}

/// One route of an immutable [`Solution`] snapshot, with its statistics
/// computed once at construction.
#[derive(Debug, Clone, Serialize)]
pub struct SolutionRoute {
    visits: Vec<LocationIdx>,
    vehicle_type: VehicleTypeIdx,
    depot: LocationIdx,
    distance: Distance,
    duration: Duration,
    time_warp: Duration,
    delivery: Load,
    pickup: Load,
    excess_load: Load,
    prizes: Cost,
    fixed_cost: Cost,
    unit_distance_cost: Cost,
    unit_duration_cost: Cost,
}

impl SolutionRoute {
    fn new(data: &ProblemData, idx: usize, visits: Vec<LocationIdx>, vehicle_type: VehicleTypeIdx) -> Self {
        let mut route = Route::new(data, RouteIdx::new(idx), vehicle_type);
        for &client in &visits {
            route.push(client);
        }
        route.update(data);

        SolutionRoute {
            distance: route.distance(),
            duration: route.duration(),
            time_warp: route.time_warp(),
            delivery: route.delivery(),
            pickup: route.pickup(),
            excess_load: route.excess_load(),
            prizes: route.prizes(),
            fixed_cost: route.fixed_cost(),
            unit_distance_cost: route.unit_distance_cost(),
            unit_duration_cost: route.unit_duration_cost(),
            depot: route.depot(),
            visits,
            vehicle_type,
        }
    }

    pub fn visits(&self) -> &[LocationIdx] {
        &self.visits
    }

    pub fn len(&self) -> usize {
        self.visits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visits.is_empty()
    }

    pub fn vehicle_type(&self) -> VehicleTypeIdx {
        self.vehicle_type
    }

    pub fn depot(&self) -> LocationIdx {
        self.depot
    }

    pub fn distance(&self) -> Distance {
        self.distance
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn time_warp(&self) -> Duration {
        self.time_warp
    }

    pub fn delivery(&self) -> Load {
        self.delivery
    }

    pub fn pickup(&self) -> Load {
        self.pickup
    }

    pub fn excess_load(&self) -> Load {
        self.excess_load
    }

    pub fn prizes(&self) -> Cost {
        self.prizes
    }

    pub fn fixed_cost(&self) -> Cost {
        self.fixed_cost
    }

    pub fn unit_distance_cost(&self) -> Cost {
        self.unit_distance_cost
    }

    pub fn unit_duration_cost(&self) -> Cost {
        self.unit_duration_cost
    }

    pub fn has_excess_load(&self) -> bool {
        self.excess_load > 0
    }

    pub fn has_time_warp(&self) -> bool {
        self.time_warp > 0
    }

    pub fn is_feasible(&self) -> bool {
        !self.has_excess_load() && !self.has_time_warp()
    }
}

impl PartialEq for SolutionRoute {
    fn eq(&self, other: &Self) -> bool {
        self.vehicle_type == other.vehicle_type && self.visits == other.visits
    }
}

impl Eq for SolutionRoute {}

/// An immutable snapshot of routes, one per used vehicle. Input and output of
/// the local search. Optional clients may be omitted; required clients appear
/// in exactly one route.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Solution {
    routes: Vec<SolutionRoute>,
}

impl Solution {
    /// Builds a solution from visit lists with explicit vehicle types.
    pub fn new(
        data: &ProblemData,
        routes: Vec<(Vec<LocationIdx>, VehicleTypeIdx)>,
    ) -> Result<Solution, SolutionError> {
        let mut used = vec![0usize; data.num_vehicle_types()];
        for &(_, vehicle_type) in &routes {
            used[vehicle_type.get()] += 1;
            if used[vehicle_type.get()] > data.vehicle_type(vehicle_type).num_available() {
                return Err(SolutionError::TooManyRoutes(vehicle_type));
            }
        }

        Self::validate_clients(data, routes.iter().flat_map(|(visits, _)| visits.iter()))?;
        if routes.iter().any(|(visits, _)| visits.is_empty()) {
            return Err(SolutionError::EmptyRoute);
        }

        let routes = routes
            .into_iter()
            .enumerate()
            .map(|(idx, (visits, vehicle_type))| SolutionRoute::new(data, idx, visits, vehicle_type))
            .collect();

        Ok(Solution { routes })
    }

    /// Builds a solution from plain client-index lists, assigning vehicle
    /// types greedily in order of availability.
    pub fn from_route_lists(
        data: &ProblemData,
        lists: &[Vec<usize>],
    ) -> Result<Solution, SolutionError> {
        let mut routes = Vec::with_capacity(lists.len());
        let mut vehicle_type = 0usize;
        let mut used = 0usize;

        for list in lists {
            while vehicle_type < data.num_vehicle_types()
                && used == data.vehicle_type(VehicleTypeIdx::new(vehicle_type)).num_available()
            {
                vehicle_type += 1;
                used = 0;
            }

            if vehicle_type == data.num_vehicle_types() {
                return Err(SolutionError::TooManyRoutes(VehicleTypeIdx::new(
                    vehicle_type - 1,
                )));
            }

            used += 1;
            routes.push((
                list.iter().copied().map(LocationIdx::new).collect(),
                VehicleTypeIdx::new(vehicle_type),
            ));
        }

        Self::new(data, routes)
    }

    fn validate_clients<'a>(
        data: &ProblemData,
        visits: impl Iterator<Item = &'a LocationIdx>,
    ) -> Result<(), SolutionError> {
        let mut seen = vec![false; data.num_locations()];

        for &client in visits {
            if client.get() >= data.num_locations() || data.is_depot(client) {
                return Err(SolutionError::InvalidClient(client.get()));
            }

            if seen[client.get()] {
                return Err(SolutionError::DuplicateClient(client));
            }
            seen[client.get()] = true;
        }

        for client in data.clients() {
            if data.location(client).is_required() && !seen[client.get()] {
                return Err(SolutionError::MissingRequiredClient(client));
            }
        }

        Ok(())
    }

    pub fn routes(&self) -> &[SolutionRoute] {
        &self.routes
    }

    pub fn num_routes(&self) -> usize {
        self.routes.len()
    }

    pub fn num_clients(&self) -> usize {
        self.routes.iter().map(SolutionRoute::len).sum()
    }

    /// Serializes back to plain client-index lists.
    pub fn route_lists(&self) -> Vec<Vec<usize>> {
        self.routes
            .iter()
            .map(|route| route.visits().iter().map(LocationIdx::get).collect())
            .collect()
    }

    pub fn distance(&self) -> Distance {
        self.routes.iter().map(SolutionRoute::distance).sum()
    }

    pub fn duration(&self) -> Duration {
        self.routes.iter().map(SolutionRoute::duration).sum()
    }

    pub fn time_warp(&self) -> Duration {
        self.routes.iter().map(SolutionRoute::time_warp).sum()
    }

    pub fn excess_load(&self) -> Load {
        self.routes.iter().map(SolutionRoute::excess_load).sum()
    }

    pub fn prizes(&self) -> Cost {
        self.routes.iter().map(SolutionRoute::prizes).sum()
    }

    pub fn fixed_cost(&self) -> Cost {
        self.routes.iter().map(SolutionRoute::fixed_cost).sum()
    }

    pub fn is_feasible(&self) -> bool {
        self.routes.iter().all(SolutionRoute::is_feasible)
    }
}
