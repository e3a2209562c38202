use crate::problem::{
    location::{Location, LocationIdx},
    matrix::Matrix,
    measure::{Distance, Duration},
    vehicle_type::{VehicleType, VehicleTypeIdx},
};

#[derive(Debug, thiserror::Error)]
pub enum ProblemError {
    #[error("no depots; locations must start with at least one depot")]
    NoDepots,

    #[error("no vehicle types")]
    NoVehicleTypes,

    #[error("distance matrix is {actual}x{actual}, expected {expected}x{expected}")]
    DistanceMatrixDimension { actual: usize, expected: usize },

    #[error("duration matrix is {actual}x{actual}, expected {expected}x{expected}")]
    DurationMatrixDimension { actual: usize, expected: usize },

    #[error("vehicle type {vehicle_type} references location {depot} which is not a depot")]
    InvalidDepot {
        vehicle_type: usize,
        depot: LocationIdx,
    },

    #[error("depot {0} must not have demand, service duration, release time, or prize")]
    DepotWithClientAttributes(LocationIdx),

    #[error("location {0} has a time window that opens after it closes")]
    TimeWindowOpenAfterClose(LocationIdx),
}

/// Immutable problem facts: locations (depots first, then clients), vehicle
/// types, and the distance and duration matrices. Matrix indices correspond
/// 1:1 to location indices. Shared read-only across concurrent searches.
#[derive(Debug)]
pub struct ProblemData {
    locations: Vec<Location>,
    num_depots: usize,
    vehicle_types: Vec<VehicleType>,
    distances: Matrix,
    durations: Matrix,
}

impl ProblemData {
    pub fn num_locations(&self) -> usize {
        self.locations.len()
    }

    pub fn num_depots(&self) -> usize {
        self.num_depots
    }

    pub fn num_clients(&self) -> usize {
        self.locations.len() - self.num_depots
    }

    pub fn num_vehicle_types(&self) -> usize {
        self.vehicle_types.len()
    }

    pub fn num_vehicles(&self) -> usize {
        self.vehicle_types
            .iter()
            .map(VehicleType::num_available)
            .sum()
    }

    pub fn location(&self, idx: LocationIdx) -> &Location {
        &self.locations[idx]
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn is_depot(&self, idx: LocationIdx) -> bool {
        idx.get() < self.num_depots
    }

    pub fn is_client(&self, idx: LocationIdx) -> bool {
        !self.is_depot(idx)
    }

    /// Iterates over client indices (depots excluded).
    pub fn clients(&self) -> impl Iterator<Item = LocationIdx> + '_ {
        (self.num_depots..self.locations.len()).map(LocationIdx::new)
    }

    pub fn vehicle_type(&self, idx: VehicleTypeIdx) -> &VehicleType {
        &self.vehicle_types[idx]
    }

    pub fn vehicle_types(&self) -> &[VehicleType] {
        &self.vehicle_types
    }

    #[inline(always)]
    pub fn dist(&self, from: LocationIdx, to: LocationIdx) -> Distance {
        self.distances.at(from, to)
    }

    #[inline(always)]
    pub fn duration(&self, from: LocationIdx, to: LocationIdx) -> Duration {
        self.durations.at(from, to)
    }

    pub fn distance_matrix(&self) -> &Matrix {
        &self.distances
    }

    pub fn duration_matrix(&self) -> &Matrix {
        &self.durations
    }

    pub fn has_time_windows(&self) -> bool {
        self.locations
            .iter()
            .any(|location| location.tw_early() > 0 || location.tw_late() < Duration::MAX)
    }
}

#[derive(Default)]
pub struct ProblemDataBuilder {
    depots: Vec<Location>,
    clients: Vec<Location>,
    vehicle_types: Vec<VehicleType>,
    distances: Option<Matrix>,
    durations: Option<Matrix>,
}

impl ProblemDataBuilder {
    pub fn set_depots(&mut self, depots: Vec<Location>) -> &mut Self {
        self.depots = depots;
        self
    }

    pub fn set_clients(&mut self, clients: Vec<Location>) -> &mut Self {
        self.clients = clients;
        self
    }

    pub fn set_vehicle_types(&mut self, vehicle_types: Vec<VehicleType>) -> &mut Self {
        self.vehicle_types = vehicle_types;
        self
    }

    pub fn set_distances(&mut self, distances: Matrix) -> &mut Self {
        self.distances = Some(distances);
        self
    }

    pub fn set_durations(&mut self, durations: Matrix) -> &mut Self {
        self.durations = Some(durations);
        self
    }

    pub fn build(self) -> Result<ProblemData, ProblemError> {
        let num_depots = self.depots.len();
        if num_depots == 0 {
            return Err(ProblemError::NoDepots);
        }

        if self.vehicle_types.is_empty() {
            return Err(ProblemError::NoVehicleTypes);
        }

        let mut locations = self.depots;
        locations.extend(self.clients);
        let num_locations = locations.len();

        let distances = self.distances.unwrap_or_else(|| Matrix::zeros(num_locations));
        let durations = self.durations.unwrap_or_else(|| Matrix::zeros(num_locations));

        if distances.dim() != num_locations {
            return Err(ProblemError::DistanceMatrixDimension {
                actual: distances.dim(),
                expected: num_locations,
            });
        }

        if durations.dim() != num_locations {
            return Err(ProblemError::DurationMatrixDimension {
                actual: durations.dim(),
                expected: num_locations,
            });
        }

        for (idx, vehicle_type) in self.vehicle_types.iter().enumerate() {
            if vehicle_type.depot().get() >= num_depots {
                return Err(ProblemError::InvalidDepot {
                    vehicle_type: idx,
                    depot: vehicle_type.depot(),
                });
            }
        }

        for (idx, location) in locations.iter().enumerate() {
            let idx = LocationIdx::new(idx);

            if location.tw_early() > location.tw_late() {
                return Err(ProblemError::TimeWindowOpenAfterClose(idx));
            }

            let is_depot = idx.get() < num_depots;
            if is_depot
                && (location.has_demand()
                    || location.service_duration() != 0
                    || location.release_time() != 0
                    || location.prize() != 0)
            {
                return Err(ProblemError::DepotWithClientAttributes(idx));
            }
        }

        Ok(ProblemData {
            locations,
            num_depots,
            vehicle_types: self.vehicle_types,
            distances,
            durations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::{location::LocationBuilder, vehicle_type::VehicleTypeBuilder};

    fn two_location_builder() -> ProblemDataBuilder {
        let mut builder = ProblemDataBuilder::default();
        builder.set_depots(vec![Location::depot(0, 0)]);
        builder.set_clients(vec![Location::client(1, 0).set_delivery(1).build()]);
        builder.set_vehicle_types(vec![VehicleTypeBuilder::default().set_capacity(10).build()]);
        builder.set_distances(Matrix::zeros(2));
        builder.set_durations(Matrix::zeros(2));
        builder
    }

    #[test]
    fn test_counts() {
        let data = two_location_builder().build().unwrap();

        assert_eq!(data.num_locations(), 2);
        assert_eq!(data.num_depots(), 1);
        assert_eq!(data.num_clients(), 1);
        assert_eq!(data.num_vehicles(), 1);
        assert!(data.is_depot(LocationIdx::new(0)));
        assert!(data.is_client(LocationIdx::new(1)));
        assert_eq!(data.clients().collect::<Vec<_>>(), vec![LocationIdx::new(1)]);
    }

    #[test]
    fn test_rejects_matrix_dimension_mismatch() {
        let mut builder = two_location_builder();
        builder.set_distances(Matrix::zeros(3));

        assert!(matches!(
            builder.build(),
            Err(ProblemError::DistanceMatrixDimension { actual: 3, expected: 2 })
        ));
    }

    #[test]
    fn test_rejects_vehicle_type_with_client_depot() {
        let mut builder = two_location_builder();
        builder.set_vehicle_types(vec![
            VehicleTypeBuilder::default()
                .set_depot(LocationIdx::new(1))
                .build(),
        ]);

        assert!(matches!(
            builder.build(),
            Err(ProblemError::InvalidDepot { .. })
        ));
    }

    #[test]
    fn test_rejects_depot_with_demand() {
        let mut builder = two_location_builder();
        builder.set_depots(vec![Location::client(0, 0).set_delivery(3).build()]);

        assert!(matches!(
            builder.build(),
            Err(ProblemError::DepotWithClientAttributes(_))
        ));
    }

    #[test]
    fn test_rejects_inverted_time_window() {
        let mut builder = two_location_builder();
        builder.set_clients(vec![Location::client(1, 0).set_time_window(10, 5).build()]);

        assert!(matches!(
            builder.build(),
            Err(ProblemError::TimeWindowOpenAfterClose(_))
        ));
    }

    #[test]
    fn test_has_time_windows() {
        let data = two_location_builder().build().unwrap();
        assert!(!data.has_time_windows());

        let mut builder = two_location_builder();
        builder.set_clients(vec![Location::client(1, 0).set_time_window(0, 100).build()]);
        let data = builder.build().unwrap();
        assert!(data.has_time_windows());
    }
}
