use crate::{
    define_index_newtype,
    problem::{
        location::LocationIdx,
        measure::{Cost, Duration, Load},
    },
};

define_index_newtype!(VehicleTypeIdx, VehicleType);

/// A group of identical vehicles operating out of one depot.
#[derive(Debug, Clone)]
pub struct VehicleType {
    capacity: Load,
    fixed_cost: Cost,
    max_duration: Duration,
    num_available: usize,
    depot: LocationIdx,
    unit_distance_cost: Cost,
    unit_duration_cost: Cost,
    name: String,
}

impl VehicleType {
    pub fn capacity(&self) -> Load {
        self.capacity
    }

    pub fn fixed_cost(&self) -> Cost {
        self.fixed_cost
    }

    pub fn max_duration(&self) -> Duration {
        self.max_duration
    }

    pub fn num_available(&self) -> usize {
        self.num_available
    }

    pub fn depot(&self) -> LocationIdx {
        self.depot
    }

    pub fn unit_distance_cost(&self) -> Cost {
        self.unit_distance_cost
    }

    pub fn unit_duration_cost(&self) -> Cost {
        self.unit_duration_cost
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug)]
pub struct VehicleTypeBuilder {
    capacity: Load,
    fixed_cost: Cost,
    max_duration: Duration,
    num_available: usize,
    depot: LocationIdx,
    unit_distance_cost: Cost,
    unit_duration_cost: Cost,
    name: String,
}

impl Default for VehicleTypeBuilder {
    fn default() -> Self {
        VehicleTypeBuilder {
            capacity: 0,
            fixed_cost: 0,
            max_duration: Duration::MAX,
            num_available: 1,
            depot: LocationIdx::new(0),
            unit_distance_cost: 1,
            unit_duration_cost: 0,
            name: String::new(),
        }
    }
}

impl VehicleTypeBuilder {
    pub fn set_capacity(&mut self, capacity: Load) -> &mut Self {
        self.capacity = capacity;
        self
    }

    pub fn set_fixed_cost(&mut self, fixed_cost: Cost) -> &mut Self {
        self.fixed_cost = fixed_cost;
        self
    }

    pub fn set_max_duration(&mut self, max_duration: Duration) -> &mut Self {
        self.max_duration = max_duration;
        self
    }

    pub fn set_num_available(&mut self, num_available: usize) -> &mut Self {
        self.num_available = num_available;
        self
    }

    pub fn set_depot(&mut self, depot: LocationIdx) -> &mut Self {
        self.depot = depot;
        self
    }

    pub fn set_unit_distance_cost(&mut self, unit_distance_cost: Cost) -> &mut Self {
        self.unit_distance_cost = unit_distance_cost;
        self
    }

    pub fn set_unit_duration_cost(&mut self, unit_duration_cost: Cost) -> &mut Self {
        self.unit_duration_cost = unit_duration_cost;
        self
    }

    pub fn set_name(&mut self, name: String) -> &mut Self {
        self.name = name;
        self
    }

    pub fn build(&self) -> VehicleType {
        VehicleType {
            capacity: self.capacity,
            fixed_cost: self.fixed_cost,
            max_duration: self.max_duration,
            num_available: self.num_available,
            depot: self.depot,
            unit_distance_cost: self.unit_distance_cost,
            unit_duration_cost: self.unit_duration_cost,
            name: self.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let vehicle_type = VehicleTypeBuilder::default().build();

        assert_eq!(vehicle_type.capacity(), 0);
        assert_eq!(vehicle_type.fixed_cost(), 0);
        assert_eq!(vehicle_type.max_duration(), Duration::MAX);
        assert_eq!(vehicle_type.num_available(), 1);
        assert_eq!(vehicle_type.depot(), LocationIdx::new(0));
        assert_eq!(vehicle_type.unit_distance_cost(), 1);
        assert_eq!(vehicle_type.unit_duration_cost(), 0);
    }
}
