use crate::{
    define_index_newtype,
    problem::measure::{Duration, Load},
};

define_index_newtype!(LocationIdx, Location);

/// A depot or client location. Coordinates are integral (the parser applies
/// its rounding policy before construction) and are only used for matrix
/// construction and centroid reporting, never inside the search loop.
#[derive(Debug, Clone)]
pub struct Location {
    x: i64,
    y: i64,
    delivery: Load,
    pickup: Load,
    service_duration: Duration,
    tw_early: Duration,
    tw_late: Duration,
    release_time: Duration,
    prize: i64,
    required: bool,
    name: String,
}

impl Location {
    pub fn depot(x: i64, y: i64) -> Self {
        LocationBuilder::default().set_coords(x, y).build()
    }

    pub fn client(x: i64, y: i64) -> LocationBuilder {
        let mut builder = LocationBuilder::default();
        builder.set_coords(x, y);
        builder
    }

    pub fn x(&self) -> i64 {
        self.x
    }

    pub fn y(&self) -> i64 {
        self.y
    }

    pub fn delivery(&self) -> Load {
        self.delivery
    }

    pub fn pickup(&self) -> Load {
        self.pickup
    }

    pub fn service_duration(&self) -> Duration {
        self.service_duration
    }

    pub fn tw_early(&self) -> Duration {
        self.tw_early
    }

    pub fn tw_late(&self) -> Duration {
        self.tw_late
    }

    pub fn release_time(&self) -> Duration {
        self.release_time
    }

    pub fn prize(&self) -> i64 {
        self.prize
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_demand(&self) -> bool {
        self.delivery != 0 || self.pickup != 0
    }
}

#[derive(Debug)]
pub struct LocationBuilder {
    x: i64,
    y: i64,
    delivery: Load,
    pickup: Load,
    service_duration: Duration,
    tw_early: Duration,
    tw_late: Duration,
    release_time: Duration,
    prize: i64,
    required: bool,
    name: String,
}

impl Default for LocationBuilder {
    fn default() -> Self {
        LocationBuilder {
            x: 0,
            y: 0,
            delivery: 0,
            pickup: 0,
            service_duration: 0,
            tw_early: 0,
            tw_late: Duration::MAX,
            release_time: 0,
            prize: 0,
            required: true,
            name: String::new(),
        }
    }
}

impl LocationBuilder {
    pub fn set_coords(&mut self, x: i64, y: i64) -> &mut Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn set_delivery(&mut self, delivery: Load) -> &mut Self {
        self.delivery = delivery;
        self
    }

    pub fn set_pickup(&mut self, pickup: Load) -> &mut Self {
        self.pickup = pickup;
        self
    }

    pub fn set_service_duration(&mut self, service_duration: Duration) -> &mut Self {
        self.service_duration = service_duration;
        self
    }

    pub fn set_time_window(&mut self, tw_early: Duration, tw_late: Duration) -> &mut Self {
        self.tw_early = tw_early;
        self.tw_late = tw_late;
        self
    }

    pub fn set_release_time(&mut self, release_time: Duration) -> &mut Self {
        self.release_time = release_time;
        self
    }

    pub fn set_prize(&mut self, prize: i64) -> &mut Self {
        self.prize = prize;
        self
    }

    pub fn set_required(&mut self, required: bool) -> &mut Self {
        self.required = required;
        self
    }

    pub fn set_name(&mut self, name: String) -> &mut Self {
        self.name = name;
        self
    }

    pub fn build(&self) -> Location {
        Location {
            x: self.x,
            y: self.y,
            delivery: self.delivery,
            pickup: self.pickup,
            service_duration: self.service_duration,
            tw_early: self.tw_early,
            tw_late: self.tw_late,
            release_time: self.release_time,
            prize: self.prize,
            required: self.required,
            name: self.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let location = LocationBuilder::default().build();

        assert_eq!(location.delivery(), 0);
        assert_eq!(location.pickup(), 0);
        assert_eq!(location.tw_early(), 0);
        assert_eq!(location.tw_late(), Duration::MAX);
        assert!(location.is_required());
        assert!(!location.has_demand());
    }

    #[test]
    fn test_client_builder() {
        let client = Location::client(3, 4)
            .set_delivery(5)
            .set_pickup(2)
            .set_time_window(100, 200)
            .set_prize(7)
            .set_required(false)
            .build();

        assert_eq!(client.x(), 3);
        assert_eq!(client.y(), 4);
        assert_eq!(client.delivery(), 5);
        assert_eq!(client.pickup(), 2);
        assert_eq!(client.prize(), 7);
        assert!(!client.is_required());
    }
}
