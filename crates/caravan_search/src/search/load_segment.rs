use crate::problem::{location::Location, measure::Load};

/// Load statistics of a contiguous stretch of visits. Segments concatenate:
/// `load` tracks the peak running load over the stretch, where deliveries are
/// on board from the start and pickups stay on board until the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadSegment {
    delivery: Load,
    pickup: Load,
    load: Load,
}

impl LoadSegment {
    pub const EMPTY: LoadSegment = LoadSegment {
        delivery: 0,
        pickup: 0,
        load: 0,
    };

    pub fn new(delivery: Load, pickup: Load, load: Load) -> Self {
        LoadSegment {
            delivery,
            pickup,
            load,
        }
    }

    pub fn client(location: &Location) -> Self {
        LoadSegment {
            delivery: location.delivery(),
            pickup: location.pickup(),
            load: location.delivery().max(location.pickup()),
        }
    }

    pub fn merge(first: LoadSegment, second: LoadSegment) -> LoadSegment {
        LoadSegment {
            delivery: first.delivery + second.delivery,
            pickup: first.pickup + second.pickup,
            load: (first.load + second.delivery).max(second.load + first.pickup),
        }
    }

    pub fn delivery(&self) -> Load {
        self.delivery
    }

    pub fn pickup(&self) -> Load {
        self.pickup
    }

    /// Peak running load over the segment.
    pub fn load(&self) -> Load {
        self.load
    }
}
