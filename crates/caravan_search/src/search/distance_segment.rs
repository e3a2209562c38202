use crate::problem::{location::LocationIdx, matrix::Matrix, measure::Distance};

/// Distance travelled over a contiguous stretch of visits. Concatenating two
/// segments adds the arc from the first segment's last location to the second
/// segment's first location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistanceSegment {
    idx_first: LocationIdx,
    idx_last: LocationIdx,
    distance: Distance,
}

impl DistanceSegment {
    pub fn new(idx_first: LocationIdx, idx_last: LocationIdx, distance: Distance) -> Self {
        DistanceSegment {
            idx_first,
            idx_last,
            distance,
        }
    }

    pub fn at(location: LocationIdx) -> Self {
        DistanceSegment {
            idx_first: location,
            idx_last: location,
            distance: 0,
        }
    }

    pub fn merge(
        distances: &Matrix,
        first: DistanceSegment,
        second: DistanceSegment,
    ) -> DistanceSegment {
        let edge = distances.at(first.idx_last, second.idx_first);

        DistanceSegment {
            idx_first: first.idx_first,
            idx_last: second.idx_last,
            distance: first.distance + edge + second.distance,
        }
    }

    pub fn first(&self) -> LocationIdx {
        self.idx_first
    }

    pub fn last(&self) -> LocationIdx {
        self.idx_last
    }

    pub fn distance(&self) -> Distance {
        self.distance
    }
}
