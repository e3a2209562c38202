use crate::problem::{
    location::{Location, LocationIdx},
    matrix::Matrix,
    measure::Duration,
};

/// Duration statistics of a contiguous stretch of visits. Segments
/// concatenate while tracking total duration (waiting and servicing
/// included) and accumulated time warp.
///
/// When concatenation detects an arrival past the next stretch's latest
/// start, the excess is booked as time warp and the start window is clamped
/// to the late bound. Scheduling continues from the clamped time; later
/// comparisons see the clamped schedule, not the true infeasible arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationSegment {
    idx_first: LocationIdx,
    idx_last: LocationIdx,
    duration: Duration,
    time_warp: Duration,
    tw_early: Duration,
    tw_late: Duration,
    release_time: Duration,
}

impl DurationSegment {
    pub fn new(
        idx_first: LocationIdx,
        idx_last: LocationIdx,
        duration: Duration,
        time_warp: Duration,
        tw_early: Duration,
        tw_late: Duration,
        release_time: Duration,
    ) -> Self {
        DurationSegment {
            idx_first,
            idx_last,
            duration,
            time_warp,
            tw_early,
            tw_late,
            release_time,
        }
    }

    pub fn client(idx: LocationIdx, location: &Location) -> Self {
        DurationSegment {
            idx_first: idx,
            idx_last: idx,
            duration: location.service_duration(),
            time_warp: 0,
            tw_early: location.tw_early(),
            tw_late: location.tw_late(),
            release_time: location.release_time(),
        }
    }

    /// A depot visit takes no time; its window bounds the vehicle shift.
    pub fn depot(idx: LocationIdx, location: &Location) -> Self {
        DurationSegment {
            idx_first: idx,
            idx_last: idx,
            duration: 0,
            time_warp: 0,
            tw_early: location.tw_early(),
            tw_late: location.tw_late(),
            release_time: 0,
        }
    }

    pub fn merge(
        durations: &Matrix,
        first: DurationSegment,
        second: DurationSegment,
    ) -> DurationSegment {
        let edge_duration = durations.at(first.idx_last, second.idx_first);

        // Time (after starting the first stretch at its earliest moment) at
        // which we arrive at the second stretch's first location.
        let at_second = first.duration - first.time_warp + edge_duration;

        // Arriving after the second stretch's window closes adds time warp;
        // arriving before it opens adds waiting.
        let diff_tw = (first
            .tw_early
            .saturating_add(at_second)
            .saturating_sub(second.tw_late))
        .max(0);
        let diff_wait = if second.tw_early.saturating_sub(at_second) > first.tw_late {
            second.tw_early - at_second - first.tw_late
        } else {
            0
        };

        DurationSegment {
            idx_first: first.idx_first,
            idx_last: second.idx_last,
            duration: first.duration + second.duration + edge_duration + diff_wait,
            time_warp: first.time_warp + second.time_warp + diff_tw,
            tw_early: second
                .tw_early
                .saturating_sub(at_second)
                .max(first.tw_early)
                - diff_wait,
            tw_late: second
                .tw_late
                .saturating_sub(at_second)
                .min(first.tw_late)
                .saturating_add(diff_tw),
            release_time: first.release_time.max(second.release_time),
        }
    }

    /// Total duration of the stretch, waiting included.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Time warp over the stretch. Any excess over `max_duration`, and any
    /// shortfall against the release time, counts as additional warp.
    pub fn time_warp(&self, max_duration: Duration) -> Duration {
        self.time_warp
            + (self.release_time.saturating_sub(self.tw_late)).max(0)
            + (self.duration.saturating_sub(max_duration)).max(0)
    }

    /// Earliest start that yields the minimum stretch duration.
    pub fn tw_early(&self) -> Duration {
        self.tw_early
    }

    /// Latest start that yields the minimum stretch duration.
    pub fn tw_late(&self) -> Duration {
        self.tw_late
    }

    pub fn release_time(&self) -> Duration {
        self.release_time
    }
}
