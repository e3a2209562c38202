/// Travel distance between two locations, or accumulated along a route.
pub type Distance = i64;

/// Travel or service time, waiting included.
pub type Duration = i64;

/// Net demand carried by a vehicle.
pub type Load = i64;

/// Objective value. Shares the scale of [`Distance`] and [`Duration`].
pub type Cost = i64;

/// Sentinel for forbidden arcs. A distance or duration matrix entry at this
/// value marks the arc as effectively unusable: any route crossing it is
/// priced out of consideration, yet sums over a full route stay far below
/// `i64::MAX` so accumulation never wraps.
pub const MAX_VALUE: i64 = 1 << 41;

#[cfg(test)]
mod tests {
    use super::MAX_VALUE;

    #[test]
    fn test_max_value_leaves_summing_headroom() {
        // A route visiting a million locations over forbidden arcs must not
        // overflow when its legs are added up.
        assert!(MAX_VALUE.checked_mul(1_000_000).is_some());
    }
}
