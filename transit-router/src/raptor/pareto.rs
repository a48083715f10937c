//! Pareto set of found paths.
//!
//! Criteria: later departure, earlier arrival, fewer transfers.

use crate::domain::TransitPath;

/// Returns true if `a` is at least as good as `b` in every criterion.
///
/// Equal paths count as dominated, so the first one found is kept.
fn dominates(a: &TransitPath, b: &TransitPath) -> bool {
    a.departure_time >= b.departure_time
        && a.arrival_time <= b.arrival_time
        && a.number_of_transfers() <= b.number_of_transfers()
}

/// Paths that no other found path dominates.
#[derive(Debug, Default)]
pub struct ParetoSet {
    paths: Vec<TransitPath>,
}

impl ParetoSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a path unless it is dominated, removing paths it dominates.
    ///
    /// Returns true if the path was added.
    pub fn add(&mut self, path: TransitPath) -> bool {
        if self.paths.iter().any(|existing| dominates(existing, &path)) {
            return false;
        }
        self.paths.retain(|existing| !dominates(&path, existing));
        self.paths.push(path);
        true
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// The paths, by departure time, then arrival time.
    pub fn into_paths(mut self) -> Vec<TransitPath> {
        self.paths.sort_by(|a, b| {
            a.departure_time
                .cmp(&b.departure_time)
                .then(a.arrival_time.cmp(&b.arrival_time))
                .then(a.number_of_transfers().cmp(&b.number_of_transfers()))
        });
        self.paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        AccessEgress, StopIndex, StopPos, TransitLeg, TransitTime, TripPattern, TripSchedule,
    };
    use chrono::Duration;
    use std::sync::Arc;

    /// A path with `transfers + 1` copies of the same leg; only the
    /// counts and times matter for dominance.
    fn path(dep: &str, arr: &str, transfers: usize) -> TransitPath {
        let (dep, arr) = (TransitTime::parse(dep).unwrap(), TransitTime::parse(arr).unwrap());
        let stops = vec![StopIndex(0), StopIndex(1)];
        let pattern = Arc::new(TripPattern::new("AB", stops, 0).unwrap());
        let trip = Arc::new(TripSchedule::with_times("T", pattern, vec![dep, arr]).unwrap());
        let leg = TransitLeg::new(trip, StopPos(0), StopPos(1));

        TransitPath {
            access: AccessEgress::new(StopIndex(0), Duration::zero()),
            legs: vec![leg; transfers + 1],
            walks: vec![Duration::zero(); transfers],
            egress: AccessEgress::new(StopIndex(1), Duration::zero()),
            departure_time: dep,
            arrival_time: arr,
        }
    }

    #[test]
    fn dominated_path_rejected() {
        let mut set = ParetoSet::new();
        assert!(set.add(path("10:00", "11:00", 1)));
        assert!(!set.add(path("09:50", "11:00", 1)));
        assert!(!set.add(path("10:00", "11:05", 2)));
        assert!(!set.add(path("10:00", "11:00", 1)));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn new_path_removes_dominated() {
        let mut set = ParetoSet::new();
        set.add(path("10:00", "11:00", 1));
        set.add(path("10:00", "11:10", 0));
        assert_eq!(set.len(), 2);

        assert!(set.add(path("10:05", "10:55", 0)));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn trade_offs_kept_and_sorted() {
        let mut set = ParetoSet::new();
        set.add(path("10:10", "11:20", 0));
        set.add(path("10:00", "11:00", 0));
        set.add(path("10:10", "11:10", 2));

        let deps: Vec<String> = set
            .into_paths()
            .iter()
            .map(|p| format!("{}-{}", p.departure_time, p.arrival_time))
            .collect();
        assert_eq!(deps, vec!["10:00-11:00", "10:10-11:10", "10:10-11:20"]);
    }
}
