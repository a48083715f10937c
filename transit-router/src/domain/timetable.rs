//! Timetables and the read-only transit data shared by all searches.

use std::sync::Arc;

use chrono::Duration;

use super::{DomainError, StopIndex, StopPos, TripPattern, TripSchedule};

/// All trips of one pattern, sorted by departure.
///
/// The position of a trip in the sorted list is its *trip index*. Trips
/// never overtake each other, so the list is sorted at every stop
/// position and a binary search on any position is valid.
#[derive(Debug, Clone)]
pub struct Timetable {
    pattern: Arc<TripPattern>,
    trips: Vec<Arc<TripSchedule>>,
}

impl Timetable {
    /// Build a timetable, sorting trips and rejecting overtaking trips.
    pub fn new(
        pattern: Arc<TripPattern>,
        trips: Vec<TripSchedule>,
    ) -> Result<Self, DomainError> {
        let mut trips: Vec<Arc<TripSchedule>> = trips.into_iter().map(Arc::new).collect();

        for trip in &trips {
            if trip.pattern().as_ref() != pattern.as_ref() {
                return Err(DomainError::ForeignTrip {
                    trip: trip.id().to_string(),
                    pattern: pattern.name().to_string(),
                });
            }
        }

        trips.sort_by_key(|trip| trip.departure(StopPos(0)));

        for pair in trips.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            let overtakes = (0..pattern.number_of_stops()).map(StopPos).any(|pos| {
                b.departure(pos) < a.departure(pos) || b.arrival(pos) < a.arrival(pos)
            });
            if overtakes {
                return Err(DomainError::OvertakingTrips(
                    a.id().to_string(),
                    b.id().to_string(),
                ));
            }
        }

        Ok(Self { pattern, trips })
    }

    pub fn pattern(&self) -> &Arc<TripPattern> {
        &self.pattern
    }

    pub fn trips(&self) -> &[Arc<TripSchedule>] {
        &self.trips
    }

    pub fn trip(&self, trip_index: usize) -> &Arc<TripSchedule> {
        &self.trips[trip_index]
    }

    /// Returns the trip index of a trip with the given id.
    pub fn index_of(&self, trip_id: &str) -> Option<usize> {
        self.trips.iter().position(|t| t.id() == trip_id)
    }

    pub fn len(&self) -> usize {
        self.trips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trips.is_empty()
    }
}

/// A walking transfer between two stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Walk {
    pub from: StopIndex,
    pub to: StopIndex,
    pub duration: Duration,
}

impl Walk {
    pub fn new(from: StopIndex, to: StopIndex, duration: Duration) -> Self {
        Self { from, to, duration }
    }
}

/// Read-only transit data: timetables, walking transfers and indexes.
///
/// Built once and shared between searches; nothing here is mutated while
/// a search runs.
#[derive(Debug, Clone)]
pub struct TransitData {
    number_of_stops: usize,
    timetables: Vec<Timetable>,
    patterns_by_stop: Vec<Vec<usize>>,
    walks_from: Vec<Vec<Walk>>,
    walks_to: Vec<Vec<Walk>>,
}

impl TransitData {
    /// Build transit data, validating every stop index.
    pub fn new(
        number_of_stops: usize,
        timetables: Vec<Timetable>,
        walks: Vec<Walk>,
    ) -> Result<Self, DomainError> {
        let check = |stop: StopIndex| {
            if stop.0 < number_of_stops {
                Ok(())
            } else {
                Err(DomainError::UnknownStop(stop))
            }
        };

        let mut patterns_by_stop = vec![Vec::new(); number_of_stops];
        for (idx, timetable) in timetables.iter().enumerate() {
            for &stop in timetable.pattern().stops() {
                check(stop)?;
                let patterns: &mut Vec<usize> = &mut patterns_by_stop[stop.0];
                if patterns.last() != Some(&idx) {
                    patterns.push(idx);
                }
            }
        }

        let mut walks_from = vec![Vec::new(); number_of_stops];
        let mut walks_to = vec![Vec::new(); number_of_stops];
        for walk in walks {
            check(walk.from)?;
            check(walk.to)?;
            walks_from[walk.from.0].push(walk);
            walks_to[walk.to.0].push(walk);
        }

        Ok(Self {
            number_of_stops,
            timetables,
            patterns_by_stop,
            walks_from,
            walks_to,
        })
    }

    pub fn number_of_stops(&self) -> usize {
        self.number_of_stops
    }

    pub fn timetables(&self) -> &[Timetable] {
        &self.timetables
    }

    pub fn timetable(&self, idx: usize) -> &Timetable {
        &self.timetables[idx]
    }

    /// Indexes of the timetables whose pattern serves `stop`.
    pub fn patterns_at(&self, stop: StopIndex) -> &[usize] {
        &self.patterns_by_stop[stop.0]
    }

    /// Walking transfers leaving `stop`.
    pub fn walks_from(&self, stop: StopIndex) -> &[Walk] {
        &self.walks_from[stop.0]
    }

    /// Walking transfers arriving at `stop`.
    pub fn walks_to(&self, stop: StopIndex) -> &[Walk] {
        &self.walks_to[stop.0]
    }

    /// Find the timetable running a trip.
    pub fn timetable_of(&self, trip: &TripSchedule) -> Option<&Timetable> {
        self.timetables
            .iter()
            .find(|tt| tt.pattern().as_ref() == trip.pattern().as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TransitTime;

    fn t(s: &str) -> TransitTime {
        TransitTime::parse(s).unwrap()
    }

    fn pattern(name: &str, stops: &[usize]) -> Arc<TripPattern> {
        Arc::new(TripPattern::new(name, stops.iter().map(|s| StopIndex(*s)).collect(), 0).unwrap())
    }

    #[test]
    fn trips_sorted_by_departure() {
        let p = pattern("AB", &[0, 1]);
        let late =
            TripSchedule::with_times("late", p.clone(), vec![t("11:00"), t("11:10")]).unwrap();
        let early =
            TripSchedule::with_times("early", p.clone(), vec![t("10:00"), t("10:10")]).unwrap();

        let timetable = Timetable::new(p, vec![late, early]).unwrap();

        assert_eq!(timetable.len(), 2);
        assert_eq!(timetable.trip(0).id(), "early");
        assert_eq!(timetable.index_of("late"), Some(1));
        assert_eq!(timetable.index_of("missing"), None);
    }

    #[test]
    fn reject_overtaking() {
        let p = pattern("AB", &[0, 1]);
        let slow =
            TripSchedule::with_times("slow", p.clone(), vec![t("10:00"), t("11:00")]).unwrap();
        let fast =
            TripSchedule::with_times("fast", p.clone(), vec![t("10:05"), t("10:30")]).unwrap();

        let result = Timetable::new(p, vec![slow, fast]);
        assert_eq!(
            result.unwrap_err(),
            DomainError::OvertakingTrips("slow".into(), "fast".into())
        );
    }

    #[test]
    fn reject_foreign_trip() {
        let p = pattern("AB", &[0, 1]);
        let other = pattern("CD", &[2, 3]);
        let trip = TripSchedule::with_times("T", other, vec![t("10:00"), t("10:10")]).unwrap();

        assert!(matches!(
            Timetable::new(p, vec![trip]),
            Err(DomainError::ForeignTrip { .. })
        ));
    }

    #[test]
    fn transit_data_indexes() {
        let ab = pattern("AB", &[0, 1]);
        let bc = pattern("BC", &[1, 2]);
        let data = TransitData::new(
            4,
            vec![
                Timetable::new(ab, vec![]).unwrap(),
                Timetable::new(bc, vec![]).unwrap(),
            ],
            vec![Walk::new(StopIndex(2), StopIndex(3), Duration::minutes(3))],
        )
        .unwrap();

        assert_eq!(data.patterns_at(StopIndex(1)), &[0, 1]);
        assert_eq!(data.patterns_at(StopIndex(3)), &[] as &[usize]);
        assert_eq!(data.walks_from(StopIndex(2)).len(), 1);
        assert_eq!(data.walks_to(StopIndex(3))[0].from, StopIndex(2));
        assert!(data.walks_from(StopIndex(3)).is_empty());
    }

    #[test]
    fn reject_unknown_stops() {
        let ab = pattern("AB", &[0, 5]);
        let result = TransitData::new(2, vec![Timetable::new(ab, vec![]).unwrap()], vec![]);
        assert_eq!(result.unwrap_err(), DomainError::UnknownStop(StopIndex(5)));

        let result = TransitData::new(
            2,
            vec![],
            vec![Walk::new(StopIndex(0), StopIndex(9), Duration::minutes(1))],
        );
        assert_eq!(result.unwrap_err(), DomainError::UnknownStop(StopIndex(9)));
    }
}
