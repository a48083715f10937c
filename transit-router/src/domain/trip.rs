//! Trip schedule type.
//!
//! A `TripSchedule` is one scheduled run of a pattern. It uses
//! `Arc<TripPattern>` so many trips share one stop sequence.

use std::fmt;
use std::sync::Arc;

use super::{DomainError, StopPos, TransitTime, TripPattern};

/// One scheduled trip with arrival and departure times per stop position.
///
/// # Invariants
///
/// - Exactly one arrival and one departure per pattern stop
/// - `arrival(pos) <= departure(pos)`
/// - `departure(pos) <= arrival(pos + 1)`
#[derive(Clone)]
pub struct TripSchedule {
    id: String,
    pattern: Arc<TripPattern>,
    arrivals: Vec<TransitTime>,
    departures: Vec<TransitTime>,
}

impl TripSchedule {
    /// Construct a trip, validating its times against the pattern.
    pub fn new(
        id: impl Into<String>,
        pattern: Arc<TripPattern>,
        arrivals: Vec<TransitTime>,
        departures: Vec<TransitTime>,
    ) -> Result<Self, DomainError> {
        let id = id.into();
        let stops = pattern.number_of_stops();

        for times in [&arrivals, &departures] {
            if times.len() != stops {
                return Err(DomainError::TimesMismatch {
                    trip: id,
                    times: times.len(),
                    stops,
                });
            }
        }

        for pos in 0..stops {
            if departures[pos] < arrivals[pos] {
                return Err(DomainError::DecreasingTimes { trip: id, pos });
            }
            if pos + 1 < stops && arrivals[pos + 1] < departures[pos] {
                return Err(DomainError::DecreasingTimes {
                    trip: id,
                    pos: pos + 1,
                });
            }
        }

        Ok(Self {
            id,
            pattern,
            arrivals,
            departures,
        })
    }

    /// Construct a trip where arrival and departure coincide at every stop.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use transit_router::domain::{StopIndex, StopPos, TransitTime, TripPattern, TripSchedule};
    ///
    /// let pattern = Arc::new(
    ///     TripPattern::new("AB", vec![StopIndex(0), StopIndex(1)], 0).unwrap(),
    /// );
    /// let times = vec![
    ///     TransitTime::parse("10:00").unwrap(),
    ///     TransitTime::parse("10:10").unwrap(),
    /// ];
    /// let trip = TripSchedule::with_times("T1", pattern, times).unwrap();
    /// assert_eq!(trip.arrival(StopPos(1)).to_string(), "10:10");
    /// ```
    pub fn with_times(
        id: impl Into<String>,
        pattern: Arc<TripPattern>,
        times: Vec<TransitTime>,
    ) -> Result<Self, DomainError> {
        Self::new(id, pattern, times.clone(), times)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn pattern(&self) -> &Arc<TripPattern> {
        &self.pattern
    }

    pub fn arrival(&self, pos: StopPos) -> TransitTime {
        self.arrivals[pos.0]
    }

    pub fn departure(&self, pos: StopPos) -> TransitTime {
        self.departures[pos.0]
    }

    pub fn number_of_stops(&self) -> usize {
        self.arrivals.len()
    }
}

// Trip ids are unique within one set of transit data.
impl PartialEq for TripSchedule {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TripSchedule {}

impl fmt::Debug for TripSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TripSchedule({} {} {}-{})",
            self.id,
            self.pattern.name(),
            self.departures[0],
            self.arrivals[self.arrivals.len() - 1]
        )
    }
}
