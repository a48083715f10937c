//! Trip-to-trip transfer types.
//!
//! A `TripToTripTransfer` is one candidate point for changing from an
//! incoming trip to an outgoing trip. Candidates are produced fresh for
//! every path being optimized and are read-only afterwards.

use std::fmt;
use std::sync::Arc;

use chrono::Duration;

use super::{StopIndex, StopPos, TransitTime, TripSchedule};

/// Cost of a transfer that has no constraint attached.
const REGULAR_TRANSFER_PRIORITY_COST: i64 = 30;

/// A transfer rule overriding the default slack behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferConstraint {
    /// The same vehicle continues as the next trip
    StaySeated,
    /// The outgoing trip is scheduled to wait for the incoming one
    Guaranteed,
    /// The combination is explicitly forbidden
    NotAllowed,
    /// A fixed minimum transfer duration replaces walk time and slack
    MinTransferTime(Duration),
}

impl TransferConstraint {
    pub fn is_not_allowed(&self) -> bool {
        matches!(self, TransferConstraint::NotAllowed)
    }

    /// Stay-seated and guaranteed transfers ignore board and alight slack.
    pub fn is_facilitated(&self) -> bool {
        matches!(
            self,
            TransferConstraint::StaySeated | TransferConstraint::Guaranteed
        )
    }

    /// Priority cost of a transfer; lower is preferred.
    pub fn priority_cost(constraint: Option<&TransferConstraint>) -> i64 {
        match constraint {
            Some(TransferConstraint::StaySeated) => 0,
            Some(TransferConstraint::Guaranteed) => 10,
            Some(TransferConstraint::MinTransferTime(_)) => 20,
            Some(TransferConstraint::NotAllowed) => 1_000,
            None => REGULAR_TRANSFER_PRIORITY_COST,
        }
    }
}

/// A trip at a stop position, with the arrival or departure time there.
#[derive(Clone, PartialEq, Eq)]
pub struct TripStopTime {
    pub trip: Arc<TripSchedule>,
    pub stop_pos: StopPos,
    pub time: TransitTime,
}

impl TripStopTime {
    /// The alighting point of a trip: time is the arrival.
    pub fn arrival(trip: Arc<TripSchedule>, stop_pos: StopPos) -> Self {
        let time = trip.arrival(stop_pos);
        Self {
            trip,
            stop_pos,
            time,
        }
    }

    /// The boarding point of a trip: time is the departure.
    pub fn departure(trip: Arc<TripSchedule>, stop_pos: StopPos) -> Self {
        let time = trip.departure(stop_pos);
        Self {
            trip,
            stop_pos,
            time,
        }
    }

    pub fn stop(&self) -> StopIndex {
        self.trip.pattern().stop_index(self.stop_pos)
    }
}

impl fmt::Debug for TripStopTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}{} {}",
            self.trip.id(),
            self.stop(),
            self.stop_pos,
            self.time
        )
    }
}

/// A candidate transfer between two consecutive trips of a path.
#[derive(Clone, PartialEq, Eq)]
pub struct TripToTripTransfer {
    /// Alighting point on the incoming trip.
    pub from: TripStopTime,
    /// Boarding point on the outgoing trip.
    pub to: TripStopTime,
    /// Walking time between the stops; zero for a same-stop transfer.
    pub walk: Duration,
    pub constraint: Option<TransferConstraint>,
}

impl TripToTripTransfer {
    pub fn new(
        from: TripStopTime,
        to: TripStopTime,
        walk: Duration,
        constraint: Option<TransferConstraint>,
    ) -> Self {
        Self {
            from,
            to,
            walk,
            constraint,
        }
    }

    pub fn is_same_stop(&self) -> bool {
        self.from.stop() == self.to.stop()
    }

    /// Time spent waiting at the boarding stop, after walking.
    pub fn wait_time(&self) -> Duration {
        self.to.time.duration_since(self.from.time) - self.walk
    }

    pub fn priority_cost(&self) -> i64 {
        TransferConstraint::priority_cost(self.constraint.as_ref())
    }
}

impl fmt::Debug for TripToTripTransfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} -> {:?}", self.from, self.to)?;
        if !self.is_same_stop() {
            write!(f, " (walk {}s)", self.walk.num_seconds())?;
        }
        if let Some(c) = &self.constraint {
            write!(f, " [{c:?}]")?;
        }
        Ok(())
    }
}
