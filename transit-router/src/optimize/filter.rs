//! Filtering of transfer candidates.

use super::OptimizeError;
use crate::domain::{StopPos, TripToTripTransfer};

/// Narrows the transfer candidates of one path.
///
/// `transfers[i]` holds the candidates between trip `i` and trip `i + 1`.
/// The result has one list per boundary, in the same order.
pub trait TransferFilter {
    fn filter_transfers(
        &self,
        board_pos_first_trip: StopPos,
        alight_pos_last_trip: StopPos,
        transfers: &[Vec<TripToTripTransfer>],
    ) -> Result<Vec<Vec<TripToTripTransfer>>, OptimizeError>;
}
