//! Pass-through points.
//!
//! A pass-through point is a mandatory waypoint: the journey must
//! physically visit at least one of its stops, whether or not it boards
//! or alights there.

use std::fmt;

use fixedbitset::FixedBitSet;

use super::{DomainError, StopIndex};

/// A non-empty, ordered set of alternative stops forming one waypoint.
///
/// Equality and hashing use the exact ordered stop list.
///
/// # Examples
///
/// ```
/// use transit_router::domain::{PassThroughPoint, StopIndex};
///
/// let point = PassThroughPoint::new(vec![StopIndex(3), StopIndex(8)]).unwrap();
/// assert!(point.contains(StopIndex(8)));
/// assert!(point.as_bit_set().contains(3));
///
/// assert!(PassThroughPoint::new(vec![]).is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PassThroughPoint {
    stops: Vec<StopIndex>,
}

impl PassThroughPoint {
    /// Create a point, rejecting an empty stop list.
    pub fn new(stops: Vec<StopIndex>) -> Result<Self, DomainError> {
        if stops.is_empty() {
            return Err(DomainError::EmptyPassThroughPoint);
        }
        Ok(Self { stops })
    }

    pub fn stops(&self) -> &[StopIndex] {
        &self.stops
    }

    /// Bit-set view of the stops, indexed by stop index.
    ///
    /// This is the only membership test to use inside scans over stop
    /// positions; build it once and reuse it.
    pub fn as_bit_set(&self) -> FixedBitSet {
        let len = self.stops.iter().map(|s| s.0 + 1).max().unwrap_or(0);
        let mut bits = FixedBitSet::with_capacity(len);
        for stop in &self.stops {
            bits.insert(stop.0);
        }
        bits
    }

    /// Linear membership test.
    ///
    /// Not optimized for performance; keep it out of routing loops and
    /// use [`PassThroughPoint::as_bit_set`] there.
    pub fn contains(&self, stop: StopIndex) -> bool {
        self.stops.contains(&stop)
    }
}

impl fmt::Debug for PassThroughPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stops: Vec<usize> = self.stops.iter().map(|s| s.0).collect();
        write!(f, "(stops: {stops:?})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn point(stops: &[usize]) -> PassThroughPoint {
        PassThroughPoint::new(stops.iter().map(|s| StopIndex(*s)).collect()).unwrap()
    }

    #[test]
    fn reject_empty() {
        assert_eq!(
            PassThroughPoint::new(vec![]),
            Err(DomainError::EmptyPassThroughPoint)
        );
    }

    #[test]
    fn membership_views_agree() {
        let p = point(&[2, 9, 4]);
        let bits = p.as_bit_set();
        for stop in 0..12 {
            assert_eq!(p.contains(StopIndex(stop)), bits.contains(stop), "stop {stop}");
        }
    }

    #[test]
    fn equality_uses_order() {
        assert_eq!(point(&[1, 2]), point(&[1, 2]));
        assert_ne!(point(&[1, 2]), point(&[2, 1]));

        let mut set = HashSet::new();
        set.insert(point(&[1, 2]));
        assert!(set.contains(&point(&[1, 2])));
        assert!(!set.contains(&point(&[2, 1])));
    }

    #[test]
    fn debug() {
        assert_eq!(format!("{:?}", point(&[5, 1])), "(stops: [5, 1])");
    }
}
