//! Transit itinerary search.
//!
//! A range-RAPTOR search finds the pareto-optimal journeys leaving inside
//! a departure window, honouring board/alight slack and constrained
//! transfers. Every journey found is then revisited to choose its best
//! transfer points, optionally forcing it through pass-through points.

pub mod domain;
pub mod optimize;
pub mod raptor;
pub mod scenario;
