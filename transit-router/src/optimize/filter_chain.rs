//! Minimum-cost filter chain.

use crate::domain::{StopPos, TripToTripTransfer};

/// The remainder of a path, from boarding one of its trips to the end.
///
/// All costs are additive over the transfers, so a tail can be extended
/// backwards one trip at a time without revisiting its choices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizedPathTail {
    /// Where the first trip of the tail is boarded.
    pub board_pos: StopPos,
    pub transfers: Vec<TripToTripTransfer>,
    pub generalized_cost: i64,
    /// Sum of the wait-time costs of the transfers.
    pub wait_time_cost: i64,
    pub transfer_priority_cost: i64,
    /// Lower when transfers happen later on the incoming trip.
    pub break_tie_cost: i64,
}

impl OptimizedPathTail {
    pub fn wait_time_optimized_cost(&self) -> i64 {
        self.generalized_cost + self.wait_time_cost
    }
}

/// Applies cost functions in order, each keeping only the cheapest
/// elements left by the previous one.
pub struct MinCostFilterChain<T> {
    costs: Vec<fn(&T) -> i64>,
}

impl<T> MinCostFilterChain<T> {
    pub fn new(costs: Vec<fn(&T) -> i64>) -> Self {
        Self { costs }
    }

    /// The elements minimal under every cost, in input order.
    pub fn filter(&self, elements: Vec<T>) -> Vec<T> {
        self.costs.iter().fold(elements, |elements, cost| {
            let Some(min) = elements.iter().map(cost).min() else {
                return elements;
            };
            elements.into_iter().filter(|e| cost(e) == min).collect()
        })
    }
}

impl MinCostFilterChain<OptimizedPathTail> {
    /// Transfer priority first (if enabled), then wait-time optimized
    /// cost (if enabled) or generalized cost, then the latest transfers.
    pub fn transfer_optimized(transfer_priority: bool, optimize_wait_time: bool) -> Self {
        let mut costs: Vec<fn(&OptimizedPathTail) -> i64> = Vec::new();
        if transfer_priority {
            costs.push(|tail| tail.transfer_priority_cost);
        }
        if optimize_wait_time {
            costs.push(OptimizedPathTail::wait_time_optimized_cost);
        } else {
            costs.push(|tail| tail.generalized_cost);
        }
        costs.push(|tail| tail.break_tie_cost);
        Self::new(costs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tail(priority: i64, generalized: i64, wait: i64, break_tie: i64) -> OptimizedPathTail {
        OptimizedPathTail {
            board_pos: StopPos(0),
            transfers: vec![],
            generalized_cost: generalized,
            wait_time_cost: wait,
            transfer_priority_cost: priority,
            break_tie_cost: break_tie,
        }
    }

    #[test]
    fn keeps_all_minimal_elements() {
        let mut costs: Vec<fn(&(i64, i64)) -> i64> = Vec::new();
        costs.push(|x| x.0);
        costs.push(|x| x.1);
        let chain = MinCostFilterChain::new(costs);

        assert_eq!(
            chain.filter(vec![(2, 1), (1, 5), (1, 3), (1, 3)]),
            vec![(1, 3), (1, 3)]
        );
        assert!(chain.filter(vec![]).is_empty());
    }

    #[test]
    fn transfer_priority_first() {
        let tails = vec![tail(30, 100, 0, 0), tail(10, 500, 0, 0)];

        let chain = MinCostFilterChain::transfer_optimized(true, false);
        assert_eq!(chain.filter(tails.clone()), vec![tails[1].clone()]);

        let chain = MinCostFilterChain::transfer_optimized(false, false);
        assert_eq!(chain.filter(tails.clone()), vec![tails[0].clone()]);
    }

    #[test]
    fn wait_time_replaces_generalized_cost() {
        let tails = vec![tail(30, 100, 300, 0), tail(30, 200, 100, 5)];

        let chain = MinCostFilterChain::transfer_optimized(true, true);
        assert_eq!(chain.filter(tails.clone()), vec![tails[1].clone()]);

        let chain = MinCostFilterChain::transfer_optimized(true, false);
        assert_eq!(chain.filter(tails.clone()), vec![tails[0].clone()]);
    }

    #[test]
    fn break_tie_last() {
        let tails = vec![tail(30, 100, 0, 20), tail(30, 100, 0, 10)];
        let chain = MinCostFilterChain::transfer_optimized(true, true);
        assert_eq!(chain.filter(tails.clone()), vec![tails[1].clone()]);
    }
}
