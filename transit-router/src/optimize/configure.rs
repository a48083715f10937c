//! Assembly of the transfer optimization service.

use super::config::{CostConfig, TransferOptimizationParameters};
use super::cost::{
    GeneralizedCostCalculator, MinSafeTransferTimeCalculator, TransferWaitTimeCostCalculator,
};
use super::filter_chain::MinCostFilterChain;
use super::generator::TransferGenerator;
use super::pass_through_filter::PassThroughPointFilter;
use super::path_service::OptimizePathService;
use super::service::OptimizeTransferService;
use crate::domain::{PassThroughPoint, TransitData};
use crate::raptor::{SlackProvider, TransferService};

/// Builds an [`OptimizeTransferService`] from configuration.
///
/// Optional parts are decided here, once: constrained transfers are only
/// looked up when transfer priority is optimized, the wait-time cost is
/// only computed when wait time is optimized, and the pass-through filter
/// only runs when there are pass-through points.
pub struct TransferOptimizationConfigurator<'a> {
    data: &'a TransitData,
    slack: &'a dyn SlackProvider,
    cost: &'a CostConfig,
    params: &'a TransferOptimizationParameters,
    transfers: Option<&'a TransferService>,
    pass_through_points: Vec<PassThroughPoint>,
    stop_board_alight_costs: Option<Vec<i64>>,
}

impl<'a> TransferOptimizationConfigurator<'a> {
    pub fn new(
        data: &'a TransitData,
        slack: &'a dyn SlackProvider,
        cost: &'a CostConfig,
        params: &'a TransferOptimizationParameters,
    ) -> Self {
        Self {
            data,
            slack,
            cost,
            params,
            transfers: None,
            pass_through_points: Vec::new(),
            stop_board_alight_costs: None,
        }
    }

    pub fn with_transfer_service(mut self, transfers: &'a TransferService) -> Self {
        self.transfers = Some(transfers);
        self
    }

    pub fn with_pass_through_points(mut self, points: Vec<PassThroughPoint>) -> Self {
        self.pass_through_points = points;
        self
    }

    /// Per-stop board and alight costs in seconds, indexed by stop.
    pub fn with_stop_board_alight_costs(mut self, costs_secs: Vec<i64>) -> Self {
        self.stop_board_alight_costs = Some(costs_secs);
        self
    }

    pub fn build(self) -> OptimizeTransferService<'a> {
        let params = self.params;

        let mut generator = TransferGenerator::new(self.data, self.slack);
        if let Some(transfers) = self.transfers.filter(|_| params.optimize_transfer_priority) {
            generator = generator.with_transfer_service(transfers);
        }

        let mut cost = GeneralizedCostCalculator::new(self.cost);
        if let Some(costs) = &self.stop_board_alight_costs {
            cost = cost.with_stop_board_alight_costs(
                costs,
                params.extra_stop_board_alight_costs_factor,
            );
        }

        let mut path_service = OptimizePathService::new(
            generator,
            MinSafeTransferTimeCalculator::new(self.slack),
            cost,
            MinCostFilterChain::transfer_optimized(
                params.optimize_transfer_priority,
                params.optimize_transfer_wait_time,
            ),
        );
        if params.optimize_transfer_wait_time {
            path_service = path_service.with_wait_time_calculator(
                TransferWaitTimeCostCalculator::new(
                    params.back_travel_wait_time_factor,
                    params.min_safe_wait_time_factor,
                ),
            );
        }
        if !self.pass_through_points.is_empty() {
            path_service = path_service.with_filter(Box::new(PassThroughPointFilter::new(
                self.pass_through_points,
            )));
        }

        OptimizeTransferService::new(path_service)
    }
}
