//! Transfer optimization of a set of search results.

use tracing::debug;

use super::path_service::OptimizePathService;
use crate::domain::{OptimizedPath, TransitPath};

/// Optimizes the transfers of every path a search returned.
pub struct OptimizeTransferService<'a> {
    path_service: OptimizePathService<'a>,
}

impl<'a> OptimizeTransferService<'a> {
    pub fn new(path_service: OptimizePathService<'a>) -> Self {
        Self { path_service }
    }

    /// Optimized versions of `paths`, by departure time, then arrival
    /// time, then cost.
    ///
    /// A path that cannot be optimized is kept with the transfers the
    /// search found.
    pub fn optimize(&self, paths: &[TransitPath]) -> Vec<OptimizedPath> {
        let mut result: Vec<OptimizedPath> = paths
            .iter()
            .flat_map(|path| match self.path_service.find_best_transit_path(path) {
                Ok(best) if !best.is_empty() => best,
                Ok(_) => {
                    debug!(%path, "no transfer combination found, keeping path");
                    vec![self.path_service.original(path)]
                }
                Err(e) => {
                    debug!(%path, error = %e, "transfer optimization failed, keeping path");
                    vec![self.path_service.original(path)]
                }
            })
            .collect();

        result.sort_by_key(|path| (path.departure_time, path.arrival_time, path.generalized_cost));
        result
    }
}
