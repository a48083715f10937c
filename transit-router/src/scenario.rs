//! Scenario files: a small timetable, a search request and configuration
//! in one JSON document.
//!
//! Stops are referred to by name and times are written as "HH:MM" (or
//! "HH:MM:SS"); loading resolves names to indexes and validates
//! everything before a search runs.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::domain::{
    AccessEgress, DomainError, PassThroughPoint, StopIndex, TimeError, Timetable,
    TransferConstraint, TransitData, TransitTime, TripPattern, TripSchedule, Walk,
};
use crate::optimize::{CostConfig, TransferOptimizationParameters};
use crate::raptor::{
    ConfigError, ConstrainedTransfer, RaptorConfig, RaptorRequest, TransferPoint, TransferService,
};

/// Errors from loading a scenario.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// The file could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid scenario JSON
    #[error("invalid scenario: {0}")]
    Json(#[from] serde_json::Error),

    /// A stop name that was never declared
    #[error("unknown stop: {0}")]
    UnknownStop(String),

    /// Two stops share a name
    #[error("duplicate stop: {0}")]
    DuplicateStop(String),

    #[error(transparent)]
    Time(#[from] TimeError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StopDto {
    name: String,
    /// Extra cost of boarding or alighting here (seconds).
    #[serde(default)]
    board_alight_cost_secs: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TripDto {
    id: String,
    /// Arrival times, also used as departures unless those are given.
    times: Vec<String>,
    #[serde(default)]
    departures: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PatternDto {
    name: String,
    stops: Vec<String>,
    #[serde(default)]
    slack_index: usize,
    trips: Vec<TripDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WalkDto {
    from: String,
    to: String,
    duration_secs: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ConstraintDto {
    StaySeated,
    Guaranteed,
    NotAllowed,
    /// Minimum transfer time in seconds
    MinTransferTime(i64),
}

impl From<ConstraintDto> for TransferConstraint {
    fn from(dto: ConstraintDto) -> Self {
        match dto {
            ConstraintDto::StaySeated => TransferConstraint::StaySeated,
            ConstraintDto::Guaranteed => TransferConstraint::Guaranteed,
            ConstraintDto::NotAllowed => TransferConstraint::NotAllowed,
            ConstraintDto::MinTransferTime(secs) => {
                TransferConstraint::MinTransferTime(Duration::seconds(secs))
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConstrainedTransferDto {
    from_stop: String,
    #[serde(default)]
    from_trip: Option<String>,
    to_stop: String,
    #[serde(default)]
    to_trip: Option<String>,
    constraint: ConstraintDto,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AccessEgressDto {
    stop: String,
    #[serde(default)]
    duration_secs: i64,
    /// Opening and closing time, e.g. `["08:00", "09:30"]`.
    #[serde(default)]
    opening_hours: Option<(String, String)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RequestDto {
    earliest_departure: String,
    #[serde(default)]
    search_window_secs: i64,
    access: Vec<AccessEgressDto>,
    egress: Vec<AccessEgressDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ScenarioDto {
    stops: Vec<StopDto>,
    patterns: Vec<PatternDto>,
    #[serde(default)]
    walks: Vec<WalkDto>,
    #[serde(default)]
    constrained_transfers: Vec<ConstrainedTransferDto>,
    request: RequestDto,
    /// Each point lists its alternative stops.
    #[serde(default)]
    pass_through_points: Vec<Vec<String>>,
    #[serde(default)]
    raptor: RaptorConfig,
    #[serde(default)]
    cost: CostConfig,
    #[serde(default)]
    optimization: TransferOptimizationParameters,
}

/// A loaded and validated scenario.
#[derive(Debug, Clone)]
pub struct Scenario {
    stop_names: Vec<String>,
    pub data: TransitData,
    pub transfers: TransferService,
    pub request: RaptorRequest,
    pub pass_through_points: Vec<PassThroughPoint>,
    /// Per-stop board and alight costs (seconds), if any stop has one.
    pub stop_board_alight_costs: Option<Vec<i64>>,
    pub raptor: RaptorConfig,
    pub cost: CostConfig,
    pub optimization: TransferOptimizationParameters,
}

impl Scenario {
    /// Load a scenario from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    /// Parse and validate a scenario document.
    pub fn from_json(json: &str) -> Result<Self, ScenarioError> {
        let dto: ScenarioDto = serde_json::from_str(json)?;
        dto.raptor.validate()?;
        dto.cost.validate()?;
        dto.optimization.validate()?;

        let stops = StopNames::new(&dto.stops)?;

        let mut timetables = Vec::with_capacity(dto.patterns.len());
        for pattern in &dto.patterns {
            timetables.push(build_timetable(&stops, pattern)?);
        }

        let walks = dto
            .walks
            .iter()
            .map(|walk| -> Result<Walk, ScenarioError> {
                Ok(Walk::new(
                    stops.index(&walk.from)?,
                    stops.index(&walk.to)?,
                    Duration::seconds(walk.duration_secs),
                ))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let data = TransitData::new(stops.len(), timetables, walks)?;

        let point = |stop: &str, trip: &Option<String>| -> Result<_, ScenarioError> {
            let stop = stops.index(stop)?;
            Ok(match trip {
                Some(id) => TransferPoint::trip(stop, id.clone()),
                None => TransferPoint::stop(stop),
            })
        };
        let mut transfers = TransferService::default();
        for tx in &dto.constrained_transfers {
            transfers.add(ConstrainedTransfer::new(
                point(&tx.from_stop, &tx.from_trip)?,
                point(&tx.to_stop, &tx.to_trip)?,
                tx.constraint.into(),
            ));
        }

        let request = build_request(&stops, &dto.request)?;

        let pass_through_points = dto
            .pass_through_points
            .iter()
            .map(|names| -> Result<PassThroughPoint, ScenarioError> {
                let indexes = names
                    .iter()
                    .map(|name| stops.index(name))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(PassThroughPoint::new(indexes)?)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let stop_board_alight_costs = stop_costs(&dto.stops)?;

        Ok(Self {
            stop_names: stops.names,
            data,
            transfers,
            request,
            pass_through_points,
            stop_board_alight_costs,
            raptor: dto.raptor,
            cost: dto.cost,
            optimization: dto.optimization,
        })
    }

    /// Name of a stop, or "?" for an index outside the scenario.
    pub fn stop_name(&self, stop: StopIndex) -> &str {
        self.stop_names.get(stop.0).map_or("?", String::as_str)
    }
}

/// Stop name to index lookup.
struct StopNames {
    names: Vec<String>,
    index: HashMap<String, StopIndex>,
}

impl StopNames {
    fn new(stops: &[StopDto]) -> Result<Self, ScenarioError> {
        let mut index = HashMap::with_capacity(stops.len());
        for (i, stop) in stops.iter().enumerate() {
            if index.insert(stop.name.clone(), StopIndex(i)).is_some() {
                return Err(ScenarioError::DuplicateStop(stop.name.clone()));
            }
        }
        Ok(Self {
            names: stops.iter().map(|s| s.name.clone()).collect(),
            index,
        })
    }

    fn index(&self, name: &str) -> Result<StopIndex, ScenarioError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| ScenarioError::UnknownStop(name.to_string()))
    }

    fn len(&self) -> usize {
        self.names.len()
    }
}

fn parse_times(times: &[String]) -> Result<Vec<TransitTime>, TimeError> {
    times.iter().map(|s| TransitTime::parse(s)).collect()
}

fn build_timetable(stops: &StopNames, dto: &PatternDto) -> Result<Timetable, ScenarioError> {
    let indexes = dto
        .stops
        .iter()
        .map(|name| stops.index(name))
        .collect::<Result<Vec<_>, _>>()?;
    let pattern = Arc::new(TripPattern::new(&dto.name, indexes, dto.slack_index)?);

    let mut trips = Vec::with_capacity(dto.trips.len());
    for trip in &dto.trips {
        let arrivals = parse_times(&trip.times)?;
        let departures = match &trip.departures {
            Some(times) => parse_times(times)?,
            None => arrivals.clone(),
        };
        trips.push(TripSchedule::new(
            &trip.id,
            Arc::clone(&pattern),
            arrivals,
            departures,
        )?);
    }
    Ok(Timetable::new(pattern, trips)?)
}

fn build_access_egress(
    stops: &StopNames,
    dto: &AccessEgressDto,
) -> Result<AccessEgress, ScenarioError> {
    let leg = AccessEgress::new(stops.index(&dto.stop)?, Duration::seconds(dto.duration_secs));
    Ok(match &dto.opening_hours {
        Some((open, close)) => {
            leg.with_opening_hours(TransitTime::parse(open)?, TransitTime::parse(close)?)
        }
        None => leg,
    })
}

fn build_request(stops: &StopNames, dto: &RequestDto) -> Result<RaptorRequest, ScenarioError> {
    if dto.search_window_secs < 0 {
        return Err(ConfigError::InvalidSearchWindow(dto.search_window_secs).into());
    }
    let legs = |list: &[AccessEgressDto]| {
        list.iter()
            .map(|leg| build_access_egress(stops, leg))
            .collect::<Result<Vec<_>, _>>()
    };
    Ok(RaptorRequest::new(
        TransitTime::parse(&dto.earliest_departure)?,
        Duration::seconds(dto.search_window_secs),
        legs(&dto.access)?,
        legs(&dto.egress)?,
    ))
}

fn stop_costs(stops: &[StopDto]) -> Result<Option<Vec<i64>>, ScenarioError> {
    if stops.iter().all(|s| s.board_alight_cost_secs.is_none()) {
        return Ok(None);
    }
    let costs = stops
        .iter()
        .map(|stop| match stop.board_alight_cost_secs.unwrap_or(0) {
            value if value < 0 => Err(ConfigError::NegativeCost {
                name: "stop board/alight cost",
                value,
            }),
            value => Ok(value),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some(costs))
}
