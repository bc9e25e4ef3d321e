//! Solver parameters sent with a solve request.

use serde::{Deserialize, Serialize};

/// Which optimisation backend the solve endpoint should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolverKind {
    #[default]
    OrTools,
    Gurobi,
}

impl SolverKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SolverKind::OrTools => "ortools",
            SolverKind::Gurobi => "gurobi",
        }
    }

    /// Vehicle penalty weight the solver applies when none is sent.
    pub fn default_vehicle_penalty(&self) -> f64 {
        match self {
            SolverKind::OrTools => 100_000.0,
            SolverKind::Gurobi => 1_000.0,
        }
    }
}

/// An option value outside the range the solve endpoint accepts.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OptionsError {
    #[error("time limit must be between 1 and 3600 seconds, got {0}")]
    TimeLimit(u32),

    #[error("distance weight must be between 0.1 and 10, got {0}")]
    DistanceWeight(f64),

    #[error("MIP gap must be between 0.001 and 0.5, got {0}")]
    MipGap(f64),

    #[error("vehicle penalty weight must be non-negative, got {0}")]
    VehiclePenalty(f64),
}

/// Parameters for one solve.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveOptions {
    /// Solver time limit in seconds.
    pub time_limit_secs: u32,

    pub solver: SolverKind,

    /// Higher values favour fewer vehicles. `None` leaves the solver default.
    pub vehicle_penalty_weight: Option<f64>,

    /// Higher values favour shorter routes.
    pub distance_weight: f64,

    /// Relative optimality gap. Only Gurobi reads it.
    pub mip_gap: f64,
}

impl SolveOptions {
    pub fn new(solver: SolverKind) -> Self {
        Self {
            solver,
            ..Self::default()
        }
    }

    pub fn with_time_limit(mut self, secs: u32) -> Self {
        self.time_limit_secs = secs;
        self
    }

    pub fn with_vehicle_penalty(mut self, weight: f64) -> Self {
        self.vehicle_penalty_weight = Some(weight);
        self
    }

    pub fn with_distance_weight(mut self, weight: f64) -> Self {
        self.distance_weight = weight;
        self
    }

    pub fn with_mip_gap(mut self, gap: f64) -> Self {
        self.mip_gap = gap;
        self
    }

    /// Check every value against the ranges the endpoint accepts.
    pub fn validate(&self) -> Result<(), OptionsError> {
        if !(1..=3600).contains(&self.time_limit_secs) {
            return Err(OptionsError::TimeLimit(self.time_limit_secs));
        }
        if !(0.1..=10.0).contains(&self.distance_weight) {
            return Err(OptionsError::DistanceWeight(self.distance_weight));
        }
        if !(0.001..=0.5).contains(&self.mip_gap) {
            return Err(OptionsError::MipGap(self.mip_gap));
        }
        if let Some(weight) = self.vehicle_penalty_weight
            && (weight.is_nan() || weight < 0.0)
        {
            return Err(OptionsError::VehiclePenalty(weight));
        }
        Ok(())
    }

    /// Query parameters for the solve endpoint.
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("time_limit", self.time_limit_secs.to_string()),
            ("solver", self.solver.as_str().to_string()),
            ("distance_weight", self.distance_weight.to_string()),
            ("mip_gap", self.mip_gap.to_string()),
        ];
        if let Some(weight) = self.vehicle_penalty_weight {
            params.push(("vehicle_penalty_weight", weight.to_string()));
        }
        params
    }

    /// The penalty the solver will actually use.
    pub fn effective_vehicle_penalty(&self) -> f64 {
        self.vehicle_penalty_weight
            .unwrap_or_else(|| self.solver.default_vehicle_penalty())
    }
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            time_limit_secs: 60,
            solver: SolverKind::OrTools,
            vehicle_penalty_weight: None,
            distance_weight: 1.0,
            mip_gap: 0.01,
        }
    }
}
