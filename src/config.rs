//! Solver configuration, loaded from JSON.

use crate::envs::costs::CostModel;
use crate::envs::grid_world::{Continous, DEFAULT_ACTION_STOCHASTICITY};
use crate::error::{GridWorldError, Result};
use crate::mdps::solvers::value_iteration::DEFAULT_EPS;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Discount factor in [0, 1) (default: 0.9)
    #[serde(default = "default_gamma")]
    pub gamma: Continous,

    /// Value iteration convergence threshold (default: 1e-9)
    #[serde(default = "default_eps")]
    pub eps: Continous,

    /// Iteration cap for both solvers (default: 10_000_000)
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Probability of slipping into each orthogonal direction (default: 0.1)
    #[serde(default = "default_action_stochasticity")]
    pub action_stochasticity: Continous,

    #[serde(default)]
    pub cost: CostModel,
}

fn default_gamma() -> Continous {
    0.9
}

fn default_eps() -> Continous {
    DEFAULT_EPS
}

fn default_max_iterations() -> usize {
    10_000_000
}

fn default_action_stochasticity() -> Continous {
    DEFAULT_ACTION_STOCHASTICITY
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            gamma: default_gamma(),
            eps: default_eps(),
            max_iterations: default_max_iterations(),
            action_stochasticity: default_action_stochasticity(),
            cost: CostModel::default(),
        }
    }
}

impl SolverConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: SolverConfig = serde_json::from_str(&content)?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0. ..1.).contains(&self.gamma) {
            return Err(invalid(format!("gamma must be in [0, 1), got {}", self.gamma)));
        }

        if self.eps.is_nan() || self.eps <= 0. {
            return Err(invalid(format!("eps must be positive, got {}", self.eps)));
        }

        if !(0. ..=0.5).contains(&self.action_stochasticity) {
            return Err(invalid(format!(
                "action_stochasticity must be in [0, 0.5], got {}",
                self.action_stochasticity
            )));
        }

        Ok(())
    }
}

fn invalid(msg: String) -> GridWorldError {
    GridWorldError::InvalidParameter(msg)
}
