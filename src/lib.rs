//! Value iteration and policy iteration for a grid world with slippery moves.

pub mod config;
pub mod envs;
pub mod error;
pub mod mdps;
pub mod report;

pub use envs::costs::{CostFn, CostModel};
pub use envs::grid_world::{Action, Cell, Grid, GridWorld, Position, Transition};
pub use error::{GridWorldError, Result, WorldMapError};
pub use mdps::mdp::{MdpSolver, PolicyMap, ValueFn};
pub use mdps::solvers::{policy_iteration::PolicyIteration, value_iteration::ValueIteration};
