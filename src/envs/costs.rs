use super::grid_world::{Continous, GridWorld, Position};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// One step cost of moving from `current` to `next`.
pub type CostFn = Rc<dyn Fn(&GridWorld, Position, Position) -> Continous>;

pub const TRAP_COST: Continous = 50.;

/// Reaching the goal costs -1, falling into the trap costs 50 and everything else is free.
pub fn goal_reward_cost(world: &GridWorld, _current: Position, next: Position) -> Continous {
    if Some(next) == world.goal_pos() {
        -1.
    } else if Some(next) == world.trap_pos() {
        TRAP_COST
    } else {
        0.
    }
}

/// Every step costs 1 except staying at the goal, the trap costs 50.
pub fn living_cost(world: &GridWorld, current: Position, next: Position) -> Continous {
    let goal = world.goal_pos();
    if Some(current) == goal && Some(next) == goal {
        0.
    } else if Some(next) == world.trap_pos() {
        TRAP_COST
    } else {
        1.
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum CostModel {
    #[default]
    GoalReward,
    LivingCost,
}

impl CostModel {
    pub fn cost_fn(&self) -> CostFn {
        match self {
            CostModel::GoalReward => Rc::new(goal_reward_cost),
            CostModel::LivingCost => Rc::new(living_cost),
        }
    }
}
