use crate::envs::costs::CostFn;
use crate::envs::grid_world::{Action, Continous, GridWorld, Position};
use crate::error::{GridWorldError, Result};
use ndarray::Array2;
use std::rc::Rc;

/// One value per grid cell. Wall cells hold NaN and are never read.
pub type ValueFn = Array2<Continous>;

/// One action per grid cell. Wall cells hold `None`.
pub type PolicyMap = Array2<Option<Action>>;

/// Called once per outer iteration with the 1-based iteration number and the value function
/// it produced.
pub type Observer = Box<dyn FnMut(usize, &ValueFn)>;

/// Markov Decision Process - Sutton & Barto 2018.
///
/// The grid world with a one step cost and a discount factor, shared read-only by the solvers.
#[derive(Clone)]
pub struct GridMdp {
    world: Rc<GridWorld>,
    cost: CostFn,
    gamma: Continous,
}

impl GridMdp {
    pub fn new(world: Rc<GridWorld>, cost: CostFn, gamma: Continous) -> Result<Self> {
        if !(0. ..=1.).contains(&gamma) {
            return Err(GridWorldError::InvalidParameter(format!(
                "discount factor must be in [0, 1], got {gamma}"
            )));
        }

        Ok(Self { world, cost, gamma })
    }

    pub fn world(&self) -> &GridWorld {
        &self.world
    }

    pub fn gamma(&self) -> Continous {
        self.gamma
    }

    pub fn cost(&self, current: Position, next: Position) -> Continous {
        (self.cost)(&self.world, current, next)
    }

    /// Zero at free cells, NaN at walls.
    pub fn new_value_fn(&self) -> ValueFn {
        Array2::from_shape_fn(self.world.shape(), |(y, x)| {
            if self.world.is_wall(Position::new(x as i32, y as i32)) {
                Continous::NAN
            } else {
                0.
            }
        })
    }

    pub fn new_policy(&self) -> PolicyMap {
        Array2::from_elem(self.world.shape(), None)
    }
}

pub trait MdpSolver {
    fn v_star(&self, s: Position) -> Option<Continous>;

    fn q_star(&self, s: Position, a: Action) -> Option<Continous>;

    fn pi_star(&self, s: Position) -> Option<Action>;

    /// Runs until convergence or `max_iterations`.
    /// Returns whether it converged and the iterations used.
    fn execute(&mut self, max_iterations: usize) -> Result<(bool, usize)>;
}
