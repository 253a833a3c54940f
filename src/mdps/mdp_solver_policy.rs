use super::mdp::*;
use crate::envs::grid_world::{Action, Position};
use std::rc::Rc;

pub trait Policy {
    fn policy(&self, s: Position) -> Option<Action>;
}

impl Policy for PolicyMap {
    fn policy(&self, s: Position) -> Option<Action> {
        if s.x < 0 || s.y < 0 {
            return None;
        }

        self.get(s.ix()).copied().flatten()
    }
}

pub struct MdpSolverPolicy {
    pub mdp_solver: Rc<dyn MdpSolver>,
}

impl Policy for MdpSolverPolicy {
    fn policy(&self, s: Position) -> Option<Action> {
        self.mdp_solver.pi_star(s)
    }
}
