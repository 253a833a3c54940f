use super::super::mdp::*;
use super::common::*;
use crate::envs::costs::CostFn;
use crate::envs::grid_world::{Action, Continous, GridWorld, Position};
use crate::error::{GridWorldError, Result};
use nalgebra::{DMatrix, DVector};
use ndarray::Array2;
use std::rc::Rc;
use tracing::{debug, info, warn};

/// Dense numbering of the non-wall cells in row-major order.
#[derive(Debug, Clone)]
pub struct StateIndex {
    positions: Vec<Position>,
    indices: Array2<Option<usize>>,
}

impl StateIndex {
    pub fn new(world: &GridWorld) -> Self {
        let positions = world.free_positions().collect::<Vec<_>>();
        let mut indices = Array2::from_elem(world.shape(), None);
        for (i, s) in positions.iter().enumerate() {
            indices[s.ix()] = Some(i);
        }

        Self { positions, indices }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn index(&self, s: Position) -> Option<usize> {
        if s.x < 0 || s.y < 0 {
            return None;
        }

        self.indices.get(s.ix()).copied().flatten()
    }

    pub fn position(&self, i: usize) -> Option<Position> {
        self.positions.get(i).copied()
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }
}

/// Policy iteration with exact policy evaluation.
pub struct PolicyIteration {
    mdp: GridMdp,
    policy: PolicyMap,
    value_fn: ValueFn,
    observer: Option<Observer>,
}

impl PolicyIteration {
    pub fn new(world: Rc<GridWorld>, cost: CostFn, gamma: Continous) -> Result<Self> {
        let mdp = GridMdp::new(world, cost, gamma)?;
        let policy = mdp.new_policy();
        let value_fn = mdp.new_value_fn();

        Ok(Self {
            mdp,
            policy,
            value_fn,
            observer: None,
        })
    }

    pub fn with_observer(mut self, observer: Observer) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn policy(&self) -> &PolicyMap {
        &self.policy
    }

    pub fn value_fn(&self) -> &ValueFn {
        &self.value_fn
    }

    pub fn mdp(&self) -> &GridMdp {
        &self.mdp
    }

    /// An arbitrary but valid policy: the first allowed action of every free cell.
    pub fn init_random_policy(&self) -> PolicyMap {
        let world = self.mdp.world();
        let mut policy = self.mdp.new_policy();
        for s in world.free_positions() {
            policy[s.ix()] = world
                .actions()
                .iter()
                .copied()
                .find(|&a| world.is_action_allowed(s, a));
        }

        policy
    }

    /// Exact value of `policy`, from solving `(I - gamma P) v = c` over the free cells.
    pub fn evaluate(&self, policy: &PolicyMap) -> Result<ValueFn> {
        let world = self.mdp.world();
        if policy.dim() != world.shape() {
            return Err(GridWorldError::InvalidParameter(format!(
                "policy shape {:?} does not match the {}x{} grid",
                policy.dim(),
                world.width(),
                world.height()
            )));
        }

        let index = StateIndex::new(world);
        let n = index.len();
        let mut a = DMatrix::<Continous>::identity(n, n);
        let mut b = DVector::<Continous>::zeros(n);

        for (i, &s) in index.positions().iter().enumerate() {
            let action = policy[s.ix()].ok_or(GridWorldError::Infeasible(s))?;
            let ts = world.get_transitions(s, action)?;
            if ts.is_empty() {
                return Err(GridWorldError::Infeasible(s));
            }

            for t in ts {
                let j = index
                    .index(t.next)
                    .ok_or(GridWorldError::InvalidState(t.next))?;
                b[i] += t.probability * self.mdp.cost(s, t.next);
                a[(i, j)] -= t.probability * self.mdp.gamma();
            }
        }

        let solution = a.lu().solve(&b).ok_or(GridWorldError::SingularSystem(n))?;

        let mut value_fn = self.mdp.new_value_fn();
        for (i, s) in index.positions().iter().enumerate() {
            value_fn[s.ix()] = solution[i];
        }

        Ok(value_fn)
    }

    /// Greedy policy with respect to `value_fn`.
    pub fn improve(&self, value_fn: &ValueFn) -> Result<PolicyMap> {
        greedy_policy(&self.mdp, value_fn)
    }

    pub fn execute(&mut self, max_iterations: usize) -> Result<(bool, usize)> {
        let mut policy = self.init_random_policy();
        let mut value_fn = self.mdp.new_value_fn();

        for i in 0..max_iterations {
            value_fn = self.evaluate(&policy)?;
            if let Some(observer) = self.observer.as_mut() {
                observer(i + 1, &value_fn);
            }

            let improved = self.improve(&value_fn)?;
            let changed = count_changes(&policy, &improved);
            debug!(iteration = i + 1, changed, "policy iteration step");

            policy = improved;
            if changed == 0 {
                info!("Policy iteration has converged after {} iterations", i + 1);
                self.policy = policy;
                self.value_fn = value_fn;
                return Ok((true, i + 1));
            }
        }

        warn!(
            "Policy iteration did not converge after {} iterations",
            max_iterations
        );
        self.policy = policy;
        self.value_fn = value_fn;
        Ok((false, max_iterations))
    }
}

fn count_changes(a: &PolicyMap, b: &PolicyMap) -> usize {
    a.iter().zip(b.iter()).filter(|(x, y)| x != y).count()
}

impl MdpSolver for PolicyIteration {
    fn v_star(&self, s: Position) -> Option<Continous> {
        self.mdp
            .world()
            .is_free(s)
            .then(|| self.value_fn[s.ix()])
    }

    fn q_star(&self, s: Position, a: Action) -> Option<Continous> {
        lookahead(&self.mdp, &self.value_fn, s, a).ok().flatten()
    }

    fn pi_star(&self, s: Position) -> Option<Action> {
        if !self.mdp.world().is_within_bounds(s) {
            return None;
        }

        self.policy[s.ix()]
    }

    fn execute(&mut self, max_iterations: usize) -> Result<(bool, usize)> {
        PolicyIteration::execute(self, max_iterations)
    }
}
