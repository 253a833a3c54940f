use super::super::mdp::*;
use super::common::*;
use crate::envs::costs::CostFn;
use crate::envs::grid_world::{Action, Continous, GridWorld, Position};
use crate::error::Result;
use std::rc::Rc;
use tracing::{debug, info, warn};

pub const DEFAULT_EPS: Continous = 1e-9;

/// Value iteration with synchronous Bellman optimality backups.
pub struct ValueIteration {
    mdp: GridMdp,
    eps: Continous,
    value_fn: ValueFn,
    observer: Option<Observer>,
}

impl ValueIteration {
    pub fn new(world: Rc<GridWorld>, cost: CostFn, gamma: Continous) -> Result<Self> {
        let mdp = GridMdp::new(world, cost, gamma)?;
        let value_fn = mdp.new_value_fn();

        Ok(Self {
            mdp,
            eps: DEFAULT_EPS,
            value_fn,
            observer: None,
        })
    }

    /// Convergence threshold on the largest per cell change between sweeps.
    pub fn with_eps(mut self, eps: Continous) -> Self {
        self.eps = eps;
        self
    }

    pub fn with_observer(mut self, observer: Observer) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn value_fn(&self) -> &ValueFn {
        &self.value_fn
    }

    pub fn mdp(&self) -> &GridMdp {
        &self.mdp
    }

    pub fn execute(&mut self, max_iterations: usize) -> Result<(bool, usize)> {
        for k in 0..max_iterations {
            let prev = &self.value_fn;
            let mut next = prev.clone();
            for s in self.mdp.world().free_positions() {
                let (_, v) = greedy_action(&self.mdp, prev, s)?;
                next[s.ix()] = v;
            }

            let delta = max_abs_diff(&self.mdp, &next, prev);
            self.value_fn = next;
            if let Some(observer) = self.observer.as_mut() {
                observer(k + 1, &self.value_fn);
            }

            debug!(iteration = k + 1, delta, "value iteration sweep");
            if delta <= self.eps {
                info!("Value iteration has converged after {} iterations", k + 1);
                return Ok((true, k + 1));
            }
        }

        warn!(
            "Value iteration did not converge after {} iterations",
            max_iterations
        );
        Ok((false, max_iterations))
    }

    /// Greedy policy induced by the current value function.
    pub fn extract_policy(&self) -> Result<PolicyMap> {
        greedy_policy(&self.mdp, &self.value_fn)
    }
}

impl MdpSolver for ValueIteration {
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
        greedy_action(&self.mdp, &self.value_fn, s)
            .ok()
            .map(|(a, _)| a)
    }

    fn execute(&mut self, max_iterations: usize) -> Result<(bool, usize)> {
        ValueIteration::execute(self, max_iterations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envs::costs::CostModel;
    use float_eq::*;
    use std::cell::RefCell;

    fn vi(map: &str, p: Continous, cost: CostModel, gamma: Continous) -> ValueIteration {
        let world = GridWorld::with_stochasticity(map.parse().unwrap(), p).unwrap();
        ValueIteration::new(Rc::new(world), cost.cost_fn(), gamma).unwrap()
    }

    #[test]
    fn corridor_values() {
        let mut vi = vi("S 0 0 G", 0., CostModel::GoalReward, 0.5);

        let (converged, _) = vi.execute(1000).unwrap();
        assert!(converged);

        // Staying at the goal costs -1 forever: -1 / (1 - 0.5).
        let v = vi.value_fn();
        assert_float_eq!(v[[0, 3]], -2., abs <= 1e-8);
        assert_float_eq!(v[[0, 2]], -2., abs <= 1e-8);
        assert_float_eq!(v[[0, 1]], -1., abs <= 1e-8);
        assert_float_eq!(v[[0, 0]], -0.5, abs <= 1e-8);
    }

    #[test]
    fn sweeps_are_synchronous() {
        let mut vi = vi("G 0 0 S", 0., CostModel::GoalReward, 0.5);

        let (converged, iterations) = vi.execute(1).unwrap();
        assert!(!converged);
        assert_eq!(iterations, 1);

        // Every backup reads the previous sweep, so (1, 0) sees the zero goal value and not the
        // -1 just written for it.
        assert_float_eq!(
            vi.value_fn().row(0).to_vec(),
            vec![-1., -1., 0., 0.],
            abs_all <= 0.
        );

        vi.execute(1).unwrap();
        assert_float_eq!(
            vi.value_fn().row(0).to_vec(),
            vec![-1.5, -1.5, -0.5, 0.],
            abs_all <= 0.
        );
    }

    #[test]
    fn observer_sees_every_sweep() {
        let seen = Rc::new(RefCell::new(vec![]));
        let sink = Rc::clone(&seen);
        let mut vi = vi("S 0 G", 0., CostModel::GoalReward, 0.5).with_observer(Box::new(
            move |k: usize, v: &ValueFn| sink.borrow_mut().push((k, v[[0, 2]])),
        ));

        let (_, iterations) = vi.execute(1000).unwrap();

        let seen = seen.borrow();
        assert_eq!(seen.len(), iterations);
        assert_eq!(seen[0], (1, -1.));
        assert_eq!(
            seen.iter().map(|(k, _)| *k).collect::<Vec<_>>(),
            (1..=iterations).collect::<Vec<_>>()
        );
    }

    #[test]
    fn extract_policy_is_idempotent() {
        let mut vi = vi("S 0 0\n0 1 0\n0 T G", 0.1, CostModel::GoalReward, 0.9);
        vi.execute(100_000).unwrap();

        assert_eq!(vi.extract_policy().unwrap(), vi.extract_policy().unwrap());
    }

    #[test]
    fn solver_queries() {
        let mut vi = vi("S 0 1 G", 0., CostModel::LivingCost, 0.9);
        MdpSolver::execute(&mut vi, 10_000).unwrap();

        assert_eq!(vi.v_star(Position::new(2, 0)), None);
        assert_eq!(vi.pi_star(Position::new(2, 0)), None);
        assert_eq!(vi.pi_star(Position::new(3, 0)), Some(Action::Idle));
        assert_float_eq!(vi.v_star(Position::new(3, 0)).unwrap(), 0., abs <= 1e-12);
        assert_eq!(vi.q_star(Position::new(1, 0), Action::Right), None);
        assert_float_eq!(
            vi.q_star(Position::new(3, 0), Action::Idle).unwrap(),
            0.,
            abs <= 1e-12
        );
    }

    #[test]
    fn zero_iterations_do_not_converge() {
        let mut vi = vi("S G", 0., CostModel::GoalReward, 0.9);

        assert_eq!(vi.execute(0).unwrap(), (false, 0));
    }
}
