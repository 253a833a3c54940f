use super::mdp::GridMdp;
use super::mdp_solver_policy::Policy;
use crate::envs::grid_world::{Continous, Position, Transition};
use crate::error::{GridWorldError, Result};
use rand::distributions::WeightedIndex;
use rand::prelude::*;
use tracing::debug;

pub trait Weighted<S> {
    fn s(&self) -> S;

    fn p(&self) -> f64;
}

impl Weighted<Position> for Transition {
    fn s(&self) -> Position {
        self.next
    }

    fn p(&self) -> f64 {
        self.probability
    }
}

/// Samples one item by weight. `None` if there is nothing with positive weight.
pub fn pick_next<T, S>(rng: &mut StdRng, ts: &[T]) -> Option<S>
where
    T: Weighted<S>,
{
    let dist = WeightedIndex::new(ts.iter().map(|item| item.p())).ok()?;
    ts.get(dist.sample(rng)).map(|t| t.s())
}

#[derive(Debug, Clone, PartialEq)]
pub struct Episode {
    pub path: Vec<Position>,
    pub cost: Continous,
    pub reached_goal: bool,
}

/// Follows `policy` from `start` through the stochastic dynamics until the goal or `max_steps`.
pub fn rollout(
    mdp: &GridMdp,
    policy: &dyn Policy,
    start: Position,
    max_steps: usize,
    rng: &mut StdRng,
) -> Result<Episode> {
    let world = mdp.world();
    let goal = world.goal_pos();

    let mut s = start;
    let mut path = vec![s];
    let mut cost = 0.;
    let mut discount = 1.;
    for _ in 0..max_steps {
        if Some(s) == goal {
            break;
        }

        let a = policy.policy(s).ok_or(GridWorldError::Infeasible(s))?;
        let ts = world.get_transitions(s, a)?;
        let next = pick_next(rng, &ts).ok_or(GridWorldError::Infeasible(s))?;

        cost += discount * mdp.cost(s, next);
        discount *= mdp.gamma();
        path.push(next);
        s = next;
    }

    Ok(Episode {
        reached_goal: Some(s) == goal,
        path,
        cost,
    })
}

/// Mean discounted cost of `n` seeded rollouts.
pub fn mean_rollout_cost(
    mdp: &GridMdp,
    policy: &dyn Policy,
    start: Position,
    n: usize,
    max_steps: usize,
    seed: u64,
) -> Result<Continous> {
    let rng = &mut StdRng::seed_from_u64(seed);
    let mut total = 0.;
    let mut reached = 0;
    for _ in 0..n {
        let ep = rollout(mdp, policy, start, max_steps, rng)?;
        total += ep.cost;
        reached += ep.reached_goal as usize;
    }

    debug!("{} of {} episodes reached the goal", reached, n);
    Ok(if n == 0 { 0. } else { total / n as Continous })
}
