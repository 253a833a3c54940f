use super::super::mdp::{GridMdp, PolicyMap, ValueFn};
use crate::envs::grid_world::{Action, Continous, Position};
use crate::error::{GridWorldError, Result};

/// Lookahead values closer than this to the current minimum count as ties.
pub const TIE_TOLERANCE: Continous = 1e-12;

/// Expected one step cost plus discounted value of taking `a` in `s`.
/// `None` if `a` is not allowed in `s`.
pub fn lookahead(mdp: &GridMdp, v: &ValueFn, s: Position, a: Action) -> Result<Option<Continous>> {
    let ts = mdp.world().get_transitions(s, a)?;
    if ts.is_empty() {
        return Ok(None);
    }

    Ok(Some(
        ts.iter()
            .map(|t| t.probability * (mdp.cost(s, t.next) + mdp.gamma() * v[t.next.ix()]))
            .sum(),
    ))
}

/// The action minimising the lookahead in `s` and the exact minimum. Actions within
/// [`TIE_TOLERANCE`] of the chosen one count as ties and go to the earliest in [`Action::ALL`].
pub fn greedy_action(mdp: &GridMdp, v: &ValueFn, s: Position) -> Result<(Action, Continous)> {
    let mut best: Option<(Action, Continous)> = None;
    let mut min = Continous::INFINITY;
    for &a in mdp.world().actions() {
        if let Some(q) = lookahead(mdp, v, s, a)? {
            if best.map_or(true, |(_, b)| q < b - TIE_TOLERANCE) {
                best = Some((a, q));
            }
            min = min.min(q);
        }
    }

    best.map(|(a, _)| (a, min)).ok_or(GridWorldError::Infeasible(s))
}

pub fn greedy_policy(mdp: &GridMdp, v: &ValueFn) -> Result<PolicyMap> {
    let mut policy = mdp.new_policy();
    for s in mdp.world().free_positions() {
        let (a, _) = greedy_action(mdp, v, s)?;
        policy[s.ix()] = Some(a);
    }

    Ok(policy)
}

/// Largest absolute per cell change over the free cells.
pub fn max_abs_diff(mdp: &GridMdp, a: &ValueFn, b: &ValueFn) -> Continous {
    mdp.world()
        .free_positions()
        .map(|s| (a[s.ix()] - b[s.ix()]).abs())
        .fold(0., Continous::max)
}
