//! Plain text and JSON summaries of a solved grid world.

use crate::envs::grid_world::{Action, Continous, Discrete, GridWorld, Position};
use crate::mdps::mdp::{PolicyMap, ValueFn};
use itertools::Itertools;
use serde::Serialize;

const WALL: &str = "#";

pub fn render_policy(world: &GridWorld, policy: &PolicyMap) -> String {
    policy
        .rows()
        .into_iter()
        .enumerate()
        .map(|(y, row)| {
            row.iter()
                .enumerate()
                .map(|(x, a)| match a {
                    _ if world.is_wall(pos(x, y)) => WALL.to_string(),
                    Some(a) => a.arrow().to_string(),
                    None => "?".to_string(),
                })
                .join(" ")
        })
        .join("\n")
}

pub fn render_values(world: &GridWorld, value_fn: &ValueFn) -> String {
    value_fn
        .rows()
        .into_iter()
        .enumerate()
        .map(|(y, row)| {
            row.iter()
                .enumerate()
                .map(|(x, v)| {
                    if world.is_wall(pos(x, y)) {
                        format!("{WALL:>8}")
                    } else {
                        format!("{v:>8.2}")
                    }
                })
                .join("")
        })
        .join("\n")
}

fn pos(x: usize, y: usize) -> Position {
    Position::new(x as Discrete, y as Discrete)
}

#[derive(Debug, Clone, Serialize)]
pub struct SolverReport {
    pub algorithm: String,
    pub converged: bool,
    pub iterations: usize,
    pub gamma: Continous,
    /// Row-major, `None` at walls.
    pub values: Vec<Vec<Option<Continous>>>,
    pub policy: Vec<Vec<Option<Action>>>,
}

impl SolverReport {
    pub fn new(
        algorithm: &str,
        (converged, iterations): (bool, usize),
        gamma: Continous,
        world: &GridWorld,
        value_fn: &ValueFn,
        policy: &PolicyMap,
    ) -> Self {
        let values = value_fn
            .rows()
            .into_iter()
            .enumerate()
            .map(|(y, row)| {
                row.iter()
                    .enumerate()
                    .map(|(x, &v)| (!world.is_wall(pos(x, y))).then_some(v))
                    .collect()
            })
            .collect();

        let policy = policy.rows().into_iter().map(|r| r.to_vec()).collect();

        Self {
            algorithm: algorithm.to_string(),
            converged,
            iterations,
            gamma,
            values,
            policy,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr2, Array2};

    fn world() -> GridWorld {
        GridWorld::new("S 1\n0 G".parse().unwrap())
    }

    fn policy() -> PolicyMap {
        arr2(&[
            [Some(Action::Down), None],
            [Some(Action::Right), Some(Action::Idle)],
        ])
    }

    #[test]
    fn policy_arrows() {
        insta::assert_snapshot!(render_policy(&world(), &policy()), @r###"
        ↓ #
        → ·
        "###);
    }

    #[test]
    fn value_table() {
        let v = arr2(&[[-8.1, Continous::NAN], [-9., -10.]]);

        assert_eq!(
            render_values(&world(), &v),
            "   -8.10       #\n   -9.00  -10.00"
        );
    }

    #[test]
    fn json_report_hides_walls() {
        let v = arr2(&[[-8.1, Continous::NAN], [-9., -10.]]);
        let report = SolverReport::new("value_iteration", (true, 3), 0.9, &world(), &v, &policy());

        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["values"][0][1], serde_json::Value::Null);
        assert_eq!(json["policy"][1][0], "right");
        assert_eq!(json["policy"][0][1], serde_json::Value::Null);
        assert_eq!(json["iterations"], 3);
        assert_eq!(json["converged"], true);
    }

    #[test]
    fn unknown_actions_are_marked() {
        let policy: PolicyMap = Array2::from_elem((2, 2), None);

        assert_eq!(render_policy(&world(), &policy), "? #\n? ?");
    }
}
