use gridworld_dp::*;
use std::rc::Rc;

#[allow(dead_code)]
pub const MAZE: &str = "\
S 0 0 0 0
0 1 1 T 0
0 0 0 1 0
1 0 1 0 0
0 0 0 0 G
";

#[allow(dead_code)]
pub fn world(map: &str, p: f64) -> Rc<GridWorld> {
    Rc::new(GridWorld::with_stochasticity(map.parse().unwrap(), p).unwrap())
}

#[allow(dead_code)]
pub fn solve_both(
    world: &Rc<GridWorld>,
    cost: CostModel,
    gamma: f64,
) -> (ValueIteration, PolicyIteration) {
    let mut vi = ValueIteration::new(Rc::clone(world), cost.cost_fn(), gamma)
        .unwrap()
        .with_eps(1e-12);
    let (converged, _) = vi.execute(1_000_000).unwrap();
    assert!(converged, "value iteration did not converge");

    let mut pi = PolicyIteration::new(Rc::clone(world), cost.cost_fn(), gamma).unwrap();
    let (converged, _) = pi.execute(1000).unwrap();
    assert!(converged, "policy iteration did not converge");

    (vi, pi)
}

#[allow(dead_code)]
pub fn pos(x: i32, y: i32) -> Position {
    Position::new(x, y)
}
