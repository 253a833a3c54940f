use crate::error::{GridWorldError, Result, WorldMapError};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;

pub type Discrete = i32;
pub type Continous = f64;

pub const DEFAULT_ACTION_STOCHASTICITY: Continous = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cell {
    Wall,
    Free,
    Start,
    Goal,
    Trap,
}

impl Cell {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "1" => Some(Cell::Wall),
            "0" => Some(Cell::Free),
            "S" => Some(Cell::Start),
            "G" => Some(Cell::Goal),
            "T" => Some(Cell::Trap),
            _ => None,
        }
    }

    pub fn token(&self) -> char {
        match self {
            Cell::Wall => '1',
            Cell::Free => '0',
            Cell::Start => 'S',
            Cell::Goal => 'G',
            Cell::Trap => 'T',
        }
    }
}

/// Grid coordinate. `x` is the column and `y` the row, (0, 0) is top left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: Discrete,
    pub y: Discrete,
}

impl Position {
    pub const fn new(x: Discrete, y: Discrete) -> Self {
        Self { x, y }
    }

    /// `[row, column]` index into a grid shaped array. Only meaningful in bounds.
    pub fn ix(&self) -> [usize; 2] {
        [self.y as usize, self.x as usize]
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl Add<Action> for Position {
    type Output = Position;

    fn add(self, a: Action) -> Position {
        let (dx, dy) = a.delta();
        Position::new(self.x.saturating_add(dx), self.y.saturating_add(dy))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Up,
    Right,
    Down,
    Left,
    Idle,
}

impl Action {
    /// Fixed enumeration order. Greedy selection breaks ties in favour of the earlier action.
    pub const ALL: [Action; 5] = [
        Action::Up,
        Action::Right,
        Action::Down,
        Action::Left,
        Action::Idle,
    ];

    pub fn delta(&self) -> (Discrete, Discrete) {
        match self {
            Action::Up => (0, -1),
            Action::Right => (1, 0),
            Action::Down => (0, 1),
            Action::Left => (-1, 0),
            Action::Idle => (0, 0),
        }
    }

    /// The two directions orthogonal to `self` that the agent may slip into.
    pub fn residuals(&self) -> Option<[Action; 2]> {
        match self {
            Action::Up | Action::Down => Some([Action::Left, Action::Right]),
            Action::Left | Action::Right => Some([Action::Up, Action::Down]),
            Action::Idle => None,
        }
    }

    pub fn arrow(&self) -> char {
        match self {
            Action::Up => '↑',
            Action::Right => '→',
            Action::Down => '↓',
            Action::Left => '←',
            Action::Idle => '·',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub next: Position,
    pub probability: Continous,
}

/// Immutable grid layout with the special cells resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    cells: Array2<Cell>,
    start_pos: Option<Position>,
    goal_pos: Option<Position>,
    trap_pos: Option<Position>,
}

impl Grid {
    /// Builds a grid from rows of cells. When a special cell appears more than once the last one in
    /// row-major order wins.
    pub fn new(rows: Vec<Vec<Cell>>) -> std::result::Result<Self, WorldMapError> {
        let height = rows.len();
        let width = rows.first().map(|r| r.len()).ok_or(WorldMapError::Empty)?;
        if width == 0 {
            return Err(WorldMapError::Empty);
        }

        if let Some((i, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
            return Err(WorldMapError::RaggedRow {
                line: i + 1,
                expected: width,
                found: r.len(),
            });
        }

        let cells = Array2::from_shape_fn((height, width), |(y, x)| rows[y][x]);

        let mut start_pos = None;
        let mut goal_pos = None;
        let mut trap_pos = None;
        for ((y, x), c) in cells.indexed_iter() {
            let pos = Position::new(x as Discrete, y as Discrete);
            match c {
                Cell::Start => start_pos = Some(pos),
                Cell::Goal => goal_pos = Some(pos),
                Cell::Trap => trap_pos = Some(pos),
                Cell::Wall | Cell::Free => {}
            }
        }

        Ok(Self {
            cells,
            start_pos,
            goal_pos,
            trap_pos,
        })
    }

    pub fn width(&self) -> usize {
        self.cells.ncols()
    }

    pub fn height(&self) -> usize {
        self.cells.nrows()
    }

    pub fn cells(&self) -> &Array2<Cell> {
        &self.cells
    }

    pub fn cell(&self, pos: Position) -> Option<Cell> {
        if pos.x < 0 || pos.y < 0 {
            return None;
        }

        self.cells.get(pos.ix()).copied()
    }

    pub fn start_pos(&self) -> Option<Position> {
        self.start_pos
    }

    pub fn goal_pos(&self) -> Option<Position> {
        self.goal_pos
    }

    pub fn trap_pos(&self) -> Option<Position> {
        self.trap_pos
    }
}

/// The grid world MDP: layout plus stochastic transition dynamics.
#[derive(Debug, Clone)]
pub struct GridWorld {
    grid: Grid,
    action_stochasticity: Continous,
}

impl GridWorld {
    pub fn new(grid: Grid) -> Self {
        Self {
            grid,
            action_stochasticity: DEFAULT_ACTION_STOCHASTICITY,
        }
    }

    /// `p` is the probability of slipping into each orthogonal direction.
    pub fn with_stochasticity(grid: Grid, p: Continous) -> Result<Self> {
        if !(0. ..=0.5).contains(&p) {
            return Err(GridWorldError::InvalidParameter(format!(
                "action stochasticity must be in [0, 0.5], got {p}"
            )));
        }

        Ok(Self {
            grid,
            action_stochasticity: p,
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn width(&self) -> usize {
        self.grid.width()
    }

    pub fn height(&self) -> usize {
        self.grid.height()
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.height(), self.width())
    }

    pub fn action_stochasticity(&self) -> Continous {
        self.action_stochasticity
    }

    pub fn actions(&self) -> &'static [Action; 5] {
        &Action::ALL
    }

    pub fn start_pos(&self) -> Option<Position> {
        self.grid.start_pos()
    }

    pub fn goal_pos(&self) -> Option<Position> {
        self.grid.goal_pos()
    }

    pub fn trap_pos(&self) -> Option<Position> {
        self.grid.trap_pos()
    }

    /// All cells in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        let w = self.width();
        (0..self.height() * w).map(move |i| Position::new((i % w) as Discrete, (i / w) as Discrete))
    }

    /// Non-wall cells in row-major order.
    pub fn free_positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.positions().filter(move |&p| !self.is_wall(p))
    }

    pub fn is_within_bounds(&self, pos: Position) -> bool {
        0 <= pos.x
            && (pos.x as usize) < self.width()
            && 0 <= pos.y
            && (pos.y as usize) < self.height()
    }

    /// True iff `pos` is inside the grid and holds a wall. Positions outside the grid are not
    /// walls, use [`GridWorld::is_free`] to ask whether the agent can stand somewhere.
    pub fn is_wall(&self, pos: Position) -> bool {
        matches!(self.grid.cell(pos), Some(Cell::Wall))
    }

    pub fn is_free(&self, pos: Position) -> bool {
        self.is_within_bounds(pos) && !self.is_wall(pos)
    }

    pub fn is_action_allowed(&self, pos: Position, action: Action) -> bool {
        self.is_free(pos + action)
    }

    pub fn get_transitions(&self, pos: Position, action: Action) -> Result<Vec<Transition>> {
        self.check_state(pos)?;

        let mut transitions = Vec::with_capacity(3);
        if !self.is_action_allowed(pos, action) {
            return Ok(transitions);
        }

        let mut probability = 1.;
        if let Some(residuals) = action.residuals() {
            if self.action_stochasticity > 0. {
                for next in residuals.iter().map(|&r| pos + r) {
                    if self.is_free(next) {
                        transitions.push(Transition {
                            next,
                            probability: self.action_stochasticity,
                        });
                        probability -= self.action_stochasticity;
                    }
                }
            }
        }

        if probability > 0. {
            transitions.push(Transition {
                next: pos + action,
                probability,
            });
        }

        Ok(transitions)
    }

    pub fn get_transition_prob(
        &self,
        pos: Position,
        next_pos: Position,
        action: Action,
    ) -> Result<Continous> {
        Ok(self
            .get_transitions(pos, action)?
            .iter()
            .filter(|t| t.next == next_pos)
            .map(|t| t.probability)
            .sum())
    }

    fn check_state(&self, pos: Position) -> Result<()> {
        if !self.is_within_bounds(pos) {
            return Err(GridWorldError::OutOfBounds {
                pos,
                width: self.width(),
                height: self.height(),
            });
        }

        if self.is_wall(pos) {
            return Err(GridWorldError::InvalidState(pos));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_eq::*;
    use rstest::*;

    fn world(map: &str, p: Continous) -> GridWorld {
        GridWorld::with_stochasticity(map.parse().unwrap(), p).unwrap()
    }

    #[test]
    fn moves_from_extreme_positions_are_not_allowed() {
        let gw = world("S G", 0.1);

        assert!(!gw.is_action_allowed(Position::new(i32::MAX, 0), Action::Right));
        assert!(!gw.is_action_allowed(Position::new(0, i32::MIN), Action::Up));
        assert!(!gw.is_action_allowed(Position::new(i32::MIN, i32::MAX), Action::Left));
        assert_eq!(Position::new(i32::MAX, 0) + Action::Right, Position::new(i32::MAX, 0));
    }

    #[test]
    fn special_cells_are_resolved() {
        let gw = world("S 0 0\n1 T 0\n0 0 G", 0.1);

        assert_eq!(gw.start_pos(), Some(Position::new(0, 0)));
        assert_eq!(gw.trap_pos(), Some(Position::new(1, 1)));
        assert_eq!(gw.goal_pos(), Some(Position::new(2, 2)));
        assert_eq!((gw.width(), gw.height()), (3, 3));
    }

    #[test]
    fn last_special_cell_wins() {
        let gw = world("G 0 T\nT 0 G", 0.1);

        assert_eq!(gw.goal_pos(), Some(Position::new(2, 1)));
        assert_eq!(gw.trap_pos(), Some(Position::new(0, 1)));
        assert_eq!(gw.start_pos(), None);
    }

    #[rstest]
    #[case(Position::new(0, 0), true)]
    #[case(Position::new(2, 1), true)]
    #[case(Position::new(-1, 0), false)]
    #[case(Position::new(0, 2), false)]
    #[case(Position::new(3, 0), false)]
    fn bounds(#[case] pos: Position, #[case] expected: bool) {
        let gw = world("S 0 0\n1 0 G", 0.1);

        assert_eq!(gw.is_within_bounds(pos), expected);
    }

    #[test]
    fn out_of_bounds_is_not_a_wall() {
        let gw = world("S 1\n0 G", 0.1);

        assert!(gw.is_wall(Position::new(1, 0)));
        assert!(!gw.is_wall(Position::new(-1, 0)));
        assert!(!gw.is_wall(Position::new(5, 5)));
        assert!(!gw.is_free(Position::new(5, 5)));
    }

    #[rstest]
    #[case(Action::Up, false)]
    #[case(Action::Right, false)]
    #[case(Action::Down, true)]
    #[case(Action::Left, false)]
    #[case(Action::Idle, true)]
    fn allowed_actions_from_corner(#[case] a: Action, #[case] expected: bool) {
        let gw = world("S 1\n0 G", 0.1);

        assert_eq!(gw.is_action_allowed(Position::new(0, 0), a), expected);
    }

    #[test]
    fn transitions_slip_sideways() {
        let gw = world("0 0 0\n0 S 0\n0 0 G", 0.1);
        let ts = gw.get_transitions(Position::new(1, 1), Action::Up).unwrap();

        assert_eq!(
            ts.iter().map(|t| t.next).collect::<Vec<_>>(),
            vec![
                Position::new(0, 1),
                Position::new(2, 1),
                Position::new(1, 0)
            ]
        );
        assert_float_eq!(
            ts.iter().map(|t| t.probability).collect::<Vec<_>>(),
            vec![0.1, 0.1, 0.8],
            abs_all <= 1e-12
        );
    }

    #[test]
    fn blocked_residual_mass_goes_to_intended_cell() {
        let gw = world("0 0 0\n1 S 0\n0 0 G", 0.1);
        let ts = gw.get_transitions(Position::new(1, 1), Action::Down).unwrap();

        assert_eq!(ts.len(), 2);
        assert_eq!(ts[0].next, Position::new(2, 1));
        assert_eq!(ts[1].next, Position::new(1, 2));
        assert_float_eq!(ts[1].probability, 0.9, abs <= 1e-12);
    }

    #[test]
    fn idle_stays_put() {
        let gw = world("S 0\n0 G", 0.1);
        let ts = gw.get_transitions(Position::new(1, 1), Action::Idle).unwrap();

        assert_eq!(
            ts,
            vec![Transition {
                next: Position::new(1, 1),
                probability: 1.
            }]
        );
    }

    #[test]
    fn disallowed_action_has_no_transitions() {
        let gw = world("S 1\n0 G", 0.1);

        assert!(gw
            .get_transitions(Position::new(0, 0), Action::Right)
            .unwrap()
            .is_empty());
        assert!(gw
            .get_transitions(Position::new(0, 0), Action::Left)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn transitions_from_wall_or_outside_fail() {
        let gw = world("S 1\n0 G", 0.1);

        assert!(matches!(
            gw.get_transitions(Position::new(1, 0), Action::Idle),
            Err(GridWorldError::InvalidState(p)) if p == Position::new(1, 0)
        ));
        assert!(matches!(
            gw.get_transitions(Position::new(2, 0), Action::Idle),
            Err(GridWorldError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn zero_stochasticity_is_deterministic() {
        let gw = world("0 0 0\n0 S 0\n0 0 G", 0.);
        let ts = gw.get_transitions(Position::new(1, 1), Action::Left).unwrap();

        assert_eq!(
            ts,
            vec![Transition {
                next: Position::new(0, 1),
                probability: 1.
            }]
        );
    }

    #[test]
    fn transition_prob_matches_transitions() {
        let gw = world("0 0 0\n0 S 0\n0 0 G", 0.1);
        let s = Position::new(1, 1);

        assert_float_eq!(
            gw.get_transition_prob(s, Position::new(1, 2), Action::Down)
                .unwrap(),
            0.8,
            abs <= 1e-12
        );
        assert_float_eq!(
            gw.get_transition_prob(s, Position::new(0, 1), Action::Down)
                .unwrap(),
            0.1,
            abs <= 1e-12
        );
        assert_float_eq!(
            gw.get_transition_prob(s, Position::new(1, 0), Action::Down)
                .unwrap(),
            0.,
            abs <= 1e-12
        );
    }

    #[test]
    fn stochasticity_is_validated() {
        let grid: Grid = "S G".parse().unwrap();

        assert!(GridWorld::with_stochasticity(grid.clone(), 0.6).is_err());
        assert!(GridWorld::with_stochasticity(grid.clone(), -0.1).is_err());
        assert_float_eq!(
            GridWorld::new(grid).action_stochasticity(),
            DEFAULT_ACTION_STOCHASTICITY,
            abs <= 0.
        );
    }

    #[test]
    fn free_positions_are_row_major() {
        let gw = world("S 1\n0 G", 0.1);

        assert_eq!(
            gw.free_positions().collect::<Vec<_>>(),
            vec![
                Position::new(0, 0),
                Position::new(0, 1),
                Position::new(1, 1)
            ]
        );
    }
}
