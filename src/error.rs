use crate::envs::grid_world::Position;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GridWorldError>;

#[derive(Debug, Error)]
pub enum GridWorldError {
    /// An operation that needs a free cell was given a wall.
    #[error("the provided position {0} is occupied by a wall")]
    InvalidState(Position),

    #[error("the provided position {pos} is outside the {width}x{height} grid")]
    OutOfBounds {
        pos: Position,
        width: usize,
        height: usize,
    },

    /// A free cell with no allowed action. The grid is malformed.
    #[error("no action could be applied on state {0}, it is probably surrounded by walls on all sides")]
    Infeasible(Position),

    #[error("the policy evaluation system over {0} states is singular")]
    SingularSystem(usize),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error(transparent)]
    WorldMap(#[from] WorldMapError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorldMapError {
    #[error("line {line}: unrecognized token '{token}'")]
    UnknownToken { line: usize, token: String },

    #[error("line {line}: expected {expected} tokens but found {found}, all lines should have the same number of tokens")]
    RaggedRow {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("the world map has no rows")]
    Empty,
}
