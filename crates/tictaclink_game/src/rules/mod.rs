//! Game rules for tic-tac-toe.
//!
//! Pure functions over a [`Board`](super::Board). Rules are kept apart from
//! board storage so both peers can run exactly the same evaluation.

pub mod result;
pub mod win;

pub use result::GameResult;
pub use win::{DiagonalPolicy, WinDetector};
