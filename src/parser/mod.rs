//! Text-level parsing of result cells: participant info blocks and clock times.

pub mod fields;
pub mod time;
