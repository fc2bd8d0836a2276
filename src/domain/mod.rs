pub mod outcome;
pub mod tags;
