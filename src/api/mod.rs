// Public entry points: the orchestrating launcher and process-wide setup.

pub mod launcher;
pub mod simple;
