// Tabular data handling — CSV in/out, cleanup, and encoding diagnostics.

pub mod clean;
pub mod table;
