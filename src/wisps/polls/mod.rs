pub mod commands;
pub mod results;
