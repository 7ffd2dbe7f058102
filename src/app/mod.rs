pub mod commands;
pub mod presentation;
