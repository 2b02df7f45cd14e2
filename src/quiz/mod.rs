// src/quiz/mod.rs

pub mod attempt;
pub mod runner;
