// src/models/mod.rs

pub mod attempt;
pub mod question;
pub mod timetable;
pub mod user;
