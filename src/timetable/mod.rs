// src/timetable/mod.rs

//! Timetable editing: the draft grid, teacher conflict checks and room lookup.

pub mod checker;
pub mod drafts;
pub mod grid;
pub mod rooms;
pub mod time;
