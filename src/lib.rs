// src/lib.rs

//! ULSTU timetable extraction library
//!
//! Resolves groups and instructors to their timetable pages and turns the
//! portal's loosely formatted HTML tables into normalized lesson records.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod utils;
