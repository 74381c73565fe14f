// src/models/mod.rs

pub mod announcement;
pub mod assignment;
pub mod course;
pub mod question;
pub mod quiz;
pub mod role;
pub mod ticket;
pub mod user;
