// src/services/mod.rs

pub mod activity;
pub mod course;
pub mod enrollment;
pub mod news;
pub mod notification;
pub mod quiz;
pub mod user;
