// src/handlers/mod.rs

pub mod admin;
pub mod announcement;
pub mod assignment;
pub mod auth;
pub mod course;
pub mod home;
pub mod instructor;
pub mod question;
pub mod quiz;
pub mod ticket;
pub mod user;
