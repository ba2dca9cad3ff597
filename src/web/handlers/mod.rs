//! # Web API Request Handlers

pub mod employees;
pub mod health;
