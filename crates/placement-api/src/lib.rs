pub mod admin;
pub mod applications;
pub mod auth;
pub mod error;
pub mod export;
pub mod internships;
pub mod middleware;
pub mod ownership;
pub mod routes;
mod validate;
mod views;
