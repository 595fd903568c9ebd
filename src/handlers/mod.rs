pub mod admin;
pub mod agent;
pub mod auth;
pub mod booking;
pub mod customer;
pub mod payment;
pub mod review;
pub mod vehicle;
