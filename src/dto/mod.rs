pub mod auth;
pub mod clients;
pub mod services;
pub mod technicians;
pub mod tickets;
