pub mod account;
pub mod auth_service;
pub mod catalog_service;
pub mod client_service;
pub mod technician_service;
pub mod ticket_service;
