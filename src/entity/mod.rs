pub mod audit_logs;
pub mod clients;
pub mod services;
pub mod technicians;
pub mod ticket_services;
pub mod tickets;
pub mod users;

pub use audit_logs::Entity as AuditLogs;
pub use clients::Entity as Clients;
pub use services::Entity as Services;
pub use technicians::Entity as Technicians;
pub use ticket_services::Entity as TicketServices;
pub use tickets::Entity as Tickets;
pub use users::Entity as Users;
