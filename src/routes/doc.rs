use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{ChangePasswordRequest, LoginRequest, LoginResponse},
        clients::{ClientList, RegisterClientRequest, UpdateClientRequest},
        services::{CreateServiceRequest, ServiceList, UpdateServiceRequest},
        technicians::{
            AvailableTechnicianList, CreateTechnicianRequest, TechnicianList,
            UpdateTechnicianProfileRequest, UpdateTechnicianRequest,
        },
        tickets::{
            AddTicketServiceRequest, CreateTicketRequest, TicketList, UpdateTicketStatusRequest,
        },
    },
    entity::{tickets::TicketStatus, users::Role},
    models::{
        AccountInfo, AvailableTechnician, Client, ClientDetail, ClientRef, CreatedTechnician,
        Service, Technician, TechnicianDetail, TechnicianRef, TicketClient, TicketLine,
        TicketTechnician, TicketView, UserProfile, UserSummary,
    },
    response::{ApiResponse, Meta},
    routes::{auth, clients, health, params, services, technicians, tickets, upload},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        auth::profile,
        auth::change_password,
        clients::register,
        clients::list_clients,
        clients::get_client,
        clients::update_client,
        clients::delete_client,
        clients::update_profile,
        clients::delete_account,
        clients::upload_avatar,
        technicians::list_available,
        technicians::create_technician,
        technicians::list_technicians,
        technicians::get_technician,
        technicians::update_technician,
        technicians::update_profile,
        technicians::upload_avatar,
        services::list_active,
        services::list_all,
        services::get_service,
        services::create_service,
        services::update_service,
        services::activate_service,
        services::deactivate_service,
        tickets::list_all_tickets,
        tickets::create_ticket,
        tickets::list_my_tickets,
        tickets::list_assigned_tickets,
        tickets::get_ticket,
        tickets::update_status,
        tickets::add_service
    ),
    components(
        schemas(
            Role,
            TicketStatus,
            UserSummary,
            UserProfile,
            TechnicianRef,
            ClientRef,
            AccountInfo,
            Client,
            ClientDetail,
            Technician,
            TechnicianDetail,
            CreatedTechnician,
            AvailableTechnician,
            Service,
            TicketClient,
            TicketTechnician,
            TicketLine,
            TicketView,
            LoginRequest,
            LoginResponse,
            ChangePasswordRequest,
            RegisterClientRequest,
            UpdateClientRequest,
            ClientList,
            CreateTechnicianRequest,
            UpdateTechnicianRequest,
            UpdateTechnicianProfileRequest,
            TechnicianList,
            AvailableTechnicianList,
            CreateServiceRequest,
            UpdateServiceRequest,
            ServiceList,
            CreateTicketRequest,
            UpdateTicketStatusRequest,
            AddTicketServiceRequest,
            TicketList,
            params::Pagination,
            params::SortOrder,
            params::TicketListQuery,
            upload::AvatarForm,
            Meta,
            ApiResponse<TicketView>,
            ApiResponse<TicketList>,
            ApiResponse<Service>,
            ApiResponse<ServiceList>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Login, profile and password endpoints"),
        (name = "Clients", description = "Client registration and management"),
        (name = "Technicians", description = "Technician accounts and availability"),
        (name = "Services", description = "Service catalog"),
        (name = "Tickets", description = "Ticket lifecycle and line items"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_resource_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/health",
            "/api/auth/login",
            "/api/clients/register",
            "/api/technicians/available",
            "/api/services/{id}/deactivate",
            "/api/tickets/{id}/services",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
