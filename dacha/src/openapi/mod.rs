//! OpenAPI document for the REST API, served at `/openapi.json` and rendered at `/docs`.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::api;

/// Security scheme for owner-only routes (session token as a Bearer token).
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "BearerAuth".to_string(),
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "Session token returned by `/users/registration` and `/users/authentication`:\n\n\
                            ```\nAuthorization: Bearer YOUR_TOKEN\n```",
                        ))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Dacha API",
        description = "Classifieds marketplace: users, categories, subcategories and geotagged advertisements. \
            Locations are GeoJSON geometry objects in WGS 84."
    ),
    paths(
        api::handlers::users::list_users,
        api::handlers::users::get_user,
        api::handlers::users::register,
        api::handlers::users::authenticate,
        api::handlers::users::update_user,
        api::handlers::users::delete_user,
        api::handlers::categories::list_categories,
        api::handlers::categories::get_category,
        api::handlers::categories::create_category,
        api::handlers::categories::update_category,
        api::handlers::categories::delete_category,
        api::handlers::subcategories::list_subcategories,
        api::handlers::subcategories::get_subcategory,
        api::handlers::subcategories::create_subcategory,
        api::handlers::subcategories::update_subcategory,
        api::handlers::subcategories::delete_subcategory,
        api::handlers::ads::list_ads,
        api::handlers::ads::get_ad,
        api::handlers::ads::create_ad,
        api::handlers::ads::update_ad,
        api::handlers::ads::delete_ad,
    ),
    components(schemas(
        api::models::users::UserRegistration,
        api::models::users::UserUpdate,
        api::models::users::UserResponse,
        api::models::auth::AuthenticationRequest,
        api::models::auth::AuthResponse,
        api::models::categories::CategoryCreate,
        api::models::categories::CategoryResponse,
        api::models::subcategories::SubcategoryCreate,
        api::models::subcategories::SubcategoryResponse,
        api::models::ads::AdCreate,
        api::models::ads::AdUpdate,
        api::models::ads::AdCreated,
        api::models::ads::AdResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "users", description = "Registration, authentication and profiles"),
        (name = "categories", description = "Top-level categories"),
        (name = "subcategories", description = "Subcategories within a category"),
        (name = "ads", description = "Geotagged advertisements"),
    )
)]
pub struct ApiDoc;
