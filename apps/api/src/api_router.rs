use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, post, put};
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{handlers, middleware};

pub fn build_router(app_state: AppState) -> Router {
    let protected_routes = Router::new()
        .route(
            "/api/permissions",
            get(handlers::catalogue::list_permissions_handler),
        )
        .route("/api/models", get(handlers::catalogue::list_models_handler))
        .route(
            "/api/roles",
            get(handlers::roles::list_roles_handler).post(handlers::roles::create_role_handler),
        )
        .route(
            "/api/roles/{role_id}",
            get(handlers::roles::get_role_handler).delete(handlers::roles::delete_role_handler),
        )
        .route(
            "/api/roles/{role_id}/permissions",
            post(handlers::roles::grant_role_permission_handler),
        )
        .route(
            "/api/roles/{role_id}/permissions/{permission}",
            delete(handlers::roles::revoke_role_permission_handler),
        )
        .route(
            "/api/roles/{role_id}/groups",
            post(handlers::roles::add_role_group_handler),
        )
        .route(
            "/api/roles/{role_id}/groups/{group}",
            delete(handlers::roles::remove_role_group_handler),
        )
        .route(
            "/api/groups/{group}/members",
            get(handlers::roles::list_group_members_handler)
                .post(handlers::roles::add_group_member_handler),
        )
        .route(
            "/api/groups/{group}/members/{subject}",
            delete(handlers::roles::remove_group_member_handler),
        )
        .route(
            "/api/objects/{content_type}/{object_id}/acls",
            get(handlers::acls::list_acls_handler),
        )
        .route(
            "/api/objects/{content_type}/{object_id}/acls/grant",
            post(handlers::acls::grant_acl_handler),
        )
        .route(
            "/api/objects/{content_type}/{object_id}/acls/revoke",
            post(handlers::acls::revoke_acl_handler),
        )
        .route(
            "/api/objects/{content_type}/{object_id}/acls/{role_id}/inherited",
            get(handlers::acls::inherited_permissions_handler),
        )
        .route(
            "/api/objects/{content_type}/{object_id}/relations/{relation}",
            put(handlers::relations::set_relation_handler)
                .delete(handlers::relations::clear_relation_handler),
        )
        .route(
            "/api/access/restrict",
            post(handlers::access::restrict_handler),
        )
        .route(
            "/api/access/explain",
            post(handlers::access::explain_handler),
        )
        .route(
            "/api/audit-log",
            get(handlers::audit::list_audit_log_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_subject,
        ));

    Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
