pub mod bridge_routes;
pub mod chat_routes;
pub mod chat_ws_route;
pub mod document_routes;
pub mod forum_routes;
pub mod health_route;
