pub mod access;
pub mod auth;
pub mod crm_service;
pub mod document_service;
pub mod order_service;
pub mod team_service;
pub mod timeline_service;
