//! Business logic services layer

pub mod association_service;

pub use association_service::AssociationService;
