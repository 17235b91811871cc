//! Service layer: the object-store client and the coordination service
//! that ties it to the metadata database.

pub mod image_service;
pub mod object_store;
