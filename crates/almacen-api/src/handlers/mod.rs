//! HTTP request handlers, grouped by resource.

pub mod attachments;
pub mod catalogs;
pub mod chat;
pub mod materials;
