//! Entity module - SeaORM entity definitions
//!
//! One module per database table. Cross-table relations are resolved with
//! manual queries in the handlers to avoid circular dependencies.

pub mod access_token;
pub mod division;
pub mod documentation;
pub mod link;
pub mod pengurus;
pub mod profile_desc;
pub mod schedule;
pub mod surat_disposition;
pub mod surat_outgoing;
pub mod surat_request;
pub mod user;
