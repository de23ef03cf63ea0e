pub mod dto;
pub mod extract;
mod memberships;
pub mod response;
mod router;
mod segments;
mod users;
pub mod validation;

pub use router::{AppState, create_router};
