pub mod api;
pub mod common;
pub mod errors;
pub mod notification;
pub mod offer;
pub mod shipment;
pub mod user;

pub use api::*;
pub use common::*;
pub use errors::*;
pub use notification::*;
pub use offer::*;
pub use shipment::*;
pub use user::*;
