pub mod cart;
pub mod common;
pub mod game;
pub mod order;
pub mod pagination;
pub mod steam_key;
pub mod user;

pub use cart::*;
pub use common::*;
pub use game::*;
pub use order::*;
pub use pagination::*;
pub use steam_key::*;
pub use user::*;
