pub mod jwt;
pub mod mask;
pub mod password;

pub use jwt::*;
pub use mask::mask_key_code;
pub use password::*;
