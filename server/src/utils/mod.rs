pub mod mask;
pub mod parser;

pub use mask::{mask_email, mask_sensitive, token_preview};
pub use parser::parse_price;
