pub mod link;
pub mod product;

pub use link::{LinkType, ProductLink};
pub use product::Product;
