pub mod category;
pub mod photo;

pub use category::Category;
pub use photo::PhotoRef;
