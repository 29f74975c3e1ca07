pub mod images;
pub mod orders;
