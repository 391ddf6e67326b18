pub mod detail;
pub mod overview;
pub mod request;
pub mod summary;
