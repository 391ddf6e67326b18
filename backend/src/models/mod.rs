pub mod request;
pub mod series;
pub mod time;

pub use request::*;
pub use series::*;
pub use time::*;
