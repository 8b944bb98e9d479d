pub mod shipping_handler;

pub use shipping_handler::*;
