mod shipping_dto;

pub use shipping_dto::*;
