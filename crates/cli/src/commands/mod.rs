pub mod chat;
pub mod products;
pub mod recommend;
