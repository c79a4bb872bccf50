pub mod ticket;
pub mod token;
