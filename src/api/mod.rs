pub mod callback;
pub mod contact;
pub mod media;
