pub mod auth;
pub mod device;
pub mod email;
pub mod fraud;
