pub mod log;
pub mod user;

pub use log::AuthenticationLog;
pub use user::{LoginParameters, UserInformation, UserReference};
