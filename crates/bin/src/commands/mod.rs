pub mod health;
pub mod info;
pub mod serve;
pub mod token;
pub mod users;
