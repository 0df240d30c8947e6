pub mod ads;
pub mod users;
