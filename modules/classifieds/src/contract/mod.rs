pub mod model;

pub use model::{Ad, AdPatch, NewAd, NewUser, User};
