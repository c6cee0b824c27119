// handlers/public/auth/mod.rs - token acquisition and account creation
pub mod login; // POST /login - verify credentials, issue a bearer token
pub mod signup; // POST /signup, POST /api/users - create an account
pub mod validation;

pub use login::login;
pub use signup::{register, signup};
