pub mod login;
pub mod token;

pub use login::LoginOutcome;
pub use token::TokenStore;
