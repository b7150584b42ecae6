pub mod memory;
pub mod token;
pub mod user;

pub use memory::InMemoryCredentialStore;
pub use memory::InMemoryUserRepository;
pub use token::PostgresCredentialStore;
pub use user::PostgresUserRepository;
