pub mod json_file_user_repo;
pub mod sqlite_user_repo;

pub use json_file_user_repo::JsonFileUserRepository;
pub use sqlite_user_repo::SqliteUserRepository;
