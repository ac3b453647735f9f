pub mod about_book;
pub mod book;
pub mod book_pack;
pub mod code;
pub mod follow_book;
pub mod follow_pack;
pub mod follow_session;
pub mod notification;
pub mod pack;
pub mod session;
pub mod session_quiz;
pub mod teacher_postulate;
pub mod user;

pub use code::CodeStatus;
pub use pack::AgeGroup;
pub use session::Location;
pub use user::UserRole;
