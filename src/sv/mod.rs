pub mod book;
pub mod code;
pub mod follow;
pub mod invoicing;
pub mod notification;
pub mod pack;
pub mod quiz;
pub mod role;
pub mod session;
pub mod user;

#[cfg(test)]
pub mod test_utils;

pub use book::Book;
pub use code::Code;
pub use follow::Follow;
pub use invoicing::Invoicing;
pub use notification::Notification;
pub use pack::Pack;
pub use quiz::{Quiz, QuizApi};
pub use role::Role;
pub use session::Session;
pub use user::User;
