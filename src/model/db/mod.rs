pub mod question;
pub mod survey;
