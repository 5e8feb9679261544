//! The survey/question command-and-query layer.
//!
//! Every operation takes the caller's identity and a cancellation signal,
//! checks ownership through [`crate::model::auth::guard`], and returns view
//! models from [`crate::model::api`] rather than stored documents.

pub mod question;
pub mod survey;

pub use question::QuestionService;
pub use survey::SurveyService;
