//! Core domain for the Lectern learning platform.
//!
//! This crate contains every entity, newtype identifier, value type, and the
//! error taxonomy used throughout the workspace, plus the entity graph that
//! enforces referential and uniqueness invariants. Storage adapters implement
//! the port traits defined here; they never add domain rules.
//!
//! ## Architectural Layer
//!
//! **Domain model + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is stored and which invariants hold; the `store` crate
//! defines *how* units of work are persisted, and the `workflows` crate
//! sequences multi-entity operations on top.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype entity identifiers (`UserId`, `CourseId`, etc.) |
//! | [`types`] | Value types (`Role`, `Rating`, `Timestamp`, etc.) |
//! | [`entities`] | Entity records |
//! | [`graph`] | Entity arena, unique indexes, composite operations, cascades, queries |
//! | [`scoring`] | Quiz scoring |
//! | [`errors`] | Error taxonomy and boundary status mapping |
//! | [`ports`] | Storage port traits |

pub mod entities;
pub mod errors;
pub mod graph;
pub mod identifiers;
pub mod ports;
pub mod scoring;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use entities::{
    Answer, AnswerOption, Assignment, Category, Course, CourseReview, Enrollment, Lesson, Module,
    Profile, Question, Quiz, QuizAnswers, QuizSubmission, Submission, Tag, User,
};
pub use errors::{ErrorKind, LearningError, ValidationErrors};
pub use graph::{DeletionSummary, EntityGraph, Tables};
pub use identifiers::{
    AnswerOptionId, AssignmentId, CategoryId, CourseId, EnrollmentId, LessonId, ModuleId,
    QuestionId, QuizId, QuizSubmissionId, ReviewId, SubmissionId, TagId, UserId,
};
pub use ports::{GraphView, LearningStore, StoreError, UnitOfWork};
pub use scoring::{score_quiz, QuizScore};
pub use types::{Date, EnrollmentStatus, QuestionType, Rating, Role, Timestamp};
