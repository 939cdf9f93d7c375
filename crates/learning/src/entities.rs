//! Entity records stored in the [`crate::EntityGraph`].
//!
//! Relationships are expressed as identifiers, never as pointers. Where a
//! relationship has two sides (course ↔ module), only the graph's composite
//! operations may change it, so the fields that encode it are read-only
//! outside this crate.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{
    AnswerOptionId, AssignmentId, CategoryId, CourseId, Date, EnrollmentId, EnrollmentStatus,
    LessonId, ModuleId, QuestionId, QuestionType, QuizId, QuizSubmissionId, Rating, ReviewId,
    Role, SubmissionId, TagId, Timestamp, UserId,
};

// ---------------------------------------------------------------------------
// People
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    /// Unique across all users, compared case-insensitively.
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: Timestamp,
}

/// Optional personal details of a user. Owned 1:1 by the user and keyed by
/// the owner's [`UserId`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub user: UserId,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub github: Option<String>,
    pub linkedin: Option<String>,
    pub created_at: Timestamp,
    /// Refreshed on every mutation.
    pub updated_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub title: String,
    pub description: String,
    pub duration_hours: Option<u32>,
    pub start_date: Option<Date>,
    pub category: Option<CategoryId>,
    /// Must have role [`Role::Teacher`] when the course is created.
    pub teacher: UserId,
    pub created_at: Timestamp,
    pub(crate) modules: Vec<ModuleId>,
    pub(crate) tags: BTreeSet<TagId>,
}

impl Course {
    /// Creates an unattached course record with no modules and no tags.
    pub fn new(title: impl Into<String>, description: impl Into<String>, teacher: UserId) -> Self {
        Self {
            id: CourseId::new_random(),
            title: title.into(),
            description: description.into(),
            duration_hours: None,
            start_date: None,
            category: None,
            teacher,
            created_at: Timestamp::now(),
            modules: Vec::new(),
            tags: BTreeSet::new(),
        }
    }

    /// Attached modules in course order.
    pub fn modules(&self) -> &[ModuleId] {
        &self.modules
    }

    pub fn tags(&self) -> &BTreeSet<TagId> {
        &self.tags
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub id: ModuleId,
    pub title: String,
    /// 1-based place in the course's module sequence, 0 while detached.
    pub(crate) position: u32,
    pub(crate) course: Option<CourseId>,
}

impl Module {
    /// Creates a module that is not yet attached to any course.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: ModuleId::new_random(),
            title: title.into(),
            position: 0,
            course: None,
        }
    }

    /// Place in the course order, starting at 1. Detached modules report 0.
    pub fn position(&self) -> u32 {
        self.position
    }

    /// The course this module is attached to, if any.
    pub fn course(&self) -> Option<CourseId> {
        self.course
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: LessonId,
    pub module: ModuleId,
    pub title: String,
    pub content: String,
}

// ---------------------------------------------------------------------------
// Assignments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: AssignmentId,
    pub lesson: LessonId,
    pub title: String,
    pub description: String,
    pub due_date: Option<Timestamp>,
    /// Always greater than zero.
    pub max_score: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: SubmissionId,
    pub assignment: AssignmentId,
    pub student: UserId,
    pub content: String,
    pub submitted_at: Timestamp,
    /// Unset until graded; always within `0..=assignment.max_score`.
    pub score: Option<u32>,
    pub feedback: Option<String>,
}

// ---------------------------------------------------------------------------
// Quizzes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    pub id: QuizId,
    pub course: CourseId,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub quiz: QuizId,
    pub text: String,
    pub kind: QuestionType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub id: AnswerOptionId,
    pub question: QuestionId,
    pub text: String,
    pub is_correct: bool,
}

/// A student's answer to a single question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Answer {
    /// Selected options of a choice question.
    Choices(BTreeSet<AnswerOptionId>),
    /// Free-text answer to a text question.
    Text(String),
}

impl Answer {
    pub fn single(option: AnswerOptionId) -> Self {
        Answer::Choices(BTreeSet::from([option]))
    }

    pub fn choices(options: impl IntoIterator<Item = AnswerOptionId>) -> Self {
        Answer::Choices(options.into_iter().collect())
    }
}

/// Answers keyed by question. Questions without an entry are unanswered.
pub type QuizAnswers = BTreeMap<QuestionId, Answer>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizSubmission {
    pub id: QuizSubmissionId,
    pub quiz: QuizId,
    pub student: UserId,
    pub answers: QuizAnswers,
    /// Number of questions answered correctly.
    pub score: u32,
    /// Number of questions in the quiz at submission time.
    pub max_score: u32,
    pub submitted_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Participation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub course: CourseId,
    pub student: UserId,
    pub enrolled_at: Timestamp,
    pub status: EnrollmentStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseReview {
    pub id: ReviewId,
    pub course: CourseId,
    pub student: UserId,
    pub rating: Rating,
    pub comment: Option<String>,
    pub created_at: Timestamp,
}
