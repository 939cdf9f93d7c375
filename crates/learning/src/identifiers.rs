//! Newtype entity identifiers.
//!
//! Every entity set has its own identifier type wrapping a [`Uuid`], so a
//! [`CourseId`] cannot be passed where a [`QuizId`] is expected even though
//! both are UUIDs underneath. Identifiers are opaque. Their `Ord` impl only
//! keeps map iteration deterministic and says nothing about creation order.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for UUID-wrapped newtypes.
// Generates: struct (Copy), new_random(), from_uuid(), as_uuid(), Display, FromStr.
// ---------------------------------------------------------------------------
macro_rules! uuid_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generates a new random identifier.
            pub fn new_random() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wraps an existing UUID (e.g. one parsed from a request path).
            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Returns the underlying [`Uuid`].
            pub fn as_uuid(self) -> Uuid {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// People
// ---------------------------------------------------------------------------

uuid_id! {
    /// Identifies a platform user (student, teacher, or administrator).
    ///
    /// Also keys the user's 1:1 profile; profiles have no identity of their own.
    UserId
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

uuid_id! {
    /// Identifies a course category.
    CategoryId
}

uuid_id! {
    /// Identifies a tag that can be attached to any number of courses.
    TagId
}

uuid_id! {
    /// Identifies a course.
    CourseId
}

uuid_id! {
    /// Identifies a module. Modules are owned by at most one course at a time.
    ModuleId
}

uuid_id! {
    /// Identifies a lesson within a module.
    LessonId
}

// ---------------------------------------------------------------------------
// Assessment
// ---------------------------------------------------------------------------

uuid_id! {
    /// Identifies an assignment attached to a lesson.
    AssignmentId
}

uuid_id! {
    /// Identifies one student's submission for one assignment.
    SubmissionId
}

uuid_id! {
    /// Identifies a quiz belonging to a course.
    QuizId
}

uuid_id! {
    /// Identifies a question within a quiz.
    QuestionId
}

uuid_id! {
    /// Identifies a selectable answer option of a question.
    AnswerOptionId
}

uuid_id! {
    /// Identifies one student's scored quiz attempt.
    QuizSubmissionId
}

// ---------------------------------------------------------------------------
// Participation
// ---------------------------------------------------------------------------

uuid_id! {
    /// Identifies a (course, student) enrollment record.
    EnrollmentId
}

uuid_id! {
    /// Identifies a course review.
    ReviewId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_parse_agree() {
        let id = CourseId::new_random();
        let parsed: CourseId = id.to_string().parse().expect("valid uuid");
        assert_eq!(parsed, id);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("not-a-uuid".parse::<UserId>().is_err());
    }

    #[test]
    fn serializes_as_bare_uuid_string() {
        let uuid = Uuid::new_v4();
        let id = QuizId::from_uuid(uuid);
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, format!("\"{uuid}\""));
    }
}
