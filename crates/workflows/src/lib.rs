//! Lectern workflow services.
//!
//! Each service sequences one multi-entity operation against the storage
//! port: begin a unit of work, check preconditions, mutate the
//! [`learning::EntityGraph`], commit. A failure at any step drops the unit of
//! work, so no partial state is ever committed.
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** Services sequence calls between the domain rules in
//! the [`learning`] crate and a [`learning::LearningStore`] adapter. Integrity
//! rules themselves live in the graph; services add the authorization and
//! precondition checks that need more than one entity.
//!
//! | Service | Operations |
//! |---------|------------|
//! | [`UserService`] | registration, profiles, deactivation, deletion |
//! | [`CourseService`] | catalog authoring, course ↔ module composition, queries, cascades |
//! | [`EnrollmentService`] | enroll, status changes, rosters |
//! | [`SubmissionService`] | assignment submission and grading |
//! | [`QuizService`] | quiz submission and scoring |
//! | [`ReviewService`] | course reviews and ratings |

use std::sync::Arc;

use learning::LearningStore;

mod commands;
mod courses;
mod enrollment;
mod quizzes;
mod reviews;
mod submissions;
mod users;

pub use commands::{
    NewAssignment, NewCourse, NewLesson, NewModule, NewQuestion, NewUser, ProfileFields,
};
pub use courses::{CourseOutline, CourseService, LessonOutline, ModuleOutline};
pub use enrollment::EnrollmentService;
pub use quizzes::{QuizPolicy, QuizService};
pub use reviews::ReviewService;
pub use submissions::SubmissionService;
pub use users::UserService;

/// Every workflow service wired to one store.
#[derive(Clone)]
pub struct Services {
    pub users: UserService,
    pub courses: CourseService,
    pub enrollment: EnrollmentService,
    pub submissions: SubmissionService,
    pub quizzes: QuizService,
    pub reviews: ReviewService,
}

impl Services {
    pub fn new(store: Arc<dyn LearningStore>, quiz_policy: QuizPolicy) -> Self {
        Self {
            users: UserService::new(Arc::clone(&store)),
            courses: CourseService::new(Arc::clone(&store)),
            enrollment: EnrollmentService::new(Arc::clone(&store)),
            submissions: SubmissionService::new(Arc::clone(&store)),
            quizzes: QuizService::new(Arc::clone(&store), quiz_policy),
            reviews: ReviewService::new(store),
        }
    }
}

/// Rejects users that may not act: deactivated accounts, or accounts without
/// the role the operation needs.
pub(crate) fn require_role(
    user: &learning::User,
    role: learning::Role,
) -> Result<(), learning::LearningError> {
    if !user.is_active {
        return Err(learning::LearningError::forbidden(format!(
            "user {} is deactivated",
            user.id
        )));
    }
    if user.role != role {
        return Err(learning::LearningError::forbidden(format!(
            "user {} has role {}, expected {role}",
            user.id, user.role
        )));
    }
    Ok(())
}
