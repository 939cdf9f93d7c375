//! The entity graph: every entity table plus the unique indexes that guard
//! natural keys.
//!
//! The graph is the storage-layer model a [`crate::UnitOfWork`] hands out.
//! It enforces, independently of any workflow pre-check:
//!
//! - referential integrity of every insert (parents must exist),
//! - uniqueness of emails, category/tag names, and the natural-key pairs
//!   (course, student) for enrollments and reviews, (assignment, student) for
//!   submissions, (quiz, student) for quiz submissions,
//! - agreement of both sides of the course ↔ module association.
//!
//! Only [`Tables`] is serialized; indexes are rebuilt (and re-validated) on load.
//!
//! | Submodule | Contents |
//! |-----------|----------|
//! | `composition` | course ↔ module and course ↔ tag composite operations |
//! | `cascade` | explicit cascading deletes |
//! | `queries` | side-effect-free relationship queries |

mod cascade;
mod composition;
mod queries;

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    AnswerOption, AnswerOptionId, Assignment, AssignmentId, Category, CategoryId, Course,
    CourseId, CourseReview, Enrollment, EnrollmentId, EnrollmentStatus, Lesson, LessonId, Module,
    ModuleId, Profile, Question, QuestionId, QuestionType, Quiz, QuizId, QuizSubmission,
    QuizSubmissionId, ReviewId, StoreError, Submission, SubmissionId, Tag, TagId, User, UserId,
};

pub use cascade::DeletionSummary;

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// Serialized form of the graph: one map per entity set, kept in insertion
/// order so child listings come back in authoring order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tables {
    users: IndexMap<UserId, User>,
    profiles: IndexMap<UserId, Profile>,
    categories: IndexMap<CategoryId, Category>,
    tags: IndexMap<TagId, Tag>,
    courses: IndexMap<CourseId, Course>,
    modules: IndexMap<ModuleId, Module>,
    lessons: IndexMap<LessonId, Lesson>,
    assignments: IndexMap<AssignmentId, Assignment>,
    submissions: IndexMap<SubmissionId, Submission>,
    quizzes: IndexMap<QuizId, Quiz>,
    questions: IndexMap<QuestionId, Question>,
    answer_options: IndexMap<AnswerOptionId, AnswerOption>,
    quiz_submissions: IndexMap<QuizSubmissionId, QuizSubmission>,
    enrollments: IndexMap<EnrollmentId, Enrollment>,
    reviews: IndexMap<ReviewId, CourseReview>,
}

// ---------------------------------------------------------------------------
// Unique indexes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
struct Indexes {
    emails: HashMap<String, UserId>,
    category_names: HashMap<String, CategoryId>,
    tag_names: HashMap<String, TagId>,
    enrollments: HashMap<(CourseId, UserId), EnrollmentId>,
    submissions: HashMap<(AssignmentId, UserId), SubmissionId>,
    quiz_submissions: HashMap<(QuizId, UserId), QuizSubmissionId>,
    reviews: HashMap<(CourseId, UserId), ReviewId>,
}

/// Normalized key for case-insensitive unique text columns.
fn text_key(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Fails if `table` already holds a row with identifier `id`.
fn vacant<K, V>(table: &IndexMap<K, V>, id: K, entity: &'static str) -> Result<(), StoreError>
where
    K: std::hash::Hash + Eq + std::fmt::Display,
{
    if table.contains_key(&id) {
        return Err(StoreError::integrity(format!("duplicate {entity} id {id}")));
    }
    Ok(())
}

/// Stores a row whose identifier was checked with [`vacant`].
fn put<K, V>(table: &mut IndexMap<K, V>, id: K, row: V) -> &V
where
    K: std::hash::Hash + Eq,
{
    table.entry(id).or_insert(row)
}

/// Claims `key` in a unique index, failing if another row already holds it.
fn claim<K, V>(
    index: &mut HashMap<K, V>,
    key: K,
    value: V,
    constraint: &'static str,
) -> Result<(), StoreError>
where
    K: std::hash::Hash + Eq + std::fmt::Debug,
{
    if index.contains_key(&key) {
        return Err(StoreError::UniqueViolation {
            constraint,
            key: format!("{key:?}"),
        });
    }
    index.insert(key, value);
    Ok(())
}

// ---------------------------------------------------------------------------
// Graph
// ---------------------------------------------------------------------------

/// Arena of every entity, addressed by identifier.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "Tables", into = "Tables")]
pub struct EntityGraph {
    tables: Tables,
    indexes: Indexes,
}

impl PartialEq for EntityGraph {
    fn eq(&self, other: &Self) -> bool {
        self.tables == other.tables
    }
}

impl From<EntityGraph> for Tables {
    fn from(graph: EntityGraph) -> Self {
        graph.tables
    }
}

impl TryFrom<Tables> for EntityGraph {
    type Error = StoreError;

    /// Rebuilds the unique indexes and re-checks the course ↔ module agreement.
    fn try_from(tables: Tables) -> Result<Self, Self::Error> {
        let mut indexes = Indexes::default();
        for user in tables.users.values() {
            claim(
                &mut indexes.emails,
                text_key(&user.email),
                user.id,
                "user_email",
            )?;
        }
        for category in tables.categories.values() {
            claim(
                &mut indexes.category_names,
                text_key(&category.name),
                category.id,
                "category_name",
            )?;
        }
        for tag in tables.tags.values() {
            claim(
                &mut indexes.tag_names,
                text_key(&tag.name),
                tag.id,
                "tag_name",
            )?;
        }
        for e in tables.enrollments.values() {
            claim(
                &mut indexes.enrollments,
                (e.course, e.student),
                e.id,
                "enrollment",
            )?;
        }
        for s in tables.submissions.values() {
            claim(
                &mut indexes.submissions,
                (s.assignment, s.student),
                s.id,
                "submission",
            )?;
        }
        for q in tables.quiz_submissions.values() {
            claim(
                &mut indexes.quiz_submissions,
                (q.quiz, q.student),
                q.id,
                "quiz_submission",
            )?;
        }
        for r in tables.reviews.values() {
            claim(
                &mut indexes.reviews,
                (r.course, r.student),
                r.id,
                "course_review",
            )?;
        }

        let graph = Self { tables, indexes };
        graph.check_module_links()?;
        Ok(graph)
    }
}

// ---------------------------------------------------------------------------
// Lookups: every lookup fails with `RowNotFound` rather than returning None.
// ---------------------------------------------------------------------------

macro_rules! lookups {
    ($( $get:ident, $all:ident, $table:ident, $id:ty, $entity:ty, $name:literal; )*) => {
        impl EntityGraph {
            $(
                #[doc = concat!("Looks up a ", $name, " by identifier.")]
                pub fn $get(&self, id: $id) -> Result<&$entity, StoreError> {
                    self.tables
                        .$table
                        .get(&id)
                        .ok_or_else(|| StoreError::row_not_found($name, id))
                }

                #[doc = concat!("Iterates every ", $name, " in insertion order.")]
                pub fn $all(&self) -> impl Iterator<Item = &$entity> + '_ {
                    self.tables.$table.values()
                }
            )*
        }
    };
}

lookups! {
    user, users, users, UserId, User, "user";
    category, categories, categories, CategoryId, Category, "category";
    tag, tags, tags, TagId, Tag, "tag";
    course, courses, courses, CourseId, Course, "course";
    module, modules, modules, ModuleId, Module, "module";
    lesson, lessons, lessons, LessonId, Lesson, "lesson";
    assignment, assignments, assignments, AssignmentId, Assignment, "assignment";
    submission, submissions, submissions, SubmissionId, Submission, "submission";
    quiz, quizzes, quizzes, QuizId, Quiz, "quiz";
    question, questions, questions, QuestionId, Question, "question";
    answer_option, answer_options, answer_options, AnswerOptionId, AnswerOption, "answer option";
    quiz_submission, quiz_submissions, quiz_submissions, QuizSubmissionId, QuizSubmission, "quiz submission";
    enrollment, enrollments, enrollments, EnrollmentId, Enrollment, "enrollment";
    review, reviews, reviews, ReviewId, CourseReview, "course review";
}

impl EntityGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// The profile owned by `user`, if one was created.
    pub fn profile(&self, user: UserId) -> Option<&Profile> {
        self.tables.profiles.get(&user)
    }

    pub fn user_by_email(&self, email: &str) -> Option<&User> {
        self.indexes
            .emails
            .get(&text_key(email))
            .and_then(|id| self.tables.users.get(id))
    }

    fn require_user(&self, id: UserId) -> Result<(), StoreError> {
        self.user(id).map(|_| ())
    }

    // -----------------------------------------------------------------------
    // Inserts
    // -----------------------------------------------------------------------

    pub fn insert_user(&mut self, user: User) -> Result<&User, StoreError> {
        vacant(&self.tables.users, user.id, "user")?;
        claim(
            &mut self.indexes.emails,
            text_key(&user.email),
            user.id,
            "user_email",
        )?;
        Ok(put(&mut self.tables.users, user.id, user))
    }

    /// Creates or replaces the profile owned by `profile.user`.
    pub fn upsert_profile(&mut self, profile: Profile) -> Result<&Profile, StoreError> {
        self.require_user(profile.user)?;
        let owner = profile.user;
        self.tables.profiles.insert(owner, profile);
        self.tables
            .profiles
            .get(&owner)
            .ok_or_else(|| StoreError::row_not_found("profile", owner))
    }

    pub fn insert_category(&mut self, category: Category) -> Result<&Category, StoreError> {
        vacant(&self.tables.categories, category.id, "category")?;
        claim(
            &mut self.indexes.category_names,
            text_key(&category.name),
            category.id,
            "category_name",
        )?;
        Ok(put(&mut self.tables.categories, category.id, category))
    }

    pub fn insert_tag(&mut self, tag: Tag) -> Result<&Tag, StoreError> {
        vacant(&self.tables.tags, tag.id, "tag")?;
        claim(
            &mut self.indexes.tag_names,
            text_key(&tag.name),
            tag.id,
            "tag_name",
        )?;
        Ok(put(&mut self.tables.tags, tag.id, tag))
    }

    /// Inserts a course built by [`Course::new`]. Modules and tags are linked
    /// afterwards through the composite operations.
    pub fn insert_course(&mut self, course: Course) -> Result<&Course, StoreError> {
        self.require_user(course.teacher)?;
        if let Some(category) = course.category {
            self.category(category)?;
        }
        if !course.modules.is_empty() || !course.tags.is_empty() {
            return Err(StoreError::integrity(
                "a new course must not carry module or tag links",
            ));
        }
        vacant(&self.tables.courses, course.id, "course")?;
        Ok(put(&mut self.tables.courses, course.id, course))
    }

    /// Inserts a detached module built by [`Module::new`].
    pub fn insert_module(&mut self, module: Module) -> Result<&Module, StoreError> {
        if module.course.is_some() || module.position != 0 {
            return Err(StoreError::integrity(
                "a new module must be attached through add_module",
            ));
        }
        vacant(&self.tables.modules, module.id, "module")?;
        Ok(put(&mut self.tables.modules, module.id, module))
    }

    pub fn insert_lesson(&mut self, lesson: Lesson) -> Result<&Lesson, StoreError> {
        self.module(lesson.module)?;
        vacant(&self.tables.lessons, lesson.id, "lesson")?;
        Ok(put(&mut self.tables.lessons, lesson.id, lesson))
    }

    pub fn insert_assignment(&mut self, assignment: Assignment) -> Result<&Assignment, StoreError> {
        self.lesson(assignment.lesson)?;
        if assignment.max_score == 0 {
            return Err(StoreError::integrity(
                "assignment max_score must be positive",
            ));
        }
        vacant(&self.tables.assignments, assignment.id, "assignment")?;
        Ok(put(&mut self.tables.assignments, assignment.id, assignment))
    }

    pub fn insert_quiz(&mut self, quiz: Quiz) -> Result<&Quiz, StoreError> {
        self.course(quiz.course)?;
        vacant(&self.tables.quizzes, quiz.id, "quiz")?;
        Ok(put(&mut self.tables.quizzes, quiz.id, quiz))
    }

    pub fn insert_question(&mut self, question: Question) -> Result<&Question, StoreError> {
        self.quiz(question.quiz)?;
        vacant(&self.tables.questions, question.id, "question")?;
        Ok(put(&mut self.tables.questions, question.id, question))
    }

    /// Inserts an option. A single-choice question accepts at most one
    /// correct option.
    pub fn insert_answer_option(
        &mut self,
        option: AnswerOption,
    ) -> Result<&AnswerOption, StoreError> {
        let question = self.question(option.question)?;
        if option.is_correct
            && question.kind == QuestionType::SingleChoice
            && self
                .options_for_question(question.id)
                .iter()
                .any(|o| o.is_correct)
        {
            return Err(StoreError::integrity(format!(
                "single-choice question {} already has a correct option",
                question.id
            )));
        }
        vacant(&self.tables.answer_options, option.id, "answer option")?;
        Ok(put(&mut self.tables.answer_options, option.id, option))
    }

    /// Uniqueness-enforcing insert on (assignment, student).
    pub fn insert_submission(&mut self, submission: Submission) -> Result<&Submission, StoreError> {
        self.assignment(submission.assignment)?;
        self.require_user(submission.student)?;
        vacant(&self.tables.submissions, submission.id, "submission")?;
        claim(
            &mut self.indexes.submissions,
            (submission.assignment, submission.student),
            submission.id,
            "submission",
        )?;
        Ok(put(&mut self.tables.submissions, submission.id, submission))
    }

    /// Uniqueness-enforcing insert on (quiz, student).
    pub fn insert_quiz_submission(
        &mut self,
        submission: QuizSubmission,
    ) -> Result<&QuizSubmission, StoreError> {
        self.quiz(submission.quiz)?;
        self.require_user(submission.student)?;
        vacant(
            &self.tables.quiz_submissions,
            submission.id,
            "quiz submission",
        )?;
        claim(
            &mut self.indexes.quiz_submissions,
            (submission.quiz, submission.student),
            submission.id,
            "quiz_submission",
        )?;
        Ok(put(
            &mut self.tables.quiz_submissions,
            submission.id,
            submission,
        ))
    }

    /// Uniqueness-enforcing insert on (course, student).
    pub fn insert_enrollment(&mut self, enrollment: Enrollment) -> Result<&Enrollment, StoreError> {
        self.course(enrollment.course)?;
        self.require_user(enrollment.student)?;
        vacant(&self.tables.enrollments, enrollment.id, "enrollment")?;
        claim(
            &mut self.indexes.enrollments,
            (enrollment.course, enrollment.student),
            enrollment.id,
            "enrollment",
        )?;
        Ok(put(&mut self.tables.enrollments, enrollment.id, enrollment))
    }

    /// Uniqueness-enforcing insert on (course, student).
    pub fn insert_review(&mut self, review: CourseReview) -> Result<&CourseReview, StoreError> {
        self.course(review.course)?;
        self.require_user(review.student)?;
        vacant(&self.tables.reviews, review.id, "course review")?;
        claim(
            &mut self.indexes.reviews,
            (review.course, review.student),
            review.id,
            "course_review",
        )?;
        Ok(put(&mut self.tables.reviews, review.id, review))
    }

    // -----------------------------------------------------------------------
    // Updates
    // -----------------------------------------------------------------------

    pub fn set_user_active(&mut self, id: UserId, active: bool) -> Result<&User, StoreError> {
        let user = self
            .tables
            .users
            .get_mut(&id)
            .ok_or_else(|| StoreError::row_not_found("user", id))?;
        user.is_active = active;
        Ok(user)
    }

    /// Overwrites score and feedback. The score must lie within
    /// `0..=assignment.max_score`; `submitted_at` is untouched.
    pub fn record_grade(
        &mut self,
        id: SubmissionId,
        score: u32,
        feedback: Option<String>,
    ) -> Result<&Submission, StoreError> {
        let assignment = self.submission(id)?.assignment;
        let max_score = self.assignment(assignment)?.max_score;
        if score > max_score {
            return Err(StoreError::integrity(format!(
                "score {score} exceeds max_score {max_score}"
            )));
        }
        let submission = self
            .tables
            .submissions
            .get_mut(&id)
            .ok_or_else(|| StoreError::row_not_found("submission", id))?;
        submission.score = Some(score);
        submission.feedback = feedback;
        Ok(submission)
    }

    pub fn set_enrollment_status(
        &mut self,
        id: EnrollmentId,
        status: EnrollmentStatus,
    ) -> Result<&Enrollment, StoreError> {
        let enrollment = self
            .tables
            .enrollments
            .get_mut(&id)
            .ok_or_else(|| StoreError::row_not_found("enrollment", id))?;
        enrollment.status = status;
        Ok(enrollment)
    }

    /// Removes the quiz submission occupying the (quiz, student) slot, if any.
    pub fn remove_quiz_submission_for(
        &mut self,
        quiz: QuizId,
        student: UserId,
    ) -> Option<QuizSubmission> {
        let id = self.indexes.quiz_submissions.remove(&(quiz, student))?;
        self.tables.quiz_submissions.shift_remove(&id)
    }

    // -----------------------------------------------------------------------
    // Integrity
    // -----------------------------------------------------------------------

    /// Verifies that every course's module sequence agrees with each module's
    /// course reference and position.
    fn check_module_links(&self) -> Result<(), StoreError> {
        for course in self.tables.courses.values() {
            for (index, module_id) in course.modules.iter().enumerate() {
                let module = self.module(*module_id)?;
                if module.course != Some(course.id) || module.position as usize != index + 1 {
                    return Err(StoreError::integrity(format!(
                        "course {} lists module {} at position {} which disagrees with the module",
                        course.id,
                        module_id,
                        index + 1
                    )));
                }
            }
        }
        for module in self.tables.modules.values() {
            if let Some(course_id) = module.course {
                let course = self.course(course_id)?;
                if !course.modules.contains(&module.id) {
                    return Err(StoreError::integrity(format!(
                        "module {} points at course {} which does not list it",
                        module.id, course_id
                    )));
                }
            }
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures;
    use super::*;
    use crate::{Role, Timestamp};
    use pretty_assertions::assert_eq;

    fn enrollment(course: CourseId, student: UserId) -> Enrollment {
        Enrollment {
            id: EnrollmentId::new_random(),
            course,
            student,
            enrolled_at: Timestamp::now(),
            status: EnrollmentStatus::Active,
        }
    }

    #[test]
    fn lookup_of_missing_row_reports_entity_and_id() {
        let graph = EntityGraph::new();
        let id = CourseId::new_random();
        assert_eq!(
            graph.course(id).unwrap_err(),
            StoreError::RowNotFound {
                entity: "course",
                id: id.to_string()
            }
        );
    }

    #[test]
    fn email_uniqueness_ignores_case() {
        let mut graph = EntityGraph::new();
        fixtures::user(&mut graph, "ada@example.com", Role::Student);
        let dup = User {
            id: UserId::new_random(),
            name: "Ada again".into(),
            email: "ADA@example.com".into(),
            role: Role::Teacher,
            is_active: true,
            created_at: Timestamp::now(),
        };
        assert!(matches!(
            graph.insert_user(dup),
            Err(StoreError::UniqueViolation {
                constraint: "user_email",
                ..
            })
        ));
        assert!(graph.user_by_email("Ada@Example.com").is_some());
    }

    #[test]
    fn enrollment_natural_key_is_enforced_by_the_graph() {
        let mut graph = EntityGraph::new();
        let teacher = fixtures::user(&mut graph, "t@example.com", Role::Teacher);
        let student = fixtures::user(&mut graph, "s@example.com", Role::Student);
        let course = fixtures::course(&mut graph, teacher);

        graph
            .insert_enrollment(enrollment(course, student))
            .expect("first");
        let second = graph.insert_enrollment(enrollment(course, student));
        assert!(matches!(second, Err(StoreError::UniqueViolation { .. })));
        assert_eq!(graph.enrollments().count(), 1);
    }

    #[test]
    fn inserts_require_existing_parents() {
        let mut graph = EntityGraph::new();
        let lesson = Lesson {
            id: LessonId::new_random(),
            module: ModuleId::new_random(),
            title: "orphan".into(),
            content: String::new(),
        };
        assert!(matches!(
            graph.insert_lesson(lesson),
            Err(StoreError::RowNotFound {
                entity: "module",
                ..
            })
        ));
    }

    #[test]
    fn record_grade_rejects_scores_above_max() {
        let mut graph = EntityGraph::new();
        let student = fixtures::user(&mut graph, "s@example.com", Role::Student);
        let module = fixtures::module(&mut graph, "m");
        let lesson = graph
            .insert_lesson(Lesson {
                id: LessonId::new_random(),
                module,
                title: "l".into(),
                content: String::new(),
            })
            .expect("lesson")
            .id;
        let assignment = graph
            .insert_assignment(Assignment {
                id: AssignmentId::new_random(),
                lesson,
                title: "a".into(),
                description: String::new(),
                due_date: None,
                max_score: 10,
            })
            .expect("assignment")
            .id;
        let submission = graph
            .insert_submission(Submission {
                id: SubmissionId::new_random(),
                assignment,
                student,
                content: "x".into(),
                submitted_at: Timestamp::now(),
                score: None,
                feedback: None,
            })
            .expect("submission")
            .id;

        assert!(graph.record_grade(submission, 11, None).is_err());
        assert_eq!(graph.submission(submission).expect("row").score, None);
        graph
            .record_grade(submission, 10, Some("full marks".into()))
            .expect("in range");
        assert_eq!(graph.submission(submission).expect("row").score, Some(10));
    }

    #[test]
    fn serialized_graph_rebuilds_indexes_on_load() {
        let mut graph = EntityGraph::new();
        let teacher = fixtures::user(&mut graph, "t@example.com", Role::Teacher);
        let student = fixtures::user(&mut graph, "s@example.com", Role::Student);
        let course = fixtures::course(&mut graph, teacher);
        let module = fixtures::module(&mut graph, "Intro");
        graph.add_module(course, module).expect("attach");
        graph
            .insert_enrollment(enrollment(course, student))
            .expect("enroll");

        let json = serde_json::to_string(&graph).expect("serialize");
        let mut loaded: EntityGraph = serde_json::from_str(&json).expect("deserialize");

        assert_eq!(loaded, graph);
        assert!(loaded.user_by_email("s@example.com").is_some());
        assert!(loaded
            .insert_enrollment(enrollment(course, student))
            .is_err());
        assert_eq!(loaded.course(course).expect("course").modules(), &[module]);
    }

    #[test]
    fn loading_rejects_duplicate_natural_keys() {
        let mut graph = EntityGraph::new();
        let teacher = fixtures::user(&mut graph, "t@example.com", Role::Teacher);
        let student = fixtures::user(&mut graph, "s@example.com", Role::Student);
        let course = fixtures::course(&mut graph, teacher);
        graph
            .insert_enrollment(enrollment(course, student))
            .expect("enroll");

        let mut tables: Tables = graph.into();
        let dup = enrollment(course, student);
        tables.enrollments.insert(dup.id, dup);

        assert!(matches!(
            EntityGraph::try_from(tables),
            Err(StoreError::UniqueViolation {
                constraint: "enrollment",
                ..
            })
        ));
    }
    #[test]
    fn loading_rejects_module_positions_out_of_sequence() {
        let mut graph = EntityGraph::new();
        let teacher = fixtures::user(&mut graph, "t@example.com", Role::Teacher);
        let course = fixtures::course(&mut graph, teacher);
        let first = fixtures::module(&mut graph, "Intro");
        let second = fixtures::module(&mut graph, "Parsing");
        graph.add_module(course, first).expect("attach first");
        graph.add_module(course, second).expect("attach second");

        let mut tables: Tables = graph.into();
        if let Some(module) = tables.modules.get_mut(&second) {
            module.position = 1;
        }

        assert!(matches!(
            EntityGraph::try_from(tables),
            Err(StoreError::Integrity { .. })
        ));
    }
}
