//! Side-effect-free relationship queries.
//!
//! Relationships are never loaded implicitly. Workflows call these functions
//! when they need a related set. Sequences are returned in a stable order:
//! course module order for modules, authoring order for other children, and
//! timestamp for records. Records sharing a timestamp keep insertion order.

use crate::{
    AnswerOption, Assignment, AssignmentId, Course, CourseId, CourseReview, Enrollment, Lesson,
    LessonId, Module, ModuleId, Question, QuestionId, Quiz, QuizId, QuizSubmission, StoreError,
    Submission, TagId, UserId,
};

use super::EntityGraph;

impl EntityGraph {
    // -----------------------------------------------------------------------
    // Course structure
    // -----------------------------------------------------------------------

    /// Modules attached to the course, in course order.
    pub fn modules_for_course(&self, course: CourseId) -> Result<Vec<&Module>, StoreError> {
        self.course(course)?
            .modules
            .iter()
            .map(|id| self.module(*id))
            .collect()
    }

    /// Lessons of the module, in the order they were added.
    pub fn lessons_for_module(&self, module: ModuleId) -> Vec<&Lesson> {
        self.tables
            .lessons
            .values()
            .filter(|l| l.module == module)
            .collect()
    }

    pub fn assignments_for_lesson(&self, lesson: LessonId) -> Vec<&Assignment> {
        self.tables
            .assignments
            .values()
            .filter(|a| a.lesson == lesson)
            .collect()
    }

    pub fn quizzes_for_course(&self, course: CourseId) -> Vec<&Quiz> {
        self.tables
            .quizzes
            .values()
            .filter(|q| q.course == course)
            .collect()
    }

    /// Questions of the quiz, in the order they were added.
    pub fn questions_for_quiz(&self, quiz: QuizId) -> Vec<&Question> {
        self.tables
            .questions
            .values()
            .filter(|q| q.quiz == quiz)
            .collect()
    }

    pub fn options_for_question(&self, question: QuestionId) -> Vec<&AnswerOption> {
        self.tables
            .answer_options
            .values()
            .filter(|o| o.question == question)
            .collect()
    }

    pub fn courses_by_teacher(&self, teacher: UserId) -> Vec<&Course> {
        self.tables
            .courses
            .values()
            .filter(|c| c.teacher == teacher)
            .collect()
    }

    pub fn courses_by_tag(&self, tag: TagId) -> Vec<&Course> {
        self.tables
            .courses
            .values()
            .filter(|c| c.tags.contains(&tag))
            .collect()
    }

    // -----------------------------------------------------------------------
    // Natural-key lookups
    // -----------------------------------------------------------------------

    pub fn enrollment_for(&self, course: CourseId, student: UserId) -> Option<&Enrollment> {
        self.indexes
            .enrollments
            .get(&(course, student))
            .and_then(|id| self.tables.enrollments.get(id))
    }

    pub fn submission_for(&self, assignment: AssignmentId, student: UserId) -> Option<&Submission> {
        self.indexes
            .submissions
            .get(&(assignment, student))
            .and_then(|id| self.tables.submissions.get(id))
    }

    pub fn quiz_submission_for(&self, quiz: QuizId, student: UserId) -> Option<&QuizSubmission> {
        self.indexes
            .quiz_submissions
            .get(&(quiz, student))
            .and_then(|id| self.tables.quiz_submissions.get(id))
    }

    pub fn review_for(&self, course: CourseId, student: UserId) -> Option<&CourseReview> {
        self.indexes
            .reviews
            .get(&(course, student))
            .and_then(|id| self.tables.reviews.get(id))
    }

    // -----------------------------------------------------------------------
    // Participation
    // -----------------------------------------------------------------------

    /// Every enrollment of the student, oldest first.
    pub fn enrollments_for_student(&self, student: UserId) -> Vec<&Enrollment> {
        let mut rows: Vec<_> = self
            .tables
            .enrollments
            .values()
            .filter(|e| e.student == student)
            .collect();
        rows.sort_by_key(|e| e.enrolled_at);
        rows
    }

    /// Every enrollment in the course, oldest first.
    pub fn enrollments_for_course(&self, course: CourseId) -> Vec<&Enrollment> {
        let mut rows: Vec<_> = self
            .tables
            .enrollments
            .values()
            .filter(|e| e.course == course)
            .collect();
        rows.sort_by_key(|e| e.enrolled_at);
        rows
    }

    pub fn submissions_for_assignment(&self, assignment: AssignmentId) -> Vec<&Submission> {
        let mut rows: Vec<_> = self
            .tables
            .submissions
            .values()
            .filter(|s| s.assignment == assignment)
            .collect();
        rows.sort_by_key(|s| s.submitted_at);
        rows
    }

    pub fn submissions_for_student(&self, student: UserId) -> Vec<&Submission> {
        let mut rows: Vec<_> = self
            .tables
            .submissions
            .values()
            .filter(|s| s.student == student)
            .collect();
        rows.sort_by_key(|s| s.submitted_at);
        rows
    }

    pub fn quiz_submissions_for_quiz(&self, quiz: QuizId) -> Vec<&QuizSubmission> {
        let mut rows: Vec<_> = self
            .tables
            .quiz_submissions
            .values()
            .filter(|s| s.quiz == quiz)
            .collect();
        rows.sort_by_key(|s| s.submitted_at);
        rows
    }

    /// Reviews of the course, newest first. Reviews posted at the same
    /// instant list the later insert first.
    pub fn reviews_for_course(&self, course: CourseId) -> Vec<&CourseReview> {
        let mut rows: Vec<_> = self
            .tables
            .reviews
            .values()
            .filter(|r| r.course == course)
            .rev()
            .collect();
        rows.sort_by_key(|r| std::cmp::Reverse(r.created_at));
        rows
    }

    /// Whether any non-owning record (course, enrollment, submission, quiz
    /// submission, review) references the user.
    pub fn is_user_referenced(&self, user: UserId) -> bool {
        let t = &self.tables;
        t.courses.values().any(|c| c.teacher == user)
            || t.enrollments.values().any(|e| e.student == user)
            || t.submissions.values().any(|s| s.student == user)
            || t.quiz_submissions.values().any(|s| s.student == user)
            || t.reviews.values().any(|r| r.student == user)
    }
}
