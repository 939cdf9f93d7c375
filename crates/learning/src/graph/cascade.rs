//! Explicit cascading deletes.
//!
//! Each function enumerates the rows a parent owns and removes them, children
//! first, together with their unique-index entries. Run inside one unit of
//! work, a parent deletion is atomic.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    AssignmentId, CourseId, LessonId, ModuleId, QuestionId, QuizId, StoreError, UserId,
};

use super::{text_key, EntityGraph};

/// Number of rows removed by a cascading delete, per entity set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionSummary {
    pub courses: usize,
    pub modules: usize,
    pub lessons: usize,
    pub assignments: usize,
    pub submissions: usize,
    pub quizzes: usize,
    pub questions: usize,
    pub answer_options: usize,
    pub quiz_submissions: usize,
    pub enrollments: usize,
    pub reviews: usize,
    pub users: usize,
    pub profiles: usize,
}

impl DeletionSummary {
    /// Total number of rows removed.
    pub fn total(&self) -> usize {
        self.courses
            + self.modules
            + self.lessons
            + self.assignments
            + self.submissions
            + self.quizzes
            + self.questions
            + self.answer_options
            + self.quiz_submissions
            + self.enrollments
            + self.reviews
            + self.users
            + self.profiles
    }
}

impl EntityGraph {
    /// Deletes a course with its modules (and their lessons, assignments and
    /// submissions), its quizzes (and their questions, options and quiz
    /// submissions), its enrollments, and its reviews. Tag links disappear
    /// with the course row.
    pub fn delete_course(&mut self, id: CourseId) -> Result<DeletionSummary, StoreError> {
        let course = self.course(id)?;
        let modules = course.modules.clone();
        let quizzes: Vec<QuizId> = self.quizzes_for_course(id).iter().map(|q| q.id).collect();

        let mut summary = DeletionSummary::default();
        for module in modules {
            self.delete_module_into(module, &mut summary)?;
        }
        for quiz in quizzes {
            self.delete_quiz_into(quiz, &mut summary)?;
        }

        let enrollments: Vec<_> = self
            .tables
            .enrollments
            .values()
            .filter(|e| e.course == id)
            .map(|e| (e.id, e.student))
            .collect();
        for (enrollment, student) in enrollments {
            self.tables.enrollments.shift_remove(&enrollment);
            self.indexes.enrollments.remove(&(id, student));
            summary.enrollments += 1;
        }

        let reviews: Vec<_> = self
            .tables
            .reviews
            .values()
            .filter(|r| r.course == id)
            .map(|r| (r.id, r.student))
            .collect();
        for (review, student) in reviews {
            self.tables.reviews.shift_remove(&review);
            self.indexes.reviews.remove(&(id, student));
            summary.reviews += 1;
        }

        self.tables.courses.shift_remove(&id);
        summary.courses += 1;
        debug!(course = %id, rows = summary.total(), "course deleted with owned rows");
        Ok(summary)
    }

    /// Deletes a module and its lessons, detaching it from its course first.
    pub fn delete_module(&mut self, id: ModuleId) -> Result<DeletionSummary, StoreError> {
        let mut summary = DeletionSummary::default();
        self.delete_module_into(id, &mut summary)?;
        Ok(summary)
    }

    /// Deletes a lesson and its assignments.
    pub fn delete_lesson(&mut self, id: LessonId) -> Result<DeletionSummary, StoreError> {
        let mut summary = DeletionSummary::default();
        self.delete_lesson_into(id, &mut summary)?;
        Ok(summary)
    }

    /// Deletes an assignment and every submission for it.
    pub fn delete_assignment(&mut self, id: AssignmentId) -> Result<DeletionSummary, StoreError> {
        let mut summary = DeletionSummary::default();
        self.delete_assignment_into(id, &mut summary)?;
        Ok(summary)
    }

    /// Deletes a quiz, its questions and options, and every quiz submission.
    pub fn delete_quiz(&mut self, id: QuizId) -> Result<DeletionSummary, StoreError> {
        let mut summary = DeletionSummary::default();
        self.delete_quiz_into(id, &mut summary)?;
        Ok(summary)
    }

    /// Deletes a user and the owned profile.
    ///
    /// Fails with [`StoreError::Integrity`] while any course, enrollment,
    /// submission, quiz submission, or review references the user.
    pub fn delete_user(&mut self, id: UserId) -> Result<DeletionSummary, StoreError> {
        let email = self.user(id)?.email.clone();
        if self.is_user_referenced(id) {
            return Err(StoreError::integrity(format!(
                "user {id} is still referenced by courses or learning records"
            )));
        }

        let mut summary = DeletionSummary::default();
        if self.tables.profiles.shift_remove(&id).is_some() {
            summary.profiles += 1;
        }
        self.tables.users.shift_remove(&id);
        self.indexes.emails.remove(&text_key(&email));
        summary.users += 1;
        Ok(summary)
    }

    // -----------------------------------------------------------------------
    // Accumulating helpers
    // -----------------------------------------------------------------------

    fn delete_module_into(
        &mut self,
        id: ModuleId,
        summary: &mut DeletionSummary,
    ) -> Result<(), StoreError> {
        let attached = self.module(id)?.course;
        if let Some(course) = attached {
            self.remove_module(course, id)?;
        }
        let lessons: Vec<LessonId> = self.lessons_for_module(id).iter().map(|l| l.id).collect();
        for lesson in lessons {
            self.delete_lesson_into(lesson, summary)?;
        }
        self.tables.modules.shift_remove(&id);
        summary.modules += 1;
        Ok(())
    }

    fn delete_lesson_into(
        &mut self,
        id: LessonId,
        summary: &mut DeletionSummary,
    ) -> Result<(), StoreError> {
        self.lesson(id)?;
        let assignments: Vec<AssignmentId> = self
            .assignments_for_lesson(id)
            .iter()
            .map(|a| a.id)
            .collect();
        for assignment in assignments {
            self.delete_assignment_into(assignment, summary)?;
        }
        self.tables.lessons.shift_remove(&id);
        summary.lessons += 1;
        Ok(())
    }

    fn delete_assignment_into(
        &mut self,
        id: AssignmentId,
        summary: &mut DeletionSummary,
    ) -> Result<(), StoreError> {
        self.assignment(id)?;
        let submissions: Vec<_> = self
            .tables
            .submissions
            .values()
            .filter(|s| s.assignment == id)
            .map(|s| (s.id, s.student))
            .collect();
        for (submission, student) in submissions {
            self.tables.submissions.shift_remove(&submission);
            self.indexes.submissions.remove(&(id, student));
            summary.submissions += 1;
        }
        self.tables.assignments.shift_remove(&id);
        summary.assignments += 1;
        Ok(())
    }

    fn delete_quiz_into(
        &mut self,
        id: QuizId,
        summary: &mut DeletionSummary,
    ) -> Result<(), StoreError> {
        self.quiz(id)?;
        let questions: Vec<QuestionId> = self.questions_for_quiz(id).iter().map(|q| q.id).collect();
        for question in questions {
            self.delete_question_into(question, summary)?;
        }
        let attempts: Vec<_> = self
            .tables
            .quiz_submissions
            .values()
            .filter(|s| s.quiz == id)
            .map(|s| (s.id, s.student))
            .collect();
        for (attempt, student) in attempts {
            self.tables.quiz_submissions.shift_remove(&attempt);
            self.indexes.quiz_submissions.remove(&(id, student));
            summary.quiz_submissions += 1;
        }
        self.tables.quizzes.shift_remove(&id);
        summary.quizzes += 1;
        Ok(())
    }

    fn delete_question_into(
        &mut self,
        id: QuestionId,
        summary: &mut DeletionSummary,
    ) -> Result<(), StoreError> {
        self.question(id)?;
        let before = self.tables.answer_options.len();
        self.tables.answer_options.retain(|_, o| o.question != id);
        summary.answer_options += before - self.tables.answer_options.len();
        self.tables.questions.shift_remove(&id);
        summary.questions += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::super::fixtures;
    use super::DeletionSummary;
    use crate::{
        AnswerOption, AnswerOptionId, Assignment, AssignmentId, CourseReview, Enrollment,
        EnrollmentId, EnrollmentStatus, EntityGraph, Lesson, LessonId, Profile, Question,
        QuestionId, QuestionType, Quiz, QuizId, Rating, ReviewId, Role, StoreError, Submission,
        SubmissionId, Timestamp,
    };

    #[test]
    fn deleting_a_course_removes_everything_it_owns() {
        let mut graph = EntityGraph::new();
        let teacher = fixtures::user(&mut graph, "t@example.com", Role::Teacher);
        let student = fixtures::user(&mut graph, "s@example.com", Role::Student);
        let course = fixtures::course(&mut graph, teacher);
        let module = fixtures::module(&mut graph, "m");
        graph.add_module(course, module).expect("attach");
        let lesson = graph
            .insert_lesson(Lesson {
                id: LessonId::new_random(),
                module,
                title: "l".into(),
                content: "c".into(),
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
                max_score: 100,
            })
            .expect("assignment")
            .id;
        graph
            .insert_submission(Submission {
                id: SubmissionId::new_random(),
                assignment,
                student,
                content: "x".into(),
                submitted_at: Timestamp::now(),
                score: None,
                feedback: None,
            })
            .expect("submission");
        let quiz = graph
            .insert_quiz(Quiz {
                id: QuizId::new_random(),
                course,
                title: "q".into(),
            })
            .expect("quiz")
            .id;
        let question = graph
            .insert_question(Question {
                id: QuestionId::new_random(),
                quiz,
                text: "?".into(),
                kind: QuestionType::SingleChoice,
            })
            .expect("question")
            .id;
        for correct in [true, false] {
            graph
                .insert_answer_option(AnswerOption {
                    id: AnswerOptionId::new_random(),
                    question,
                    text: correct.to_string(),
                    is_correct: correct,
                })
                .expect("option");
        }
        graph
            .insert_enrollment(Enrollment {
                id: EnrollmentId::new_random(),
                course,
                student,
                enrolled_at: Timestamp::now(),
                status: EnrollmentStatus::Active,
            })
            .expect("enrollment");
        graph
            .insert_review(CourseReview {
                id: ReviewId::new_random(),
                course,
                student,
                rating: Rating::new(4).expect("valid"),
                comment: None,
                created_at: Timestamp::now(),
            })
            .expect("review");

        let summary = graph.delete_course(course).expect("delete");

        assert_eq!(
            summary,
            DeletionSummary {
                courses: 1,
                modules: 1,
                lessons: 1,
                assignments: 1,
                submissions: 1,
                quizzes: 1,
                questions: 1,
                answer_options: 2,
                enrollments: 1,
                reviews: 1,
                ..DeletionSummary::default()
            }
        );
        assert!(graph.course(course).is_err());
        assert_eq!(graph.lessons().count(), 0);
        assert_eq!(graph.answer_options().count(), 0);
        assert!(graph.enrollment_for(course, student).is_none());
        // Freed natural keys can be reused and the users are untouched.
        assert!(graph.user(student).is_ok());
        assert!(!graph.is_user_referenced(student));
    }

    #[test]
    fn deleting_a_module_detaches_it_from_its_course() {
        let mut graph = EntityGraph::new();
        let teacher = fixtures::user(&mut graph, "t@example.com", Role::Teacher);
        let course = fixtures::course(&mut graph, teacher);
        let keep = fixtures::module(&mut graph, "keep");
        let drop = fixtures::module(&mut graph, "drop");
        graph.add_module(course, keep).expect("attach");
        graph.add_module(course, drop).expect("attach");

        graph.delete_module(drop).expect("delete");

        assert_eq!(graph.course(course).expect("course").modules(), &[keep]);
        assert!(graph.module(drop).is_err());
    }

    #[test]
    fn user_deletion_is_blocked_while_referenced() {
        let mut graph = EntityGraph::new();
        let teacher = fixtures::user(&mut graph, "t@example.com", Role::Teacher);
        fixtures::course(&mut graph, teacher);

        assert!(matches!(
            graph.delete_user(teacher),
            Err(StoreError::Integrity { .. })
        ));
        assert!(graph.user(teacher).is_ok());
    }

    #[test]
    fn user_deletion_removes_profile_and_frees_email() {
        let mut graph = EntityGraph::new();
        let user = fixtures::user(&mut graph, "gone@example.com", Role::Student);
        graph
            .upsert_profile(Profile {
                user,
                bio: Some("hi".into()),
                avatar_url: None,
                phone: None,
                website: None,
                github: None,
                linkedin: None,
                created_at: Timestamp::now(),
                updated_at: Timestamp::now(),
            })
            .expect("profile");

        let summary = graph.delete_user(user).expect("delete");

        assert_eq!(summary.users, 1);
        assert_eq!(summary.profiles, 1);
        assert!(graph.profile(user).is_none());
        assert!(graph.user_by_email("gone@example.com").is_none());
        fixtures::user(&mut graph, "gone@example.com", Role::Student);
    }
}
