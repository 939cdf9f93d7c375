use std::sync::Arc;

use learning::{
    AssignmentId, LearningError, LearningStore, Submission, SubmissionId, Timestamp, UserId,
};
use tracing::{info, warn};

#[derive(Clone)]
pub struct SubmissionService {
    store: Arc<dyn LearningStore>,
}

impl SubmissionService {
    pub fn new(store: Arc<dyn LearningStore>) -> Self {
        Self { store }
    }

    /// Records a student's single submission for an assignment. The score is
    /// left unset until [`Self::grade`].
    #[tracing::instrument(level = "debug", skip(self, content))]
    pub async fn submit(
        &self,
        student: UserId,
        assignment: AssignmentId,
        content: impl Into<String> + Send,
    ) -> Result<Submission, LearningError> {
        let content = content.into();
        let mut uow = self.store.begin().await?;
        let graph = uow.graph();
        graph.assignment(assignment)?;
        graph.user(student)?;
        if content.trim().is_empty() {
            return Err(LearningError::invalid_field("content", "must not be blank"));
        }
        if graph.submission_for(assignment, student).is_some() {
            warn!(%student, %assignment, "duplicate submission rejected");
            return Err(LearningError::conflict(format!(
                "student {student} already submitted assignment {assignment}"
            )));
        }

        let submission = uow
            .graph_mut()
            .insert_submission(Submission {
                id: SubmissionId::new_random(),
                assignment,
                student,
                content,
                submitted_at: Timestamp::now(),
                score: None,
                feedback: None,
            })?
            .clone();
        uow.commit().await?;

        info!(%student, %assignment, submission = %submission.id, "assignment submitted");
        Ok(submission)
    }

    pub async fn has_submitted(
        &self,
        student: UserId,
        assignment: AssignmentId,
    ) -> Result<bool, LearningError> {
        let view = self.store.read().await?;
        Ok(view.graph().submission_for(assignment, student).is_some())
    }

    /// Sets score and feedback, replacing any earlier grade.
    ///
    /// `score` must lie within `0..=max_score` of the assignment; anything
    /// else is a `BadRequest` and leaves the submission untouched.
    #[tracing::instrument(level = "debug", skip(self, feedback))]
    pub async fn grade(
        &self,
        submission: SubmissionId,
        score: i64,
        feedback: Option<String>,
    ) -> Result<Submission, LearningError> {
        let mut uow = self.store.begin().await?;
        let graph = uow.graph();
        let assignment = graph.submission(submission)?.assignment;
        let max_score = graph.assignment(assignment)?.max_score;
        let score = u32::try_from(score)
            .ok()
            .filter(|s| *s <= max_score)
            .ok_or_else(|| {
                LearningError::bad_request(format!(
                    "score {score} is outside 0..={max_score}"
                ))
            })?;

        let graded = uow
            .graph_mut()
            .record_grade(submission, score, feedback)?
            .clone();
        uow.commit().await?;

        info!(%submission, score, max_score, "submission graded");
        Ok(graded)
    }

    /// Submissions for an assignment, oldest first.
    pub async fn list_by_assignment(
        &self,
        assignment: AssignmentId,
    ) -> Result<Vec<Submission>, LearningError> {
        let view = self.store.read().await?;
        let graph = view.graph();
        graph.assignment(assignment)?;
        Ok(graph
            .submissions_for_assignment(assignment)
            .into_iter()
            .cloned()
            .collect())
    }

    /// A student's submissions across all assignments, oldest first.
    pub async fn list_by_student(&self, student: UserId) -> Result<Vec<Submission>, LearningError> {
        let view = self.store.read().await?;
        let graph = view.graph();
        graph.user(student)?;
        Ok(graph
            .submissions_for_student(student)
            .into_iter()
            .cloned()
            .collect())
    }
}
