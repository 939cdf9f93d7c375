use std::sync::Arc;

use learning::{
    score_quiz, LearningError, LearningStore, QuizAnswers, QuizId, QuizSubmission,
    QuizSubmissionId, Timestamp, UserId,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// How repeated quiz attempts are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizPolicy {
    /// When set, a new attempt replaces the student's previous submission
    /// instead of failing with `Conflict`.
    pub allow_retakes: bool,
}

#[derive(Clone)]
pub struct QuizService {
    store: Arc<dyn LearningStore>,
    policy: QuizPolicy,
}

impl QuizService {
    pub fn new(store: Arc<dyn LearningStore>, policy: QuizPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> QuizPolicy {
        self.policy
    }

    /// Scores and records a student's answers to a quiz.
    ///
    /// One point per question, all-or-nothing. The stored submission keeps
    /// the answers alongside the score and the number of questions.
    #[tracing::instrument(level = "debug", skip(self, answers), fields(answered = answers.len()))]
    pub async fn submit_quiz(
        &self,
        student: UserId,
        quiz: QuizId,
        answers: QuizAnswers,
    ) -> Result<QuizSubmission, LearningError> {
        let mut uow = self.store.begin().await?;
        let graph = uow.graph();
        graph.quiz(quiz)?;
        graph.user(student)?;
        let retake = graph.quiz_submission_for(quiz, student).is_some();
        if retake && !self.policy.allow_retakes {
            warn!(%student, %quiz, "quiz resubmission rejected");
            return Err(LearningError::conflict(format!(
                "student {student} already submitted quiz {quiz}"
            )));
        }
        let score = score_quiz(graph, quiz, &answers)?;

        let graph = uow.graph_mut();
        if retake {
            if let Some(previous) = graph.remove_quiz_submission_for(quiz, student) {
                debug!(%student, %quiz, previous_score = previous.score, "replacing earlier attempt");
            }
        }
        let submission = graph
            .insert_quiz_submission(QuizSubmission {
                id: QuizSubmissionId::new_random(),
                quiz,
                student,
                answers,
                score: score.correct,
                max_score: score.total,
                submitted_at: Timestamp::now(),
            })?
            .clone();
        uow.commit().await?;

        info!(%student, %quiz, score = submission.score, max_score = submission.max_score, "quiz submitted");
        Ok(submission)
    }

    /// The student's recorded attempt, or `NotFound` if they have none.
    pub async fn quiz_result(
        &self,
        student: UserId,
        quiz: QuizId,
    ) -> Result<QuizSubmission, LearningError> {
        let view = self.store.read().await?;
        let graph = view.graph();
        graph.quiz(quiz)?;
        graph
            .quiz_submission_for(quiz, student)
            .cloned()
            .ok_or_else(|| LearningError::not_found("quiz submission", format!("{quiz}/{student}")))
    }

    pub async fn list_quiz_submissions(
        &self,
        quiz: QuizId,
    ) -> Result<Vec<QuizSubmission>, LearningError> {
        let view = self.store.read().await?;
        let graph = view.graph();
        graph.quiz(quiz)?;
        Ok(graph
            .quiz_submissions_for_quiz(quiz)
            .into_iter()
            .cloned()
            .collect())
    }
}
