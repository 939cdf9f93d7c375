use std::sync::Arc;

use learning::{
    CourseId, CourseReview, EnrollmentStatus, LearningError, LearningStore, Rating, ReviewId,
    Timestamp, UserId,
};
use tracing::{info, warn};

#[derive(Clone)]
pub struct ReviewService {
    store: Arc<dyn LearningStore>,
}

impl ReviewService {
    pub fn new(store: Arc<dyn LearningStore>) -> Self {
        Self { store }
    }

    /// Posts a student's single review of a course.
    ///
    /// Checks run in this order: both ids exist (`NotFound`), the rating is
    /// within 1..=5 (`BadRequest`), the student holds a non-dropped enrollment
    /// (`Forbidden`), no earlier review exists (`Conflict`).
    #[tracing::instrument(level = "debug", skip(self, comment))]
    pub async fn post_review(
        &self,
        student: UserId,
        course: CourseId,
        rating: i64,
        comment: Option<String>,
    ) -> Result<CourseReview, LearningError> {
        let mut uow = self.store.begin().await?;
        let graph = uow.graph();
        graph.user(student)?;
        graph.course(course)?;
        let rating = Rating::new(rating).ok_or_else(|| {
            LearningError::bad_request(format!(
                "rating {rating} is outside {}..={}",
                Rating::MIN,
                Rating::MAX
            ))
        })?;
        let enrolled = graph
            .enrollment_for(course, student)
            .is_some_and(|e| e.status != EnrollmentStatus::Dropped);
        if !enrolled {
            warn!(%student, %course, "review from non-enrolled student rejected");
            return Err(LearningError::forbidden(format!(
                "student {student} is not enrolled in course {course}"
            )));
        }
        if graph.review_for(course, student).is_some() {
            return Err(LearningError::conflict(format!(
                "student {student} already reviewed course {course}"
            )));
        }

        let review = uow
            .graph_mut()
            .insert_review(CourseReview {
                id: ReviewId::new_random(),
                course,
                student,
                rating,
                comment: comment.filter(|c| !c.trim().is_empty()),
                created_at: Timestamp::now(),
            })?
            .clone();
        uow.commit().await?;

        info!(%student, %course, rating = rating.as_u8(), "course reviewed");
        Ok(review)
    }

    /// Reviews of a course, newest first.
    pub async fn list_reviews(&self, course: CourseId) -> Result<Vec<CourseReview>, LearningError> {
        let view = self.store.read().await?;
        let graph = view.graph();
        graph.course(course)?;
        Ok(graph
            .reviews_for_course(course)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Mean rating of a course, or `None` when it has no reviews.
    pub async fn average_rating(&self, course: CourseId) -> Result<Option<f64>, LearningError> {
        let view = self.store.read().await?;
        let graph = view.graph();
        graph.course(course)?;
        let ratings: Vec<f64> = graph
            .reviews_for_course(course)
            .into_iter()
            .map(|r| f64::from(r.rating.as_u8()))
            .collect();
        if ratings.is_empty() {
            return Ok(None);
        }
        Ok(Some(ratings.iter().sum::<f64>() / ratings.len() as f64))
    }
}
