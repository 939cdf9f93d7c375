use std::sync::Arc;

use learning::{
    Course, CourseId, Enrollment, EnrollmentId, EnrollmentStatus, LearningError, LearningStore,
    Role, Timestamp, User, UserId,
};
use tracing::{info, warn};

use crate::require_role;

#[derive(Clone)]
pub struct EnrollmentService {
    store: Arc<dyn LearningStore>,
}

impl EnrollmentService {
    pub fn new(store: Arc<dyn LearningStore>) -> Self {
        Self { store }
    }

    /// Enrolls an active student in a course with status `ACTIVE`.
    ///
    /// Fails with `NotFound` for an unknown student or course, `Forbidden`
    /// when the user is not an active student, and `Conflict` when any
    /// enrollment (including a dropped one) already exists for the pair.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn enroll(
        &self,
        student: UserId,
        course: CourseId,
    ) -> Result<Enrollment, LearningError> {
        let mut uow = self.store.begin().await?;
        let graph = uow.graph();
        let user = graph.user(student)?;
        graph.course(course)?;
        require_role(user, Role::Student)?;
        if graph.enrollment_for(course, student).is_some() {
            warn!(%student, %course, "duplicate enrollment rejected");
            return Err(LearningError::conflict(format!(
                "student {student} is already enrolled in course {course}"
            )));
        }

        let enrollment = uow
            .graph_mut()
            .insert_enrollment(Enrollment {
                id: EnrollmentId::new_random(),
                course,
                student,
                enrolled_at: Timestamp::now(),
                status: EnrollmentStatus::Active,
            })?
            .clone();
        uow.commit().await?;

        info!(%student, %course, enrollment = %enrollment.id, "student enrolled");
        Ok(enrollment)
    }

    /// True when the student holds an `ACTIVE` or `COMPLETED` enrollment in
    /// the course.
    pub async fn is_enrolled(
        &self,
        student: UserId,
        course: CourseId,
    ) -> Result<bool, LearningError> {
        let view = self.store.read().await?;
        Ok(view
            .graph()
            .enrollment_for(course, student)
            .is_some_and(|e| e.status != EnrollmentStatus::Dropped))
    }

    /// Courses the student is actively enrolled in, oldest enrollment first.
    pub async fn list_enrolled_courses(
        &self,
        student: UserId,
    ) -> Result<Vec<Course>, LearningError> {
        let view = self.store.read().await?;
        let graph = view.graph();
        graph.user(student)?;
        graph
            .enrollments_for_student(student)
            .into_iter()
            .filter(|e| e.status == EnrollmentStatus::Active)
            .map(|e| graph.course(e.course).cloned().map_err(LearningError::from))
            .collect()
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn set_enrollment_status(
        &self,
        student: UserId,
        course: CourseId,
        status: EnrollmentStatus,
    ) -> Result<Enrollment, LearningError> {
        let mut uow = self.store.begin().await?;
        let id = uow
            .graph()
            .enrollment_for(course, student)
            .map(|e| e.id)
            .ok_or_else(|| LearningError::not_found("enrollment", format!("{course}/{student}")))?;
        let enrollment = uow.graph_mut().set_enrollment_status(id, status)?.clone();
        uow.commit().await?;

        info!(%student, %course, ?status, "enrollment status changed");
        Ok(enrollment)
    }

    /// Students holding any non-dropped enrollment in the course, by
    /// enrollment time.
    pub async fn list_students(&self, course: CourseId) -> Result<Vec<User>, LearningError> {
        let view = self.store.read().await?;
        let graph = view.graph();
        graph.course(course)?;
        graph
            .enrollments_for_course(course)
            .into_iter()
            .filter(|e| e.status != EnrollmentStatus::Dropped)
            .map(|e| graph.user(e.student).cloned().map_err(LearningError::from))
            .collect()
    }
}
