//! Course reviews.

mod common;

use common::{assert_kind, Fixture};
use learning::{EnrollmentStatus, ErrorKind};
use pretty_assertions::assert_eq;

#[tokio::test]
async fn review_requires_enrollment_and_is_unique() {
    let fx = Fixture::new().await;
    let reviews = &fx.services.reviews;

    assert_kind(
        reviews
            .post_review(fx.student.id, fx.course.id, 5, None)
            .await,
        ErrorKind::Forbidden,
    );

    fx.services
        .enrollment
        .enroll(fx.student.id, fx.course.id)
        .await
        .expect("enroll");
    let review = reviews
        .post_review(fx.student.id, fx.course.id, 5, Some("Great".into()))
        .await
        .expect("review");
    assert_eq!(review.rating.as_u8(), 5);
    assert_eq!(review.comment.as_deref(), Some("Great"));

    assert_kind(
        reviews
            .post_review(fx.student.id, fx.course.id, 4, None)
            .await,
        ErrorKind::Conflict,
    );
}

#[tokio::test]
async fn out_of_range_ratings_are_bad_requests() {
    let fx = Fixture::new().await;
    fx.services
        .enrollment
        .enroll(fx.student.id, fx.course.id)
        .await
        .expect("enroll");

    for rating in [-3, 0, 6, 100] {
        assert_kind(
            fx.services
                .reviews
                .post_review(fx.student.id, fx.course.id, rating, None)
                .await,
            ErrorKind::BadRequest,
        );
    }
    assert_eq!(fx.store.snapshot().await.reviews().count(), 0);
}

#[tokio::test]
async fn unenrolled_students_fail_whatever_the_rating() {
    let fx = Fixture::new().await;
    for rating in [0, 1, 3, 5, 9] {
        let result = fx
            .services
            .reviews
            .post_review(fx.student.id, fx.course.id, rating, None)
            .await;
        assert!(result.is_err(), "rating {rating} should fail");
    }
}

#[tokio::test]
async fn dropped_students_cannot_review() {
    let fx = Fixture::new().await;
    let enrollment = &fx.services.enrollment;
    enrollment
        .enroll(fx.student.id, fx.course.id)
        .await
        .expect("enroll");
    enrollment
        .set_enrollment_status(fx.student.id, fx.course.id, EnrollmentStatus::Dropped)
        .await
        .expect("drop");

    assert_kind(
        fx.services
            .reviews
            .post_review(fx.student.id, fx.course.id, 3, None)
            .await,
        ErrorKind::Forbidden,
    );
}

#[tokio::test]
async fn average_rating_over_all_reviews() {
    let fx = Fixture::new().await;
    let reviews = &fx.services.reviews;
    assert_eq!(
        reviews.average_rating(fx.course.id).await.expect("empty"),
        None
    );

    let bob = fx.another_student("Bob").await;
    for (student, rating) in [(fx.student.id, 5), (bob.id, 2)] {
        fx.services
            .enrollment
            .enroll(student, fx.course.id)
            .await
            .expect("enroll");
        reviews
            .post_review(student, fx.course.id, rating, None)
            .await
            .expect("review");
    }

    assert_eq!(
        reviews.average_rating(fx.course.id).await.expect("avg"),
        Some(3.5)
    );
    let listed = reviews.list_reviews(fx.course.id).await.expect("list");
    assert_eq!(listed.len(), 2);
    assert!(listed[0].created_at >= listed[1].created_at);
}
