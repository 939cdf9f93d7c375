//! Subcommand handlers. Each returns the JSON value printed on stdout.

use std::sync::Arc;

use anyhow::Context;
use learning::{Answer, LearningError, QuestionType, QuizAnswers, Role};
use serde::Serialize;
use serde_json::{json, Value};
use store::MemoryStore;
use tracing::debug;
use workflows::{
    NewAssignment, NewCourse, NewLesson, NewModule, NewQuestion, NewUser, ProfileFields,
    QuizPolicy, Services,
};

use crate::output::error_body;
use crate::{
    AssignmentCommand, CatalogCommand, Command, CourseCommand, EnrollmentCommand, QuizCommand,
    ReviewCommand, UserCommand,
};

fn to_json<T: Serialize>(value: T) -> anyhow::Result<Value> {
    Ok(serde_json::to_value(value)?)
}

pub async fn dispatch(command: Command, services: &Services) -> anyhow::Result<Value> {
    match command {
        Command::User(cmd) => user(cmd, services).await,
        Command::Catalog(cmd) => catalog(cmd, services).await,
        Command::Course(cmd) => course(cmd, services).await,
        Command::Enroll { student, course } => {
            to_json(services.enrollment.enroll(student, course).await?)
        }
        Command::Enrollment(cmd) => enrollment(cmd, services).await,
        Command::Assignment(cmd) => assignment(cmd, services).await,
        Command::Quiz(cmd) => quiz(cmd, services).await,
        Command::Review(cmd) => review(cmd, services).await,
        Command::Demo => demo(services.quizzes.policy()).await,
        Command::Config => Ok(Value::Null),
    }
}

async fn user(cmd: UserCommand, services: &Services) -> anyhow::Result<Value> {
    let users = &services.users;
    match cmd {
        UserCommand::Register { name, email, role } => to_json(
            users
                .register_user(NewUser {
                    name,
                    email,
                    role: role.into(),
                })
                .await?,
        ),
        UserCommand::Show { user } => {
            let record = users.get_user(user).await?;
            let profile = users.profile(user).await?;
            Ok(json!({ "user": record, "profile": profile }))
        }
        UserCommand::Deactivate { user } => to_json(users.deactivate_user(user).await?),
        UserCommand::Delete { user } => to_json(users.delete_user(user).await?),
        UserCommand::Profile {
            user,
            bio,
            avatar_url,
            phone,
            website,
            github,
            linkedin,
        } => to_json(
            users
                .upsert_profile(
                    user,
                    ProfileFields {
                        bio,
                        avatar_url,
                        phone,
                        website,
                        github,
                        linkedin,
                    },
                )
                .await?,
        ),
    }
}

async fn catalog(cmd: CatalogCommand, services: &Services) -> anyhow::Result<Value> {
    match cmd {
        CatalogCommand::Category { name } => {
            to_json(services.courses.create_category(&name).await?)
        }
        CatalogCommand::Tag { name } => to_json(services.courses.create_tag(&name).await?),
    }
}

async fn course(cmd: CourseCommand, services: &Services) -> anyhow::Result<Value> {
    let courses = &services.courses;
    match cmd {
        CourseCommand::Create {
            title,
            teacher,
            description,
            hours,
            category,
        } => to_json(
            courses
                .create_course(NewCourse {
                    title,
                    description,
                    duration_hours: hours,
                    start_date: None,
                    category,
                    teacher,
                })
                .await?,
        ),
        CourseCommand::List => to_json(courses.list_courses().await?),
        CourseCommand::Show { course } => course_outline(course, services).await,
        CourseCommand::AddModule { course, title } => {
            to_json(courses.create_module(course, NewModule { title }).await?)
        }
        CourseCommand::Attach { course, module } => {
            to_json(courses.add_module(course, module).await?)
        }
        CourseCommand::Detach { course, module } => {
            to_json(courses.remove_module(course, module).await?)
        }
        CourseCommand::AddLesson {
            module,
            title,
            content,
        } => to_json(
            courses
                .add_lesson(module, NewLesson { title, content })
                .await?,
        ),
        CourseCommand::Tag { course, tag } => to_json(courses.tag_course(course, tag).await?),
        CourseCommand::Untag { course, tag } => {
            let removed = courses.untag_course(course, tag).await?;
            Ok(json!({ "removed": removed }))
        }
        CourseCommand::ByTeacher { teacher } => to_json(courses.courses_by_teacher(teacher).await?),
        CourseCommand::ByTag { tag } => to_json(courses.courses_by_tag(tag).await?),
        CourseCommand::Delete { course } => to_json(courses.delete_course(course).await?),
        CourseCommand::DeleteModule { module } => to_json(courses.delete_module(module).await?),
        CourseCommand::DeleteLesson { lesson } => to_json(courses.delete_lesson(lesson).await?),
    }
}

async fn course_outline(course: learning::CourseId, services: &Services) -> anyhow::Result<Value> {
    let outline = services.courses.course_outline(course).await?;
    let average_rating = services.reviews.average_rating(course).await?;
    let mut body = serde_json::to_value(outline)?;
    body["average_rating"] = json!(average_rating);
    Ok(body)
}

async fn enrollment(cmd: EnrollmentCommand, services: &Services) -> anyhow::Result<Value> {
    let svc = &services.enrollment;
    match cmd {
        EnrollmentCommand::Status {
            student,
            course,
            status,
        } => to_json(
            svc.set_enrollment_status(student, course, status.into())
                .await?,
        ),
        EnrollmentCommand::Courses { student } => {
            to_json(svc.list_enrolled_courses(student).await?)
        }
        EnrollmentCommand::Roster { course } => to_json(svc.list_students(course).await?),
    }
}

async fn assignment(cmd: AssignmentCommand, services: &Services) -> anyhow::Result<Value> {
    let submissions = &services.submissions;
    match cmd {
        AssignmentCommand::Add {
            lesson,
            title,
            max_score,
            description,
        } => to_json(
            services
                .courses
                .add_assignment(
                    lesson,
                    NewAssignment {
                        title,
                        description,
                        due_date: None,
                        max_score,
                    },
                )
                .await?,
        ),
        AssignmentCommand::Submit {
            student,
            assignment,
            content,
        } => to_json(submissions.submit(student, assignment, content).await?),
        AssignmentCommand::Grade {
            submission,
            score,
            feedback,
        } => to_json(submissions.grade(submission, score, feedback).await?),
        AssignmentCommand::Submissions { assignment } => {
            to_json(submissions.list_by_assignment(assignment).await?)
        }
        AssignmentCommand::ByStudent { student } => {
            to_json(submissions.list_by_student(student).await?)
        }
        AssignmentCommand::Delete { assignment } => {
            to_json(services.courses.delete_assignment(assignment).await?)
        }
    }
}

async fn quiz(cmd: QuizCommand, services: &Services) -> anyhow::Result<Value> {
    let courses = &services.courses;
    let quizzes = &services.quizzes;
    match cmd {
        QuizCommand::Create { course, title } => {
            to_json(courses.create_quiz(course, &title).await?)
        }
        QuizCommand::AddQuestion { quiz, text, kind } => to_json(
            courses
                .add_question(
                    quiz,
                    NewQuestion {
                        text,
                        kind: kind.into(),
                    },
                )
                .await?,
        ),
        QuizCommand::AddOption {
            question,
            text,
            correct,
        } => to_json(courses.add_answer_option(question, &text, correct).await?),
        QuizCommand::Show { quiz } => {
            let outline: Vec<Value> = courses
                .quiz_outline(quiz)
                .await?
                .into_iter()
                .map(|(question, options)| json!({ "question": question, "options": options }))
                .collect();
            Ok(Value::Array(outline))
        }
        QuizCommand::Take {
            student,
            quiz,
            answers,
        } => {
            let answers: QuizAnswers = serde_json::from_str(&answers).map_err(|e| {
                LearningError::bad_request(format!("answers are not valid JSON: {e}"))
            })?;
            to_json(quizzes.submit_quiz(student, quiz, answers).await?)
        }
        QuizCommand::Attempt { student, quiz } => {
            to_json(quizzes.quiz_result(student, quiz).await?)
        }
        QuizCommand::Submissions { quiz } => to_json(quizzes.list_quiz_submissions(quiz).await?),
        QuizCommand::Delete { quiz } => to_json(courses.delete_quiz(quiz).await?),
    }
}

async fn review(cmd: ReviewCommand, services: &Services) -> anyhow::Result<Value> {
    let reviews = &services.reviews;
    match cmd {
        ReviewCommand::Post {
            student,
            course,
            rating,
            comment,
        } => to_json(reviews.post_review(student, course, rating, comment).await?),
        ReviewCommand::List { course } => {
            let listed = reviews.list_reviews(course).await?;
            let average = reviews.average_rating(course).await?;
            Ok(json!({ "average_rating": average, "reviews": listed }))
        }
    }
}

// ---------------------------------------------------------------------------
// Demo
// ---------------------------------------------------------------------------

/// Records each demo step with either its result or the boundary error body.
#[derive(Default)]
struct Transcript {
    steps: Vec<Value>,
}

impl Transcript {
    fn record<T: Serialize>(&mut self, step: &str, outcome: &Result<T, LearningError>) {
        let entry = match outcome {
            Ok(value) => json!({ "step": step, "ok": value }),
            Err(err) => json!({ "step": step, "error": error_body(err) }),
        };
        debug!(step, ok = outcome.is_ok(), "demo step");
        self.steps.push(entry);
    }
}

/// Runs the enrollment, submission, quiz, and review workflows on a fresh
/// in-memory catalog, including the rejected requests.
async fn demo(policy: QuizPolicy) -> anyhow::Result<Value> {
    let services = Services::new(Arc::new(MemoryStore::new()), policy);
    let mut log = Transcript::default();

    let teacher = services
        .users
        .register_user(NewUser {
            name: "Grace Hopper".into(),
            email: "grace@example.com".into(),
            role: Role::Teacher,
        })
        .await
        .context("registering demo teacher")?;
    let student = services
        .users
        .register_user(NewUser {
            name: "Ada Lovelace".into(),
            email: "ada@example.com".into(),
            role: Role::Student,
        })
        .await
        .context("registering demo student")?;

    let course = services
        .courses
        .create_course(NewCourse {
            title: "Compilers".into(),
            description: "From lexing to code generation".into(),
            duration_hours: Some(40),
            start_date: None,
            category: None,
            teacher: teacher.id,
        })
        .await
        .context("creating demo course")?;
    let module = services
        .courses
        .create_module(
            course.id,
            NewModule {
                title: "Parsing".into(),
            },
        )
        .await?;
    let lesson = services
        .courses
        .add_lesson(
            module.id,
            NewLesson {
                title: "Recursive descent".into(),
                content: "Grammar rules become functions.".into(),
            },
        )
        .await?;
    let assignment = services
        .courses
        .add_assignment(
            lesson.id,
            NewAssignment {
                title: "Expression parser".into(),
                description: "Parse arithmetic with precedence.".into(),
                due_date: None,
                max_score: 100,
            },
        )
        .await?;

    let quiz = services
        .courses
        .create_quiz(course.id, "Parsing basics")
        .await?;
    let question = services
        .courses
        .add_question(
            quiz.id,
            NewQuestion {
                text: "Which parser handles left recursion directly?".into(),
                kind: QuestionType::SingleChoice,
            },
        )
        .await?;
    let right = services
        .courses
        .add_answer_option(question.id, "LR", true)
        .await?;
    services
        .courses
        .add_answer_option(question.id, "LL(1)", false)
        .await?;

    let review = services
        .reviews
        .post_review(student.id, course.id, 5, Some("Loved it".into()))
        .await;
    log.record("review before enrolling", &review);
    let enrolled = services.enrollment.enroll(student.id, course.id).await;
    log.record("enroll", &enrolled);
    log.record(
        "enroll again",
        &services.enrollment.enroll(student.id, course.id).await,
    );
    log.record(
        "enrolled courses",
        &services.enrollment.list_enrolled_courses(student.id).await,
    );

    let submission = services
        .submissions
        .submit(student.id, assignment.id, "fn expr() { term(); }")
        .await;
    log.record("submit", &submission);
    log.record(
        "submit again",
        &services
            .submissions
            .submit(student.id, assignment.id, "second try")
            .await,
    );
    if let Ok(submission) = &submission {
        log.record(
            "grade 85",
            &services
                .submissions
                .grade(submission.id, 85, Some("Good".into()))
                .await,
        );
        log.record(
            "grade -1",
            &services.submissions.grade(submission.id, -1, None).await,
        );
    }

    let answers = QuizAnswers::from([(question.id, Answer::single(right.id))]);
    log.record(
        "take quiz",
        &services
            .quizzes
            .submit_quiz(student.id, quiz.id, answers.clone())
            .await,
    );
    log.record(
        "retake quiz",
        &services
            .quizzes
            .submit_quiz(student.id, quiz.id, answers)
            .await,
    );

    log.record(
        "review with rating 7",
        &services
            .reviews
            .post_review(student.id, course.id, 7, None)
            .await,
    );
    log.record(
        "review",
        &services
            .reviews
            .post_review(student.id, course.id, 5, Some("Loved it".into()))
            .await,
    );
    log.record(
        "review again",
        &services
            .reviews
            .post_review(student.id, course.id, 4, None)
            .await,
    );
    log.record(
        "delete teacher",
        &services.users.delete_user(teacher.id).await,
    );
    log.record(
        "delete course",
        &services.courses.delete_course(course.id).await,
    );

    Ok(Value::Array(log.steps))
}
