//! Quiz submission, scoring, and retake policy.

mod common;

use common::{assert_kind, Fixture};
use learning::{Answer, AnswerOption, ErrorKind, Question, QuestionType, QuizAnswers, QuizId};
use pretty_assertions::assert_eq;
use workflows::QuizPolicy;

struct Sample {
    quiz: QuizId,
    single: Question,
    single_right: AnswerOption,
    single_wrong: AnswerOption,
    multi: Question,
    multi_right: Vec<AnswerOption>,
    text: Question,
}

async fn sample_quiz(fx: &Fixture) -> Sample {
    let courses = &fx.services.courses;
    let quiz = courses
        .create_quiz(fx.course.id, "Lexing")
        .await
        .expect("quiz");

    let single = fx
        .question(quiz.id, "Which is a token?", QuestionType::SingleChoice)
        .await;
    let single_right = courses
        .add_answer_option(single.id, "identifier", true)
        .await
        .expect("option");
    let single_wrong = courses
        .add_answer_option(single.id, "whitespace", false)
        .await
        .expect("option");

    let multi = fx
        .question(quiz.id, "Which are keywords?", QuestionType::MultipleChoice)
        .await;
    let mut multi_right = Vec::new();
    for text in ["fn", "let"] {
        multi_right.push(
            courses
                .add_answer_option(multi.id, text, true)
                .await
                .expect("option"),
        );
    }
    courses
        .add_answer_option(multi.id, "foo", false)
        .await
        .expect("option");

    let text = fx
        .question(
            quiz.id,
            "Name the DFA minimisation algorithm",
            QuestionType::Text,
        )
        .await;
    courses
        .add_answer_option(text.id, "Hopcroft", true)
        .await
        .expect("option");

    Sample {
        quiz: quiz.id,
        single,
        single_right,
        single_wrong,
        multi,
        multi_right,
        text,
    }
}

fn perfect(s: &Sample) -> QuizAnswers {
    QuizAnswers::from([
        (s.single.id, Answer::single(s.single_right.id)),
        (s.multi.id, Answer::choices(s.multi_right.iter().map(|o| o.id))),
        (s.text.id, Answer::Text("  hopcroft ".into())),
    ])
}

#[tokio::test]
async fn perfect_answers_score_every_question() {
    let fx = Fixture::new().await;
    let s = sample_quiz(&fx).await;

    let submission = fx
        .services
        .quizzes
        .submit_quiz(fx.student.id, s.quiz, perfect(&s))
        .await
        .expect("submit");

    assert_eq!((submission.score, submission.max_score), (3, 3));
    assert_eq!(submission.answers, perfect(&s));
}

#[tokio::test]
async fn partial_multiple_choice_earns_nothing() {
    let fx = Fixture::new().await;
    let s = sample_quiz(&fx).await;
    let answers = QuizAnswers::from([
        (s.single.id, Answer::single(s.single_wrong.id)),
        (s.multi.id, Answer::single(s.multi_right[0].id)),
    ]);

    let submission = fx
        .services
        .quizzes
        .submit_quiz(fx.student.id, s.quiz, answers)
        .await
        .expect("submit");

    assert_eq!((submission.score, submission.max_score), (0, 3));
}

#[tokio::test]
async fn resubmission_is_a_conflict_by_default() {
    let fx = Fixture::new().await;
    let s = sample_quiz(&fx).await;
    let quizzes = &fx.services.quizzes;
    quizzes
        .submit_quiz(fx.student.id, s.quiz, QuizAnswers::new())
        .await
        .expect("first");

    assert_kind(
        quizzes
            .submit_quiz(fx.student.id, s.quiz, perfect(&s))
            .await,
        ErrorKind::Conflict,
    );
    let result = quizzes
        .quiz_result(fx.student.id, s.quiz)
        .await
        .expect("result");
    assert_eq!(result.score, 0);
}

#[tokio::test]
async fn retakes_replace_the_previous_attempt_when_allowed() {
    let fx = Fixture::with_policy(QuizPolicy {
        allow_retakes: true,
    })
    .await;
    let s = sample_quiz(&fx).await;
    let quizzes = &fx.services.quizzes;
    quizzes
        .submit_quiz(fx.student.id, s.quiz, QuizAnswers::new())
        .await
        .expect("first");

    let retake = quizzes
        .submit_quiz(fx.student.id, s.quiz, perfect(&s))
        .await
        .expect("retake");

    assert_eq!(retake.score, 3);
    let all = quizzes.list_quiz_submissions(s.quiz).await.expect("list");
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, retake.id);
}

#[tokio::test]
async fn foreign_options_are_bad_requests() {
    let fx = Fixture::new().await;
    let s = sample_quiz(&fx).await;
    let answers = QuizAnswers::from([(s.single.id, Answer::single(s.multi_right[0].id))]);

    assert_kind(
        fx.services
            .quizzes
            .submit_quiz(fx.student.id, s.quiz, answers)
            .await,
        ErrorKind::BadRequest,
    );
    assert_eq!(fx.store.snapshot().await.quiz_submissions().count(), 0);
}

#[tokio::test]
async fn questions_from_another_quiz_are_bad_requests() {
    let fx = Fixture::new().await;
    let s = sample_quiz(&fx).await;
    let other = fx
        .services
        .courses
        .create_quiz(fx.course.id, "Parsing")
        .await
        .expect("quiz");
    let answers = QuizAnswers::from([(s.text.id, Answer::Text("Hopcroft".into()))]);

    assert_kind(
        fx.services
            .quizzes
            .submit_quiz(fx.student.id, other.id, answers)
            .await,
        ErrorKind::BadRequest,
    );
}

#[tokio::test]
async fn missing_quiz_or_result_is_not_found() {
    let fx = Fixture::new().await;
    let s = sample_quiz(&fx).await;
    let quizzes = &fx.services.quizzes;

    assert_kind(
        quizzes
            .submit_quiz(fx.student.id, QuizId::new_random(), QuizAnswers::new())
            .await,
        ErrorKind::NotFound,
    );
    assert_kind(
        quizzes.quiz_result(fx.student.id, s.quiz).await,
        ErrorKind::NotFound,
    );
}

#[tokio::test]
async fn single_choice_questions_accept_one_correct_option() {
    let fx = Fixture::new().await;
    let s = sample_quiz(&fx).await;

    assert_kind(
        fx.services
            .courses
            .add_answer_option(s.single.id, "keyword", true)
            .await,
        ErrorKind::Conflict,
    );
}
