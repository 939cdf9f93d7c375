//! Quiz scoring.
//!
//! Each question is worth one point and is scored all-or-nothing; there is no
//! partial credit.
//!
//! - `SINGLE_CHOICE`: the selection must be exactly the one correct option.
//! - `MULTIPLE_CHOICE`: the selected set must equal the set of correct options.
//! - `TEXT`: the trimmed answer must match the text of a correct option,
//!   ignoring case.
//!
//! Unanswered questions (and empty selections) score zero. Answers that do not
//! fit the quiz (unknown question, foreign option, wrong answer shape, more
//! than one selection on a single-choice question) are rejected as bad
//! requests rather than scored.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{
    Answer, AnswerOptionId, EntityGraph, LearningError, QuestionId, QuestionType, QuizAnswers,
    QuizId,
};

/// Outcome of scoring one set of answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizScore {
    /// Questions answered correctly.
    pub correct: u32,
    /// Questions in the quiz.
    pub total: u32,
    /// Per-question correctness, including unanswered questions.
    pub per_question: BTreeMap<QuestionId, bool>,
}

/// Scores `answers` against the quiz's current questions and options.
pub fn score_quiz(
    graph: &EntityGraph,
    quiz: QuizId,
    answers: &QuizAnswers,
) -> Result<QuizScore, LearningError> {
    graph.quiz(quiz)?;
    let questions = graph.questions_for_quiz(quiz);

    if let Some(unknown) = answers
        .keys()
        .find(|id| !questions.iter().any(|q| q.id == **id))
    {
        return Err(LearningError::bad_request(format!(
            "question {unknown} is not part of quiz {quiz}"
        )));
    }

    let mut per_question = BTreeMap::new();
    for question in &questions {
        let options = graph.options_for_question(question.id);
        let correct = match (question.kind, answers.get(&question.id)) {
            (_, None) => false,
            (QuestionType::Text, Some(Answer::Text(text))) => {
                let given = text.trim().to_lowercase();
                options
                    .iter()
                    .filter(|o| o.is_correct)
                    .any(|o| o.text.trim().to_lowercase() == given)
            }
            (QuestionType::Text, Some(Answer::Choices(_))) => {
                return Err(LearningError::bad_request(format!(
                    "question {} expects a text answer",
                    question.id
                )));
            }
            (_, Some(Answer::Text(_))) => {
                return Err(LearningError::bad_request(format!(
                    "question {} expects selected options",
                    question.id
                )));
            }
            (kind, Some(Answer::Choices(selected))) => {
                if let Some(foreign) = selected
                    .iter()
                    .find(|id| !options.iter().any(|o| o.id == **id))
                {
                    return Err(LearningError::bad_request(format!(
                        "option {foreign} does not belong to question {}",
                        question.id
                    )));
                }
                if kind == QuestionType::SingleChoice && selected.len() > 1 {
                    return Err(LearningError::bad_request(format!(
                        "question {} accepts a single selection",
                        question.id
                    )));
                }
                let expected: BTreeSet<AnswerOptionId> = options
                    .iter()
                    .filter(|o| o.is_correct)
                    .map(|o| o.id)
                    .collect();
                !expected.is_empty() && *selected == expected
            }
        };
        per_question.insert(question.id, correct);
    }

    let correct = per_question.values().filter(|c| **c).count();
    Ok(QuizScore {
        correct: u32::try_from(correct).unwrap_or(u32::MAX),
        total: u32::try_from(questions.len()).unwrap_or(u32::MAX),
        per_question,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::graph::fixtures;
    use crate::{AnswerOption, ErrorKind, Question, Quiz, Role};

    struct Fixture {
        graph: EntityGraph,
        quiz: QuizId,
        single: QuestionId,
        single_right: AnswerOptionId,
        single_wrong: AnswerOptionId,
        multi: QuestionId,
        multi_a: AnswerOptionId,
        multi_b: AnswerOptionId,
        multi_c: AnswerOptionId,
        text: QuestionId,
    }

    fn option(
        graph: &mut EntityGraph,
        question: QuestionId,
        text: &str,
        correct: bool,
    ) -> AnswerOptionId {
        graph
            .insert_answer_option(AnswerOption {
                id: AnswerOptionId::new_random(),
                question,
                text: text.into(),
                is_correct: correct,
            })
            .expect("option")
            .id
    }

    fn question(graph: &mut EntityGraph, quiz: QuizId, kind: QuestionType) -> QuestionId {
        graph
            .insert_question(Question {
                id: QuestionId::new_random(),
                quiz,
                text: "?".into(),
                kind,
            })
            .expect("question")
            .id
    }

    fn fixture() -> Fixture {
        let mut graph = EntityGraph::new();
        let teacher = fixtures::user(&mut graph, "t@example.com", Role::Teacher);
        let course = fixtures::course(&mut graph, teacher);
        let quiz = graph
            .insert_quiz(Quiz {
                id: QuizId::new_random(),
                course,
                title: "Borrowing".into(),
            })
            .expect("quiz")
            .id;

        let single = question(&mut graph, quiz, QuestionType::SingleChoice);
        let single_right = option(&mut graph, single, "&mut T", true);
        let single_wrong = option(&mut graph, single, "Rc<T>", false);

        let multi = question(&mut graph, quiz, QuestionType::MultipleChoice);
        let multi_a = option(&mut graph, multi, "Send", true);
        let multi_b = option(&mut graph, multi, "Sync", true);
        let multi_c = option(&mut graph, multi, "Drop", false);

        let text = question(&mut graph, quiz, QuestionType::Text);
        option(&mut graph, text, "borrow checker", true);

        Fixture {
            graph,
            quiz,
            single,
            single_right,
            single_wrong,
            multi,
            multi_a,
            multi_b,
            multi_c,
            text,
        }
    }

    #[test]
    fn all_correct_answers_score_full_marks() {
        let f = fixture();
        let answers = QuizAnswers::from([
            (f.single, Answer::single(f.single_right)),
            (f.multi, Answer::choices([f.multi_a, f.multi_b])),
            (f.text, Answer::Text("  Borrow Checker ".into())),
        ]);

        let score = score_quiz(&f.graph, f.quiz, &answers).expect("scored");

        assert_eq!((score.correct, score.total), (3, 3));
    }

    #[test]
    fn multiple_choice_has_no_partial_credit() {
        let f = fixture();
        let subset = QuizAnswers::from([(f.multi, Answer::single(f.multi_a))]);
        let everything = Answer::choices([f.multi_a, f.multi_b, f.multi_c]);
        let superset = QuizAnswers::from([(f.multi, everything)]);

        for answers in [subset, superset] {
            let score = score_quiz(&f.graph, f.quiz, &answers).expect("scored");
            assert_eq!(score.correct, 0);
        }
    }

    #[test]
    fn unanswered_questions_score_zero() {
        let f = fixture();
        let answers = QuizAnswers::from([(f.single, Answer::single(f.single_wrong))]);

        let score = score_quiz(&f.graph, f.quiz, &answers).expect("scored");

        assert_eq!(score.correct, 0);
        assert_eq!(score.total, 3);
        assert_eq!(score.per_question.len(), 3);
    }

    #[test]
    fn malformed_answers_are_bad_requests() {
        let f = fixture();
        let both = Answer::choices([f.single_right, f.single_wrong]);
        let cases = [
            (QuestionId::new_random(), Answer::Text("x".into())),
            (f.single, Answer::single(f.multi_a)),
            (f.single, both),
            (f.text, Answer::single(f.single_right)),
            (f.multi, Answer::Text("Send".into())),
        ];
        for case in cases {
            let answers = QuizAnswers::from([case]);
            let err = score_quiz(&f.graph, f.quiz, &answers).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::BadRequest);
        }
    }
}
