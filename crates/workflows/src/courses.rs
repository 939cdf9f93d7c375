use std::sync::Arc;

use learning::{
    AnswerOption, AnswerOptionId, Assignment, AssignmentId, Category, CategoryId, Course, CourseId,
    DeletionSummary, LearningError, LearningStore, Lesson, LessonId, Module, ModuleId, Question,
    QuestionId, Quiz, QuizId, Role, Tag, TagId, UserId,
};
use serde::Serialize;
use tracing::info;

use crate::commands::{validate_name, NewAssignment, NewCourse, NewLesson, NewModule, NewQuestion};
use crate::require_role;

/// A course with its modules, lessons and assignments in course order, plus
/// its quizzes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseOutline {
    pub course: Course,
    pub modules: Vec<ModuleOutline>,
    pub quizzes: Vec<Quiz>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleOutline {
    pub module: Module,
    pub lessons: Vec<LessonOutline>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LessonOutline {
    pub lesson: Lesson,
    pub assignments: Vec<Assignment>,
}

/// Catalog authoring, course ↔ module composition, structure queries, and
/// cascading deletes.
#[derive(Clone)]
pub struct CourseService {
    store: Arc<dyn LearningStore>,
}

impl CourseService {
    pub fn new(store: Arc<dyn LearningStore>) -> Self {
        Self { store }
    }

    // -----------------------------------------------------------------------
    // Catalog
    // -----------------------------------------------------------------------

    /// Creates a category. Names are unique ignoring case.
    pub async fn create_category(&self, name: &str) -> Result<Category, LearningError> {
        validate_name("name", name)?;
        let mut uow = self.store.begin().await?;
        let category = uow
            .graph_mut()
            .insert_category(Category {
                id: CategoryId::new_random(),
                name: name.trim().to_owned(),
            })?
            .clone();
        uow.commit().await?;
        info!(category = %category.id, name = %category.name, "category created");
        Ok(category)
    }

    /// Creates a tag. Names are unique ignoring case.
    pub async fn create_tag(&self, name: &str) -> Result<Tag, LearningError> {
        validate_name("name", name)?;
        let mut uow = self.store.begin().await?;
        let tag = uow
            .graph_mut()
            .insert_tag(Tag {
                id: TagId::new_random(),
                name: name.trim().to_owned(),
            })?
            .clone();
        uow.commit().await?;
        info!(tag = %tag.id, name = %tag.name, "tag created");
        Ok(tag)
    }

    /// Creates a course taught by an active teacher.
    #[tracing::instrument(level = "debug", skip(self, input), fields(teacher = %input.teacher))]
    pub async fn create_course(&self, input: NewCourse) -> Result<Course, LearningError> {
        input.validate()?;
        let mut uow = self.store.begin().await?;
        require_role(uow.graph().user(input.teacher)?, Role::Teacher)?;

        let mut course = Course::new(input.title.trim(), input.description, input.teacher);
        course.duration_hours = input.duration_hours;
        course.start_date = input.start_date;
        course.category = input.category;
        let course = uow.graph_mut().insert_course(course)?.clone();
        uow.commit().await?;

        info!(course = %course.id, title = %course.title, "course created");
        Ok(course)
    }

    pub async fn get_course(&self, course: CourseId) -> Result<Course, LearningError> {
        let view = self.store.read().await?;
        Ok(view.graph().course(course)?.clone())
    }

    /// All courses, oldest first.
    pub async fn list_courses(&self) -> Result<Vec<Course>, LearningError> {
        let view = self.store.read().await?;
        let mut courses: Vec<Course> = view.graph().courses().cloned().collect();
        courses.sort_by_key(|c| (c.created_at, c.id));
        Ok(courses)
    }

    // -----------------------------------------------------------------------
    // Composition
    // -----------------------------------------------------------------------

    /// Creates a module and appends it to the course in one unit of work.
    #[tracing::instrument(level = "debug", skip(self, input))]
    pub async fn create_module(
        &self,
        course: CourseId,
        input: NewModule,
    ) -> Result<Module, LearningError> {
        input.validate()?;
        let mut uow = self.store.begin().await?;
        let graph = uow.graph_mut();
        let id = graph.insert_module(Module::new(input.title.trim()))?.id;
        graph.add_module(course, id)?;
        let module = graph.module(id)?.clone();
        uow.commit().await?;

        info!(%course, module = %id, "module created");
        Ok(module)
    }

    /// Attaches a detached module to the end of the course's sequence.
    /// A module attached to any course already is a `Conflict`.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn add_module(
        &self,
        course: CourseId,
        module: ModuleId,
    ) -> Result<Course, LearningError> {
        let mut uow = self.store.begin().await?;
        uow.graph_mut().add_module(course, module)?;
        let updated = uow.graph().course(course)?.clone();
        uow.commit().await?;
        info!(%course, %module, "module attached");
        Ok(updated)
    }

    /// Detaches a module from its course; the module and its lessons remain.
    /// A module not attached to this course is a `Conflict`.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn remove_module(
        &self,
        course: CourseId,
        module: ModuleId,
    ) -> Result<Course, LearningError> {
        let mut uow = self.store.begin().await?;
        uow.graph_mut().remove_module(course, module)?;
        let updated = uow.graph().course(course)?.clone();
        uow.commit().await?;
        info!(%course, %module, "module detached");
        Ok(updated)
    }

    /// Creates a module outside any course, to be attached later.
    pub async fn create_detached_module(&self, input: NewModule) -> Result<Module, LearningError> {
        input.validate()?;
        let mut uow = self.store.begin().await?;
        let module = uow
            .graph_mut()
            .insert_module(Module::new(input.title.trim()))?
            .clone();
        uow.commit().await?;
        Ok(module)
    }

    pub async fn add_lesson(
        &self,
        module: ModuleId,
        input: NewLesson,
    ) -> Result<Lesson, LearningError> {
        input.validate()?;
        let mut uow = self.store.begin().await?;
        let lesson = uow
            .graph_mut()
            .insert_lesson(Lesson {
                id: LessonId::new_random(),
                module,
                title: input.title.trim().to_owned(),
                content: input.content,
            })?
            .clone();
        uow.commit().await?;
        info!(%module, lesson = %lesson.id, "lesson added");
        Ok(lesson)
    }

    pub async fn add_assignment(
        &self,
        lesson: LessonId,
        input: NewAssignment,
    ) -> Result<Assignment, LearningError> {
        input.validate()?;
        let mut uow = self.store.begin().await?;
        let assignment = uow
            .graph_mut()
            .insert_assignment(Assignment {
                id: AssignmentId::new_random(),
                lesson,
                title: input.title.trim().to_owned(),
                description: input.description,
                due_date: input.due_date,
                max_score: input.max_score,
            })?
            .clone();
        uow.commit().await?;
        info!(%lesson, assignment = %assignment.id, max_score = assignment.max_score, "assignment added");
        Ok(assignment)
    }

    pub async fn create_quiz(&self, course: CourseId, title: &str) -> Result<Quiz, LearningError> {
        validate_name("title", title)?;
        let mut uow = self.store.begin().await?;
        let quiz = uow
            .graph_mut()
            .insert_quiz(Quiz {
                id: QuizId::new_random(),
                course,
                title: title.trim().to_owned(),
            })?
            .clone();
        uow.commit().await?;
        info!(%course, quiz = %quiz.id, "quiz created");
        Ok(quiz)
    }

    pub async fn add_question(
        &self,
        quiz: QuizId,
        input: NewQuestion,
    ) -> Result<Question, LearningError> {
        input.validate()?;
        let mut uow = self.store.begin().await?;
        let question = uow
            .graph_mut()
            .insert_question(Question {
                id: QuestionId::new_random(),
                quiz,
                text: input.text.trim().to_owned(),
                kind: input.kind,
            })?
            .clone();
        uow.commit().await?;
        Ok(question)
    }

    /// Adds an answer option. A second correct option on a single-choice
    /// question is a `Conflict`.
    pub async fn add_answer_option(
        &self,
        question: QuestionId,
        text: &str,
        is_correct: bool,
    ) -> Result<AnswerOption, LearningError> {
        validate_name("text", text)?;
        let mut uow = self.store.begin().await?;
        let option = uow
            .graph_mut()
            .insert_answer_option(AnswerOption {
                id: AnswerOptionId::new_random(),
                question,
                text: text.trim().to_owned(),
                is_correct,
            })?
            .clone();
        uow.commit().await?;
        Ok(option)
    }

    /// Links a tag to a course. Tagging twice is a no-op.
    pub async fn tag_course(&self, course: CourseId, tag: TagId) -> Result<Course, LearningError> {
        let mut uow = self.store.begin().await?;
        uow.graph_mut().tag_course(course, tag)?;
        let updated = uow.graph().course(course)?.clone();
        uow.commit().await?;
        Ok(updated)
    }

    /// Unlinks a tag; returns whether the link existed.
    pub async fn untag_course(&self, course: CourseId, tag: TagId) -> Result<bool, LearningError> {
        let mut uow = self.store.begin().await?;
        let removed = uow.graph_mut().untag_course(course, tag)?;
        uow.commit().await?;
        Ok(removed)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Modules of a course in course order.
    pub async fn modules_for_course(&self, course: CourseId) -> Result<Vec<Module>, LearningError> {
        let view = self.store.read().await?;
        Ok(view
            .graph()
            .modules_for_course(course)?
            .into_iter()
            .cloned()
            .collect())
    }

    pub async fn lessons_for_module(&self, module: ModuleId) -> Result<Vec<Lesson>, LearningError> {
        let view = self.store.read().await?;
        let graph = view.graph();
        graph.module(module)?;
        Ok(graph
            .lessons_for_module(module)
            .into_iter()
            .cloned()
            .collect())
    }

    pub async fn assignments_for_lesson(
        &self,
        lesson: LessonId,
    ) -> Result<Vec<Assignment>, LearningError> {
        let view = self.store.read().await?;
        let graph = view.graph();
        graph.lesson(lesson)?;
        Ok(graph
            .assignments_for_lesson(lesson)
            .into_iter()
            .cloned()
            .collect())
    }

    pub async fn quizzes_for_course(&self, course: CourseId) -> Result<Vec<Quiz>, LearningError> {
        let view = self.store.read().await?;
        let graph = view.graph();
        graph.course(course)?;
        Ok(graph
            .quizzes_for_course(course)
            .into_iter()
            .cloned()
            .collect())
    }

    /// The whole structure of a course, read from one view of the graph.
    pub async fn course_outline(&self, course: CourseId) -> Result<CourseOutline, LearningError> {
        let view = self.store.read().await?;
        let graph = view.graph();
        let modules: Vec<ModuleOutline> = graph
            .modules_for_course(course)?
            .into_iter()
            .map(|module| ModuleOutline {
                module: module.clone(),
                lessons: graph
                    .lessons_for_module(module.id)
                    .into_iter()
                    .map(|lesson| LessonOutline {
                        lesson: lesson.clone(),
                        assignments: graph
                            .assignments_for_lesson(lesson.id)
                            .into_iter()
                            .cloned()
                            .collect(),
                    })
                    .collect(),
            })
            .collect();
        Ok(CourseOutline {
            course: graph.course(course)?.clone(),
            modules,
            quizzes: graph
                .quizzes_for_course(course)
                .into_iter()
                .cloned()
                .collect(),
        })
    }

    /// A quiz's questions with their options, in creation order.
    pub async fn quiz_outline(
        &self,
        quiz: QuizId,
    ) -> Result<Vec<(Question, Vec<AnswerOption>)>, LearningError> {
        let view = self.store.read().await?;
        let graph = view.graph();
        graph.quiz(quiz)?;
        Ok(graph
            .questions_for_quiz(quiz)
            .into_iter()
            .map(|q| {
                let options: Vec<AnswerOption> = graph
                    .options_for_question(q.id)
                    .into_iter()
                    .cloned()
                    .collect();
                (q.clone(), options)
            })
            .collect())
    }

    pub async fn courses_by_teacher(&self, teacher: UserId) -> Result<Vec<Course>, LearningError> {
        let view = self.store.read().await?;
        let graph = view.graph();
        graph.user(teacher)?;
        Ok(graph
            .courses_by_teacher(teacher)
            .into_iter()
            .cloned()
            .collect())
    }

    pub async fn courses_by_tag(&self, tag: TagId) -> Result<Vec<Course>, LearningError> {
        let view = self.store.read().await?;
        let graph = view.graph();
        graph.tag(tag)?;
        Ok(graph.courses_by_tag(tag).into_iter().cloned().collect())
    }

    // -----------------------------------------------------------------------
    // Cascading deletes
    // -----------------------------------------------------------------------

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn delete_course(&self, course: CourseId) -> Result<DeletionSummary, LearningError> {
        let mut uow = self.store.begin().await?;
        let summary = uow.graph_mut().delete_course(course)?;
        uow.commit().await?;
        info!(%course, rows = summary.total(), "course deleted");
        Ok(summary)
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn delete_module(&self, module: ModuleId) -> Result<DeletionSummary, LearningError> {
        let mut uow = self.store.begin().await?;
        let summary = uow.graph_mut().delete_module(module)?;
        uow.commit().await?;
        info!(%module, rows = summary.total(), "module deleted");
        Ok(summary)
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn delete_lesson(&self, lesson: LessonId) -> Result<DeletionSummary, LearningError> {
        let mut uow = self.store.begin().await?;
        let summary = uow.graph_mut().delete_lesson(lesson)?;
        uow.commit().await?;
        info!(%lesson, rows = summary.total(), "lesson deleted");
        Ok(summary)
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn delete_assignment(
        &self,
        assignment: AssignmentId,
    ) -> Result<DeletionSummary, LearningError> {
        let mut uow = self.store.begin().await?;
        let summary = uow.graph_mut().delete_assignment(assignment)?;
        uow.commit().await?;
        info!(%assignment, rows = summary.total(), "assignment deleted");
        Ok(summary)
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn delete_quiz(&self, quiz: QuizId) -> Result<DeletionSummary, LearningError> {
        let mut uow = self.store.begin().await?;
        let summary = uow.graph_mut().delete_quiz(quiz)?;
        uow.commit().await?;
        info!(%quiz, rows = summary.total(), "quiz deleted");
        Ok(summary)
    }
}
