//! Shared fixtures for workflow integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use learning::{
    Assignment, Course, ErrorKind, LearningError, Lesson, Module, QuestionType, Role, User,
};
use store::MemoryStore;
use workflows::{
    NewAssignment, NewCourse, NewLesson, NewModule, NewQuestion, NewUser, QuizPolicy, Services,
};

pub struct Fixture {
    pub store: MemoryStore,
    pub services: Services,
    pub teacher: User,
    pub student: User,
    pub course: Course,
}

impl Fixture {
    pub async fn new() -> Self {
        Self::with_policy(QuizPolicy::default()).await
    }

    pub async fn with_policy(policy: QuizPolicy) -> Self {
        let store = MemoryStore::new();
        let services = Services::new(Arc::new(store.clone()), policy);
        let teacher = register(&services, "Grace", "grace@example.com", Role::Teacher).await;
        let student = register(&services, "Ada", "ada@example.com", Role::Student).await;
        let course = services
            .courses
            .create_course(new_course("Compilers", &teacher))
            .await
            .expect("create course");
        Self {
            store,
            services,
            teacher,
            student,
            course,
        }
    }

    pub async fn another_student(&self, name: &str) -> User {
        let email = format!("{}@example.com", name.to_lowercase());
        register(&self.services, name, &email, Role::Student).await
    }

    /// Module → lesson → assignment chain under the fixture course.
    pub async fn assignment(&self, max_score: u32) -> (Module, Lesson, Assignment) {
        let module = self
            .services
            .courses
            .create_module(
                self.course.id,
                NewModule {
                    title: "Parsing".into(),
                },
            )
            .await
            .expect("module");
        let lesson = self
            .services
            .courses
            .add_lesson(
                module.id,
                NewLesson {
                    title: "Recursive descent".into(),
                    content: "Write a parser.".into(),
                },
            )
            .await
            .expect("lesson");
        let assignment = self
            .services
            .courses
            .add_assignment(
                lesson.id,
                NewAssignment {
                    title: "Expression parser".into(),
                    description: String::new(),
                    due_date: None,
                    max_score,
                },
            )
            .await
            .expect("assignment");
        (module, lesson, assignment)
    }

    pub async fn question(
        &self,
        quiz: learning::QuizId,
        text: &str,
        kind: QuestionType,
    ) -> learning::Question {
        self.services
            .courses
            .add_question(
                quiz,
                NewQuestion {
                    text: text.into(),
                    kind,
                },
            )
            .await
            .expect("question")
    }
}

pub async fn register(services: &Services, name: &str, email: &str, role: Role) -> User {
    services
        .users
        .register_user(NewUser {
            name: name.into(),
            email: email.into(),
            role,
        })
        .await
        .expect("register user")
}

pub fn new_course(title: &str, teacher: &User) -> NewCourse {
    NewCourse {
        title: title.into(),
        description: format!("{title} from first principles"),
        duration_hours: Some(30),
        start_date: None,
        category: None,
        teacher: teacher.id,
    }
}

#[track_caller]
pub fn assert_kind<T: std::fmt::Debug>(result: Result<T, LearningError>, kind: ErrorKind) {
    match result {
        Err(e) => assert_eq!(e.kind(), kind, "unexpected error: {e}"),
        Ok(value) => panic!("expected {kind:?}, got Ok({value:?})"),
    }
}
