//! Lectern CLI entry point.
//!
//! This binary is the composition root:
//!
//! 1. **Load configuration** from `lectern.toml` (or `--config`).
//! 2. **Install logging** with `tracing-subscriber`, pretty or JSON.
//! 3. **Open the store** selected by `store.backend` and wire every workflow
//!    service to it.
//! 4. **Dispatch** one subcommand and print its result as JSON on stdout.
//!
//! Domain failures are printed to stderr as a JSON body carrying the boundary
//! status code (404, 400, 403, 409, 500) and exit with status 1.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use learning::{
    AssignmentId, CategoryId, CourseId, EnrollmentStatus, ErrorKind, LearningError,
    LearningStore, LessonId, ModuleId, QuestionId, QuestionType, QuizId, Role, SubmissionId,
    TagId, UserId,
};
use store::{JsonFileStore, MemoryStore};
use tracing::{error, info};
use workflows::{QuizPolicy, Services};

mod commands;
mod config;
mod logging;
mod output;

use config::{Backend, Config};

#[derive(Parser)]
#[command(name = "lectern")]
#[command(about = "Course catalog, enrollment, grading and review workflows")]
#[command(after_help = "\
QUICK START:
  lectern demo                               # Walk through every workflow on a fresh catalog
  lectern user register --name Ada --email ada@example.com --role student
  lectern course create --title Compilers --teacher <USER_ID>
  lectern enroll <STUDENT_ID> <COURSE_ID>")]
struct Cli {
    /// Path to the configuration file (default: ./lectern.toml if present)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Users and profiles
    #[command(subcommand)]
    User(UserCommand),
    /// Categories and tags
    #[command(subcommand)]
    Catalog(CatalogCommand),
    /// Course authoring, composition and queries
    #[command(subcommand)]
    Course(CourseCommand),
    /// Enroll a student in a course
    Enroll { student: UserId, course: CourseId },
    /// Enrollment status changes and listings
    #[command(subcommand)]
    Enrollment(EnrollmentCommand),
    /// Assignments, submissions and grading
    #[command(subcommand)]
    Assignment(AssignmentCommand),
    /// Quiz authoring and attempts
    #[command(subcommand)]
    Quiz(QuizCommand),
    /// Course reviews
    #[command(subcommand)]
    Review(ReviewCommand),
    /// Seed a sample catalog and run every workflow against it
    Demo,
    /// Print the effective configuration
    Config,
}

#[derive(Subcommand)]
pub enum UserCommand {
    /// Register a new user
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, value_enum)]
        role: RoleArg,
    },
    /// Show a user and their profile
    Show { user: UserId },
    /// Deactivate a user
    Deactivate { user: UserId },
    /// Delete an unreferenced user and their profile
    Delete { user: UserId },
    /// Create or replace a user's profile
    Profile {
        user: UserId,
        #[arg(long)]
        bio: Option<String>,
        #[arg(long)]
        avatar_url: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        website: Option<String>,
        #[arg(long)]
        github: Option<String>,
        #[arg(long)]
        linkedin: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum CatalogCommand {
    /// Create a category
    Category { name: String },
    /// Create a tag
    Tag { name: String },
}

#[derive(Subcommand)]
pub enum CourseCommand {
    /// Create a course
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        teacher: UserId,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        hours: Option<u32>,
        #[arg(long)]
        category: Option<CategoryId>,
    },
    /// List all courses
    List,
    /// Show a course with its modules, lessons and quizzes
    Show { course: CourseId },
    /// Create a module and append it to the course
    AddModule {
        course: CourseId,
        #[arg(long)]
        title: String,
    },
    /// Attach an existing detached module
    Attach { course: CourseId, module: ModuleId },
    /// Detach a module from the course
    Detach { course: CourseId, module: ModuleId },
    /// Add a lesson to a module
    AddLesson {
        module: ModuleId,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        content: String,
    },
    /// Link a tag
    Tag { course: CourseId, tag: TagId },
    /// Unlink a tag
    Untag { course: CourseId, tag: TagId },
    /// Courses taught by a teacher
    ByTeacher { teacher: UserId },
    /// Courses carrying a tag
    ByTag { tag: TagId },
    /// Delete a course and everything it owns
    Delete { course: CourseId },
    /// Delete a module and everything it owns
    DeleteModule { module: ModuleId },
    /// Delete a lesson and everything it owns
    DeleteLesson { lesson: LessonId },
}

#[derive(Subcommand)]
pub enum EnrollmentCommand {
    /// Change an enrollment's status
    Status {
        student: UserId,
        course: CourseId,
        #[arg(value_enum)]
        status: StatusArg,
    },
    /// Courses a student is actively enrolled in
    Courses { student: UserId },
    /// Students enrolled in a course
    Roster { course: CourseId },
}

#[derive(Subcommand)]
pub enum AssignmentCommand {
    /// Add an assignment to a lesson
    Add {
        lesson: LessonId,
        #[arg(long)]
        title: String,
        #[arg(long)]
        max_score: u32,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Submit work for an assignment
    Submit {
        student: UserId,
        assignment: AssignmentId,
        content: String,
    },
    /// Grade a submission
    Grade {
        submission: SubmissionId,
        #[arg(allow_negative_numbers = true)]
        score: i64,
        #[arg(long)]
        feedback: Option<String>,
    },
    /// Submissions for an assignment
    Submissions { assignment: AssignmentId },
    /// A student's submissions
    ByStudent { student: UserId },
    /// Delete an assignment and its submissions
    Delete { assignment: AssignmentId },
}

#[derive(Subcommand)]
pub enum QuizCommand {
    /// Create a quiz in a course
    Create { course: CourseId, title: String },
    /// Add a question to a quiz
    AddQuestion {
        quiz: QuizId,
        #[arg(long)]
        text: String,
        #[arg(long, value_enum)]
        kind: QuestionKindArg,
    },
    /// Add an answer option to a question
    AddOption {
        question: QuestionId,
        #[arg(long)]
        text: String,
        #[arg(long)]
        correct: bool,
    },
    /// Show a quiz's questions and options
    Show { quiz: QuizId },
    /// Submit answers, given as JSON: {"<question>": {"choices": ["<option>"]} | {"text": "..."}}
    Take {
        student: UserId,
        quiz: QuizId,
        #[arg(long)]
        answers: String,
    },
    /// A student's recorded attempt
    Attempt { student: UserId, quiz: QuizId },
    /// Every attempt at a quiz
    Submissions { quiz: QuizId },
    /// Delete a quiz with its questions and attempts
    Delete { quiz: QuizId },
}

#[derive(Subcommand)]
pub enum ReviewCommand {
    /// Post a review
    Post {
        student: UserId,
        course: CourseId,
        #[arg(allow_negative_numbers = true)]
        rating: i64,
        #[arg(long)]
        comment: Option<String>,
    },
    /// Reviews of a course with the average rating
    List { course: CourseId },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum RoleArg {
    Student,
    Teacher,
    Admin,
}

impl From<RoleArg> for Role {
    fn from(arg: RoleArg) -> Self {
        match arg {
            RoleArg::Student => Role::Student,
            RoleArg::Teacher => Role::Teacher,
            RoleArg::Admin => Role::Admin,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum StatusArg {
    Active,
    Completed,
    Dropped,
}

impl From<StatusArg> for EnrollmentStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Active => EnrollmentStatus::Active,
            StatusArg::Completed => EnrollmentStatus::Completed,
            StatusArg::Dropped => EnrollmentStatus::Dropped,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum QuestionKindArg {
    SingleChoice,
    MultipleChoice,
    Text,
}

impl From<QuestionKindArg> for QuestionType {
    fn from(arg: QuestionKindArg) -> Self {
        match arg {
            QuestionKindArg::SingleChoice => QuestionType::SingleChoice,
            QuestionKindArg::MultipleChoice => QuestionType::MultipleChoice,
            QuestionKindArg::Text => QuestionType::Text,
        }
    }
}

async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn LearningStore>> {
    Ok(match config.store.backend {
        Backend::Memory => Arc::new(MemoryStore::new()),
        Backend::Json => Arc::new(
            JsonFileStore::open(&config.store.path)
                .await
                .map_err(LearningError::from)
                .with_context(|| format!("opening {}", config.store.path.display()))?,
        ),
    })
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    logging::init(&config.logging)?;

    if let Command::Config = cli.command {
        return output::print(&config);
    }

    let store = open_store(&config).await?;
    info!(backend = ?config.store.backend, "store opened");
    let services = Services::new(
        store,
        QuizPolicy {
            allow_retakes: config.policy.allow_quiz_retakes,
        },
    );

    let result = commands::dispatch(cli.command, &services).await?;
    output::print(&result)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<LearningError>() {
                Some(domain) => {
                    if domain.kind() == ErrorKind::Internal {
                        error!(error = %domain, "unclassified failure");
                    }
                    eprintln!("{:#}", output::error_body(domain));
                }
                None => eprintln!("error: {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}
