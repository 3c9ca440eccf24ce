use clap::{Parser, Subcommand};
use lexis::Config;
use lexis::error::AppResult;
use lexis::model::entity::{Level, LevelCreate, UserEntity, UserEntityCreateUpdate, Video, VideoCreate};
use lexis::model::{CrudRepository, DbConnection, ModelManager, ResourceType};
use lexis::progress::{ProgressEngine, ProgressError};
use lexis::web::{AuthenticatedUser, UserRole};

#[derive(Parser, Debug)]
#[command(about = "CLI tool for seeding the courses DB", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserCommands,
    },

    /// Manage levels
    Level {
        #[command(subcommand)]
        action: LevelCommands,
    },

    /// Manage videos
    Video {
        #[command(subcommand)]
        action: VideoCommands,
    },
}

/// User management
#[derive(Subcommand, Debug)]
pub enum UserCommands {
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "client", value_parser = ["admin", "client"])]
        role: String,
    },
    /// Grants the admin role to an existing user
    Promote {
        #[arg(long)]
        email: String,
    },
}

/// Level management
#[derive(Subcommand, Debug)]
pub enum LevelCommands {
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        level_number: i32,
        #[arg(long)]
        price: f64,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        initial_question: Option<String>,
        #[arg(long)]
        final_question: Option<String>,
    },
    /// Enrolls a user in a level, same as an admin assignment
    Assign {
        #[arg(long)]
        email: String,
        #[arg(long)]
        level_number: i32,
    },
}

/// Video management
#[derive(Subcommand, Debug)]
pub enum VideoCommands {
    Add {
        /// Level number to attach the video to
        #[arg(long)]
        level_number: i32,
        #[arg(long)]
        link: String,
        /// Repeat for several quiz questions
        #[arg(long = "question")]
        questions: Vec<String>,
        /// Defaults to the end of the level
        #[arg(long)]
        order_index: Option<i32>,
    },
}

async fn find_level(mm: &ModelManager, actor: &AuthenticatedUser, number: i32) -> AppResult<Level> {
    let level = Level::find_by_number(mm, actor, number)
        .await?
        .ok_or(ProgressError::NotFound(ResourceType::Level))?;
    Ok(level)
}

async fn find_user(mm: &ModelManager, actor: &AuthenticatedUser, email: &str) -> AppResult<UserEntity> {
    let user = UserEntity::find_by_email(mm, actor, email)
        .await?
        .ok_or(ProgressError::NotFound(ResourceType::User))?;
    Ok(user)
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let _ = dotenvy::dotenv();
    let args = Cli::parse();

    let db_con = match std::env::var("DATABASE_URL") {
        Ok(url) => DbConnection::connect(&url)?,
        Err(_) => {
            let config = Config::get_or_init(cfg!(debug_assertions)).await;
            DbConnection::connect(config.app().database_uri())?
        }
    };
    db_con.migrate().await?;

    let mm = ModelManager::new(db_con);
    let actor = AuthenticatedUser::system();

    match args.command {
        Commands::User { action } => match action {
            UserCommands::Add { name, email, password, role } => {
                let user = UserEntity::create(
                    &mm,
                    &actor,
                    UserEntityCreateUpdate {
                        name,
                        email,
                        password_hash: lexis::auth::hash_password(&password)?,
                        role: UserRole::from(role.as_str()),
                        picture: String::new(),
                    },
                )
                .await?;
                println!("User created: {:?}", user);
            }

            UserCommands::Promote { email } => {
                let user = find_user(&mm, &actor, &email).await?;
                let data = UserEntityCreateUpdate {
                    name: user.name().to_string(),
                    email: user.email().to_string(),
                    password_hash: String::new(), // not changed by update
                    role: UserRole::Admin,
                    picture: user.picture().to_string(),
                };
                let user = user.update(&mm, &actor, data).await?;
                println!("User promoted: {:?}", user);
            }
        },

        Commands::Level { action } => match action {
            LevelCommands::Add {
                name,
                level_number,
                price,
                description,
                initial_question,
                final_question,
            } => {
                let level = Level::create(
                    &mm,
                    &actor,
                    LevelCreate {
                        name,
                        description,
                        level_number,
                        price,
                        initial_exam_question: initial_question,
                        final_exam_question: final_question,
                    },
                )
                .await?;
                println!("Level created: {:?}", level);
            }

            LevelCommands::Assign { email, level_number } => {
                let user = find_user(&mm, &actor, &email).await?;
                let level = find_level(&mm, &actor, level_number).await?;

                let engine = ProgressEngine::new(mm.clone(), Default::default());
                let enrollment = engine.enroll(user.id(), level.id()).await?;
                println!("Level assigned: {:?}", enrollment);
            }
        },

        Commands::Video { action } => match action {
            VideoCommands::Add { level_number, link, questions, order_index } => {
                let level = find_level(&mm, &actor, level_number).await?;

                let video = Video::create(
                    &mm,
                    &actor,
                    VideoCreate {
                        level_id: level.id(),
                        link,
                        questions,
                        order_index,
                    },
                )
                .await?;
                println!("Video created: {:?}", video);
            }
        },
    }

    Ok(())
}
