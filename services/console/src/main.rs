//! Admin console command line client
//!
//! Drives the admin API with a session persisted in a local storage file.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Result, anyhow, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{Level, debug, info, warn};
use tracing_subscriber::FmtSubscriber;

use api::ApiClient;
use api::models::{
    CourseQuery, CourseTypeQuery, CourseTypeUpdate, FileUpload, LoginCredentials, NewCourseType,
    NewUser, UserQuery,
};
use api::session::SessionContext;
use common::config::ClientConfig;
use common::storage::{FileStore, KeyValueStore};
use console::guard::{NavigationOutcome, Navigator};
use console::routes::RouteTable;
use console::session::SessionStore;
use console::theme::{Theme, ThemeStore};

/// Admin console client
#[derive(Parser)]
#[command(name = "admin-console")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// API base URL (overrides config)
    #[arg(long)]
    api_url: Option<String>,

    /// Session storage file (overrides config)
    #[arg(long)]
    storage: Option<PathBuf>,

    /// Request timeout in milliseconds (overrides config)
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Assume the system prefers a dark theme
    #[arg(long)]
    prefers_dark: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in
    Login {
        /// Email or login name
        login: String,

        /// Password (read from stdin when omitted)
        #[arg(long)]
        password: Option<String>,

        /// Keep the session in memory only
        #[arg(long)]
        no_remember: bool,
    },

    /// Sign out
    Logout,

    /// Show the signed-in user
    Whoami {
        /// Re-fetch the user from the server
        #[arg(long)]
        refresh: bool,
    },

    /// User management
    Users {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Course management
    Courses {
        #[command(subcommand)]
        command: CourseCommands,
    },

    /// Course type management
    CourseTypes {
        #[command(subcommand)]
        command: CourseTypeCommands,
    },

    /// Theme preference
    Theme {
        #[command(subcommand)]
        command: ThemeCommands,
    },

    /// Navigate to a console path through the route guard
    Open {
        /// Path, e.g. "/admin/users/3"
        path: String,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// List users
    List {
        #[arg(long)]
        page: Option<u64>,
        /// Page size
        #[arg(long)]
        show: Option<u64>,
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        role: Option<String>,
        /// "1" for male, "2" for female
        #[arg(long)]
        gender: Option<String>,
        #[arg(long)]
        city: Option<String>,
        /// "active" or "deleted"
        #[arg(long)]
        status: Option<String>,
    },

    /// Show a user
    Show { id: i64 },

    /// Create a user
    Create {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        /// Password (read from stdin when omitted)
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        gender: Option<String>,
        #[arg(long)]
        role: Option<String>,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        address: Option<String>,
        /// Profile image file
        #[arg(long)]
        image: Option<PathBuf>,
    },

    /// Delete a user permanently
    Delete { id: i64 },

    /// Mark a user as deleted
    SoftDelete { id: i64 },

    /// Restore a soft-deleted user
    Restore { id: i64 },

    /// Create users in bulk from a spreadsheet or CSV file
    Import { file: PathBuf },
}

#[derive(Subcommand)]
enum CourseCommands {
    /// List courses
    List {
        #[arg(long)]
        page: Option<u64>,
        #[arg(long)]
        per_page: Option<u64>,
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        type_id: Option<i64>,
    },

    /// Show a course
    Show { id: i64 },

    /// Delete a course
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum CourseTypeCommands {
    /// List course types
    List {
        #[arg(long)]
        page: Option<u64>,
        /// Page size
        #[arg(long)]
        show: Option<u64>,
        #[arg(long)]
        search: Option<String>,
    },

    /// Show a course type
    Show { id: i64 },

    /// Create a course type
    Create {
        name: String,
        /// Icon file
        #[arg(long)]
        icon: Option<PathBuf>,
    },

    /// Update a course type
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        /// Icon file
        #[arg(long)]
        icon: Option<PathBuf>,
    },

    /// Delete a course type
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum ThemeCommands {
    /// Show the current theme
    Show,
    /// Switch between light and dark
    Toggle,
    /// Set the theme
    Set { theme: Theme },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so command output stays parseable
    let subscriber = FmtSubscriber::builder()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let mut config = ClientConfig::load(cli.config.as_deref())?;
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url;
    }
    if let Some(storage) = cli.storage {
        config.storage_path = storage;
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.timeout_ms = timeout_ms;
    }
    debug!("Using API at {}", config.base_url());

    let storage: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(config.storage_path.clone()));
    let context = SessionContext::new(storage.clone());
    let client = ApiClient::new(&config, context.clone())?;
    let sessions = SessionStore::from_client(&client);
    sessions.load_from_storage();

    let result = run(cli.command, &client, &sessions, storage, cli.prefers_dark).await;

    if let Some(path) = context.take_redirect() {
        warn!("Session expired, please log in again ({})", path);
    }

    result
}

async fn run(
    command: Commands,
    client: &ApiClient,
    sessions: &SessionStore,
    storage: Arc<dyn KeyValueStore>,
    prefers_dark: bool,
) -> Result<()> {
    match command {
        Commands::Login {
            login,
            password,
            no_remember,
        } => {
            let password = match password {
                Some(password) => password,
                None => prompt("Password: ")?,
            };
            let credentials = LoginCredentials::new(login, password).remember(!no_remember);
            match sessions.login(&credentials).await.message() {
                None => {
                    let name = sessions
                        .current_user()
                        .map(|user| user.display_name())
                        .unwrap_or_default();
                    info!("Logged in as {}", name);
                }
                Some(message) => bail!("{}", message),
            }
        }
        Commands::Logout => sessions.logout().await,
        Commands::Whoami { refresh } => {
            let user = if refresh {
                sessions.refresh_current_user().await?
            } else {
                sessions.current_user()
            };
            match user {
                Some(user) => print_json(&user)?,
                None => println!("Not logged in"),
            }
        }
        Commands::Users { command } => run_users(command, client).await?,
        Commands::Courses { command } => run_courses(command, client).await?,
        Commands::CourseTypes { command } => run_course_types(command, client).await?,
        Commands::Theme { command } => {
            let mut themes = ThemeStore::init(storage, prefers_dark);
            let theme = match command {
                ThemeCommands::Show => themes.theme(),
                ThemeCommands::Toggle => themes.toggle()?,
                ThemeCommands::Set { theme } => {
                    themes.set(theme)?;
                    theme
                }
            };
            println!("{}", theme);
        }
        Commands::Open { path } => {
            let navigator = Navigator::new(RouteTable::admin_console()?, sessions.context().clone());
            match navigator.navigate(&path) {
                NavigationOutcome::Arrived { route, redirected } => {
                    if redirected {
                        info!("Redirected to {}", route.full_path);
                    }
                    println!("{} ({})", route.route.title, route.full_path);
                }
                NavigationOutcome::NotFound(path) => bail!("No page at {}", path),
            }
        }
    }
    Ok(())
}

async fn run_users(command: UserCommands, client: &ApiClient) -> Result<()> {
    match command {
        UserCommands::List {
            page,
            show,
            search,
            role,
            gender,
            city,
            status,
        } => {
            let query = UserQuery {
                page,
                show,
                search,
                role,
                gender,
                city,
                deleted_at: status,
            };
            print_json(&client.users.list(&query).await?)?;
        }
        UserCommands::Show { id } => print_json(&client.users.get(id).await?)?,
        UserCommands::Create {
            first_name,
            last_name,
            email,
            password,
            phone,
            gender,
            role,
            city,
            address,
            image,
        } => {
            let password = match password {
                Some(password) => password,
                None => prompt("Password: ")?,
            };
            let image = match image {
                Some(path) => Some(FileUpload::from_path(&path).await?),
                None => None,
            };
            let user = NewUser {
                first_name,
                last_name,
                email,
                password_confirmation: password.clone(),
                password,
                phone_num: phone,
                gender,
                role,
                city,
                address,
                image,
                ..NewUser::default()
            };
            print_json(&client.users.create(&user).await?)?;
        }
        UserCommands::Delete { id } => {
            client.users.delete(id).await?;
            info!("User {} deleted", id);
        }
        UserCommands::SoftDelete { id } => {
            client.users.soft_delete(id).await?;
            info!("User {} marked as deleted", id);
        }
        UserCommands::Restore { id } => {
            client.users.restore(id).await?;
            info!("User {} restored", id);
        }
        UserCommands::Import { file } => {
            let file = FileUpload::from_path(&file).await?;
            print_json(&client.users.import(file).await?)?;
        }
    }
    Ok(())
}

async fn run_courses(command: CourseCommands, client: &ApiClient) -> Result<()> {
    match command {
        CourseCommands::List {
            page,
            per_page,
            search,
            type_id,
        } => {
            let query = CourseQuery {
                page,
                per_page,
                search,
                course_type_id: type_id,
            };
            print_json(&client.courses.list(&query).await?)?;
        }
        CourseCommands::Show { id } => print_json(&client.courses.get(id).await?)?,
        CourseCommands::Delete { id } => {
            client.courses.delete(id).await?;
            info!("Course {} deleted", id);
        }
    }
    Ok(())
}

async fn run_course_types(command: CourseTypeCommands, client: &ApiClient) -> Result<()> {
    match command {
        CourseTypeCommands::List { page, show, search } => {
            let query = CourseTypeQuery { page, show, search };
            print_json(&client.course_types.list(&query).await?)?;
        }
        CourseTypeCommands::Show { id } => print_json(&client.course_types.get(id).await?)?,
        CourseTypeCommands::Create { name, icon } => {
            let icon = match icon {
                Some(path) => Some(FileUpload::from_path(&path).await?),
                None => None,
            };
            let created = client
                .course_types
                .create(&NewCourseType { name, icon })
                .await?;
            print_json(&created)?;
        }
        CourseTypeCommands::Update { id, name, icon } => {
            let icon = match icon {
                Some(path) => Some(FileUpload::from_path(&path).await?),
                None => None,
            };
            let updated = client
                .course_types
                .update(id, &CourseTypeUpdate { name, icon })
                .await?;
            print_json(&updated)?;
        }
        CourseTypeCommands::Delete { id } => {
            client.course_types.delete(id).await?;
            info!("Course type {} deleted", id);
        }
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    eprint!("{}", label);
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let value = line.trim_end_matches(['\r', '\n']).to_string();
    if value.is_empty() {
        return Err(anyhow!("No input given"));
    }
    Ok(value)
}
