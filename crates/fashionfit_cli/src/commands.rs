//! Command execution against the core stores.

use crate::{Commands, ProductAction, RatingAction, RegisterArgs, ReviewAction, UserAction};
use fashionfit_core::{
    init_logging_from_config, open_db_with_timeout, Argon2Hasher, CivilClock, Clock,
    ConfigError, CoreConfig, DbError, RepoError, ReviewSubmission, SqliteCatalogService,
    SqliteRatingAggregator, SqliteReviewStore, SqliteUserStore, StoreError, UserRegistration,
    UserUpdate,
};
use log::info;
use rusqlite::Connection;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

#[derive(Debug)]
pub enum CliError {
    Config(ConfigError),
    Logging(String),
    Db(DbError),
    Repo(RepoError),
    Store(StoreError),
    Usage(String),
    Output(serde_json::Error),
}

impl CliError {
    /// Short code printed next to the message.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Logging(_) => "logging",
            Self::Db(_) | Self::Repo(_) => "storage",
            Self::Store(err) => err.kind(),
            Self::Usage(_) => "usage",
            Self::Output(_) => "output",
        }
    }
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Logging(message) => write!(f, "{message}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::Usage(message) => write!(f, "{message}"),
            Self::Output(err) => write!(f, "cannot render output: {err}"),
        }
    }
}

impl Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<DbError> for CliError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<RepoError> for CliError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<StoreError> for CliError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Output(value)
    }
}

type CliResult<T> = Result<T, CliError>;

pub fn run(command: Commands) -> CliResult<()> {
    let config = CoreConfig::from_env()?;
    init_logging_from_config(&config).map_err(|err| CliError::Logging(err.to_string()))?;
    let conn = open_db_with_timeout(&config.db_path, config.storage_timeout)?;
    let clock: Arc<dyn Clock> = Arc::new(CivilClock);

    match command {
        Commands::Migrate => {
            info!(
                "event=cli_migrate module=cli status=ok db_path={}",
                config.db_path.display()
            );
            print_json(&json!({
                "dbPath": config.db_path.display().to_string(),
                "coreVersion": fashionfit_core::core_version(),
            }))
        }
        Commands::Product { action } => run_product(&conn, clock, action),
        Commands::User { action } => run_user(&conn, clock, action),
        Commands::Review { action } => run_review(&conn, clock, action),
        Commands::Rating {
            action: RatingAction::Summary { product_id },
        } => {
            let aggregator = SqliteRatingAggregator::open(&conn)?;
            print_json(&aggregator.summarize(&product_id)?)
        }
    }
}

fn run_product(conn: &Connection, clock: Arc<dyn Clock>, action: ProductAction) -> CliResult<()> {
    let catalog = SqliteCatalogService::open(conn, clock)?;
    match action {
        ProductAction::Add { product_id, name } => {
            print_json(&catalog.add_product(&product_id, &name)?)
        }
        ProductAction::List => print_json(&catalog.list_products()?),
        ProductAction::Remove { product_id } => {
            catalog.remove_product(&product_id)?;
            print_json(&json!({ "deleted": product_id }))
        }
    }
}

fn run_user(conn: &Connection, clock: Arc<dyn Clock>, action: UserAction) -> CliResult<()> {
    let users = SqliteUserStore::open(conn, Arc::new(Argon2Hasher::new()), clock)?;
    match action {
        UserAction::Register(args) => print_json(&users.register(&registration(args))?),
        UserAction::Login { username, password } => {
            let user_id = users.authenticate(&username, &password)?;
            print_json(&json!({ "UserId": user_id }))
        }
        UserAction::Show { user_id } => print_json(&users.get_profile(&user_id)?),
        UserAction::Update {
            user_id,
            assignments,
        } => {
            let update = parse_assignments(&assignments)?;
            print_json(&users.update(&user_id, &update)?)
        }
        UserAction::Delete { user_id } => {
            users.delete(&user_id)?;
            print_json(&json!({ "deleted": user_id }))
        }
    }
}

fn run_review(conn: &Connection, clock: Arc<dyn Clock>, action: ReviewAction) -> CliResult<()> {
    let reviews = SqliteReviewStore::open(conn, clock)?;
    match action {
        ReviewAction::Submit {
            product_id,
            user_id,
            rating,
            text,
        } => print_json(&reviews.submit(&ReviewSubmission {
            product_id,
            user_id,
            rating,
            review_text: text,
        })?),
        ReviewAction::List {
            product_id: Some(product_id),
            ..
        } => print_json(&reviews.list_by_product(&product_id)?),
        ReviewAction::List {
            user_id: Some(user_id),
            ..
        } => print_json(&reviews.list_by_user(&user_id)?),
        ReviewAction::List { .. } => Err(CliError::Usage(
            "review list needs --product-id or --user-id".to_string(),
        )),
        ReviewAction::Delete { review_id } => {
            reviews.delete(&review_id)?;
            print_json(&json!({ "deleted": review_id }))
        }
    }
}

fn registration(args: RegisterArgs) -> UserRegistration {
    UserRegistration {
        username: args.username,
        password: args.password,
        email: args.email,
        full_name: args.full_name,
        address: args.address,
        date_of_birth: args.date_of_birth,
        phone_number: args.phone_number,
    }
}

/// Turns `Field=value` pairs into an update body.
fn parse_assignments(assignments: &[String]) -> CliResult<UserUpdate> {
    let mut body = Map::new();
    for assignment in assignments {
        let Some((field, value)) = assignment.split_once('=') else {
            return Err(CliError::Usage(format!(
                "expected FIELD=VALUE, got `{assignment}`"
            )));
        };
        body.insert(field.trim().to_string(), Value::String(value.to_string()));
    }
    Ok(UserUpdate::from(body))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
