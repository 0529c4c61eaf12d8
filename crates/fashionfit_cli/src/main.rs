//! FashionFit admin CLI.
//!
//! # Usage
//!
//! ```bash
//! fashionfit migrate
//! fashionfit product add P01 "Linen shirt"
//! fashionfit user register --username mali --password s3cret --email mali@example.com \
//!     --full-name "Mali S." --address Bangkok --date-of-birth 1995-02-14 --phone-number 0812345678
//! fashionfit user update 001 --set Address="99 Silom Rd"
//! fashionfit review submit --product-id P01 --user-id 001 --rating 5 --text "fits well"
//! fashionfit rating summary P01
//! ```
//!
//! Settings come from `FASHIONFIT_*` environment variables; a `.env` file in
//! the working directory is loaded first. Results print as JSON on stdout.

use clap::{Args, Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "fashionfit")]
#[command(version, about = "FashionFit record store tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    Migrate,
    /// Maintain the catalog mirror
    Product {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// Manage user accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Manage reviews
    Review {
        #[command(subcommand)]
        action: ReviewAction,
    },
    /// Read rating summaries
    Rating {
        #[command(subcommand)]
        action: RatingAction,
    },
}

#[derive(Subcommand)]
enum ProductAction {
    /// Add or rename a product reference
    Add { product_id: String, name: String },
    /// List mirrored products
    List,
    /// Remove a product reference and its reviews
    Remove { product_id: String },
}

#[derive(Subcommand)]
enum UserAction {
    /// Register a new user
    Register(RegisterArgs),
    /// Check a username/password pair
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: String,
    },
    /// Show a user profile
    Show { user_id: String },
    /// Update profile fields, e.g. `--set FullName="Mali S."`
    Update {
        user_id: String,
        #[arg(long = "set", value_name = "FIELD=VALUE", required = true)]
        assignments: Vec<String>,
    },
    /// Delete a user and their reviews
    Delete { user_id: String },
}

#[derive(Args)]
struct RegisterArgs {
    #[arg(long)]
    username: Option<String>,
    #[arg(long)]
    password: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    full_name: Option<String>,
    #[arg(long)]
    address: Option<String>,
    #[arg(long)]
    date_of_birth: Option<String>,
    #[arg(long)]
    phone_number: Option<String>,
}

#[derive(Subcommand)]
enum ReviewAction {
    /// Submit a review
    Submit {
        #[arg(long)]
        product_id: Option<String>,
        #[arg(long)]
        user_id: Option<String>,
        #[arg(long, allow_negative_numbers = true)]
        rating: Option<i64>,
        #[arg(long)]
        text: Option<String>,
    },
    /// List reviews of a product or by a user
    List {
        #[arg(long, conflicts_with = "user_id", required_unless_present = "user_id")]
        product_id: Option<String>,
        #[arg(long)]
        user_id: Option<String>,
    },
    /// Delete a review
    Delete { review_id: String },
}

#[derive(Subcommand)]
enum RatingAction {
    /// Show review count and mean rating of a product
    Summary { product_id: String },
}

fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Err(err) = commands::run(cli.command) {
        eprintln!("error[{}]: {err}", err.code());
        std::process::exit(1);
    }
}
