//! Mints a bearer token signed with the configured JWT secret.
//!
//! Run with: cargo run --bin issue-token -- --role manager --name "Store Manager"

use clap::{Parser, ValueEnum};
use uuid::Uuid;

use grocery_api::auth::{AuthConfig, AuthService, Role};
use grocery_api::config::load_config;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum RoleArg {
    Regular,
    Manager,
}

impl From<RoleArg> for Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Regular => Role::Regular,
            RoleArg::Manager => Role::Manager,
        }
    }
}

#[derive(Parser)]
#[command(name = "issue-token", about = "Issue a grocery-api access token", version)]
struct Cli {
    #[arg(long, value_parser = clap::value_parser!(Uuid), help = "User identifier (UUID); random when omitted")]
    user_id: Option<Uuid>,
    #[arg(long, value_enum, default_value_t = RoleArg::Regular, help = "Role carried by the token")]
    role: RoleArg,
    #[arg(long, help = "Optional display name")]
    name: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = load_config()?;
    let auth = AuthService::new(AuthConfig::from(&cfg));

    let user_id = cli.user_id.unwrap_or_else(Uuid::new_v4);
    let token = auth.issue_token(user_id, cli.name, cli.role.into())?;

    eprintln!("user_id: {}", user_id);
    println!("{}", token);
    Ok(())
}
