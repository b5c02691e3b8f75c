use crate::config::Config;
use crate::db::Store;
use crate::services::{AuthService, SeaOrmAuthService};

pub async fn cmd_token_issue(config: &Config, username: &str) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let auth = SeaOrmAuthService::new(store);

    let token = auth.issue_token(username).await?;

    println!("✓ Token issued for '{}'", username.trim());
    println!("{token}");
    println!();
    println!("Send it as: Authorization: Bearer <token>");

    Ok(())
}
