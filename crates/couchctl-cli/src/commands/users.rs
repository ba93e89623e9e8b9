use tracing::info;

use crate::cli::{CreateUserArgs, EnvArgs};
use crate::client::{CliDependencies, CliResult, Outcome};

pub(crate) async fn handle_create_user(
    deps: &CliDependencies,
    args: CreateUserArgs,
) -> CliResult<Outcome> {
    let ctx = deps.context_for(&args.environment)?;
    let ack = ctx
        .client
        .create_user(&args.username, &args.password, vec![args.role])
        .await?;
    info!(user = %args.username, "server user created");
    Ok(Outcome::Json(ack))
}

pub(crate) async fn handle_list_server_users(
    deps: &CliDependencies,
    args: EnvArgs,
) -> CliResult<Outcome> {
    let ctx = deps.context_for(&args.environment)?;
    let users = ctx.client.list_server_users().await?;
    Outcome::json(users)
}
