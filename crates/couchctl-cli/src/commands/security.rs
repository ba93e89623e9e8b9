use tracing::info;

use crate::cli::{AddUserArgs, DatabaseArgs, RemoveUserArgs};
use crate::client::{CliDependencies, CliResult, Outcome};

pub(crate) async fn handle_list_users(
    deps: &CliDependencies,
    args: DatabaseArgs,
) -> CliResult<Outcome> {
    let ctx = deps.context_for(&args.environment)?;
    let security = ctx.client.list_users(&args.database).await?;
    Outcome::json(security)
}

pub(crate) async fn handle_add_user(
    deps: &CliDependencies,
    args: AddUserArgs,
) -> CliResult<Outcome> {
    let ctx = deps.context_for(&args.environment)?;
    let roles: Vec<String> = args.role.into_iter().collect();
    let security = ctx
        .client
        .add_user_to_database(&args.database, &args.username, &roles)
        .await?;
    info!(database = %args.database, user = %args.username, "member added");
    Outcome::json(security)
}

pub(crate) async fn handle_remove_user(
    deps: &CliDependencies,
    args: RemoveUserArgs,
) -> CliResult<Outcome> {
    let ctx = deps.context_for(&args.environment)?;
    let security = ctx
        .client
        .remove_user_from_database(&args.database, &args.username)
        .await?;
    info!(database = %args.database, user = %args.username, "member removed");
    Outcome::json(security)
}
