use tracing::info;

use crate::cli::{DatabaseArgs, EnvArgs};
use crate::client::{CliDependencies, CliResult, Outcome};

pub(crate) async fn handle_list_dbs(deps: &CliDependencies, args: EnvArgs) -> CliResult<Outcome> {
    let ctx = deps.context_for(&args.environment)?;
    let databases = ctx.client.list_databases().await?;
    Outcome::json(databases)
}

pub(crate) async fn handle_create_db(
    deps: &CliDependencies,
    args: DatabaseArgs,
) -> CliResult<Outcome> {
    let ctx = deps.context_for(&args.environment)?;
    let ack = ctx.client.create_database(&args.database).await?;
    info!(database = %args.database, "database created");
    Ok(Outcome::Json(ack))
}

/// Prints a confirmation line rather than the server acknowledgement.
pub(crate) async fn handle_delete_db(
    deps: &CliDependencies,
    args: DatabaseArgs,
) -> CliResult<Outcome> {
    let ctx = deps.context_for(&args.environment)?;
    ctx.client.delete_database(&args.database).await?;
    info!(database = %args.database, "database deleted");
    Ok(Outcome::Message(format!(
        "database {} deleted",
        args.database
    )))
}
