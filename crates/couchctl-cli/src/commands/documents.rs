use tracing::info;

use crate::cli::{DatabaseArgs, DocumentArgs, InsertDocArgs, UpdateDocArgs};
use crate::client::{CliDependencies, CliResult, Outcome, parse_document};

pub(crate) async fn handle_insert_doc(
    deps: &CliDependencies,
    args: InsertDocArgs,
) -> CliResult<Outcome> {
    let document = parse_document(&args.document)?;
    let ctx = deps.context_for(&args.environment)?;
    let ack = ctx
        .client
        .insert_document(&args.database, &document)
        .await?;
    Ok(Outcome::Json(ack))
}

pub(crate) async fn handle_get_doc(
    deps: &CliDependencies,
    args: DocumentArgs,
) -> CliResult<Outcome> {
    let ctx = deps.context_for(&args.environment)?;
    let document = ctx.client.get_document(&args.database, &args.doc_id).await?;
    Ok(Outcome::Json(document))
}

pub(crate) async fn handle_list_docs(
    deps: &CliDependencies,
    args: DatabaseArgs,
) -> CliResult<Outcome> {
    let ctx = deps.context_for(&args.environment)?;
    let listing = ctx.client.list_documents(&args.database).await?;
    Ok(Outcome::Json(listing))
}

pub(crate) async fn handle_update_doc(
    deps: &CliDependencies,
    args: UpdateDocArgs,
) -> CliResult<Outcome> {
    let document = parse_document(&args.document)?;
    let ctx = deps.context_for(&args.environment)?;
    let ack = ctx
        .client
        .update_document(&args.database, &args.doc_id, &document)
        .await?;
    Ok(Outcome::Json(ack))
}

/// Succeeds silently; only failures are reported.
pub(crate) async fn handle_delete_doc(
    deps: &CliDependencies,
    args: DocumentArgs,
) -> CliResult<Outcome> {
    let ctx = deps.context_for(&args.environment)?;
    ctx.client
        .delete_document(&args.database, &args.doc_id)
        .await?;
    info!(database = %args.database, id = %args.doc_id, "document deleted");
    Ok(Outcome::Silent)
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use httpmock::MockServer;
    use httpmock::prelude::*;
    use serde_json::json;

    use crate::cli::tests::execute;
    use crate::client::Outcome;

    #[tokio::test]
    async fn malformed_documents_fail_before_any_request() -> Result<()> {
        let server = MockServer::start_async().await;
        let insert = server.mock(|when, then| {
            when.method(POST).path("/shop");
            then.status(201);
        });
        let update = server.mock(|when, then| {
            when.method(PUT).path("/shop/doc1");
            then.status(201);
        });

        let err = execute(&server, &["insert-doc", "dev", "shop", "{not json"])
            .await
            .expect_err("malformed insert");
        assert_eq!(err.exit_code(), 2);
        let err = execute(&server, &["update-doc", "dev", "shop", "doc1", "[1,"])
            .await
            .expect_err("malformed update");
        assert_eq!(err.exit_code(), 2);

        insert.assert_calls(0);
        update.assert_calls(0);
        Ok(())
    }

    #[tokio::test]
    async fn insert_and_update_pass_documents_through_unchanged() -> Result<()> {
        let server = MockServer::start_async().await;
        let insert = server.mock(|when, then| {
            when.method(POST)
                .path("/shop")
                .json_body(json!({"_id": "doc1", "tags": ["a", "b"], "price": 9.5}));
            then.status(201)
                .json_body(json!({"ok": true, "id": "doc1", "rev": "1-abc"}));
        });
        let update = server.mock(|when, then| {
            when.method(PUT)
                .path("/shop/doc1")
                .json_body(json!({"_rev": "1-abc", "price": 10}));
            then.status(201)
                .json_body(json!({"ok": true, "id": "doc1", "rev": "2-abc"}));
        });

        let inserted = execute(
            &server,
            &[
                "insert-doc",
                "dev",
                "shop",
                r#"{"_id": "doc1", "tags": ["a", "b"], "price": 9.5}"#,
            ],
        )
        .await;
        assert!(matches!(inserted, Ok(Outcome::Json(ref ack)) if ack["rev"] == "1-abc"));

        let updated = execute(
            &server,
            &["update-doc", "dev", "shop", "doc1", r#"{"_rev": "1-abc", "price": 10}"#],
        )
        .await;
        assert!(matches!(updated, Ok(Outcome::Json(ref ack)) if ack["rev"] == "2-abc"));

        insert.assert();
        update.assert();
        Ok(())
    }

    #[tokio::test]
    async fn get_and_list_docs_return_server_payloads() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/shop/doc1");
            then.status(200)
                .json_body(json!({"_id": "doc1", "_rev": "2-abc", "qty": 4}));
        });
        server.mock(|when, then| {
            when.method(GET).path("/shop/_all_docs");
            then.status(200).json_body(json!({
                "total_rows": 1,
                "offset": 0,
                "rows": [{"id": "doc1", "key": "doc1", "value": {"rev": "2-abc"}}]
            }));
        });

        let fetched = execute(&server, &["get-doc", "dev", "shop", "doc1"]).await;
        assert!(matches!(fetched, Ok(Outcome::Json(ref doc)) if doc["qty"] == 4));

        let listed = execute(&server, &["list-docs", "dev", "shop"]).await;
        assert!(matches!(listed, Ok(Outcome::Json(ref listing)) if listing["total_rows"] == 1));
        Ok(())
    }

    #[tokio::test]
    async fn delete_doc_fetches_revision_then_deletes_once() -> Result<()> {
        let server = MockServer::start_async().await;
        let get = server.mock(|when, then| {
            when.method(GET).path("/shop/doc1");
            then.status(200)
                .json_body(json!({"_id": "doc1", "_rev": "2-abc", "qty": 4}));
        });
        let delete = server.mock(|when, then| {
            when.method(DELETE)
                .path("/shop/doc1")
                .query_param("rev", "2-abc");
            then.status(200)
                .json_body(json!({"ok": true, "id": "doc1", "rev": "3-fff"}));
        });

        let outcome = execute(&server, &["delete-doc", "dev", "shop", "doc1"]).await;
        assert!(matches!(outcome, Ok(Outcome::Silent)));
        get.assert_calls(1);
        delete.assert_calls(1);
        Ok(())
    }

    #[tokio::test]
    async fn delete_doc_reports_conflicts() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/shop/doc1");
            then.status(200).json_body(json!({"_id": "doc1", "_rev": "2-abc"}));
        });
        server.mock(|when, then| {
            when.method(DELETE).path("/shop/doc1");
            then.status(409)
                .json_body(json!({"error": "conflict", "reason": "Document update conflict."}));
        });

        let err = execute(&server, &["delete-doc", "dev", "shop", "doc1"])
            .await
            .expect_err("conflict");
        assert_eq!(err.exit_code(), 3);
        assert!(err.display_message().contains("status 409"));
        Ok(())
    }
}
