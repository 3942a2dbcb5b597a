use pg_session::prelude::*;
use pg_session::test_utils::start_embedded;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn begin_rollback_discards_work() -> Result<(), Box<dyn std::error::Error>> {
    let server = start_embedded("tx_rollback").await?;
    let mut session = Session::connect(&server.config).await?;
    session
        .run("CREATE TABLE ledger (id BIGSERIAL PRIMARY KEY, amount BIGINT NOT NULL)", &[])
        .await?;
    session.run("INSERT INTO ledger (amount) VALUES (10)", &[]).await?;

    session.transaction("BEGIN").await?;
    session
        .run("INSERT INTO ledger (amount) VALUES ($1)", &[SqlValue::Int(999)])
        .await?;
    session.transaction("ROLLBACK").await?;

    let rs = session.run("SELECT count(*) AS cnt FROM ledger", &[]).await?;
    assert_eq!(rs.rows[0].get("cnt").unwrap().as_int(), Some(&1));

    // The keyword aliases work case-insensitively.
    session.transaction("start transaction").await?;
    session
        .run("INSERT INTO ledger (amount) VALUES ($1)", &[SqlValue::Int(20)])
        .await?;
    session.transaction("End").await?;

    let rs = session.run("SELECT count(*) AS cnt FROM ledger", &[]).await?;
    assert_eq!(rs.rows[0].get("cnt").unwrap().as_int(), Some(&2));

    session.close().await;
    server.stop().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unknown_keyword_is_rejected_and_issues_nothing() -> Result<(), Box<dyn std::error::Error>> {
    let server = start_embedded("tx_unknown").await?;
    let mut session = Session::connect(&server.config).await?;
    session
        .run("CREATE TABLE notes (id BIGSERIAL PRIMARY KEY, body TEXT NOT NULL)", &[])
        .await?;

    let err = session.transaction("SAVEPOINT s1").await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::UnknownTransactionCommand(ref s) if s == "SAVEPOINT s1"
    ));

    // Nothing was begun: the next statement autocommits, so a second
    // session sees it immediately.
    session
        .run("INSERT INTO notes (body) VALUES ($1)", &[SqlValue::Text("hi".into())])
        .await?;

    let mut observer = Session::connect(&server.config).await?;
    let rs = observer.run("SELECT count(*) AS cnt FROM notes", &[]).await?;
    assert_eq!(rs.rows[0].get("cnt").unwrap().as_int(), Some(&1));

    observer.close().await;
    session.close().await;
    server.stop().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn commit_makes_work_visible_to_other_sessions() -> Result<(), Box<dyn std::error::Error>> {
    let server = start_embedded("tx_commit").await?;
    let mut writer = Session::connect(&server.config).await?;
    writer
        .run("CREATE TABLE marks (id BIGSERIAL PRIMARY KEY, tag TEXT NOT NULL)", &[])
        .await?;

    writer.transaction("BEGIN").await?;
    writer
        .run("INSERT INTO marks (tag) VALUES ($1)", &[SqlValue::Text("pending".into())])
        .await?;

    // Uncommitted work is invisible elsewhere.
    let mut reader = Session::connect(&server.config).await?;
    let rs = reader.run("SELECT count(*) AS cnt FROM marks", &[]).await?;
    assert_eq!(rs.rows[0].get("cnt").unwrap().as_int(), Some(&0));

    writer.transaction("COMMIT").await?;
    let rs = reader.run("SELECT count(*) AS cnt FROM marks", &[]).await?;
    assert_eq!(rs.rows[0].get("cnt").unwrap().as_int(), Some(&1));

    reader.close().await;
    writer.close().await;
    server.stop().await;
    Ok(())
}
