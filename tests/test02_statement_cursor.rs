use pg_session::prelude::*;
use pg_session::test_utils::start_embedded;

async fn seed_items(session: &mut Session) -> Result<(), Box<dyn std::error::Error>> {
    session
        .run(
            "CREATE TABLE items (id BIGSERIAL PRIMARY KEY, label TEXT NOT NULL, qty BIGINT NOT NULL)",
            &[],
        )
        .await?;
    let insert = session.prepare("INSERT INTO items (label, qty) VALUES ($1, $2)").await?;
    for (label, qty) in [("bolt", 5), ("nut", 9), ("washer", 1), ("screw", 4), ("pin", 2)] {
        let mut cursor = session
            .execute(&insert, &[SqlValue::Text(label.into()), SqlValue::Int(qty)])
            .await?;
        assert_eq!(cursor.affected_rows().await?, 1);
    }
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn prepare_execute_fetch_roundtrip() -> Result<(), Box<dyn std::error::Error>> {
    let server = start_embedded("stmt_flow").await?;
    let mut session = Session::connect(&server.config).await?;
    seed_items(&mut session).await?;

    let select = session
        .prepare("SELECT label, qty FROM items ORDER BY id")
        .await?;
    assert_eq!(select.column_count(), 2);
    assert_eq!(select.sql(), "SELECT label, qty FROM items ORDER BY id");

    let mut cursor = session.execute(&select, &[]).await?;
    assert_eq!(cursor.column_count(), 2);

    let first = cursor.fetch().await?.expect("first row");
    assert_eq!(first.get("label").unwrap().as_text(), Some("bolt"));
    assert_eq!(first.get_by_index(1).unwrap().as_int(), Some(&5));

    let second = cursor.fetch_values().await?.expect("second row");
    assert_eq!(second[0].as_text(), Some("nut"));

    // Closing mid-iteration releases the rest; the statement stays usable.
    cursor.close();
    assert!(cursor.fetch().await?.is_none());

    let mut cursor = session.execute(&select, &[]).await?;
    let mut labels = Vec::new();
    while let Some(row) = cursor.fetch().await? {
        labels.push(row.get("label").unwrap().as_text().unwrap().to_string());
    }
    assert_eq!(labels, ["bolt", "nut", "washer", "screw", "pin"]);

    session.close().await;
    server.stop().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn row_count_consumes_the_cursor() -> Result<(), Box<dyn std::error::Error>> {
    let server = start_embedded("stmt_count").await?;
    let mut session = Session::connect(&server.config).await?;
    seed_items(&mut session).await?;

    let select = session.prepare("SELECT id FROM items").await?;
    let mut cursor = session.execute(&select, &[]).await?;
    assert_eq!(cursor.row_count().await?, 5);
    // Consumed: nothing left to fetch.
    assert!(cursor.fetch().await?.is_none());
    assert!(cursor.fetch_values().await?.is_none());

    // Counting after a partial fetch counts only what remains.
    let mut cursor = session.execute(&select, &[]).await?;
    let _ = cursor.fetch().await?;
    let _ = cursor.fetch().await?;
    assert_eq!(cursor.row_count().await?, 3);

    session.close().await;
    server.stop().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn affected_rows_is_hybrid() -> Result<(), Box<dyn std::error::Error>> {
    let server = start_embedded("stmt_affected").await?;
    let mut session = Session::connect(&server.config).await?;
    session
        .run("CREATE TABLE t (x BIGINT NOT NULL, y BIGINT NOT NULL)", &[])
        .await?;
    session
        .run("INSERT INTO t (x, y) VALUES (0, 2), (0, 2), (0, 2), (0, 7)", &[])
        .await?;

    // DML through run reports its count on the result set.
    let rs = session.run("UPDATE t SET x = 1 WHERE y = 2", &[]).await?;
    assert_eq!(rs.rows_affected, 3);

    // DML through a cursor drains and reports the driver count.
    let update = session.prepare("UPDATE t SET x = 2 WHERE y = $1").await?;
    let mut cursor = session.execute(&update, &[SqlValue::Int(2)]).await?;
    assert_eq!(cursor.affected_rows().await?, 3);
    assert_eq!(cursor.rows_affected(), Some(3));

    // SELECT-class statements report the first column of the next row.
    let count = session
        .prepare("SELECT count(*) FROM t WHERE x = $1")
        .await?;
    let mut cursor = session.execute(&count, &[SqlValue::Int(2)]).await?;
    assert_eq!(cursor.affected_rows().await?, 3);

    session.close().await;
    server.stop().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn last_insert_id_tracks_sequences() -> Result<(), Box<dyn std::error::Error>> {
    let server = start_embedded("stmt_insert_id").await?;
    let mut session = Session::connect(&server.config).await?;
    session
        .run(
            "CREATE TABLE events (id BIGSERIAL PRIMARY KEY, kind TEXT NOT NULL)",
            &[],
        )
        .await?;

    // Before any sequence use the driver reports an error, not a guess.
    assert!(session.last_insert_id().await.is_err());
    assert!(session.last_error().is_some());

    session
        .run(
            "INSERT INTO events (kind) VALUES ($1)",
            &[SqlValue::Text("boot".into())],
        )
        .await?;
    assert_eq!(session.last_insert_id().await?, 1);

    session
        .run(
            "INSERT INTO events (kind) VALUES ($1)",
            &[SqlValue::Text("tick".into())],
        )
        .await?;
    assert_eq!(session.last_insert_id().await?, 2);

    session.close().await;
    server.stop().await;
    Ok(())
}
