//! Live round-trip tests against a PostgreSQL container.
//!
//! These need Docker and are ignored by default:
//!
//! ```text
//! cargo test -p pgscope-driver-postgres -- --ignored
//! ```

use pgscope_catalog::{ColumnFlags, ColumnFactCollector, ColumnKind, DdlGenerator, ObjectRef};
use pgscope_core::{Connection, ConnectionConfig, SslMode};
use pgscope_driver_postgres::PostgresConnection;
use pretty_assertions::assert_eq;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;

async fn start_postgres() -> anyhow::Result<(ContainerAsync<Postgres>, PostgresConnection)> {
    let container = Postgres::default().start().await?;
    let port = container.get_host_port_ipv4(5432).await?;

    let config = ConnectionConfig::new_postgres("127.0.0.1", port, "postgres", "postgres")
        .with_password("postgres")
        .with_ssl_mode(SslMode::Disable);
    let conn = PostgresConnection::connect(&config).await?;
    Ok((container, conn))
}

/// Run each statement of a generated script on its own.
async fn execute_script(conn: &PostgresConnection, script: &str) {
    for statement in script.split(";\n").map(str::trim).filter(|s| !s.is_empty()) {
        let statement = statement.trim_end_matches(';');
        conn.query(statement, &[])
            .await
            .unwrap_or_else(|e| panic!("statement failed: {}\n{}", e, statement));
    }
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn orders_scenario_against_a_live_server() {
    let (_container, conn) = start_postgres().await.unwrap();
    conn.query(
        "CREATE TABLE public.orders (id int NOT NULL PRIMARY KEY, total numeric)",
        &[],
    )
    .await
    .unwrap();

    let facts = ColumnFactCollector::new(&conn)
        .collect(&ObjectRef::table("public", "orders"))
        .await
        .unwrap();
    let summary: Vec<(&str, ColumnKind, &str, ColumnFlags)> = facts
        .iter()
        .map(|f| (f.name.as_str(), f.kind, f.declared_type.as_str(), f.flags))
        .collect();

    assert_eq!(
        summary,
        vec![
            (
                "id",
                ColumnKind::Column,
                "INTEGER",
                ColumnFlags::NOT_NULL | ColumnFlags::INDEXED | ColumnFlags::PRIMARY_KEY_MEMBER,
            ),
            ("total", ColumnKind::Column, "NUMERIC", ColumnFlags::empty()),
            ("orders_pkey", ColumnKind::PrimaryKey, "PRIMARY KEY (id)", ColumnFlags::empty()),
            ("orders_pkey", ColumnKind::UniqueIndex, "(id)", ColumnFlags::empty()),
        ]
    );

    let ddl = DdlGenerator::new(&conn)
        .generate("public", "orders")
        .await
        .unwrap();
    assert_eq!(
        ddl,
        "CREATE TABLE \"public\".\"orders\" (\n    id integer NOT NULL,\n    total numeric,\n    CONSTRAINT orders_pkey PRIMARY KEY (id)\n);\n"
    );

    conn.close().await.unwrap();
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn generated_ddl_recreates_an_equivalent_table() {
    let (_container, conn) = start_postgres().await.unwrap();
    execute_script(
        &conn,
        "CREATE TABLE public.customers (id bigint PRIMARY KEY);\n\
         CREATE TABLE public.invoices (\n\
             id bigint GENERATED ALWAYS AS IDENTITY PRIMARY KEY,\n\
             customer_id bigint NOT NULL REFERENCES public.customers(id),\n\
             status text NOT NULL DEFAULT 'open',\n\
             amount numeric(12,2) CHECK (amount >= 0)\n\
         );\n\
         CREATE INDEX invoices_status_idx ON public.invoices (status);\n",
    )
    .await;

    let generator = DdlGenerator::new(&conn);
    let ddl = generator.generate("public", "invoices").await.unwrap();
    assert!(ddl.contains("CREATE INDEX invoices_status_idx"), "{}", ddl);

    let object = ObjectRef::table("public", "invoices");
    let before = ColumnFactCollector::new(&conn).collect(&object).await.unwrap();

    conn.query("DROP TABLE public.invoices", &[]).await.unwrap();
    execute_script(&conn, &ddl).await;

    let after = ColumnFactCollector::new(&conn).collect(&object).await.unwrap();
    assert_eq!(before, after);

    let status = after.iter().find(|f| f.name == "status").unwrap();
    assert!(status.flags.contains(ColumnFlags::NOT_NULL | ColumnFlags::INDEXED));
    let customer = after.iter().find(|f| f.name == "customer_id").unwrap();
    assert!(customer.flags.contains(ColumnFlags::FOREIGN_KEY_MEMBER));

    assert_eq!(generator.generate("public", "invoices").await, Some(ddl));
    conn.close().await.unwrap();
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn views_have_no_ddl() {
    let (_container, conn) = start_postgres().await.unwrap();
    conn.query("CREATE VIEW public.one AS SELECT 1 AS x", &[])
        .await
        .unwrap();

    assert_eq!(DdlGenerator::new(&conn).generate("public", "one").await, None);
    assert_eq!(DdlGenerator::new(&conn).generate("public", "missing").await, None);
}
