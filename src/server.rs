use std::{sync::Arc, time::Duration};

use axum::{extract::FromRef, Router};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{Any, CorsLayer};

use crate::{
    database::PostgresConnection,
    ledger::{
        commands::postgres::PostgresCommands, queries::postgres::PostgresQueries,
        services::GeneralLedgerService,
    },
};

pub struct Options {
    pub database_pool_size: u32,
    pub database_timeout_seconds: u8,
    pub database_url: String,
}

#[derive(Clone)]
pub struct AppState {
    ledger_service: GeneralLedgerService,
}

pub async fn serve(opts: Options) -> anyhow::Result<()> {
    let db_pool = PgPoolOptions::new()
        .max_connections(opts.database_pool_size)
        .acquire_timeout(Duration::from_secs(opts.database_timeout_seconds.into()))
        .connect(&opts.database_url)
        .await?;

    let db_connection = PostgresConnection::new(db_pool);

    let queries = Arc::new(PostgresQueries(db_connection.clone()));
    let commands = Arc::new(PostgresCommands(db_connection));

    let ledger_service = GeneralLedgerService::new(queries.clone(), queries, commands);

    let state = AppState { ledger_service };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .merge(crate::ledger::http::handlers::routes())
        .layer(cors)
        .with_state(state);

    axum::Server::bind(&"0.0.0.0:8000".parse().unwrap())
        .serve(app.into_make_service())
        .await?;

    Ok(())
}

impl FromRef<AppState> for GeneralLedgerService {
    fn from_ref(state: &AppState) -> Self {
        state.ledger_service.clone()
    }
}
