//! Tabula command-line client: opens the last used table and prints the
//! rows of its active view.

use tabula_client::config::ClientConfig;
use tabula_client::error::ClientError;
use tabula_client::persistence::{self, PersistedState};
use tabula_client::{Key, Projection, RemoteTables, RestClient, TableSession};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let config = ClientConfig::load()?;
    let remote = RestClient::new(&config)?;
    let mut state = match persistence::load(&config.persistence_path) {
        Ok(state) => state.unwrap_or_default(),
        Err(err) => {
            warn!(error = %err, "Ignoring unreadable UI state");
            PersistedState::default()
        }
    };

    let bases = remote.list_bases().await?;
    for base in &bases.bases {
        println!("{}  {}  ({})", base.base_id, base.name, base.theme);
    }

    let table_id = state
        .last_table_id
        .or_else(|| bases.bases.first().and_then(|base| base.first_table_id));
    let Some(table_id) = table_id else {
        println!("No tables yet.");
        return Ok(());
    };

    let session = match TableSession::open(remote, table_id, config.page_size).await {
        Ok(session) => session,
        Err(err) if state.last_table_id.is_some() => {
            warn!(table_id = %table_id, error = %err, "Last table is gone, forgetting it");
            persistence::save(&config.persistence_path, &PersistedState::default())?;
            return Err(err.into());
        }
        Err(err) => return Err(err.into()),
    };

    let snapshot = session.snapshot();
    let view = state
        .last_view_id
        .map(Key::Real)
        .filter(|key| snapshot.view(key).is_some())
        .or_else(|| snapshot.views().first().map(|view| view.key));
    if let Some(view) = view {
        print_view(&session, &snapshot, view);
    }

    state.last_base_id = Some(snapshot.table().base_id);
    state.last_table_id = Some(table_id);
    state.last_view_id = view.and_then(|key| key.real());
    persistence::save(&config.persistence_path, &state)?;
    info!(table_id = %table_id, "Saved UI state");
    Ok(())
}

fn print_view<R: RemoteTables>(
    session: &TableSession<R>,
    snapshot: &Projection,
    view: tabula_client::projection::ViewKey,
) {
    let name = snapshot.view(&view).map(|v| v.name.as_str()).unwrap_or_default();
    println!("\n{} / {}", snapshot.table().name, name);

    let columns = session.visible_columns(view).unwrap_or_default();
    let header: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
    println!("{}", header.join(" | "));

    for row in session.visible_rows(view).unwrap_or_default() {
        let values: Vec<&str> = columns
            .iter()
            .map(|column| row.cells.get(&column.key).map_or("", |cell| cell.value.as_str()))
            .collect();
        println!("{}", values.join(" | "));
    }
}
