//! Tabula client library exports.
//!
//! The client keeps an explicit projection of one table, applies edits to
//! it optimistically, and reconciles with the server through
//! [`remote::RemoteTables`].

pub mod api_client;
pub mod config;
pub mod error;
pub mod keys;
pub mod mutation;
pub mod persistence;
pub mod projection;
pub mod reconcile;
pub mod remote;
pub mod session;

pub use api_client::{ApiClientError, RestClient};
pub use error::{ClientError, SyncError};
pub use keys::{Key, TempId};
pub use mutation::{Confirmation, LocalPatch, MutationId, MutationKind, SyncEngine};
pub use projection::{CellState, ColumnState, Projection, RowState, ViewState};
pub use remote::{InProcessRemote, RemoteTables};
pub use session::{MutationOutcome, SyncResult, TableSession};
