// src/workflow/mod.rs
//
// Client-side target-setting workflow: master-data cascade, row lifecycle,
// weight totals and approval. Everything talks to the server through
// `TargetsGateway` and asks the user through `Confirmer`.

pub mod aggregate;
pub mod approval;
pub mod cache;
pub mod confirm;
pub mod error;
pub mod gateway;
pub mod lifecycle;
pub mod loading;
pub mod row;
pub mod selector;
pub mod status;
pub mod validator;

#[cfg(test)]
pub(crate) mod testing;

pub use approval::{ApprovalOrchestrator, ApprovalSummary, BulkApproval};
pub use cache::MasterDataCache;
pub use confirm::{AutoConfirm, Confirmation, Confirmer, Outcome};
pub use error::{FieldError, Result, RowField, WorkflowError};
pub use gateway::{HttpGateway, TargetsGateway};
pub use lifecycle::{ObjectiveWeight, TargetRowManager};
pub use loading::LoadingState;
pub use row::{RowId, Scope, TargetRow, Tier};
pub use selector::CascadingSelector;
pub use status::{StatusEvent, TargetStatus};
