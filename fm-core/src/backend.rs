//! Backend plugin client
//!
//! The backend owns profiles, spools and selections. [`BackendTransport`]
//! performs one HTTP exchange for a [`Request`]; [`BackendClient`] turns that
//! into the typed [`BackendApi`] calls. The sync helpers at the bottom feed
//! backend answers into the accounting engine.

use fm_protocol::{ApiResponse, PluginMessage, Request};

use crate::accounting::{AccountingEvent, FilamentAccounting};
use crate::data::{Profile, Spool, ToolSelection};
use crate::engine::{RecomputeOutcome, SpoolUsage};
use crate::error::{FilamentError, Result};

/// Raw exchange with the backend
#[cfg_attr(test, mockall::automock)]
pub trait BackendTransport: Send {
    /// Send a request and return the response body
    fn execute(&mut self, request: &Request) -> Result<String>;
}

/// Typed access to the backend plugin
#[cfg_attr(test, mockall::automock)]
pub trait BackendApi: Send {
    fn list_profiles(&mut self, force: bool) -> Result<Vec<Profile>>;
    fn add_profile(&mut self, profile: Profile) -> Result<Profile>;
    fn update_profile(&mut self, id: u64, profile: Profile) -> Result<Profile>;
    fn delete_profile(&mut self, id: u64) -> Result<()>;

    fn list_spools(&mut self, force: bool) -> Result<Vec<Spool>>;
    fn add_spool(&mut self, spool: Spool) -> Result<Spool>;
    fn update_spool(&mut self, id: u64, spool: Spool) -> Result<Spool>;
    fn delete_spool(&mut self, id: u64) -> Result<()>;

    fn list_selections(&mut self) -> Result<Vec<ToolSelection>>;
    fn update_selection(&mut self, tool: usize, spool_id: Option<u64>) -> Result<ToolSelection>;
}

pub struct BackendClient<T> {
    transport: T,
}

impl<T: BackendTransport> BackendClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Validate, send and parse one request
    fn request(&mut self, req: Request) -> Result<Option<ApiResponse>> {
        req.validate().map_err(|e| match &req {
            Request::AddProfile { .. } | Request::UpdateProfile { .. } => FilamentError::InvalidProfile(e),
            Request::AddSpool { .. } | Request::UpdateSpool { .. } => FilamentError::InvalidSpool(e),
            _ => FilamentError::backend(format!("Request validation failed: {}", e)),
        })?;

        tracing::debug!("{} {}", req.method().as_str(), req.path());
        let body = self.transport.execute(&req)?;
        ApiResponse::parse(&body).map_err(FilamentError::BackendResponse)
    }

    fn expect_response(&mut self, req: Request) -> Result<ApiResponse> {
        let name = req.type_name();
        self.request(req)?
            .ok_or_else(|| FilamentError::BackendResponse(format!("empty response to {}", name)))
    }
}

impl<T: BackendTransport> BackendApi for BackendClient<T> {
    fn list_profiles(&mut self, force: bool) -> Result<Vec<Profile>> {
        self.expect_response(Request::ListProfiles { force })?
            .into_profiles()
            .map_err(FilamentError::BackendResponse)
    }

    fn add_profile(&mut self, profile: Profile) -> Result<Profile> {
        self.expect_response(Request::AddProfile { profile })?
            .into_profile()
            .map_err(FilamentError::BackendResponse)
    }

    fn update_profile(&mut self, id: u64, profile: Profile) -> Result<Profile> {
        self.expect_response(Request::UpdateProfile { id, profile })?
            .into_profile()
            .map_err(FilamentError::BackendResponse)
    }

    fn delete_profile(&mut self, id: u64) -> Result<()> {
        self.request(Request::DeleteProfile { id })?;
        Ok(())
    }

    fn list_spools(&mut self, force: bool) -> Result<Vec<Spool>> {
        self.expect_response(Request::ListSpools { force })?
            .into_spools()
            .map_err(FilamentError::BackendResponse)
    }

    fn add_spool(&mut self, spool: Spool) -> Result<Spool> {
        self.expect_response(Request::AddSpool { spool })?
            .into_spool()
            .map_err(FilamentError::BackendResponse)
    }

    fn update_spool(&mut self, id: u64, spool: Spool) -> Result<Spool> {
        self.expect_response(Request::UpdateSpool { id, spool })?
            .into_spool()
            .map_err(FilamentError::BackendResponse)
    }

    fn delete_spool(&mut self, id: u64) -> Result<()> {
        self.request(Request::DeleteSpool { id })?;
        Ok(())
    }

    fn list_selections(&mut self) -> Result<Vec<ToolSelection>> {
        self.expect_response(Request::ListSelections)?
            .into_selections()
            .map_err(FilamentError::BackendResponse)
    }

    fn update_selection(&mut self, tool: usize, spool_id: Option<u64>) -> Result<ToolSelection> {
        self.expect_response(Request::UpdateSelection { tool, spool_id })?
            .into_selection()
            .map_err(FilamentError::BackendResponse)
    }
}

// ============================================================================
// Sync helpers
// ============================================================================

/// Pull the backend's selections into the registry
pub fn sync_selections(
    api: &mut dyn BackendApi,
    accounting: &mut FilamentAccounting,
) -> Result<Option<RecomputeOutcome>> {
    let selections = api.list_selections()?;
    accounting.dispatch(AccountingEvent::BackendSelections { selections })
}

/// Store a user's selection on the backend, then apply what it answered
pub fn select_spool(
    api: &mut dyn BackendApi,
    accounting: &mut FilamentAccounting,
    tool: usize,
    spool_id: Option<u64>,
) -> Result<Option<RecomputeOutcome>> {
    // Reject unknown tools before touching the backend
    accounting.get_selection(tool)?;
    let selection = api.update_selection(tool, spool_id)?;
    accounting.dispatch(AccountingEvent::SelectionChanged {
        tool: selection.tool,
        spool: selection.spool,
    })
}

/// React to a push message; `data_changed` refreshes the selections
pub fn handle_plugin_message(
    api: &mut dyn BackendApi,
    accounting: &mut FilamentAccounting,
    message: &PluginMessage,
) -> Result<Option<RecomputeOutcome>> {
    if !message.requires_refresh() {
        tracing::debug!("Ignoring plugin message {:?}", message.kind);
        return Ok(None);
    }
    if let Some(change) = &message.data {
        tracing::debug!("Backend data changed: {} {}", change.table, change.action);
    }
    sync_selections(api, accounting)
}

/// Send the spools updated after a print to the backend
///
/// Every spool is attempted; the first failure is returned after the rest
/// were sent.
pub fn book_usage(api: &mut dyn BackendApi, usage: &[SpoolUsage]) -> Result<Vec<Spool>> {
    let mut saved = Vec::with_capacity(usage.len());
    let mut first_error = None;

    for entry in usage {
        let Some(id) = entry.spool.id else {
            tracing::warn!("Spool on tool{} has no id, usage not saved", entry.tool);
            continue;
        };
        match api.update_spool(id, entry.spool.clone()) {
            Ok(spool) => saved.push(spool),
            Err(e) => {
                tracing::error!("Failed to update filament on tool{}: {}", entry.tool, e);
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(saved),
    }
}
