use serde::{Deserialize, Serialize};

/// URL prefix of every endpoint served by the backend plugin
pub const PLUGIN_URL: &str = "plugin/filamentmanager";

/// Maximum length of vendor, material and spool names
const MAX_NAME_LENGTH: usize = 255;

/// Maximum tool index accepted in a selection update
const MAX_TOOL_INDEX: usize = 63;

const DEFAULT_DENSITY: f64 = 1.25;
const DEFAULT_DIAMETER: f64 = 1.75;
const DEFAULT_SPOOL_COST: f64 = 20.0;
const DEFAULT_SPOOL_WEIGHT: f64 = 1000.0;

// ============================================================================
// Data model
// ============================================================================

/// Material definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Assigned by the backend, absent for profiles not yet created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default)]
    pub vendor: String,
    #[serde(default)]
    pub material: String,
    /// g/cm³
    pub density: f64,
    /// mm
    pub diameter: f64,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            id: None,
            vendor: String::new(),
            material: String::new(),
            density: DEFAULT_DENSITY,
            diameter: DEFAULT_DIAMETER,
        }
    }
}

/// Physical roll of filament
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spool {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub name: String,
    /// Embedded on the wire; updates only look at the profile id
    pub profile: Profile,
    #[serde(default)]
    pub cost: f64,
    /// Nominal full weight in grams
    #[serde(rename = "weight")]
    pub total_weight: f64,
    /// Consumed grams, `0 <= used <= total_weight`
    #[serde(default)]
    pub used: f64,
    /// Extruder temperature adjustment
    #[serde(default)]
    pub temp_offset: f64,
}

impl Spool {
    /// Grams left on the spool
    pub fn remaining(&self) -> f64 {
        self.total_weight - self.used
    }

    /// "name - material (vendor)", the way spools are named in logs
    pub fn display_name(&self) -> String {
        format!("{} - {} ({})", self.name, self.profile.material, self.profile.vendor)
    }
}

impl Default for Spool {
    fn default() -> Self {
        Self {
            id: None,
            name: String::new(),
            profile: Profile::default(),
            cost: DEFAULT_SPOOL_COST,
            total_weight: DEFAULT_SPOOL_WEIGHT,
            used: 0.0,
            temp_offset: 0.0,
        }
    }
}

/// Spool assigned to a tool, `None` when the tool has no spool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSelection {
    pub tool: usize,
    pub spool: Option<Spool>,
}

/// Reference to a spool by id, `{"id": null}` clears a selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpoolRef {
    pub id: Option<u64>,
}

/// Body of a selection update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionUpdate {
    pub tool: usize,
    pub spool: SpoolRef,
}

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    ListProfiles { force: bool },
    GetProfile { id: u64 },
    AddProfile { profile: Profile },
    UpdateProfile { id: u64, profile: Profile },
    DeleteProfile { id: u64 },
    ListSpools { force: bool },
    GetSpool { id: u64 },
    AddSpool { spool: Spool },
    UpdateSpool { id: u64, spool: Spool },
    DeleteSpool { id: u64 },
    ListSelections,
    UpdateSelection { tool: usize, spool_id: Option<u64> },
}

/// Payload wrappers, the backend expects the object under a named key
#[derive(Serialize)]
struct ProfileBody<'a> {
    profile: &'a Profile,
}

#[derive(Serialize)]
struct SpoolBody<'a> {
    spool: &'a Spool,
}

#[derive(Serialize)]
struct SelectionBody {
    selection: SelectionUpdate,
}

impl Request {
    pub fn method(&self) -> Method {
        match self {
            Request::ListProfiles { .. }
            | Request::GetProfile { .. }
            | Request::ListSpools { .. }
            | Request::GetSpool { .. }
            | Request::ListSelections => Method::Get,
            Request::AddProfile { .. } | Request::AddSpool { .. } => Method::Post,
            Request::UpdateProfile { .. }
            | Request::UpdateSpool { .. }
            | Request::UpdateSelection { .. } => Method::Patch,
            Request::DeleteProfile { .. } | Request::DeleteSpool { .. } => Method::Delete,
        }
    }

    /// Path relative to the host's API root
    pub fn path(&self) -> String {
        match self {
            Request::ListProfiles { .. } | Request::AddProfile { .. } => {
                format!("{}/profiles", PLUGIN_URL)
            }
            Request::GetProfile { id }
            | Request::UpdateProfile { id, .. }
            | Request::DeleteProfile { id } => format!("{}/profiles/{}", PLUGIN_URL, id),
            Request::ListSpools { .. } | Request::AddSpool { .. } => {
                format!("{}/spools", PLUGIN_URL)
            }
            Request::GetSpool { id } | Request::UpdateSpool { id, .. } | Request::DeleteSpool { id } => {
                format!("{}/spools/{}", PLUGIN_URL, id)
            }
            Request::ListSelections => format!("{}/selections", PLUGIN_URL),
            Request::UpdateSelection { tool, .. } => format!("{}/selections/{}", PLUGIN_URL, tool),
        }
    }

    /// Query parameters; list requests only send `force` when set
    pub fn query(&self) -> Vec<(&'static str, String)> {
        match self {
            Request::ListProfiles { force: true } | Request::ListSpools { force: true } => {
                vec![("force", "true".to_string())]
            }
            _ => Vec::new(),
        }
    }

    /// JSON body for requests that carry one
    pub fn body(&self) -> Result<Option<serde_json::Value>, serde_json::Error> {
        let value = match self {
            Request::AddProfile { profile } | Request::UpdateProfile { profile, .. } => {
                serde_json::to_value(ProfileBody { profile })?
            }
            Request::AddSpool { spool } | Request::UpdateSpool { spool, .. } => {
                serde_json::to_value(SpoolBody { spool })?
            }
            Request::UpdateSelection { tool, spool_id } => serde_json::to_value(SelectionBody {
                selection: SelectionUpdate {
                    tool: *tool,
                    spool: SpoolRef { id: *spool_id },
                },
            })?,
            _ => return Ok(None),
        };
        Ok(Some(value))
    }

    /// Validate request parameters before sending to the backend
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Request::ListProfiles { .. }
            | Request::GetProfile { .. }
            | Request::DeleteProfile { .. }
            | Request::ListSpools { .. }
            | Request::GetSpool { .. }
            | Request::DeleteSpool { .. }
            | Request::ListSelections => Ok(()),

            Request::AddProfile { profile } => validate_profile(profile),
            Request::UpdateProfile { id, profile } => {
                validate_matching_id(*id, profile.id)?;
                validate_profile(profile)
            }

            Request::AddSpool { spool } => validate_spool(spool),
            Request::UpdateSpool { id, spool } => {
                validate_matching_id(*id, spool.id)?;
                validate_spool(spool)
            }

            Request::UpdateSelection { tool, .. } => validate_tool_index(*tool),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Request::ListProfiles { .. } => "ListProfiles",
            Request::GetProfile { .. } => "GetProfile",
            Request::AddProfile { .. } => "AddProfile",
            Request::UpdateProfile { .. } => "UpdateProfile",
            Request::DeleteProfile { .. } => "DeleteProfile",
            Request::ListSpools { .. } => "ListSpools",
            Request::GetSpool { .. } => "GetSpool",
            Request::AddSpool { .. } => "AddSpool",
            Request::UpdateSpool { .. } => "UpdateSpool",
            Request::DeleteSpool { .. } => "DeleteSpool",
            Request::ListSelections => "ListSelections",
            Request::UpdateSelection { .. } => "UpdateSelection",
        }
    }
}

// ============================================================================
// Responses
// ============================================================================

/// Response body, one variant per endpoint shape.
///
/// Externally tagged, which is exactly how the backend keys its payloads:
/// `{"profiles": [...]}`, `{"spool": {...}}`, `{"selection": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiResponse {
    Profiles(Vec<Profile>),
    Profile(Profile),
    Spools(Vec<Spool>),
    Spool(Spool),
    Selections(Vec<ToolSelection>),
    Selection(ToolSelection),
}

impl ApiResponse {
    /// Parse a response body. Empty bodies (DELETE) yield `None`.
    pub fn parse(body: &str) -> Result<Option<ApiResponse>, String> {
        let trimmed = body.trim();
        if trimmed.is_empty() || trimmed == "{}" {
            return Ok(None);
        }
        serde_json::from_str(trimmed)
            .map(Some)
            .map_err(|e| format!("malformed response: {}", e))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ApiResponse::Profiles(_) => "profiles",
            ApiResponse::Profile(_) => "profile",
            ApiResponse::Spools(_) => "spools",
            ApiResponse::Spool(_) => "spool",
            ApiResponse::Selections(_) => "selections",
            ApiResponse::Selection(_) => "selection",
        }
    }

    pub fn into_profiles(self) -> Result<Vec<Profile>, String> {
        match self {
            ApiResponse::Profiles(p) => Ok(p),
            other => Err(unexpected("profiles", &other)),
        }
    }

    pub fn into_profile(self) -> Result<Profile, String> {
        match self {
            ApiResponse::Profile(p) => Ok(p),
            other => Err(unexpected("profile", &other)),
        }
    }

    pub fn into_spools(self) -> Result<Vec<Spool>, String> {
        match self {
            ApiResponse::Spools(s) => Ok(s),
            other => Err(unexpected("spools", &other)),
        }
    }

    pub fn into_spool(self) -> Result<Spool, String> {
        match self {
            ApiResponse::Spool(s) => Ok(s),
            other => Err(unexpected("spool", &other)),
        }
    }

    pub fn into_selections(self) -> Result<Vec<ToolSelection>, String> {
        match self {
            ApiResponse::Selections(s) => Ok(s),
            other => Err(unexpected("selections", &other)),
        }
    }

    pub fn into_selection(self) -> Result<ToolSelection, String> {
        match self {
            ApiResponse::Selection(s) => Ok(s),
            other => Err(unexpected("selection", &other)),
        }
    }
}

fn unexpected(expected: &str, got: &ApiResponse) -> String {
    format!("expected '{}' response, got '{}'", expected, got.kind())
}

// ============================================================================
// Push messages
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Profiles, spools or selections were modified on the backend
    DataChanged,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataChange {
    pub table: String,
    pub action: String,
}

/// Message pushed by the backend over the host's data channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginMessage {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(default)]
    pub data: Option<DataChange>,
}

impl PluginMessage {
    pub fn data_changed(table: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::DataChanged,
            data: Some(DataChange {
                table: table.into(),
                action: action.into(),
            }),
        }
    }

    /// Whether the client has to re-request its cached lists
    pub fn requires_refresh(&self) -> bool {
        self.kind == MessageKind::DataChanged
    }
}

// ============================================================================
// Validation
// ============================================================================

pub fn validate_profile(profile: &Profile) -> Result<(), String> {
    validate_name("vendor", &profile.vendor)?;
    validate_name("material", &profile.material)?;
    validate_positive("density", profile.density)?;
    validate_positive("diameter", profile.diameter)?;
    Ok(())
}

pub fn validate_spool(spool: &Spool) -> Result<(), String> {
    validate_name("name", &spool.name)?;
    if spool.profile.id.is_none() {
        return Err("Spool must reference an existing profile".into());
    }
    validate_positive("diameter", spool.profile.diameter)?;
    validate_positive("density", spool.profile.density)?;
    if !spool.cost.is_finite() || spool.cost < 0.0 {
        return Err("Cost must be a non-negative number".into());
    }
    if !spool.total_weight.is_finite() || spool.total_weight < 0.0 {
        return Err("Weight must be a non-negative number".into());
    }
    if !spool.used.is_finite() || spool.used < 0.0 || spool.used > spool.total_weight {
        return Err(format!(
            "Used weight {} outside 0..={}",
            spool.used, spool.total_weight
        ));
    }
    if !spool.temp_offset.is_finite() {
        return Err("Temperature offset must be a number".into());
    }
    Ok(())
}

pub fn validate_tool_index(tool: usize) -> Result<(), String> {
    if tool > MAX_TOOL_INDEX {
        return Err(format!("Tool index out of range (0-{})", MAX_TOOL_INDEX));
    }
    Ok(())
}

fn validate_matching_id(path_id: u64, body_id: Option<u64>) -> Result<(), String> {
    match body_id {
        Some(id) if id != path_id => Err(format!("Body id {} does not match path id {}", id, path_id)),
        _ => Ok(()),
    }
}

fn validate_name(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} cannot be empty", field));
    }
    if value.len() > MAX_NAME_LENGTH {
        return Err(format!("{} too long (max {} chars)", field, MAX_NAME_LENGTH));
    }
    Ok(())
}

fn validate_positive(field: &str, value: f64) -> Result<(), String> {
    if !value.is_finite() || value <= 0.0 {
        return Err(format!("{} must be greater than zero", field));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pla() -> Profile {
        Profile {
            id: Some(1),
            vendor: "Prusament".to_string(),
            material: "PLA".to_string(),
            density: 1.24,
            diameter: 1.75,
        }
    }

    fn spool() -> Spool {
        Spool {
            id: Some(7),
            name: "Galaxy Black".to_string(),
            profile: pla(),
            cost: 25.0,
            total_weight: 1000.0,
            used: 250.0,
            temp_offset: 5.0,
        }
    }

    #[test]
    fn test_spool_wire_names() {
        let value = serde_json::to_value(spool()).unwrap();
        assert_eq!(value["weight"], json!(1000.0));
        assert_eq!(value["temp_offset"], json!(5.0));
        assert_eq!(value["profile"]["material"], json!("PLA"));
        assert!(value.get("total_weight").is_none());
    }

    #[test]
    fn test_remaining() {
        assert_eq!(spool().remaining(), 750.0);
    }

    #[test]
    fn test_response_keyed_by_endpoint() {
        let body = json!({ "spools": [spool()] }).to_string();
        let response = ApiResponse::parse(&body).unwrap().unwrap();
        assert_eq!(response.kind(), "spools");
        assert_eq!(response.into_spools().unwrap().len(), 1);

        let body = json!({ "profiles": [] }).to_string();
        let response = ApiResponse::parse(&body).unwrap().unwrap();
        assert!(response.into_spools().is_err());
    }

    #[test]
    fn test_selection_response_with_null_spool() {
        let body = r#"{"selection": {"tool": 1, "spool": null}}"#;
        let selection = ApiResponse::parse(body).unwrap().unwrap().into_selection().unwrap();
        assert_eq!(selection.tool, 1);
        assert!(selection.spool.is_none());
    }

    #[test]
    fn test_empty_response() {
        assert_eq!(ApiResponse::parse("").unwrap(), None);
        assert_eq!(ApiResponse::parse(" {} ").unwrap(), None);
        assert!(ApiResponse::parse("{\"bogus\": 1}").is_err());
    }

    #[test]
    fn test_request_paths_and_methods() {
        let req = Request::ListSpools { force: true };
        assert_eq!(req.method(), Method::Get);
        assert_eq!(req.path(), "plugin/filamentmanager/spools");
        assert_eq!(req.query(), vec![("force", "true".to_string())]);
        assert!(Request::ListSpools { force: false }.query().is_empty());

        let req = Request::DeleteProfile { id: 3 };
        assert_eq!(req.method().as_str(), "DELETE");
        assert_eq!(req.path(), "plugin/filamentmanager/profiles/3");
    }

    #[test]
    fn test_selection_update_body() {
        let req = Request::UpdateSelection { tool: 1, spool_id: None };
        assert_eq!(req.path(), "plugin/filamentmanager/selections/1");
        let body = req.body().unwrap().unwrap();
        assert_eq!(body, json!({ "selection": { "tool": 1, "spool": { "id": null } } }));
    }

    #[test]
    fn test_validate_profile() {
        assert!(validate_profile(&pla()).is_ok());

        let mut p = pla();
        p.vendor = "  ".to_string();
        assert!(validate_profile(&p).is_err());

        let mut p = pla();
        p.density = 0.0;
        assert!(validate_profile(&p).is_err());

        let mut p = pla();
        p.diameter = f64::NAN;
        assert!(validate_profile(&p).is_err());
    }

    #[test]
    fn test_validate_spool_used_bounds() {
        let mut s = spool();
        s.used = 1000.5;
        assert!(validate_spool(&s).is_err());
        s.used = -1.0;
        assert!(validate_spool(&s).is_err());
        s.used = 1000.0;
        assert!(validate_spool(&s).is_ok());
    }

    #[test]
    fn test_update_requires_matching_id() {
        let req = Request::UpdateSpool { id: 8, spool: spool() };
        assert!(req.validate().is_err());
        let req = Request::UpdateSpool { id: 7, spool: spool() };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_plugin_message() {
        let msg: PluginMessage =
            serde_json::from_str(r#"{"type": "data_changed", "data": {"table": "spools", "action": "update"}}"#)
                .unwrap();
        assert!(msg.requires_refresh());
        assert_eq!(msg, PluginMessage::data_changed("spools", "update"));

        let msg: PluginMessage = serde_json::from_str(r#"{"type": "something_else"}"#).unwrap();
        assert_eq!(msg.kind, MessageKind::Unknown);
        assert!(!msg.requires_refresh());
    }
}
