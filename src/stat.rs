use serde::Serialize;

/// Placeholder for every field the server did not provide.
pub const UNDEFINED: &str = "undefined";

/// Unified server info, shared by the Query and the Server List Ping paths.
///
/// Fields that could not be determined hold [UNDEFINED] rather than being absent,
/// so both protocols always produce the same shape.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct QueryResult {
    /// Message of the day, formatting codes removed.
    pub motd: String,
    /// Game type, usually `SMP`.
    #[serde(rename = "type")]
    pub game_type: String,
    pub gameid: String,
    pub version: String,
    pub plugins: String,
    /// Server software (status path) or the value the full stat reports in this slot.
    pub servertype: String,
    pub playercount: String,
    pub maxplayers: String,
    pub port: String,
    /// Names of the players online (full stat) or the sample list (status).
    pub players: Vec<String>,
    /// Server icon, base64 encoded PNG. Only present on the status path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl Default for QueryResult {
    fn default() -> Self {
        Self {
            motd: UNDEFINED.into(),
            game_type: UNDEFINED.into(),
            gameid: UNDEFINED.into(),
            version: UNDEFINED.into(),
            plugins: UNDEFINED.into(),
            servertype: UNDEFINED.into(),
            playercount: UNDEFINED.into(),
            maxplayers: UNDEFINED.into(),
            port: UNDEFINED.into(),
            players: vec![],
            icon: None,
        }
    }
}

impl std::fmt::Display for QueryResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            serde_json::to_string_pretty(self).map_err(|_| std::fmt::Error)?
        )
    }
}
