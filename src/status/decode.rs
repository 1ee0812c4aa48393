use crate::stat::{QueryResult, UNDEFINED};
use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use serde_json::Value;

/// Length of the `data:image/png;base64,` prefix of the favicon.
const FAVICON_PREFIX_LEN: usize = 22;
const NO_MOTD: &str = "-";

/// Status JSON as sent by the server.
///
/// Every field is optional and unknown ones are ignored. A field holding a value
/// of an unexpected shape reads as absent instead of failing the whole status.
#[derive(Deserialize, Debug, Default)]
pub struct ServerStatus {
    #[serde(default, deserialize_with = "lenient")]
    pub version: Option<Version>,
    #[serde(default, deserialize_with = "lenient")]
    pub players: Option<Players>,
    #[serde(default, deserialize_with = "lenient")]
    pub description: Option<Description>,
    #[serde(default, deserialize_with = "lenient")]
    pub favicon: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct Version {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct Players {
    #[serde(default, deserialize_with = "lenient")]
    pub max: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub online: Option<i64>,
    /// Entries that are not player objects are skipped.
    #[serde(default, deserialize_with = "lenient_list")]
    pub sample: Option<Vec<Player>>,
}

#[derive(Deserialize, Debug)]
pub struct Player {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
}

/// Server description, similar to MOTD. A plain string, a list of chat
/// components or a single chat component.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum Description {
    Plain(String),
    Parts(#[serde(deserialize_with = "lenient_items")] Vec<DescriptionExtra>),
    Rich {
        #[serde(default, deserialize_with = "lenient")]
        text: Option<String>,
        #[serde(default, deserialize_with = "lenient_list")]
        extra: Option<Vec<DescriptionExtra>>,
    },
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum DescriptionExtra {
    Plain(String),
    Component {
        #[serde(default, deserialize_with = "lenient")]
        text: Option<String>,
    },
}

impl DescriptionExtra {
    fn text(&self) -> &str {
        match self {
            DescriptionExtra::Plain(text) => text,
            DescriptionExtra::Component { text } => text.as_deref().unwrap_or_default(),
        }
    }
}

/// Read any JSON value, keeping it only when it has the expected shape.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;

    Ok(T::deserialize(value).ok())
}

/// Read a JSON array, dropping the items without the expected shape. Anything
/// but an array is a type error.
fn lenient_items<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items = Vec::<Value>::deserialize(deserializer)?;

    Ok(items
        .into_iter()
        .filter_map(|item| T::deserialize(item).ok())
        .collect())
}

/// Like [lenient_items], but anything but an array reads as absent.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(Some(
            items
                .into_iter()
                .filter_map(|item| T::deserialize(item).ok())
                .collect(),
        )),
        _ => Ok(None),
    }
}

impl ServerStatus {
    pub fn version_name(&self) -> Option<&str> {
        self.version.as_ref().and_then(|v| v.name.as_deref())
    }
}

/// Map a status response onto the shape of a full stat, plus the icon.
pub fn normalize_status(status: &ServerStatus, port: u16) -> QueryResult {
    let (servertype, version) = match status.version_name().and_then(split_type_version) {
        Some((servertype, version)) => (servertype, version),
        None => (UNDEFINED.into(), UNDEFINED.into()),
    };
    let players = status.players.as_ref();
    let count = |n: Option<i64>| n.map_or(UNDEFINED.into(), |n| n.to_string());

    QueryResult {
        motd: get_motd(status.description.as_ref()),
        game_type: "SMP".into(),
        gameid: "MINECRAFT".into(),
        version,
        plugins: UNDEFINED.into(),
        servertype,
        playercount: count(players.and_then(|p| p.online)),
        maxplayers: count(players.and_then(|p| p.max)),
        port: port.to_string(),
        players: players
            .and_then(|p| p.sample.as_ref())
            .map(|sample| {
                sample
                    .iter()
                    .filter_map(|player| player.name.clone())
                    .collect()
            })
            .unwrap_or_default(),
        icon: Some(
            status
                .favicon
                .as_deref()
                .and_then(|favicon| favicon.get(FAVICON_PREFIX_LEN..))
                .filter(|icon| !icon.is_empty())
                .unwrap_or(UNDEFINED)
                .into(),
        ),
    }
}

/// Flatten the description into a plain string.
fn get_motd(description: Option<&Description>) -> String {
    match description {
        Some(Description::Rich {
            extra: Some(extra), ..
        }) => extra
            .iter()
            .map(DescriptionExtra::text)
            .collect::<String>()
            .trim()
            .into(),
        Some(Description::Parts(parts)) => {
            let motd = parts.iter().map(DescriptionExtra::text).collect::<String>();

            match motd.trim() {
                "" => NO_MOTD.into(),
                motd => motd.into(),
            }
        }
        Some(Description::Rich {
            text: Some(text), ..
        })
        | Some(Description::Plain(text))
            if !text.is_empty() =>
        {
            text.trim().into()
        }
        _ => NO_MOTD.into(),
    }
}

/// Split a version name such as `Paper 1.19.2` into server software and version.
///
/// Server software names come first, followed by the version(s) it supports,
/// which start at the first `1.`. Returns `None` when no clear split exists.
pub fn split_type_version(name: &str) -> Option<(String, String)> {
    let div = name.find("1.")?;
    let (servertype, version) = (name[..div].trim(), name[div..].trim());

    if servertype.is_empty() || version.is_empty() {
        return None;
    }

    Some((servertype.into(), version.into()))
}
