//! Decoders for the stat payloads of the [Query](https://wiki.vg/Query) protocol.
//!
//! Both payloads are read positionally. The indices below are a wire contract of
//! the protocol version we speak and must not be "cleaned up".

use crate::{stat::QueryResult, StatErr};

/// Type byte, session id and the first six bytes of the `splitnum` padding.
pub const FULL_STAT_OFFSET: usize = 11;
/// Separates the key/value section from the player section of a full stat.
pub const PLAYER_DELIMITER: &str = "\0\0\x01player_\0\0";
/// Characters in front of the basic stat motd: the tail of the session id.
pub const BASIC_MOTD_HEADER_LEN: usize = 3;

/// Position of each field after splitting on NUL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatLayout {
    pub motd: usize,
    pub game_type: usize,
    pub gameid: Option<usize>,
    pub version: Option<usize>,
    pub plugins: Option<usize>,
    pub servertype: usize,
    pub playercount: usize,
    pub maxplayers: usize,
    pub port: Option<usize>,
}

impl StatLayout {
    /// Number of tokens a payload needs for every index to be valid.
    pub fn min_tokens(&self) -> usize {
        [
            Some(self.motd),
            Some(self.game_type),
            self.gameid,
            self.version,
            self.plugins,
            Some(self.servertype),
            Some(self.playercount),
            Some(self.maxplayers),
            self.port,
        ]
        .iter()
        .flatten()
        .max()
        .map_or(0, |&idx| idx + 1)
    }
}

/// Keys sit at the even indices and are discarded, values at the odd ones.
pub const FULL_STAT_FIELDS: StatLayout = StatLayout {
    motd: 3,
    game_type: 5,
    gameid: Some(7),
    version: Some(9),
    plugins: Some(11),
    servertype: 13,
    playercount: 15,
    maxplayers: 17,
    port: Some(19),
};

pub const BASIC_STAT_FIELDS: StatLayout = StatLayout {
    motd: 2,
    game_type: 3,
    gameid: None,
    version: None,
    plugins: None,
    servertype: 4,
    playercount: 5,
    maxplayers: 6,
    port: None,
};

/// Decode a [full stat](https://wiki.vg/Query#Full_stat) response.
pub fn decode_full_stat(bufs: &[u8]) -> Result<QueryResult, StatErr> {
    let text = match bufs.get(FULL_STAT_OFFSET..) {
        Some(body) => read_str(body),
        None => {
            return Err(StatErr::DecodeErr(format!(
                "Full stat response too short, expected more than {} bytes, but got {}",
                FULL_STAT_OFFSET,
                bufs.len()
            )));
        }
    };
    let (info, players) = match text.split_once(PLAYER_DELIMITER) {
        Some(sections) => sections,
        None => {
            return Err(StatErr::DecodeErr(
                "Full stat response is missing the player section".into(),
            ));
        }
    };
    let info = split_tokens(info, &FULL_STAT_FIELDS)?;
    let layout = FULL_STAT_FIELDS;

    // The player list ends with two NULs, leaving two empty entries behind
    let mut players = players.split('\0').map(String::from).collect::<Vec<_>>();
    players.truncate(players.len().saturating_sub(2));

    Ok(QueryResult {
        motd: strip_formatting(info[layout.motd]),
        game_type: info[layout.game_type].into(),
        gameid: optional_field(&info, layout.gameid),
        version: optional_field(&info, layout.version),
        plugins: optional_field(&info, layout.plugins),
        servertype: info[layout.servertype].into(),
        playercount: info[layout.playercount].into(),
        maxplayers: info[layout.maxplayers].into(),
        port: optional_field(&info, layout.port),
        players,
        icon: None,
    })
}

/// Decode a [basic stat](https://wiki.vg/Query#Basic_stat) response.
pub fn decode_basic_stat(bufs: &[u8]) -> Result<QueryResult, StatErr> {
    let text = read_str(bufs);
    let data = split_tokens(&text, &BASIC_STAT_FIELDS)?;
    let layout = BASIC_STAT_FIELDS;
    let motd = data[layout.motd]
        .chars()
        .skip(BASIC_MOTD_HEADER_LEN)
        .collect::<String>();

    Ok(QueryResult {
        motd: strip_formatting(&motd),
        game_type: data[layout.game_type].into(),
        servertype: data[layout.servertype].into(),
        playercount: data[layout.playercount].into(),
        maxplayers: data[layout.maxplayers].into(),
        ..Default::default()
    })
}

fn split_tokens<'a>(text: &'a str, layout: &StatLayout) -> Result<Vec<&'a str>, StatErr> {
    let tokens = text.split('\0').collect::<Vec<_>>();

    if tokens.len() < layout.min_tokens() {
        return Err(StatErr::DecodeErr(format!(
            "Stat response holds {} fields, but at least {} are required",
            tokens.len(),
            layout.min_tokens()
        )));
    }

    Ok(tokens)
}

fn optional_field(tokens: &[&str], idx: Option<usize>) -> String {
    match idx.and_then(|i| tokens.get(i)) {
        Some(&value) => value.into(),
        None => crate::stat::UNDEFINED.into(),
    }
}

/// Read bytes as UTF-8. A lone continuation byte (`0x80..=0xBF`) reads as its
/// Latin-1 code point, any other invalid sequence as one replacement character.
///
/// Servers with a badly encoded `server.properties` send a raw `0xA7` for `§`.
pub fn read_str(bufs: &[u8]) -> String {
    let mut result = String::with_capacity(bufs.len());
    let mut rest = bufs;

    loop {
        match std::str::from_utf8(rest) {
            Ok(valid) => {
                result.push_str(valid);

                return result;
            }
            Err(err) => {
                let (valid, invalid) = rest.split_at(err.valid_up_to());
                let invalid_len = err.error_len().unwrap_or(invalid.len());

                // `valid` was checked by the failed conversion above
                result.push_str(std::str::from_utf8(valid).unwrap_or_default());
                match invalid[..invalid_len] {
                    [b @ 0x80..=0xBF] => result.push(b as char),
                    _ => result.push(char::REPLACEMENT_CHARACTER),
                }
                rest = &invalid[invalid_len..];
            }
        }
    }
}

/// Remove two-character formatting codes (`§` or a replacement character, then
/// one code character) and the surrounding whitespace.
pub fn strip_formatting(motd: &str) -> String {
    let mut result = String::with_capacity(motd.len());
    let mut chars = motd.chars();

    while let Some(c) = chars.next() {
        match c {
            '§' | char::REPLACEMENT_CHARACTER => {
                chars.next();
            }
            common => result.push(common),
        }
    }

    result.trim().into()
}
