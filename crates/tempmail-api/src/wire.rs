//! Wire-format payloads and normalization.
//!
//! The provider's JSON is loosely shaped: numeric fields arrive as
//! numbers or strings, the message list may be absent, and attachment
//! info may be a single object or an array. Everything here decodes
//! those shapes leniently and hands strict values to [`crate::client`].
//! A shape that cannot be normalized is a recoverable parse failure,
//! never a panic.

use serde::{Deserialize, Deserializer};

/// `get_email_address` response.
#[derive(Debug, Deserialize)]
pub(crate) struct AddressPayload {
    #[serde(default)]
    pub email_addr: Option<String>,
    #[serde(default)]
    pub sid_token: Option<String>,
}

/// `check_email` response. An absent or null `list` means an empty
/// inbox.
#[derive(Debug, Deserialize)]
pub(crate) struct InboxPayload {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub list: Vec<PreviewPayload>,
}

/// One row of the `check_email` list.
#[derive(Debug, Deserialize)]
pub(crate) struct PreviewPayload {
    #[serde(deserialize_with = "lenient_u64")]
    pub mail_id: u64,
    #[serde(default)]
    pub mail_from: String,
    #[serde(default)]
    pub mail_subject: String,
    #[serde(default)]
    pub mail_date: String,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub att: bool,
}

/// `fetch_email` response.
#[derive(Debug, Deserialize)]
pub(crate) struct MessagePayload {
    #[serde(deserialize_with = "lenient_u64")]
    pub mail_id: u64,
    #[serde(default)]
    pub mail_from: String,
    #[serde(default)]
    pub mail_subject: String,
    #[serde(default)]
    pub mail_date: String,
    #[serde(default)]
    pub mail_body: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub att_info: Vec<AttachmentPayload>,
}

/// One attachment entry of `att_info`.
#[derive(Debug, Deserialize)]
pub(crate) struct AttachmentPayload {
    #[serde(default, rename = "f")]
    pub filename: String,
    #[serde(default, rename = "t")]
    pub content_type: String,
    #[serde(default, rename = "s", deserialize_with = "lenient_opt_u64")]
    pub size: Option<u64>,
    #[serde(default, rename = "p", deserialize_with = "lenient_opt_string")]
    pub part_id: Option<String>,
}

/// Accepts a JSON number or a numeric string.
fn lenient_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Num(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Like [`lenient_u64`] but tolerates an absent or null value.
fn lenient_opt_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Null,
        Num(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Null => Ok(None),
        Raw::Num(n) => Ok(Some(n)),
        Raw::Text(s) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// Accepts a string or a number, keeping the string form.
fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Null,
        Num(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Null => Ok(None),
        Raw::Num(n) => Ok(Some(n.to_string())),
        Raw::Text(s) => Ok(Some(s)),
    }
}

/// Attachment-count flag: number, numeric string, or bool.
fn lenient_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Num(u64),
        Text(String),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Bool(b) => b,
        Raw::Num(n) => n > 0,
        Raw::Text(s) => s.trim().parse::<u64>().is_ok_and(|n| n > 0),
    })
}

/// Treats an explicit `null` the same as an absent field.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// A single attachment object is normalized to a one-element sequence.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<AttachmentPayload>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Null,
        Many(Vec<AttachmentPayload>),
        One(AttachmentPayload),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Null => Vec::new(),
        Raw::Many(v) => v,
        Raw::One(a) => vec![a],
    })
}
