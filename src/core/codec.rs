//! Text encodings applied when a rendered line is handed to a sink

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Codec {
    #[default]
    #[serde(rename = "utf-8", alias = "utf8")]
    Utf8,
    #[serde(rename = "utf-16le", alias = "utf16le", alias = "ucs2")]
    Utf16Le,
    #[serde(rename = "latin1", alias = "binary")]
    Latin1,
    #[serde(rename = "ascii")]
    Ascii,
}

impl Codec {
    pub fn as_str(&self) -> &'static str {
        match self {
            Codec::Utf8 => "utf-8",
            Codec::Utf16Le => "utf-16le",
            Codec::Latin1 => "latin1",
            Codec::Ascii => "ascii",
        }
    }

    /// Encode `text` into bytes; characters the codec cannot represent become `?`
    pub fn encode(&self, text: &str) -> Vec<u8> {
        match self {
            Codec::Utf8 => text.as_bytes().to_vec(),
            Codec::Utf16Le => text.encode_utf16().flat_map(u16::to_le_bytes).collect(),
            Codec::Latin1 => text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
                .collect(),
            Codec::Ascii => text
                .chars()
                .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
                .collect(),
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Codec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(Codec::Utf8),
            "utf-16le" | "utf16le" | "ucs2" | "ucs-2" => Ok(Codec::Utf16Le),
            "latin1" | "binary" => Ok(Codec::Latin1),
            "ascii" => Ok(Codec::Ascii),
            _ => Err(format!("Unsupported codec: '{}'", s)),
        }
    }
}
