use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where the instructions attached to a template live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstructionsKind {
    /// A static asset path served by the web layer.
    Static,
    /// A project in the document store; `location` holds its id.
    Document,
}

impl InstructionsKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Document => "document",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "static" => Some(Self::Static),
            "document" => Some(Self::Document),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instructions {
    pub id: String,
    pub kind: InstructionsKind,
    pub location: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}
