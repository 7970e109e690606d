use std::fmt;

use serde::{Deserialize, Serialize};

/// Purpose of a user query. Closed set; every consumer matches it exhaustively.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Installation,
    Compatibility,
    Troubleshooting,
    General,
}

impl Intent {
    pub const ALL: [Intent; 4] =
        [Intent::Installation, Intent::Compatibility, Intent::Troubleshooting, Intent::General];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Installation => "installation",
            Self::Compatibility => "compatibility",
            Self::Troubleshooting => "troubleshooting",
            Self::General => "general",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
