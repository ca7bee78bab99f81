use serde::{Deserialize, Serialize};
use std::fmt;

const ANALOG: &[&str] = &["nfm", "fm", "bfm", "am", "nam", "ssb", "usb", "lsb", "dsb"];
const COMMON_DIGITAL: &[&str] = &["dmr", "d-star", "tetra", "tetrapol", "nxdn", "c4fm"];
const SIMPLE_DIGITAL: &[&str] = &["rtty", "ft8", "ft4", "packet", "digi"];
const UNKNOWN: &[&str] = &["unknown", "?"];
const AUTHORITY: &[&str] = &["ctu", "čtú", "čtu", "ctú"];

/// Display color of a signal category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalColor {
    Blue,
    Red,
    Green,
    Grey,
    Violet,
}

impl SignalColor {
    pub const ALL: [SignalColor; 5] = [
        SignalColor::Blue,
        SignalColor::Red,
        SignalColor::Green,
        SignalColor::Grey,
        SignalColor::Violet,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SignalColor::Blue => "blue",
            SignalColor::Red => "red",
            SignalColor::Green => "green",
            SignalColor::Grey => "grey",
            SignalColor::Violet => "violet",
        }
    }
}

impl fmt::Display for SignalColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps a free-text modulation label to its display color. Total: every
/// input, including the empty string, yields a color.
pub fn classify(kind: &str) -> SignalColor {
    let key = kind.trim().to_lowercase();
    let key = key.as_str();
    if ANALOG.contains(&key) {
        SignalColor::Blue
    } else if COMMON_DIGITAL.contains(&key) {
        SignalColor::Red
    } else if SIMPLE_DIGITAL.contains(&key) {
        SignalColor::Green
    } else if UNKNOWN.contains(&key) {
        SignalColor::Grey
    } else if AUTHORITY.contains(&key) {
        SignalColor::Violet
    } else {
        SignalColor::Grey
    }
}
