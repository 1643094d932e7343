use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Required model capabilities, combinable with `|`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Capabilities(u8);

impl Capabilities {
    pub const NONE: Self = Self(0);
    pub const IMAGE_INPUT: Self = Self(1);
    pub const STRUCTURED_OUTPUT: Self = Self(1 << 1);
    pub const REASONING: Self = Self(1 << 2);

    pub const MULTIMODAL: Self = Self::IMAGE_INPUT;
    pub const ALL: Self = Self(Self::IMAGE_INPUT.0 | Self::STRUCTURED_OUTPUT.0 | Self::REASONING.0);

    const NAMED: [(Self, &'static str); 3] = [
        (Self::IMAGE_INPUT, "image-input"),
        (Self::STRUCTURED_OUTPUT, "structured-output"),
        (Self::REASONING, "reasoning"),
    ];

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True if every bit of `other` is set in `self`.
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// The individual flags that are set, in declaration order.
    pub fn iter(self) -> impl Iterator<Item = Self> {
        Self::NAMED
            .into_iter()
            .map(|(flag, _)| flag)
            .filter(move |flag| self.contains(*flag))
    }
}

impl BitOr for Capabilities {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Capabilities {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Capabilities {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "none");
        }
        let names: Vec<&str> = Self::NAMED
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        write!(f, "{}", names.join("|"))
    }
}

/// How to order filtered models. Single choice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    None,
    /// Cheapest first.
    #[default]
    PriceAsc,
    PriceDesc,
    NameAsc,
    NameDesc,
    /// Smallest context first.
    ContextAsc,
    ContextDesc,
}

impl FromStr for SortOrder {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "none" => Ok(Self::None),
            "price-asc" | "price" | "cheapest" => Ok(Self::PriceAsc),
            "price-desc" => Ok(Self::PriceDesc),
            "name-asc" | "name" => Ok(Self::NameAsc),
            "name-desc" => Ok(Self::NameDesc),
            "context-asc" => Ok(Self::ContextAsc),
            "context-desc" | "context" => Ok(Self::ContextDesc),
            other => Err(format!("unknown sort order: {other}")),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::PriceAsc => "price-asc",
            Self::PriceDesc => "price-desc",
            Self::NameAsc => "name-asc",
            Self::NameDesc => "name-desc",
            Self::ContextAsc => "context-asc",
            Self::ContextDesc => "context-desc",
        };
        write!(f, "{s}")
    }
}
