use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A previously indexed URL used as a starting point for further crawling.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Seed {
    pub url: String,
}

impl Seed {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Order in which seed pages are read by creation time.
///
/// Sweeping the same collection oldest-first and newest-first at the same
/// time keeps either end of the crawl frontier from starving.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn sql(self) -> &'static str {
        match self {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortDirection::Ascending => "oldest",
            SortDirection::Descending => "newest",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1" | "asc" | "ascending" | "oldest" => Ok(SortDirection::Ascending),
            "-1" | "desc" | "descending" | "newest" => Ok(SortDirection::Descending),
            other => Err(format!("Invalid sort direction: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_direction_sql_and_label() {
        assert_eq!(SortDirection::Ascending.sql(), "ASC");
        assert_eq!(SortDirection::Descending.to_string(), "newest");
    }

    #[test]
    fn test_sort_direction_parse() {
        assert_eq!("oldest".parse::<SortDirection>(), Ok(SortDirection::Ascending));
        assert_eq!("-1".parse::<SortDirection>(), Ok(SortDirection::Descending));
        assert!("sideways".parse::<SortDirection>().is_err());
    }
}
