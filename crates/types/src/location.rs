//! Navigation location metadata.
//!
//! A location names the current view plus a small string map of context
//! ("location data") attached to it. Its string form is
//! `route_id?{"key":"value"}`, with the data part optional.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LocationParseError {
    #[error("location is missing a route id")]
    MissingId,
    #[error("invalid location data: {0}")]
    Data(#[from] serde_json::Error),
}

/// Current view identifier plus its location data.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    #[serde(default)]
    pub data: IndexMap<String, String>,
}

impl Location {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            data: IndexMap::new(),
        }
    }

    pub fn with_data(id: impl Into<String>, data: IndexMap<String, String>) -> Self {
        Self { id: id.into(), data }
    }

    pub fn is(&self, id: &str) -> bool {
        self.id == id
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.data.is_empty() {
            return f.write_str(&self.id);
        }
        let data = serde_json::to_string(&self.data).map_err(|_| fmt::Error)?;
        write!(f, "{}?{}", self.id, data)
    }
}

impl FromStr for Location {
    type Err = LocationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (id, data) = match s.split_once('?') {
            Some((id, data)) => (id.trim(), data.trim()),
            None => (s.trim(), ""),
        };
        if id.is_empty() {
            return Err(LocationParseError::MissingId);
        }
        let data = if data.is_empty() {
            IndexMap::new()
        } else {
            serde_json::from_str(data)?
        };
        Ok(Location::with_data(id, data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_form_round_trips_with_data() {
        let mut data = IndexMap::new();
        data.insert("guild_id".to_string(), "123".to_string());
        let location = Location::with_data("choose_guild", data);
        let rendered = location.to_string();
        assert_eq!(rendered, r#"choose_guild?{"guild_id":"123"}"#);
        assert_eq!(rendered.parse::<Location>().unwrap(), location);
    }

    #[test]
    fn data_may_contain_question_marks() {
        let location: Location = r#"apiexec.exec?{"q":"a?b"}"#.parse().unwrap();
        assert_eq!(location.data.get("q").map(String::as_str), Some("a?b"));
    }

    #[test]
    fn bare_id_parses_and_empty_id_fails() {
        assert_eq!("root".parse::<Location>().unwrap(), Location::new("root"));
        assert!(matches!("?{}".parse::<Location>(), Err(LocationParseError::MissingId)));
        assert!(matches!("root?{oops".parse::<Location>(), Err(LocationParseError::Data(_))));
    }
}
