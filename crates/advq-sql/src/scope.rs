//! Media type scopes for listings.

use std::{fmt, str::FromStr};

use serde::Serialize;

/// Restricts a compiled query to one kind of media row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// No restriction.
    #[default]
    All,
    /// Music tracks.
    Songs,
    /// Album rows.
    Albums,
    /// Artist directories.
    Artists,
}

impl Scope {
    /// Every scope, in display order.
    pub const ALL: [Self; 4] = [Self::All, Self::Songs, Self::Albums, Self::Artists];

    /// Returns the WHERE restriction for this scope, if any.
    pub fn restriction(self) -> Option<&'static str> {
        match self {
            Self::All => None,
            Self::Songs => Some("media_file.type = 'MUSIC'"),
            Self::Albums => Some("media_file.type = 'ALBUM'"),
            Self::Artists => Some("media_file.type = 'DIRECTORY'"),
        }
    }

    /// Returns the scope's name as accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Songs => "songs",
            Self::Albums => "albums",
            Self::Artists => "artists",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|scope| scope.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!("unknown scope '{s}', expected one of: all, songs, albums, artists")
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names() {
        assert_eq!("songs".parse::<Scope>().unwrap(), Scope::Songs);
        assert_eq!(" Albums ".parse::<Scope>().unwrap(), Scope::Albums);
        assert!("playlists".parse::<Scope>().is_err());
    }

    #[test]
    fn round_trips_names() {
        for scope in Scope::ALL {
            assert_eq!(scope.to_string().parse::<Scope>().unwrap(), scope);
        }
    }

    #[test]
    fn restrictions() {
        assert_eq!(Scope::All.restriction(), None);
        assert_eq!(Scope::Songs.restriction(), Some("media_file.type = 'MUSIC'"));
        assert_eq!(
            Scope::Artists.restriction(),
            Some("media_file.type = 'DIRECTORY'")
        );
    }
}
