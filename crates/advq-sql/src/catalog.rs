//! Field catalog.
//!
//! The closed set of searchable fields, each mapped to its SQL table, column
//! and value type. The table is a compile-time constant, so lookups need no
//! initialization and are safe from any number of threads.

use std::fmt;

use serde::Serialize;

use crate::CompileError;

/// Main table of the media library.
pub const MEDIA_FILE: &str = "media_file";

/// Per-user album ratings.
pub const USER_RATING: &str = "user_rating";

/// Per-user starred media files.
pub const STARRED_MEDIA_FILE: &str = "starred_media_file";

/// Value category of a field, which decides predicate semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// Free text: substring, regexp and exact matching.
    String,
    /// Text that only supports exact matching (e.g. file format).
    ExactString,
    /// Integer with range comparisons.
    Int,
    /// Timestamp with range comparisons.
    Date,
    /// Presence flag backed by a nullable joined column.
    Bool,
    /// Order-only value computed from other columns.
    Computed,
}

impl ValueType {
    /// Whether range comparisons and BETWEEN apply to this type.
    pub fn is_ordered(self) -> bool {
        matches!(self, Self::Int | Self::Date)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::String => "string",
            Self::ExactString => "exact string",
            Self::Int => "integer",
            Self::Date => "date",
            Self::Bool => "boolean",
            Self::Computed => "computed",
        })
    }
}

/// A searchable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "FieldInfo")]
pub enum Field {
    /// File path.
    Path,
    /// Track title.
    Title,
    /// Album name.
    Album,
    /// Track artist.
    Artist,
    /// Album artist.
    AlbumArtist,
    /// Disc number.
    DiscNumber,
    /// Track number.
    TrackNumber,
    /// Bit rate in kbps.
    BitRate,
    /// Duration in seconds.
    Duration,
    /// File size in bytes.
    FileSize,
    /// Comment tag.
    Comment,
    /// Creation time.
    Created,
    /// Last modification time.
    Changed,
    /// Last scan time.
    LastScanned,
    /// MusicBrainz recording id.
    MbRecordingId,
    /// MusicBrainz release id.
    MbReleaseId,
    /// Genre.
    Genre,
    /// Release year.
    Year,
    /// Music folder.
    Folder,
    /// Last play time.
    LastPlayed,
    /// File format (extension).
    Format,
    /// Play count.
    PlayCount,
    /// The user's rating of the track's album.
    AlbumRating,
    /// Whether the user starred the track.
    Starred,
    /// Per-user ranking score, order only.
    Ranking,
}

/// Static description of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldInfo {
    /// Token used in queries and ordering lists.
    pub name: &'static str,
    /// Value category.
    pub value_type: ValueType,
    /// Backing table, absent for computed fields.
    pub table: Option<&'static str>,
    /// Backing column, absent for computed fields.
    pub column: Option<&'static str>,
}

impl From<Field> for FieldInfo {
    fn from(field: Field) -> Self {
        *field.info()
    }
}

/// Builds a catalog row for a column-backed field.
const fn column(
    name: &'static str,
    value_type: ValueType,
    table: &'static str,
    column: &'static str,
) -> FieldInfo {
    FieldInfo {
        name,
        value_type,
        table: Some(table),
        column: Some(column),
    }
}

/// Catalog rows, indexed by `Field` discriminant.
const CATALOG: [FieldInfo; 25] = [
    column("path", ValueType::String, MEDIA_FILE, "path"),
    column("title", ValueType::String, MEDIA_FILE, "title"),
    column("album", ValueType::String, MEDIA_FILE, "album"),
    column("artist", ValueType::String, MEDIA_FILE, "artist"),
    column("album_artist", ValueType::String, MEDIA_FILE, "album_artist"),
    column("discnumber", ValueType::Int, MEDIA_FILE, "disc_number"),
    column("tracknumber", ValueType::Int, MEDIA_FILE, "track_number"),
    column("bitrate", ValueType::Int, MEDIA_FILE, "bit_rate"),
    column("duration", ValueType::Int, MEDIA_FILE, "duration"),
    column("filesize", ValueType::Int, MEDIA_FILE, "file_size"),
    column("comment", ValueType::String, MEDIA_FILE, "comment"),
    column("created", ValueType::Date, MEDIA_FILE, "created"),
    column("changed", ValueType::Date, MEDIA_FILE, "changed"),
    column("lastscanned", ValueType::Date, MEDIA_FILE, "last_scanned"),
    column("mb_recording_id", ValueType::String, MEDIA_FILE, "mb_recording_id"),
    column("mb_release_id", ValueType::String, MEDIA_FILE, "mb_release_id"),
    column("genre", ValueType::String, MEDIA_FILE, "genre"),
    column("year", ValueType::Int, MEDIA_FILE, "year"),
    column("folder", ValueType::String, MEDIA_FILE, "folder"),
    column("lastplayed", ValueType::Date, MEDIA_FILE, "last_played"),
    column("format", ValueType::ExactString, MEDIA_FILE, "format"),
    column("play_count", ValueType::Int, MEDIA_FILE, "play_count"),
    column("albumrating", ValueType::Int, USER_RATING, "rating"),
    column("starred", ValueType::Bool, STARRED_MEDIA_FILE, "id"),
    FieldInfo {
        name: "ranking",
        value_type: ValueType::Computed,
        table: None,
        column: None,
    },
];

impl Field {
    /// Every field, in catalog order.
    pub const ALL: [Self; 25] = [
        Self::Path,
        Self::Title,
        Self::Album,
        Self::Artist,
        Self::AlbumArtist,
        Self::DiscNumber,
        Self::TrackNumber,
        Self::BitRate,
        Self::Duration,
        Self::FileSize,
        Self::Comment,
        Self::Created,
        Self::Changed,
        Self::LastScanned,
        Self::MbRecordingId,
        Self::MbReleaseId,
        Self::Genre,
        Self::Year,
        Self::Folder,
        Self::LastPlayed,
        Self::Format,
        Self::PlayCount,
        Self::AlbumRating,
        Self::Starred,
        Self::Ranking,
    ];

    /// Looks up a field by its query token, ignoring ASCII case.
    pub fn lookup(token: &str) -> Result<Self, CompileError> {
        Self::ALL
            .into_iter()
            .find(|field| field.name().eq_ignore_ascii_case(token))
            .ok_or_else(|| CompileError::UnknownField {
                name: token.to_string(),
            })
    }

    /// Returns the static catalog row of this field.
    pub fn info(self) -> &'static FieldInfo {
        &CATALOG[self as usize]
    }

    /// Returns the query token of this field.
    pub fn name(self) -> &'static str {
        self.info().name
    }

    /// Returns the value category of this field.
    pub fn value_type(self) -> ValueType {
        self.info().value_type
    }

    /// Returns the backing table, or `None` for computed fields.
    pub fn sql_table(self) -> Option<&'static str> {
        self.info().table
    }

    /// Returns the backing column, or `None` for computed fields.
    pub fn sql_column(self) -> Option<&'static str> {
        self.info().column
    }

    /// Returns `table.column`, or `None` for computed fields.
    pub fn sql_full_column(self) -> Option<String> {
        let info = self.info();
        Some(format!("{}.{}", info.table?, info.column?))
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returns the query tokens of every field, in catalog order.
pub fn field_names() -> Vec<&'static str> {
    Field::ALL.iter().map(|field| field.name()).collect()
}
