//! Branded ID newtypes for type safety.
//!
//! Every aggregate has a distinct ID type implemented as a `Copy` newtype
//! around [`Uuid`]. This prevents accidentally passing a lesson ID where a
//! module ID is expected.
//!
//! The nil UUID is the "unset" value: it is what [`Default`] produces, it is
//! never a valid lookup key, and repositories replace it with a fresh
//! time-ordered UUID v7 on create.
//!
//! IDs are persisted as canonical lowercase hyphenated text.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! branded_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Create a new random ID (UUID v7, time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// The unset (nil) ID.
            #[must_use]
            pub const fn nil() -> Self {
                Self(Uuid::nil())
            }

            /// Whether this ID is the unset (nil) value.
            #[must_use]
            pub fn is_unset(&self) -> bool {
                self.0.is_nil()
            }

            /// Return the inner UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(u: Uuid) -> Self {
                Self(u)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl rusqlite::types::ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
                Ok(rusqlite::types::ToSqlOutput::from(self.0.to_string()))
            }
        }

        impl rusqlite::types::FromSql for $name {
            fn column_result(
                value: rusqlite::types::ValueRef<'_>,
            ) -> rusqlite::types::FromSqlResult<Self> {
                let text = value.as_str()?;
                Uuid::parse_str(text)
                    .map(Self)
                    .map_err(|e| rusqlite::types::FromSqlError::Other(Box::new(e)))
            }
        }
    };
}

branded_id! {
    /// Unique identifier for a platform user.
    UserId
}

branded_id! {
    /// Unique identifier for an uploaded material set.
    MaterialSetId
}

branded_id! {
    /// Unique identifier for a course.
    CourseId
}

branded_id! {
    /// Unique identifier for a module within a course.
    CourseModuleId
}

branded_id! {
    /// Unique identifier for a lesson within a module.
    LessonId
}

branded_id! {
    /// Unique identifier for a lesson asset (image, video, ...).
    LessonAssetId
}

branded_id! {
    /// Unique identifier for a topic-mastery record.
    TopicMasteryId
}

branded_id! {
    /// Unique identifier for a decision trace.
    DecisionTraceId
}

branded_id! {
    /// Unique identifier for a document-variant exposure.
    DocVariantExposureId
}

branded_id! {
    /// Unique identifier for a document-variant outcome.
    DocVariantOutcomeId
}

branded_id! {
    /// Unique identifier for a user-progression event.
    UserProgressionEventId
}

branded_id! {
    /// Unique identifier for a learning path.
    PathId
}

branded_id! {
    /// Unique identifier for a node within a learning path.
    PathNodeId
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn course_id_new_is_uuid_v7() {
        let id = CourseId::new();
        assert_eq!(id.as_uuid().get_version(), Some(uuid::Version::SortRand));
    }

    #[test]
    fn default_is_unset() {
        assert!(LessonId::default().is_unset());
        assert!(LessonId::nil().is_unset());
        assert!(!LessonId::new().is_unset());
    }

    #[test]
    fn ids_are_unique() {
        let a = UserId::new();
        let b = UserId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn ids_are_time_ordered() {
        let a = DecisionTraceId::new();
        let b = DecisionTraceId::new();
        assert!(a < b);
    }

    #[test]
    fn display_and_parse() {
        let id = CourseModuleId::new();
        let text = id.to_string();
        assert_eq!(text.len(), 36);
        let back: CourseModuleId = text.parse().unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("not-a-uuid".parse::<PathId>().is_err());
    }

    #[test]
    fn uuid_conversions() {
        let raw = Uuid::now_v7();
        let id = PathNodeId::from(raw);
        let back: Uuid = id.into();
        assert_eq!(back, raw);
    }

    #[test]
    fn serde_is_transparent() {
        let id = MaterialSetId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
        let back: MaterialSetId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn sqlite_text_roundtrip() {
        let conn = Connection::open_in_memory().unwrap();
        let id = TopicMasteryId::new();
        let back: TopicMasteryId = conn
            .query_row("SELECT ?1", [id], |row| row.get(0))
            .unwrap();
        assert_eq!(back, id);

        let stored: String = conn.query_row("SELECT ?1", [id], |row| row.get(0)).unwrap();
        assert_eq!(stored, id.to_string());
    }

    #[test]
    fn sqlite_rejects_malformed_text() {
        let conn = Connection::open_in_memory().unwrap();
        let result: rusqlite::Result<UserId> =
            conn.query_row("SELECT 'nope'", [], |row| row.get(0));
        assert!(result.is_err());
    }
}
