//! Cursor and window identity for the checkpoint loop

use std::fmt;

/// Strict upper bound on the project ids requested by the next window
///
/// An unset cursor asks the listing for the most recent projects. Once a
/// window has been harvested, the cursor moves to the smallest id that window
/// returned, so the next window only sees strictly older projects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Cursor {
    id_before: Option<i64>,
}

impl Cursor {
    /// A cursor that requests the newest projects
    pub fn unset() -> Self {
        Self { id_before: None }
    }

    /// A cursor that requests projects with ids below `id`
    pub fn before(id: i64) -> Self {
        Self {
            id_before: Some(id),
        }
    }

    /// Builds a cursor from an optional starting id
    pub fn from_start(start_id: Option<i64>) -> Self {
        Self {
            id_before: start_id,
        }
    }

    /// The `id_before` query value, if any
    pub fn id_before(&self) -> Option<i64> {
        self.id_before
    }

    pub fn is_unset(&self) -> bool {
        self.id_before.is_none()
    }

    /// Returns the cursor for the window after one whose smallest id was `floor`
    pub fn advance(&self, floor: i64) -> Self {
        Self::before(floor)
    }

    /// Returns whichever of the two cursors admits fewer projects
    ///
    /// An unset cursor admits every id, so any set cursor is tighter.
    pub fn tighter(self, other: Self) -> Self {
        match (self.id_before, other.id_before) {
            (Some(a), Some(b)) => Self::before(a.min(b)),
            (Some(_), None) => self,
            (None, _) => other,
        }
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Unset renders as "None" so file names match dumps made by earlier harvesters
        match self.id_before {
            Some(id) => write!(f, "{}", id),
            None => write!(f, "None"),
        }
    }
}

/// Identity of one harvested window, used to name its output files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowKey {
    /// Cursor the window was requested with
    pub before: Cursor,

    /// Smallest project id the window returned
    pub after: i64,
}

impl WindowKey {
    pub fn new(before: Cursor, after: i64) -> Self {
        Self { before, after }
    }

    /// Returns the `{before}_{after}` prefix shared by the window's files
    pub fn stem(&self) -> String {
        format!("{}_{}", self.before, self.after)
    }

    /// Parses a `{before}_{after}` prefix back into a key
    ///
    /// Returns None if either half is not a valid id (`None` is accepted for
    /// `before`).
    pub fn from_stem(stem: &str) -> Option<Self> {
        let (before, after) = stem.split_once('_')?;
        let before = match before {
            "None" => Cursor::unset(),
            id => Cursor::before(id.parse().ok()?),
        };
        let after = after.parse().ok()?;
        Some(Self { before, after })
    }
}

impl fmt::Display for WindowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.stem())
    }
}
