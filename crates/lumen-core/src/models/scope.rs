//! Media scope: the container a media item belongs to.

use uuid::Uuid;

/// The container a media item (or share token) is scoped to.
///
/// A media item belongs to exactly one event OR one project, never both and
/// never neither. The database stores this as two nullable columns with a
/// CHECK constraint; in code the invariant is carried by this sum type so an
/// ill-scoped value is unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaScope {
    Event(Uuid),
    Project(Uuid),
}

impl MediaScope {
    /// Reconstruct a scope from the two nullable database columns.
    pub fn from_columns(
        event_id: Option<Uuid>,
        project_id: Option<Uuid>,
    ) -> Result<Self, crate::AppError> {
        match (event_id, project_id) {
            (Some(id), None) => Ok(MediaScope::Event(id)),
            (None, Some(id)) => Ok(MediaScope::Project(id)),
            (None, None) => Err(crate::AppError::Internal(
                "media row has no scope".to_string(),
            )),
            (Some(_), Some(_)) => Err(crate::AppError::Internal(
                "media row has both event and project scope".to_string(),
            )),
        }
    }

    /// The two nullable columns this scope maps to.
    pub fn to_columns(self) -> (Option<Uuid>, Option<Uuid>) {
        match self {
            MediaScope::Event(id) => (Some(id), None),
            MediaScope::Project(id) => (None, Some(id)),
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            MediaScope::Event(id) | MediaScope::Project(id) => *id,
        }
    }

    pub fn event_id(&self) -> Option<Uuid> {
        match self {
            MediaScope::Event(id) => Some(*id),
            MediaScope::Project(_) => None,
        }
    }

    pub fn project_id(&self) -> Option<Uuid> {
        match self {
            MediaScope::Project(id) => Some(*id),
            MediaScope::Event(_) => None,
        }
    }

    /// Path segment used when building storage keys (`events` / `projects`).
    pub fn key_segment(&self) -> &'static str {
        match self {
            MediaScope::Event(_) => "events",
            MediaScope::Project(_) => "projects",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_columns_requires_exactly_one() {
        let id = Uuid::new_v4();
        assert_eq!(
            MediaScope::from_columns(Some(id), None).unwrap(),
            MediaScope::Event(id)
        );
        assert_eq!(
            MediaScope::from_columns(None, Some(id)).unwrap(),
            MediaScope::Project(id)
        );
        assert!(MediaScope::from_columns(None, None).is_err());
        assert!(MediaScope::from_columns(Some(id), Some(id)).is_err());
    }

    #[test]
    fn columns_round_trip() {
        let scope = MediaScope::Project(Uuid::new_v4());
        let (event_id, project_id) = scope.to_columns();
        assert_eq!(
            MediaScope::from_columns(event_id, project_id).unwrap(),
            scope
        );
    }

    #[test]
    fn key_segments() {
        assert_eq!(MediaScope::Event(Uuid::new_v4()).key_segment(), "events");
        assert_eq!(
            MediaScope::Project(Uuid::new_v4()).key_segment(),
            "projects"
        );
    }
}
