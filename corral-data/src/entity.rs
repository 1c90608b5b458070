use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity and timestamps every stored record carries.
///
/// Entities embed it with `#[serde(flatten)]`, so it serializes as the
/// top-level `id`, `createdAt` and `updatedAt` fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityMeta {
    pub id: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EntityMeta {
    /// Metadata for a record created at `at`.
    pub fn new(id: u64, at: DateTime<Utc>) -> Self {
        Self {
            id,
            created_at: at,
            updated_at: at,
        }
    }
}

/// A record that can live in a [`Repository`](crate::Repository).
///
/// `Draft` holds the caller-supplied fields of a new record and `Patch` a
/// partial update; neither can carry identity or timestamps, which the
/// repository owns.
///
/// ```ignore
/// impl Entity for User {
///     type Draft = NewUser;
///     type Patch = UserPatch;
///
///     fn build(meta: EntityMeta, draft: NewUser) -> Self {
///         User { meta, email: draft.email }
///     }
///     fn meta(&self) -> &EntityMeta { &self.meta }
///     fn meta_mut(&mut self) -> &mut EntityMeta { &mut self.meta }
///     fn apply(&mut self, patch: UserPatch) {
///         if let Some(email) = patch.email { self.email = email; }
///     }
/// }
/// ```
pub trait Entity: Clone + Send + Sync + 'static {
    type Draft: Send;
    type Patch: Send;

    /// Assemble a new record from repository-assigned metadata and caller fields.
    fn build(meta: EntityMeta, draft: Self::Draft) -> Self;

    fn meta(&self) -> &EntityMeta;

    fn meta_mut(&mut self) -> &mut EntityMeta;

    /// Merge a partial update into the record.
    fn apply(&mut self, patch: Self::Patch);

    fn id(&self) -> u64 {
        self.meta().id
    }
}
