//! Segment membership management.
//!
//! Requests name segments by slug. Every slug in a batch is resolved before
//! anything is written, so a batch containing an unknown slug changes nothing.

use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::Segment;

pub struct MembershipService<'a> {
    store: &'a dyn Store,
}

impl<'a> MembershipService<'a> {
    #[must_use]
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Adds the user to every named segment. Memberships that are already
    /// active are left alone. Returns the requested slugs.
    pub fn add_memberships(&self, user_id: i64, slugs: &[String]) -> Result<Vec<String>> {
        self.require_user(user_id)?;
        let segment_ids = self.resolve_slugs(slugs)?;

        let inserted = self.store.add_memberships(user_id, &segment_ids)?;
        tracing::debug!(user_id, requested = slugs.len(), inserted, "added memberships");

        Ok(slugs.to_vec())
    }

    /// Ends the user's active membership in every named segment. Segments the
    /// user is not a member of are skipped.
    pub fn remove_memberships(&self, user_id: i64, slugs: &[String]) -> Result<usize> {
        self.require_user(user_id)?;
        let segment_ids = self.resolve_slugs(slugs)?;

        let removed = self.store.remove_memberships(user_id, &segment_ids)?;
        tracing::debug!(user_id, requested = slugs.len(), removed, "removed memberships");

        Ok(removed)
    }

    pub fn list_memberships(&self, user_id: i64) -> Result<Vec<Segment>> {
        self.store.list_user_segments(user_id)
    }

    fn require_user(&self, user_id: i64) -> Result<()> {
        self.store.get_user(user_id)?.ok_or(Error::NotFound)?;
        Ok(())
    }

    fn resolve_slugs(&self, slugs: &[String]) -> Result<Vec<i64>> {
        slugs
            .iter()
            .map(|slug| {
                self.store
                    .get_segment_by_slug(slug)?
                    .map(|segment| segment.id)
                    .ok_or_else(|| Error::UnknownSlug(slug.clone()))
            })
            .collect()
    }
}
