mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::types::*;

/// Store defines the database interface.
///
/// Every read filters out soft-deleted rows. Deletes never remove rows; they
/// stamp `deleted_at` instead.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // User operations
    fn list_users(&self) -> Result<Vec<User>>;
    fn get_user(&self, id: i64) -> Result<Option<User>>;
    fn create_user(&self, name: &str, email: &str) -> Result<User>;
    fn update_user(&self, id: i64, name: &str, email: &str) -> Result<User>;
    fn soft_delete_user(&self, id: i64) -> Result<bool>;

    // Segment operations
    fn list_segments(&self) -> Result<Vec<Segment>>;
    fn get_segment(&self, id: i64) -> Result<Option<Segment>>;
    fn get_segment_by_slug(&self, slug: &str) -> Result<Option<Segment>>;
    fn create_segment(&self, slug: &str) -> Result<Segment>;
    fn update_segment(&self, id: i64, slug: &str) -> Result<Segment>;
    fn soft_delete_segment(&self, id: i64) -> Result<bool>;

    // Membership operations (many-to-many between users and segments)
    /// Inserts a membership row for every segment without an active one.
    /// Segments or users that are no longer active are skipped. Runs in a
    /// single transaction and returns the number of rows inserted.
    fn add_memberships(&self, user_id: i64, segment_ids: &[i64]) -> Result<usize>;
    /// Soft-deletes the active membership row for each segment, if any.
    /// Runs in a single transaction and returns the number of rows ended.
    fn remove_memberships(&self, user_id: i64, segment_ids: &[i64]) -> Result<usize>;
    fn list_user_segments(&self, user_id: i64) -> Result<Vec<Segment>>;
    /// All membership rows for a user, ended ones included, oldest first.
    fn list_membership_history(&self, user_id: i64) -> Result<Vec<Membership>>;
}
