//! Account removal across the shop's collections.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::repository::Store;
use crate::Result;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeletedUserData {
    pub carts: u64,
    pub loyalty_account: bool,
    pub history_entries: u64,
}

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn Store>,
}

impl UserService {
    pub fn new(store: Arc<dyn Store>) -> Self { Self { store } }

    /// Removes everything the shop keeps for `user_id`. Payments are stored
    /// against carts and go with them.
    #[instrument(skip(self))]
    pub async fn delete_user_cascade(&self, user_id: Uuid) -> Result<DeletedUserData> {
        let carts = self.store.delete_user_carts(user_id).await?;
        let history_entries = self.store.delete_history(user_id).await?;
        let loyalty_account = self.store.delete_account(user_id).await?;
        let deleted = DeletedUserData { carts, loyalty_account, history_entries };
        info!(%user_id, ?deleted, "user data deleted");
        Ok(deleted)
    }
}
