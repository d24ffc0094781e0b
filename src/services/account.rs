// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Linked account state.

use std::sync::Arc;
use tokio::sync::RwLock;

/// The athlete account the service syncs for, if one is linked.
///
/// Cloned handles share the same state.
#[derive(Clone, Default)]
pub struct AccountSession {
    athlete_id: Arc<RwLock<Option<u64>>>,
}

impl AccountSession {
    pub fn new(athlete_id: Option<u64>) -> Self {
        Self {
            athlete_id: Arc::new(RwLock::new(athlete_id)),
        }
    }

    /// Currently linked athlete.
    pub async fn current(&self) -> Option<u64> {
        *self.athlete_id.read().await
    }

    /// Link an athlete, replacing any previous link.
    pub async fn link(&self, athlete_id: u64) {
        let previous = self.athlete_id.write().await.replace(athlete_id);
        tracing::info!(athlete_id, previous = ?previous, "Account linked");
    }

    /// Forget the linked athlete. Returns the one that was linked.
    pub async fn clear(&self) -> Option<u64> {
        self.athlete_id.write().await.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_link_and_clear() {
        let session = AccountSession::default();
        assert_eq!(session.current().await, None);

        session.link(42).await;
        assert_eq!(session.current().await, Some(42));

        let handle = session.clone();
        assert_eq!(handle.clear().await, Some(42));
        assert_eq!(session.current().await, None);
    }
}
