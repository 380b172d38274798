//! Activity Recorder - best-effort audit trail

use crate::error::LedgerResult;
use crate::model::{colors, kinds, ActivityDetails, ActivityEntry, ActivityStream, Actor};
use crate::store::ActivityLog;
use std::sync::Arc;

/// Appends entries to the activity streams
///
/// Recording never fails the caller: if the append cannot be persisted, the failure is
/// logged and the entry is dropped. Audit-log unavailability must not block a
/// financial mutation.
#[derive(Clone)]
pub struct ActivityRecorder {
    log: Arc<dyn ActivityLog>,
}

impl ActivityRecorder {
    pub fn new(log: Arc<dyn ActivityLog>) -> Self {
        Self { log }
    }

    pub async fn record(&self, stream: ActivityStream, entry: ActivityEntry) {
        let kind = entry.kind.clone();
        if let Err(e) = self.log.append(stream, entry).await {
            log::warn!("Dropped {} activity entry '{}': {}", stream, kind, e);
        }
    }

    pub async fn entries(&self, stream: ActivityStream) -> LedgerResult<Vec<ActivityEntry>> {
        Ok(self.log.entries(stream).await?)
    }

    /// Entries about one member across all streams, oldest first
    pub async fn for_member(&self, member_id: &str) -> LedgerResult<Vec<ActivityEntry>> {
        let mut entries = Vec::new();
        for stream in ActivityStream::ALL {
            entries.extend(
                self.log
                    .entries(stream)
                    .await?
                    .into_iter()
                    .filter(|e| e.member_id.as_deref() == Some(member_id)),
            );
        }
        entries.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(entries)
    }

    /// Administrative reset of one stream
    ///
    /// The reset itself is recorded in the admin stream afterwards.
    pub async fn clear(&self, stream: ActivityStream, actor: &Actor) -> LedgerResult<usize> {
        actor.require_admin("clear activity")?;
        let removed = self.log.clear(stream).await?;
        log::info!("{} cleared {} entries from the {} stream", actor.email, removed, stream);

        self.record(
            ActivityStream::Admin,
            ActivityEntry::new(
                kinds::ACTIVITY_CLEARED,
                format!("{} cleared the {} activity log ({} entries)", actor.name, stream, removed),
                actor,
            )
            .color(colors::GRAY)
            .details(ActivityDetails::Cleared { stream, removed }),
        )
        .await;
        Ok(removed)
    }
}
