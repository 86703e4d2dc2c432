//! Cache invalidation driven by document change notifications.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::bridge::GroupBridge;
use crate::error::{Result, RightsError};
use crate::types::{DocumentEvent, GroupId, Page};

use super::barrier::LoadBarrier;
use super::tree::RightsCache;

/// Removes the cache entries a document change makes stale.
///
/// Any change (save, update, delete) invalidates the minimal affected
/// subtree: the whole farm for a farm-descriptor document, the whole space
/// for a space-descriptor document, just the document itself otherwise.
/// A change to a group-definition document additionally flushes every
/// member's cached decisions, because membership edits change resolved
/// access without touching any rule record.
///
/// All removal happens under the write side of the shared [`LoadBarrier`],
/// so no in-flight load can re-insert a now-stale parent.
pub struct RulesInvalidator {
    cache: Arc<RightsCache>,
    barrier: Arc<LoadBarrier>,
    groups: Arc<dyn GroupBridge>,
    page_size: usize,
}

impl RulesInvalidator {
    pub fn new(
        cache: Arc<RightsCache>,
        barrier: Arc<LoadBarrier>,
        groups: Arc<dyn GroupBridge>,
        page_size: usize,
    ) -> Self {
        Self {
            cache,
            barrier,
            groups,
            page_size,
        }
    }

    /// Handles one change notification. The event kind does not matter:
    /// saved, updated and deleted documents all invalidate the same way.
    pub fn on_event(&self, event: &DocumentEvent) -> Result<()> {
        let _suspend = self.barrier.suspend();

        let target = event.document.described_entity();
        debug!(
            "Invalidating [{}] after {:?} of [{}]",
            target, event.kind, event.document
        );
        self.cache.remove_entity(&target);

        if let Some(group) = self.groups.group_defined_by(&event.document) {
            self.flush_members(&group)?;
        }
        Ok(())
    }

    /// Flushes the cached decisions of every member of the group, one
    /// pagination window at a time.
    fn flush_members(&self, group: &GroupId) -> Result<()> {
        debug!("Flushing member decisions of group [{}]", group);
        let mut page = Page::first(self.page_size);
        loop {
            let members = self.groups.members_of(group, page).map_err(|err| {
                warn!(
                    "Member enumeration of group [{}] failed, cache may retain stale decisions: {:#}",
                    group, err
                );
                RightsError::from(err)
            })?;
            for member in &members {
                self.cache.remove_identity(member);
            }
            if members.len() < page.limit {
                return Ok(());
            }
            page = page.next();
        }
    }
}
