//! Temporary zone boundary previews.
//!
//! A preview highlights the outline of a zone's true extent at one height
//! and reverts it after the configured delay. The revert runs through the
//! context's scheduler and re-resolves the zone by id first: if the zone
//! has been removed in the meantime, the revert does nothing.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::core::context::ZoneContext;
use crate::core::ids::{WorldId, ZoneId};
use crate::core::scheduler::TaskId;
use crate::region::BlockPos;

/// Host-side renderer of highlighted blocks.
pub trait BoundsViewer {
    /// Show `blocks` as highlighted.
    fn highlight(&mut self, world: &WorldId, blocks: &[BlockPos]);

    /// Restore `blocks` to what the world really holds.
    fn reset(&mut self, world: &WorldId, blocks: &[BlockPos]);
}

/// A preview that has been shown and is waiting to be reverted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoundsPreview {
    /// The previewed zone.
    pub zone: ZoneId,
    /// Number of highlighted blocks.
    pub blocks: usize,
    /// The scheduled revert.
    pub revert: TaskId,
}

/// Highlight the outline of `zone`'s true extent at height `y`.
///
/// At most `preview_block_limit` blocks are highlighted. Returns `None` if
/// the zone is not registered.
pub fn show_bounds<V>(
    ctx: &mut ZoneContext,
    zone: &ZoneId,
    y: i32,
    viewer: Rc<RefCell<V>>,
) -> Option<BoundsPreview>
where
    V: BoundsViewer + 'static,
{
    let extent = ctx.zones().true_extent(zone)?;
    let world = extent.world().clone();
    let limit = ctx.config().preview_block_limit;
    let mut blocks: Vec<BlockPos> = extent.outline_at(y).take(limit.saturating_add(1)).collect();
    if blocks.len() > limit {
        blocks.truncate(limit);
        warn!(zone = %zone, limit, "bounds preview truncated");
    }
    viewer.borrow_mut().highlight(&world, &blocks);

    let count = blocks.len();
    let id = zone.clone();
    let delay = ctx.config().bounds_preview;
    let revert = ctx.schedule_after(delay, move |ctx| {
        if ctx.zones().get_zone(&id).is_none() {
            debug!(zone = %id, "zone gone before bounds preview ended");
            return;
        }
        viewer.borrow_mut().reset(&world, &blocks);
    });
    debug!(zone = %zone, blocks = count, task = %revert, "showing bounds preview");

    Some(BoundsPreview {
        zone: zone.clone(),
        blocks: count,
        revert,
    })
}
