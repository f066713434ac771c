// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Five-level invalidation cascade.

use bitflags::bitflags;

bitflags! {
    /// Recompilation stages, most expensive upstream first.
    ///
    /// The first five flags form a strict chain: a set flag implies every
    /// downstream stage must run too. The two pick flags sit outside the chain
    /// and are raised whenever the image is invalidated.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DirtyFlags: u8 {
        /// Entities were inserted, removed or had a core replaced.
        const POOL = 1 << 0;
        /// Sort keys must be recomputed.
        const ORDER = 1 << 1;
        /// The flat list must be re-sorted.
        const SORT = 1 << 2;
        /// Draw and pick lists must be recompiled.
        const DRAW_LIST = 1 << 3;
        /// The draw list must be submitted.
        const IMAGE = 1 << 4;
        /// The color-index pick buffer is stale.
        const PICK_BUFFER = 1 << 5;
        /// The depth pick buffer is stale.
        const RAY_PICK_BUFFER = 1 << 6;
    }
}

impl DirtyFlags {
    /// The chained stages, in execution order.
    pub const CHAIN: [DirtyFlags; 5] = [
        DirtyFlags::POOL,
        DirtyFlags::ORDER,
        DirtyFlags::SORT,
        DirtyFlags::DRAW_LIST,
        DirtyFlags::IMAGE,
    ];

    /// Both pick buffers.
    pub const PICK_BUFFERS: DirtyFlags = DirtyFlags::PICK_BUFFER.union(DirtyFlags::RAY_PICK_BUFFER);

    /// Every stage a pick buffer depends on.
    const COMPILE: DirtyFlags = DirtyFlags::POOL
        .union(DirtyFlags::ORDER)
        .union(DirtyFlags::SORT)
        .union(DirtyFlags::DRAW_LIST);

    /// `self` plus every chained stage upstream of it.
    fn with_upstream(self) -> DirtyFlags {
        let mut mask = DirtyFlags::empty();
        for stage in Self::CHAIN {
            mask |= stage;
            if stage == self {
                return mask;
            }
        }
        self
    }

    /// The stage that runs after `self` completes.
    fn downstream(self) -> DirtyFlags {
        match self {
            s if s == DirtyFlags::POOL => DirtyFlags::ORDER,
            s if s == DirtyFlags::ORDER => DirtyFlags::SORT,
            s if s == DirtyFlags::SORT => DirtyFlags::DRAW_LIST,
            s if s == DirtyFlags::DRAW_LIST => DirtyFlags::IMAGE | DirtyFlags::PICK_BUFFERS,
            _ => DirtyFlags::empty(),
        }
    }
}

/// Counters of stage executions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SchedulerStats {
    /// Pool rebuilds (flatten + entity build).
    pub pool_runs: u64,
    /// Sort key recomputations.
    pub order_runs: u64,
    /// Flat list sorts.
    pub sort_runs: u64,
    /// Draw list compilations.
    pub draw_list_runs: u64,
    /// Draw list submissions.
    pub image_runs: u64,
    /// Pick buffer refreshes.
    pub pick_runs: u64,
    /// Depth pick buffer refreshes.
    pub ray_pick_runs: u64,
}

/// Tracks which stages of one scene are stale.
///
/// A flag is cleared only by [`complete`](Self::complete), i.e. after the
/// stage's recompute succeeded, and completing a chained stage raises the next.
#[derive(Debug, Clone)]
pub struct DirtyScheduler {
    flags: DirtyFlags,
    stats: SchedulerStats,
}

impl Default for DirtyScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl DirtyScheduler {
    /// A new scheduler has everything dirty.
    pub fn new() -> Self {
        Self {
            flags: DirtyFlags::all(),
            stats: SchedulerStats::default(),
        }
    }

    /// Raises `flags`. Invalidating the image also invalidates both pick buffers.
    pub fn mark(&mut self, flags: DirtyFlags) {
        self.flags |= flags;
        if flags.intersects(DirtyFlags::COMPILE | DirtyFlags::IMAGE) {
            self.flags |= DirtyFlags::PICK_BUFFERS;
        }
    }

    /// Whether `stage` must run, either because it is flagged or because a
    /// chained stage upstream of it is.
    pub fn is_dirty(&self, stage: DirtyFlags) -> bool {
        if DirtyFlags::PICK_BUFFERS.contains(stage) {
            return self.flags.intersects(stage | DirtyFlags::COMPILE);
        }
        self.flags.intersects(stage.with_upstream())
    }

    /// Whether any chained stage before submission is stale.
    pub fn needs_compile(&self) -> bool {
        self.is_dirty(DirtyFlags::DRAW_LIST)
    }

    /// Clears `stage` after a successful run and raises its successor.
    pub fn complete(&mut self, stage: DirtyFlags) {
        self.flags.remove(stage);
        self.flags |= stage.downstream();
        let stats = &mut self.stats;
        let counter = match stage {
            s if s == DirtyFlags::POOL => &mut stats.pool_runs,
            s if s == DirtyFlags::ORDER => &mut stats.order_runs,
            s if s == DirtyFlags::SORT => &mut stats.sort_runs,
            s if s == DirtyFlags::DRAW_LIST => &mut stats.draw_list_runs,
            s if s == DirtyFlags::IMAGE => &mut stats.image_runs,
            s if s == DirtyFlags::PICK_BUFFER => &mut stats.pick_runs,
            s if s == DirtyFlags::RAY_PICK_BUFFER => &mut stats.ray_pick_runs,
            _ => return,
        };
        *counter += 1;
    }

    /// The raw flag set.
    pub fn flags(&self) -> DirtyFlags {
        self.flags
    }

    /// Stage execution counters.
    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settled() -> DirtyScheduler {
        let mut scheduler = DirtyScheduler::new();
        for stage in DirtyFlags::CHAIN {
            scheduler.complete(stage);
        }
        scheduler.complete(DirtyFlags::PICK_BUFFER);
        scheduler.complete(DirtyFlags::RAY_PICK_BUFFER);
        scheduler
    }

    #[test]
    fn new_scheduler_is_fully_dirty() {
        let scheduler = DirtyScheduler::new();
        for stage in DirtyFlags::CHAIN {
            assert!(scheduler.is_dirty(stage));
        }
    }

    #[test]
    fn upstream_flag_implies_downstream() {
        let mut scheduler = settled();
        assert!(scheduler.flags().is_empty());
        scheduler.mark(DirtyFlags::ORDER);
        assert!(!scheduler.is_dirty(DirtyFlags::POOL));
        assert!(scheduler.is_dirty(DirtyFlags::SORT));
        assert!(scheduler.is_dirty(DirtyFlags::IMAGE));
        assert!(scheduler.is_dirty(DirtyFlags::PICK_BUFFER));
    }

    #[test]
    fn completion_raises_the_next_stage() {
        let mut scheduler = settled();
        scheduler.mark(DirtyFlags::SORT);
        scheduler.complete(DirtyFlags::SORT);
        assert_eq!(
            scheduler.flags(),
            DirtyFlags::DRAW_LIST | DirtyFlags::PICK_BUFFERS
        );
        scheduler.complete(DirtyFlags::DRAW_LIST);
        assert_eq!(scheduler.flags(), DirtyFlags::IMAGE | DirtyFlags::PICK_BUFFERS);
        assert_eq!(scheduler.stats().sort_runs, 2);
    }

    #[test]
    fn pick_buffers_are_independent_of_each_other() {
        let mut scheduler = settled();
        scheduler.mark(DirtyFlags::IMAGE);
        scheduler.complete(DirtyFlags::PICK_BUFFER);
        assert!(!scheduler.is_dirty(DirtyFlags::PICK_BUFFER));
        assert!(scheduler.is_dirty(DirtyFlags::RAY_PICK_BUFFER));
        assert!(scheduler.is_dirty(DirtyFlags::IMAGE));
    }
}
