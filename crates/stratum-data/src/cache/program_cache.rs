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

use ahash::AHashMap;
use slotmap::SlotMap;
use stratum_core::renderer::{
    DeviceProgramId, GraphicsDevice, ProgramError, ProgramId, ProgramSourceFactory, StateSnapshot,
};

/// A compiled program shared by every entity with the same program hash.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    /// Cache handle.
    pub id: ProgramId,
    /// Program hash it was generated from.
    pub hash: String,
    /// Drawing variant.
    pub draw: DeviceProgramId,
    /// Picking variant.
    pub pick: DeviceProgramId,
}

#[derive(Debug)]
struct Entry {
    program: Program,
    uses: u32,
}

/// Reference-counted map from program hash to compiled program.
///
/// Programs are compiled on the first `acquire` of a hash and destroyed on the
/// device when the last user releases them.
#[derive(Debug, Default)]
pub struct ProgramCache {
    entries: SlotMap<ProgramId, Entry>,
    by_hash: AHashMap<String, ProgramId>,
}

impl ProgramCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the program for `hash`, compiling it on a miss.
    ///
    /// ## Errors
    /// Propagates the device's [`ProgramError`]. Nothing is cached on failure.
    pub fn acquire(
        &mut self,
        hash: &str,
        snapshot: &StateSnapshot<'_>,
        factory: &dyn ProgramSourceFactory,
        device: &mut dyn GraphicsDevice,
    ) -> Result<ProgramId, ProgramError> {
        if let Some(&id) = self.by_hash.get(hash) {
            if let Some(entry) = self.entries.get_mut(id) {
                entry.uses += 1;
                log::debug!("Program cache hit for '{hash}' ({} uses).", entry.uses);
                return Ok(id);
            }
        }

        log::debug!("Program cache miss for '{hash}', compiling.");
        let source = factory.source(hash, snapshot);
        let draw = device.compile_program(&format!("{hash}#draw"), &source.draw)?;
        let pick = match device.compile_program(&format!("{hash}#pick"), &source.pick) {
            Ok(pick) => pick,
            Err(err) => {
                device.destroy_program(draw);
                return Err(err);
            }
        };

        let id = self.entries.insert_with_key(|id| Entry {
            program: Program {
                id,
                hash: hash.to_owned(),
                draw,
                pick,
            },
            uses: 1,
        });
        self.by_hash.insert(hash.to_owned(), id);
        Ok(id)
    }

    /// Drops one use. Returns `true` if the program was evicted.
    pub fn release(&mut self, id: ProgramId, device: &mut dyn GraphicsDevice) -> bool {
        let Some(entry) = self.entries.get_mut(id) else {
            log::warn!("Release of unknown program {id:?}.");
            return false;
        };
        entry.uses = entry.uses.saturating_sub(1);
        if entry.uses > 0 {
            return false;
        }
        if let Some(entry) = self.entries.remove(id) {
            self.by_hash.remove(&entry.program.hash);
            device.destroy_program(entry.program.draw);
            device.destroy_program(entry.program.pick);
            log::debug!("Evicted program '{}'.", entry.program.hash);
        }
        true
    }

    /// Looks up a live program.
    pub fn get(&self, id: ProgramId) -> Option<&Program> {
        self.entries.get(id).map(|entry| &entry.program)
    }

    /// Current use count of the program for `hash`, 0 if none is cached.
    pub fn use_count(&self, hash: &str) -> u32 {
        self.by_hash
            .get(hash)
            .and_then(|id| self.entries.get(*id))
            .map_or(0, |entry| entry.uses)
    }

    /// Number of live programs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Destroys every program regardless of use counts.
    pub fn clear(&mut self, device: &mut dyn GraphicsDevice) {
        for (_, entry) in self.entries.drain() {
            device.destroy_program(entry.program.draw);
            device.destroy_program(entry.program.pick);
        }
        self.by_hash.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratum_core::renderer::{ProgramSource, ShaderSource};
    use stratum_core::state::{
        ClipPlanesCore, FlagsCore, GeometryCore, LightsCore, MorphCore, ShaderCore, TexturesCore,
    };
    use stratum_infra::HeadlessDevice;

    #[derive(Debug)]
    struct EchoFactory;

    impl ProgramSourceFactory for EchoFactory {
        fn source(&self, hash: &str, _: &StateSnapshot<'_>) -> ProgramSource {
            let stage = ShaderSource {
                vertex: format!("// {hash}"),
                fragment: format!("// {hash}"),
            };
            ProgramSource {
                draw: stage.clone(),
                pick: stage,
            }
        }
    }

    fn with_snapshot<R>(f: impl FnOnce(&StateSnapshot<'_>) -> R) -> R {
        let (g, fl, l, c, m, t, s) = (
            GeometryCore::default(),
            FlagsCore::default(),
            LightsCore::default(),
            ClipPlanesCore::default(),
            MorphCore::default(),
            TexturesCore::default(),
            ShaderCore::default(),
        );
        f(&StateSnapshot {
            geometry: &g,
            flags: &fl,
            lights: &l,
            clip_planes: &c,
            morph: &m,
            textures: &t,
            shader: &s,
        })
    }

    #[test]
    fn same_hash_shares_one_program() {
        let mut device = HeadlessDevice::new(8, 8);
        let mut cache = ProgramCache::new();
        with_snapshot(|snap| {
            let a = cache.acquire("h1", snap, &EchoFactory, &mut device).unwrap();
            let b = cache.acquire("h1", snap, &EchoFactory, &mut device).unwrap();
            assert_eq!(a, b);
        });
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.use_count("h1"), 2);
        assert_eq!(device.stats().programs_compiled, 2);
    }

    #[test]
    fn last_release_destroys_both_variants() {
        let mut device = HeadlessDevice::new(8, 8);
        let mut cache = ProgramCache::new();
        let id = with_snapshot(|snap| {
            cache.acquire("h1", snap, &EchoFactory, &mut device).unwrap();
            cache.acquire("h1", snap, &EchoFactory, &mut device).unwrap()
        });
        assert!(!cache.release(id, &mut device));
        assert_eq!(device.live_programs(), 2);
        assert!(cache.release(id, &mut device));
        assert_eq!(device.live_programs(), 0);
        assert!(cache.is_empty());
        assert_eq!(cache.use_count("h1"), 0);
        assert!(cache.get(id).is_none());
    }

    #[test]
    fn compile_failure_caches_nothing() {
        let mut device = HeadlessDevice::new(8, 8);
        device.fail_compiles_matching("bad");
        let mut cache = ProgramCache::new();
        let result = with_snapshot(|snap| cache.acquire("bad", snap, &EchoFactory, &mut device));
        assert!(matches!(result, Err(ProgramError::CompilationFailed { .. })));
        assert!(cache.is_empty());
        assert_eq!(device.live_programs(), 0);
    }

    #[test]
    fn clear_destroys_everything() {
        let mut device = HeadlessDevice::new(8, 8);
        let mut cache = ProgramCache::new();
        with_snapshot(|snap| {
            cache.acquire("a", snap, &EchoFactory, &mut device).unwrap();
            cache.acquire("b", snap, &EchoFactory, &mut device).unwrap();
        });
        cache.clear(&mut device);
        assert!(cache.is_empty());
        assert_eq!(device.live_programs(), 0);
    }
}
