use std::collections::HashMap;

/// What a pooled graphics resource stands for on the render side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Mesh,
    Material,
    LabelSprite,
    Line,
    ParticleSprite,
}

/// Move-only token for one allocated resource.
///
/// The handle is deliberately neither `Clone` nor `Copy`: releasing it
/// consumes it, so a resource cannot be disposed twice.
#[derive(Debug, PartialEq, Eq)]
pub struct ResourceHandle {
    id: u64,
    kind: ResourceKind,
}

impl ResourceHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }
}

/// Ledger of live graphics resources.
///
/// Mirrors what a GPU-side owner would track; used to verify that
/// collapse and teardown release everything they allocated.
#[derive(Debug, Default)]
pub struct ResourcePool {
    next_id: u64,
    live: HashMap<u64, ResourceKind>,
    allocated_total: u64,
    released_total: u64,
}

impl ResourcePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self, kind: ResourceKind) -> ResourceHandle {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        self.live.insert(id, kind);
        self.allocated_total += 1;
        ResourceHandle { id, kind }
    }

    pub fn release(&mut self, handle: ResourceHandle) {
        match self.live.remove(&handle.id) {
            Some(_) => self.released_total += 1,
            None => log::warn!(
                "released {:?} #{} which this pool does not own",
                handle.kind,
                handle.id
            ),
        }
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn live_count_of(&self, kind: ResourceKind) -> usize {
        self.live.values().filter(|k| **k == kind).count()
    }

    pub fn allocated_total(&self) -> u64 {
        self.allocated_total
    }

    pub fn released_total(&self) -> u64 {
        self.released_total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_and_release_balance() {
        let mut pool = ResourcePool::new();
        let mesh = pool.allocate(ResourceKind::Mesh);
        let line = pool.allocate(ResourceKind::Line);
        assert_eq!(pool.live_count(), 2);
        assert_eq!(pool.live_count_of(ResourceKind::Line), 1);

        pool.release(mesh);
        pool.release(line);
        assert_eq!(pool.live_count(), 0);
        assert_eq!(pool.allocated_total(), 2);
        assert_eq!(pool.released_total(), 2);
    }

    #[test]
    fn foreign_handle_is_not_counted() {
        let mut a = ResourcePool::new();
        let mut empty = ResourcePool::new();
        let handle = a.allocate(ResourceKind::Mesh);

        empty.release(handle);
        assert_eq!(empty.released_total(), 0);
        assert_eq!(a.live_count(), 1);
    }
}
