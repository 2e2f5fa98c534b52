//! Registry of GPU-resident resources owned by one renderer.
//!
//! Every buffer and texture a renderer allocates is inserted here and
//! addressed by [`ResourceId`]. Teardown releases all of them in one pass,
//! so a disposed visualizer leaves nothing resident on the device.

use super::textures::{ReadbackBuffer, RenderTarget};

/// Something that holds device memory and can give it back eagerly.
pub trait Release {
    fn release(&self);
}

impl Release for wgpu::Buffer {
    fn release(&self) {
        self.destroy();
    }
}

impl Release for RenderTarget {
    fn release(&self) {
        self.texture().destroy();
    }
}

impl Release for ReadbackBuffer {
    fn release(&self) {
        self.buffer().destroy();
    }
}

/// GPU resource tracked by a renderer.
pub enum GpuResource {
    Buffer(wgpu::Buffer),
    Target(RenderTarget),
    Readback(ReadbackBuffer),
}

impl Release for GpuResource {
    fn release(&self) {
        match self {
            Self::Buffer(buffer) => buffer.release(),
            Self::Target(target) => target.release(),
            Self::Readback(readback) => readback.release(),
        }
    }
}

/// Handle into a [`ResourceArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceId(usize);

/// Slot storage with bulk release.
pub struct ResourceArena<R: Release = GpuResource> {
    slots: Vec<Option<R>>,
}

impl<R: Release> Default for ResourceArena<R> {
    fn default() -> Self {
        Self { slots: Vec::new() }
    }
}

impl<R: Release> ResourceArena<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, resource: R) -> ResourceId {
        self.slots.push(Some(resource));
        ResourceId(self.slots.len() - 1)
    }

    pub fn get(&self, id: ResourceId) -> Option<&R> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    /// Swap in a new resource for `id`, releasing the old one.
    ///
    /// Returns `false` if `id` is unknown or already released.
    pub fn replace(&mut self, id: ResourceId, resource: R) -> bool {
        match self.slots.get_mut(id.0) {
            Some(slot) if slot.is_some() => {
                if let Some(old) = slot.replace(resource) {
                    old.release();
                }
                true
            }
            _ => false,
        }
    }

    /// Release every live resource. Returns how many were released.
    pub fn release_all(&mut self) -> usize {
        let mut released = 0;
        for slot in &mut self.slots {
            if let Some(resource) = slot.take() {
                resource.release();
                released += 1;
            }
        }
        released
    }

    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }
}

impl ResourceArena<GpuResource> {
    pub fn buffer(&self, id: ResourceId) -> Option<&wgpu::Buffer> {
        match self.get(id)? {
            GpuResource::Buffer(buffer) => Some(buffer),
            _ => None,
        }
    }

    pub fn target(&self, id: ResourceId) -> Option<&RenderTarget> {
        match self.get(id)? {
            GpuResource::Target(target) => Some(target),
            _ => None,
        }
    }

    pub fn readback(&self, id: ResourceId) -> Option<&ReadbackBuffer> {
        match self.get(id)? {
            GpuResource::Readback(readback) => Some(readback),
            _ => None,
        }
    }
}

impl<R: Release> Drop for ResourceArena<R> {
    fn drop(&mut self) {
        self.release_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Tracked(Arc<AtomicUsize>);

    impl Release for Tracked {
        fn release(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_release_all_releases_each_once() {
        let released = Arc::new(AtomicUsize::new(0));
        let mut arena = ResourceArena::new();
        for _ in 0..3 {
            arena.insert(Tracked(released.clone()));
        }
        assert_eq!(arena.live_count(), 3);

        assert_eq!(arena.release_all(), 3);
        assert_eq!(arena.release_all(), 0);
        assert_eq!(released.load(Ordering::SeqCst), 3);
        assert_eq!(arena.live_count(), 0);
    }

    #[test]
    fn test_replace_releases_previous() {
        let released = Arc::new(AtomicUsize::new(0));
        let mut arena = ResourceArena::new();
        let id = arena.insert(Tracked(released.clone()));

        assert!(arena.replace(id, Tracked(released.clone())));
        assert_eq!(released.load(Ordering::SeqCst), 1);
        assert_eq!(arena.live_count(), 1);

        arena.release_all();
        assert!(!arena.replace(id, Tracked(released.clone())));
        assert!(arena.get(id).is_none());
    }

    #[test]
    fn test_drop_releases_remaining() {
        let released = Arc::new(AtomicUsize::new(0));
        {
            let mut arena = ResourceArena::new();
            arena.insert(Tracked(released.clone()));
            arena.insert(Tracked(released.clone()));
        }
        assert_eq!(released.load(Ordering::SeqCst), 2);
    }
}
