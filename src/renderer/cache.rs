//! Geometry cache.

use crate::{
    renderer::framework::{
        error::FrameworkError, geometry_buffer::SharedGeometryBuffer,
        server::SharedGraphicsServer,
    },
    scene::mesh::SurfaceData,
};
use fxhash::FxHashMap;

/// Frames an untouched buffer survives before the cache drops it.
const TIME_TO_LIVE_FRAMES: usize = 600;

struct CacheEntry {
    buffer: SharedGeometryBuffer,
    time_to_live: usize,
}

/// Caches uploaded geometry by [`SurfaceData::id`]. Geometry shared between
/// surfaces via `Rc<SurfaceData>` hits the same entry, so each mesh is
/// uploaded to the server exactly once no matter how many surfaces or passes
/// draw it. Entries no pass has touched for [`TIME_TO_LIVE_FRAMES`] frames
/// are evicted by [`update`](Self::update), so streaming scenes do not
/// accumulate dead buffers.
pub struct GeometryCache {
    server: SharedGraphicsServer,
    buffers: FxHashMap<u64, CacheEntry>,
}

impl GeometryCache {
    /// Creates an empty cache bound to a server.
    pub fn new(server: SharedGraphicsServer) -> Self {
        Self {
            server,
            buffers: FxHashMap::default(),
        }
    }

    /// Returns the buffer for the given data, uploading it on first use.
    /// Resets the entry's time to live.
    pub fn get(&mut self, data: &SurfaceData) -> Result<SharedGeometryBuffer, FrameworkError> {
        match self.buffers.entry(data.id()) {
            std::collections::hash_map::Entry::Occupied(entry) => {
                let entry = entry.into_mut();
                entry.time_to_live = TIME_TO_LIVE_FRAMES;
                Ok(entry.buffer.clone())
            }
            std::collections::hash_map::Entry::Vacant(entry) => {
                let buffer = self.server.create_geometry_buffer(data)?;
                Ok(entry
                    .insert(CacheEntry {
                        buffer,
                        time_to_live: TIME_TO_LIVE_FRAMES,
                    })
                    .buffer
                    .clone())
            }
        }
    }

    /// Ages every entry by one frame and drops the ones whose time to live
    /// ran out. Called once per rendered frame.
    pub fn update(&mut self) {
        self.buffers.retain(|_, entry| {
            entry.time_to_live -= 1;
            entry.time_to_live > 0
        });
    }

    /// Number of cached buffers.
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Drops every cached buffer.
    pub fn clear(&mut self) {
        self.buffers.clear();
    }
}

#[cfg(test)]
mod test {
    use super::GeometryCache;
    use crate::{
        renderer::framework::{headless::HeadlessGraphicsServer, server::GraphicsServer},
        scene::mesh::SurfaceData,
    };
    use std::rc::Rc;

    #[test]
    fn test_shared_data_uploads_once() {
        let server = HeadlessGraphicsServer::new();
        let mut cache = GeometryCache::new(Rc::new(server.clone()));

        let data = SurfaceData::make_cube();
        let a = cache.get(&data).unwrap();
        let b = cache.get(&data).unwrap();
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
        assert_eq!(server.alive_resources().geometry_buffers, 1);

        let other = SurfaceData::make_cube();
        cache.get(&other).unwrap();
        assert_eq!(cache.len(), 2);

        cache.clear();
        drop(a);
        drop(b);
        assert_eq!(server.alive_resources().geometry_buffers, 0);
    }

    #[test]
    fn test_untouched_buffers_are_evicted() {
        let server = HeadlessGraphicsServer::new();
        let mut cache = GeometryCache::new(Rc::new(server.clone()));

        let streamed = SurfaceData::make_cube();
        let kept = SurfaceData::make_cube();
        cache.get(&streamed).unwrap();

        for _ in 0..super::TIME_TO_LIVE_FRAMES {
            cache.get(&kept).unwrap();
            cache.update();
        }

        assert_eq!(cache.len(), 1);
        assert_eq!(server.alive_resources().geometry_buffers, 1);
        // The survivor still resolves without a re-upload.
        cache.get(&kept).unwrap();
        assert_eq!(server.alive_resources().geometry_buffers, 1);
    }
}
