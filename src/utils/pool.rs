use crate::decoders::png::PngDecoder;
use crate::utils::error::VexelResult;
use crate::utils::image::DecodedImage;
use crate::utils::options::{DecoderOptions, DEFAULT_SCRATCH_SIZE};
use flate2::Decompress;
use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, PoisonError};

/// Mutable state owned by a single decode: the zlib inflater and the
/// buffer compressed bytes are staged through.
pub struct DecodeResources {
    pub(crate) decompress: Decompress,
    pub(crate) scratch: Vec<u8>,
}

impl DecodeResources {
    pub fn new() -> Self {
        Self::with_scratch_size(DEFAULT_SCRATCH_SIZE)
    }

    pub fn with_scratch_size(size: usize) -> Self {
        DecodeResources {
            decompress: Decompress::new(true),
            scratch: vec![0u8; size.max(1)],
        }
    }

    /// Resizes the staging buffer if it does not match the requested size.
    pub(crate) fn ensure_scratch(&mut self, size: usize) {
        let size = size.max(1);
        if self.scratch.len() != size {
            self.scratch.resize(size, 0);
        }
    }

    pub(crate) fn reset(&mut self) {
        self.decompress.reset(true);
    }
}

impl Default for DecodeResources {
    fn default() -> Self {
        Self::new()
    }
}

/// Set of [`DecodeResources`] shared by concurrent decodes.
///
/// Resources are checked out for the duration of one decode and handed back
/// when the guard is dropped. A pool that runs dry allocates fresh resources.
pub struct ResourcePool {
    options: DecoderOptions,
    free: Mutex<Vec<DecodeResources>>,
}

impl ResourcePool {
    pub fn new() -> Self {
        Self::with_options(DecoderOptions::default())
    }

    pub fn with_options(options: DecoderOptions) -> Self {
        ResourcePool {
            options,
            free: Mutex::new(Vec::new()),
        }
    }

    pub fn options(&self) -> &DecoderOptions {
        &self.options
    }

    /// Takes a set of resources out of the pool.
    pub fn acquire(&self) -> PooledResources<'_> {
        let resources = self
            .free
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop()
            .unwrap_or_else(|| DecodeResources::with_scratch_size(self.options.get_scratch_size()));

        PooledResources {
            pool: self,
            resources: Some(resources),
        }
    }

    /// Number of idle resource sets currently held.
    pub fn idle(&self) -> usize {
        self.free.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Decodes `data` with the pool's options and a pooled resource set.
    pub fn decode(&self, data: &[u8]) -> VexelResult<DecodedImage> {
        let mut resources = self.acquire();

        PngDecoder::new(data)
            .with_options(self.options)
            .decode_with(&mut resources)
    }

    fn release(&self, mut resources: DecodeResources) {
        resources.reset();
        self.free
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(resources);
    }
}

impl Default for ResourcePool {
    fn default() -> Self {
        Self::new()
    }
}

/// Resources borrowed from a [`ResourcePool`], returned on drop.
pub struct PooledResources<'a> {
    pool: &'a ResourcePool,
    resources: Option<DecodeResources>,
}

impl Deref for PooledResources<'_> {
    type Target = DecodeResources;

    fn deref(&self) -> &DecodeResources {
        match &self.resources {
            Some(resources) => resources,
            None => unreachable!("resources are only taken on drop"),
        }
    }
}

impl DerefMut for PooledResources<'_> {
    fn deref_mut(&mut self) -> &mut DecodeResources {
        match &mut self.resources {
            Some(resources) => resources,
            None => unreachable!("resources are only taken on drop"),
        }
    }
}

impl Drop for PooledResources<'_> {
    fn drop(&mut self) {
        if let Some(resources) = self.resources.take() {
            self.pool.release(resources);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_returns_resources() {
        let pool = ResourcePool::new();
        assert_eq!(pool.idle(), 0);

        {
            let first = pool.acquire();
            let second = pool.acquire();
            assert_eq!(first.scratch.len(), DEFAULT_SCRATCH_SIZE);
            assert_eq!(second.scratch.len(), DEFAULT_SCRATCH_SIZE);
        }

        assert_eq!(pool.idle(), 2);

        let _reused = pool.acquire();
        assert_eq!(pool.idle(), 1);
    }

    #[test]
    fn scratch_follows_options() {
        let pool = ResourcePool::with_options(DecoderOptions::default().set_scratch_size(64));
        assert_eq!(pool.acquire().scratch.len(), 64);

        let mut resources = DecodeResources::new();
        resources.ensure_scratch(16);
        assert_eq!(resources.scratch.len(), 16);
    }
}
