use parking_lot::Mutex;

/// Buffers larger than this are dropped instead of returned to the pool.
const MAX_KEPT_CAPACITY: usize = 1024 * 1024;

/// A bounded free list of output buffers shared by all renders.
#[derive(Debug)]
pub(crate) struct BufferPool {
    free: Mutex<Vec<Vec<u8>>>,
    size: usize,
}

impl BufferPool {
    pub(crate) fn new(size: usize) -> Self {
        Self { free: Mutex::new(Vec::with_capacity(size)), size }
    }

    pub(crate) fn get(&self) -> Vec<u8> {
        self.free.lock().pop().unwrap_or_default()
    }

    pub(crate) fn put(&self, mut buf: Vec<u8>) {
        if buf.capacity() > MAX_KEPT_CAPACITY {
            return;
        }
        buf.clear();
        let mut free = self.free.lock();
        if free.len() < self.size {
            free.push(buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reuses_cleared_buffers() {
        let pool = BufferPool::new(1);
        let mut buf = pool.get();
        buf.extend_from_slice(b"hello");
        let cap = buf.capacity();
        pool.put(buf);

        let again = pool.get();
        assert!(again.is_empty());
        assert_eq!(again.capacity(), cap);
    }

    #[test]
    fn test_bounded() {
        let pool = BufferPool::new(1);
        pool.put(Vec::with_capacity(8));
        pool.put(Vec::with_capacity(8));
        assert_eq!(pool.free.lock().len(), 1);
    }
}
