use skiros_model::{Result, SkirosError};

/// Allocates task uids, reusing released ones before growing the counter.
///
/// Never re-issues a uid while it is still live: `release` is only ever
/// called once a task has actually left the registry.
#[derive(Debug, Default)]
pub struct IdGen {
    next: i32,
    released: Vec<i32>,
}

impl IdGen {
    pub fn new() -> Self {
        IdGen::default()
    }

    pub fn alloc(&mut self) -> Result<i32> {
        if let Some(id) = self.released.pop() {
            return Ok(id);
        }
        let id = self.next;
        self.next = self
            .next
            .checked_add(1)
            .ok_or_else(|| SkirosError::InternalInvariant("task uid space exhausted".to_string()))?;
        Ok(id)
    }

    pub fn release(&mut self, id: i32) {
        self.released.push(id);
    }

    /// Marks `id` as live without handing it out: drops it from the
    /// released pool and, if it falls at or above the growth counter, bumps
    /// the counter past it. Used when a caller supplies its own uid, so a
    /// later `alloc` can never re-issue it.
    pub fn reserve(&mut self, id: i32) {
        self.released.retain(|&released| released != id);
        if id >= self.next {
            self.next = id + 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reuses_released_ids_before_growing() {
        let mut gen = IdGen::new();
        let a = gen.alloc().unwrap();
        let b = gen.alloc().unwrap();
        assert_ne!(a, b);
        gen.release(a);
        assert_eq!(gen.alloc().unwrap(), a);
    }

    #[test]
    fn never_reissues_a_live_id() {
        let mut gen = IdGen::new();
        let live: Vec<i32> = (0..5).map(|_| gen.alloc().unwrap()).collect();
        let fresh = gen.alloc().unwrap();
        assert!(!live.contains(&fresh));
    }

    #[test]
    fn reserve_bumps_the_counter_past_a_caller_supplied_id() {
        let mut gen = IdGen::new();
        gen.reserve(5);
        for _ in 0..10 {
            assert_ne!(gen.alloc().unwrap(), 5);
        }
    }

    #[test]
    fn reserve_drops_the_id_from_the_released_pool() {
        let mut gen = IdGen::new();
        let a = gen.alloc().unwrap();
        gen.release(a);
        gen.reserve(a);
        assert_ne!(gen.alloc().unwrap(), a);
    }
}
