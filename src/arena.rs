//! Append-only node storage.

/// Arena addressed by dense `u32` indices.
///
/// The engine never frees individual nodes: a node that becomes unreachable
/// simply rides along until the arena drops with its network. Indices
/// therefore stay valid for the whole life of the arena, which is what lets
/// dependency edges be rewired in place while other holders keep their
/// handles. Typed wrappers (`PulseId`, `LatchId`) keep indices from crossing
/// between the pulse and latch stores.
pub struct Arena<T> {
    items: Vec<T>,
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
        }
    }

    /// Store `item`, returning its index.
    pub fn alloc(&mut self, item: T) -> u32 {
        let index = self.items.len() as u32;
        self.items.push(item);
        index
    }

    /// Look up by index. Only indices this arena returned from `alloc` are
    /// in bounds.
    pub fn get(&self, index: u32) -> &T {
        &self.items[index as usize]
    }

    pub fn get_mut(&mut self, index: u32) -> &mut T {
        &mut self.items[index as usize]
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &T)> {
        self.items
            .iter()
            .enumerate()
            .map(|(index, item)| (index as u32, item))
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}
