use rand::{rngs::StdRng, Rng};

/// Iterator adapter that approximates a uniform shuffle with bounded memory.
///
/// A buffer of up to `capacity` elements is filled from the source. Each
/// step emits a uniformly random buffer slot and refills it from the source
/// while elements remain; once the source is exhausted the buffer drains in
/// random order. A capacity of at least the source length yields an exact
/// uniform permutation; a capacity of 1 preserves the source order.
///
/// The adapter is single-consumption, like any iterator; a fresh pass is a
/// fresh adapter over the source.
pub struct ReservoirShuffle<I: Iterator> {
    source: I,
    buffer: Vec<I::Item>,
    rng: StdRng,
}

impl<I: Iterator> ReservoirShuffle<I> {
    pub fn new(mut source: I, capacity: usize, rng: StdRng) -> Self {
        let capacity = capacity.max(1);
        let mut buffer = Vec::with_capacity(capacity);
        while buffer.len() < capacity {
            match source.next() {
                Some(item) => buffer.push(item),
                None => break,
            }
        }

        Self { source, buffer, rng }
    }
}

impl<I: Iterator> Iterator for ReservoirShuffle<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() {
            return None;
        }

        let slot = self.rng.gen_range(0..self.buffer.len());
        match self.source.next() {
            Some(incoming) => Some(std::mem::replace(&mut self.buffer[slot], incoming)),
            None => Some(self.buffer.swap_remove(slot)),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let (lower, upper) = self.source.size_hint();
        (
            lower + self.buffer.len(),
            upper.map(|u| u + self.buffer.len()),
        )
    }
}

/// Shuffle `items` through a bounded buffer, then split off a validation
/// prefix of `validation_count` elements; the remainder is the training set.
pub fn shuffle_split<T>(
    items: Vec<T>,
    buffer_capacity: usize,
    validation_count: usize,
    rng: StdRng,
) -> (Vec<T>, Vec<T>) {
    let mut shuffled = ReservoirShuffle::new(items.into_iter(), buffer_capacity, rng);
    let validation: Vec<T> = shuffled.by_ref().take(validation_count).collect();
    let train: Vec<T> = shuffled.collect();
    (train, validation)
}
