//! # Span Resizers
//!
//! A row grows while values are written. How the backing vector grows is
//! delegated to a [`SpanResizer`] so callers can trade memory for fewer
//! reallocations.
//!
//! | Resizer | Growth |
//! |---------|--------|
//! | [`DefaultSpanResizer`] | `max(minimum, 2 * current)` |
//! | [`MemorySpanResizer`] | starts at a preallocated capacity, grows to exactly `minimum` |
//!
//! A resizer must leave `buffer.len() >= minimum_length` and zero every byte it
//! adds.

use crate::config::DEFAULT_ROW_CAPACITY;

pub trait SpanResizer: Send {
    /// Grows `buffer` to at least `minimum_length` zeroed bytes.
    fn resize(&mut self, minimum_length: usize, buffer: &mut Vec<u8>);

    /// Capacity reserved when a row is created.
    fn initial_capacity(&self) -> usize {
        DEFAULT_ROW_CAPACITY
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultSpanResizer;

impl SpanResizer for DefaultSpanResizer {
    fn resize(&mut self, minimum_length: usize, buffer: &mut Vec<u8>) {
        let target = minimum_length.max(buffer.len() * 2);
        buffer.resize(target, 0);
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MemorySpanResizer {
    initial_capacity: usize,
}

impl MemorySpanResizer {
    pub fn new(initial_capacity: usize) -> Self {
        Self { initial_capacity }
    }
}

impl SpanResizer for MemorySpanResizer {
    fn resize(&mut self, minimum_length: usize, buffer: &mut Vec<u8>) {
        if buffer.len() < minimum_length {
            buffer.reserve_exact(minimum_length - buffer.len());
            buffer.resize(minimum_length, 0);
        }
    }

    fn initial_capacity(&self) -> usize {
        self.initial_capacity
    }
}
