use std::collections::VecDeque;

use crate::domain::TrendPoint;

/// Number of chart samples kept by default.
pub const TREND_CAPACITY: usize = 20;

/// Bounded chronological history of chart samples. Oldest samples are evicted first.
#[derive(Debug, Clone)]
pub struct TrendBuffer {
    points: VecDeque<TrendPoint>,
    capacity: usize,
}

impl Default for TrendBuffer {
    fn default() -> Self {
        Self::with_capacity(TREND_CAPACITY)
    }
}

impl TrendBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A capacity of zero is raised to one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { points: VecDeque::with_capacity(capacity), capacity }
    }

    pub fn append(&mut self, point: TrendPoint) {
        self.points.push_back(point);
        while self.points.len() > self.capacity {
            self.points.pop_front();
        }
    }

    /// Owned copy in chronological order.
    pub fn snapshot(&self) -> Vec<TrendPoint> {
        self.points.iter().cloned().collect()
    }

    pub fn latest(&self) -> Option<&TrendPoint> {
        self.points.back()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
