use crate::error::CoreError;
use crate::structs::Bar;
use serde::Serialize;

/// An ordered run of bars, oldest first, with strictly increasing timestamps.
///
/// The only way to build one is [`CandleSeries::new`], so every series in the
/// system has already passed the ordering check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandleSeries {
    bars: Vec<Bar>,
}

impl CandleSeries {
    /// Validates the ordering of `bars` and wraps them.
    pub fn new(bars: Vec<Bar>) -> Result<Self, CoreError> {
        if let Some(index) = bars
            .windows(2)
            .position(|pair| pair[1].timestamp <= pair[0].timestamp)
        {
            return Err(CoreError::NonMonotonicTimestamp { index: index + 1 });
        }
        Ok(Self { bars })
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// The trailing `count` bars, or the whole series if it is shorter.
    pub fn tail(&self, count: usize) -> &[Bar] {
        &self.bars[self.bars.len().saturating_sub(count)..]
    }

    /// A new series holding the first `len` bars. Ordering is inherited.
    pub fn prefix(&self, len: usize) -> Self {
        Self {
            bars: self.bars[..len.min(self.bars.len())].to_vec(),
        }
    }
}

impl<'a> IntoIterator for &'a CandleSeries {
    type Item = &'a Bar;
    type IntoIter = std::slice::Iter<'a, Bar>;

    fn into_iter(self) -> Self::IntoIter {
        self.bars.iter()
    }
}
