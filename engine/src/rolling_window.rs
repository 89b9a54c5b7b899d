use std::collections::VecDeque;

/// Mean and sample standard deviation of a full window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Band {
    pub mean: f64,
    pub std_dev: f64,
}

/// Trailing window over the last `capacity` prices.
///
/// Statistics are only defined once the window is full, mirroring a
/// `rolling(window)` that yields nothing during warm-up.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    values: VecDeque<f64>,
    capacity: usize,
}

impl RollingWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, value: f64) {
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    pub fn is_full(&self) -> bool {
        self.values.len() == self.capacity
    }

    pub fn mean(&self) -> Option<f64> {
        if !self.is_full() {
            return None;
        }
        Some(self.values.iter().sum::<f64>() / self.capacity as f64)
    }

    /// Sample (n - 1) standard deviation. Undefined for a one-value window.
    pub fn std_dev(&self) -> Option<f64> {
        let mean = self.mean()?;
        if self.capacity < 2 {
            return None;
        }
        let sum_sq: f64 = self.values.iter().map(|v| (v - mean).powi(2)).sum();
        Some((sum_sq / (self.capacity - 1) as f64).sqrt())
    }

    pub fn band(&self) -> Option<Band> {
        Some(Band {
            mean: self.mean()?,
            std_dev: self.std_dev()?,
        })
    }

    pub fn latest(&self) -> Option<f64> {
        self.values.back().copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_are_undefined_until_full() {
        let mut w = RollingWindow::new(3);
        w.push(1.0);
        w.push(2.0);
        assert!(w.mean().is_none());
        assert!(w.band().is_none());

        w.push(3.0);
        assert_eq!(w.mean(), Some(2.0));
        assert_eq!(w.std_dev(), Some(1.0));
    }

    #[test]
    fn oldest_value_is_evicted() {
        let mut w = RollingWindow::new(3);
        for v in [1.0, 2.0, 3.0, 10.0] {
            w.push(v);
        }
        assert_eq!(w.len(), 3);
        assert_eq!(w.mean(), Some(5.0));
        assert_eq!(w.latest(), Some(10.0));
    }

    #[test]
    fn std_dev_uses_sample_denominator() {
        let mut w = RollingWindow::new(4);
        for v in [2.0, 4.0, 4.0, 6.0] {
            w.push(v);
        }
        // deviations 4+0+0+4 = 8, / (4 - 1)
        let expected = (8.0f64 / 3.0).sqrt();
        assert!((w.std_dev().unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn constant_window_has_zero_spread() {
        let mut w = RollingWindow::new(5);
        for _ in 0..5 {
            w.push(100.0);
        }
        assert_eq!(
            w.band(),
            Some(Band {
                mean: 100.0,
                std_dev: 0.0
            })
        );
    }

    #[test]
    fn single_slot_window_has_no_std_dev() {
        let mut w = RollingWindow::new(1);
        w.push(4.0);
        assert_eq!(w.mean(), Some(4.0));
        assert!(w.std_dev().is_none());
    }

    #[test]
    fn clear_resets_state() {
        let mut w = RollingWindow::new(2);
        w.push(1.0);
        w.push(2.0);
        w.clear();
        assert!(w.is_empty());
        assert!(!w.is_full());
    }
}
