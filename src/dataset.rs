use std::collections::VecDeque;

use log::debug;

pub const DEFAULT_NAME: &str = "Untitled";

/// Most recent (x, y) samples, oldest first, capped at `max_points`.
pub struct Dataset {
    name: String,
    points: VecDeque<(f64, f64)>,
    max_points: usize,
}

impl Dataset {
    pub fn new(max_points: usize) -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            points: VecDeque::with_capacity(max_points.min(1 << 16)),
            max_points,
        }
    }

    pub fn add_point(&mut self, x: f64, y: f64) {
        self.points.push_back((x, y));
        if self.points.len() > self.max_points {
            self.points.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last_point(&self) -> Option<(f64, f64)> {
        self.points.back().copied()
    }

    pub fn x_values(&self) -> Vec<f64> {
        self.points.iter().map(|&(x, _)| x).collect()
    }

    pub fn y_values(&self) -> Vec<f64> {
        self.points.iter().map(|&(_, y)| y).collect()
    }

    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.points.iter().copied()
    }

    pub fn max_points(&self) -> usize {
        self.max_points
    }

    /// Shrinking drops the oldest points right away.
    pub fn set_max_points(&mut self, max_points: usize) {
        self.max_points = max_points;
        if self.points.len() > max_points {
            let excess = self.points.len() - max_points;
            self.points.drain(..excess);
            debug!("Dataset truncated by {excess} points to new capacity {max_points}");
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_most_recent_points_in_order() {
        let mut dataset = Dataset::new(10);
        for i in 0..25 {
            dataset.add_point(i as f64, (i * 2) as f64);
            assert!(dataset.point_count() <= 10);
        }
        let expected: Vec<f64> = (15..25).map(|i| i as f64).collect();
        assert_eq!(dataset.x_values(), expected);
        assert_eq!(dataset.y_values(), expected.iter().map(|x| x * 2.0).collect::<Vec<_>>());
        assert_eq!(dataset.last_point(), Some((24.0, 48.0)));
    }

    #[test]
    fn below_capacity_keeps_everything() {
        let mut dataset = Dataset::new(10);
        dataset.add_point(0.1, 1.1);
        dataset.add_point(0.2, 2.2);
        assert_eq!(dataset.points().collect::<Vec<_>>(), vec![(0.1, 1.1), (0.2, 2.2)]);
    }

    #[test]
    fn clear_empties() {
        let mut dataset = Dataset::new(10);
        dataset.add_point(1.0, 1.0);
        dataset.clear();
        assert!(dataset.is_empty());
        assert_eq!(dataset.last_point(), None);
        assert!(dataset.x_values().is_empty());
    }

    #[test]
    fn shrinking_capacity_truncates_oldest() {
        let mut dataset = Dataset::new(20);
        for i in 0..20 {
            dataset.add_point(i as f64, 0.0);
        }
        dataset.set_max_points(12);
        assert_eq!(dataset.point_count(), 12);
        assert_eq!(dataset.x_values().first(), Some(&8.0));

        dataset.set_max_points(50);
        dataset.add_point(20.0, 0.0);
        assert_eq!(dataset.point_count(), 13);
    }

    #[test]
    fn name_defaults_to_untitled() {
        let mut dataset = Dataset::new(10);
        assert_eq!(dataset.name(), DEFAULT_NAME);
        dataset.set_name("run 1");
        assert_eq!(dataset.name(), "run 1");
    }
}
