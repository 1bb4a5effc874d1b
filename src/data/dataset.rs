use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::error::{NetworkError, Result};

/// One training or test example: an input vector and its expected output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSetItem {
    input: Vec<f32>,
    target: Vec<f32>,
}

impl DataSetItem {
    pub fn new(input: Vec<f32>, target: Vec<f32>) -> DataSetItem {
        DataSetItem { input, target }
    }

    pub fn input(&self) -> &[f32] {
        &self.input
    }

    pub fn target(&self) -> &[f32] {
        &self.target
    }
}

/// An in-memory collection of items sharing one input length and one target
/// length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataSet {
    input_len: usize,
    target_len: usize,
    items: Vec<DataSetItem>,
}

impl DataSet {
    pub fn new(input_len: usize, target_len: usize) -> DataSet {
        DataSet { input_len, target_len, items: vec![] }
    }

    /// Builds a data set from parallel input and target rows.
    pub fn from_rows(inputs: &[Vec<f32>], targets: &[Vec<f32>]) -> Result<DataSet> {
        if inputs.len() != targets.len() {
            return Err(NetworkError::ShapeMismatch { expected: inputs.len(), got: targets.len() });
        }
        let input_len = inputs.first().map_or(0, Vec::len);
        let target_len = targets.first().map_or(0, Vec::len);
        let mut set = DataSet::new(input_len, target_len);
        for (input, target) in inputs.iter().zip(targets) {
            set.add(DataSetItem::new(input.clone(), target.clone()))?;
        }
        Ok(set)
    }

    /// Appends `item`, rejecting it if its lengths differ from the set's.
    pub fn add(&mut self, item: DataSetItem) -> Result<()> {
        if item.input.len() != self.input_len {
            return Err(NetworkError::ShapeMismatch { expected: self.input_len, got: item.input.len() });
        }
        if item.target.len() != self.target_len {
            return Err(NetworkError::ShapeMismatch { expected: self.target_len, got: item.target.len() });
        }
        self.items.push(item);
        Ok(())
    }

    pub fn input_len(&self) -> usize {
        self.input_len
    }

    pub fn target_len(&self) -> usize {
        self.target_len
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&DataSetItem> {
        self.items.get(idx)
    }

    pub fn items(&self) -> &[DataSetItem] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DataSetItem> {
        self.items.iter()
    }

    pub fn shuffle<R: Rng>(&mut self, rng: &mut R) {
        self.items.shuffle(rng);
    }

    /// Splits into two sets; the first holds `round(len * fraction)` items.
    pub fn split(&self, fraction: f32) -> Result<(DataSet, DataSet)> {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(NetworkError::Config(format!("split fraction {fraction} is outside [0, 1]")));
        }
        let at = (self.items.len() as f32 * fraction).round() as usize;
        let (head, tail) = self.items.split_at(at.min(self.items.len()));
        let part = |items: &[DataSetItem]| DataSet {
            input_len: self.input_len,
            target_len: self.target_len,
            items: items.to_vec(),
        };
        Ok((part(head), part(tail)))
    }
}

impl<'a> IntoIterator for &'a DataSet {
    type Item = &'a DataSetItem;
    type IntoIter = std::slice::Iter<'a, DataSetItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::init::seeded_rng;

    fn numbered(n: usize) -> DataSet {
        let mut set = DataSet::new(1, 1);
        for i in 0..n {
            set.add(DataSetItem::new(vec![i as f32], vec![0.0])).unwrap();
        }
        set
    }

    #[test]
    fn add_checks_lengths() {
        let mut set = DataSet::new(2, 1);
        assert!(set.add(DataSetItem::new(vec![1.0, 2.0], vec![1.0])).is_ok());
        assert!(matches!(
            set.add(DataSetItem::new(vec![1.0], vec![1.0])),
            Err(NetworkError::ShapeMismatch { expected: 2, got: 1 })
        ));
        assert!(set.add(DataSetItem::new(vec![1.0, 2.0], vec![])).is_err());
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn split_keeps_order() {
        let (train, test) = numbered(10).split(0.7).unwrap();
        assert_eq!(train.len(), 7);
        assert_eq!(test.len(), 3);
        assert_eq!(test.get(0).unwrap().input(), &[7.0]);
        assert!(numbered(3).split(1.5).is_err());
    }

    #[test]
    fn seeded_shuffle_is_repeatable() {
        let mut a = numbered(20);
        let mut b = numbered(20);
        a.shuffle(&mut seeded_rng(Some(9)));
        b.shuffle(&mut seeded_rng(Some(9)));
        assert_eq!(a, b);
        assert_ne!(a, numbered(20));
    }
}
