use std::fmt;

use serde::{Serialize, Deserialize};

use crate::data::dataset::DataSet;
use crate::error::{NetworkError, Result};
use crate::eval::evaluator::Evaluator;
use crate::network::network::Network;

/// Counts of (actual, predicted) class pairs; rows are actual classes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    labels: Vec<String>,
    counts: Vec<usize>,
}

impl ConfusionMatrix {
    pub fn new(labels: Vec<String>) -> ConfusionMatrix {
        let n = labels.len();
        ConfusionMatrix { labels, counts: vec![0; n * n] }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn classes(&self) -> usize {
        self.labels.len()
    }

    pub fn inc(&mut self, actual: usize, predicted: usize) {
        let n = self.classes();
        self.counts[actual * n + predicted] += 1;
    }

    pub fn get(&self, actual: usize, predicted: usize) -> usize {
        self.counts[actual * self.classes() + predicted]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    pub fn true_positives(&self, class: usize) -> usize {
        self.get(class, class)
    }

    pub fn false_positives(&self, class: usize) -> usize {
        (0..self.classes()).map(|a| self.get(a, class)).sum::<usize>() - self.true_positives(class)
    }

    pub fn false_negatives(&self, class: usize) -> usize {
        (0..self.classes()).map(|p| self.get(class, p)).sum::<usize>() - self.true_positives(class)
    }

    pub fn true_negatives(&self, class: usize) -> usize {
        self.total() - self.true_positives(class) - self.false_positives(class) - self.false_negatives(class)
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.labels.iter().map(String::len).max().unwrap_or(0).max(6);
        write!(f, "{:>width$}", "")?;
        for label in &self.labels {
            write!(f, " {label:>width$}")?;
        }
        writeln!(f)?;
        for (a, label) in self.labels.iter().enumerate() {
            write!(f, "{label:>width$}")?;
            for p in 0..self.classes() {
                write!(f, " {:>width$}", self.get(a, p))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// One-vs-rest metrics for a single class, or their macro average.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub accuracy: f32,
    pub precision: f32,
    pub recall: f32,
    pub f1: f32,
}

impl ClassMetrics {
    fn for_class(matrix: &ConfusionMatrix, class: usize) -> ClassMetrics {
        let tp = matrix.true_positives(class) as f32;
        let fp = matrix.false_positives(class) as f32;
        let fn_ = matrix.false_negatives(class) as f32;
        let tn = matrix.true_negatives(class) as f32;

        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fn_);
        ClassMetrics {
            accuracy: ratio(tp + tn, tp + tn + fp + fn_),
            precision,
            recall,
            f1: ratio(2.0 * precision * recall, precision + recall),
        }
    }
}

/// Zero when the denominator is zero, e.g. precision of a never-predicted class.
fn ratio(num: f32, den: f32) -> f32 {
    if den == 0.0 { 0.0 } else { num / den }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub confusion: ConfusionMatrix,
    pub per_class: Vec<ClassMetrics>,
    pub macro_average: ClassMetrics,
    /// Fraction of items whose predicted class is the actual class.
    pub accuracy: f32,
}

impl ClassificationMetrics {
    pub fn from_confusion(confusion: ConfusionMatrix) -> ClassificationMetrics {
        let per_class: Vec<ClassMetrics> =
            (0..confusion.classes()).map(|c| ClassMetrics::for_class(&confusion, c)).collect();

        let n = per_class.len() as f32;
        let mut macro_average = ClassMetrics::default();
        for m in &per_class {
            macro_average.accuracy += m.accuracy / n;
            macro_average.precision += m.precision / n;
            macro_average.recall += m.recall / n;
            macro_average.f1 += m.f1 / n;
        }

        let correct: usize = (0..confusion.classes()).map(|c| confusion.true_positives(c)).sum();
        let accuracy = ratio(correct as f32, confusion.total() as f32);

        ClassificationMetrics { confusion, per_class, macro_average, accuracy }
    }
}

/// Classifies each output vector: a single output is a binary decision at
/// `threshold`, several outputs pick the largest (first wins ties).
#[derive(Debug, Clone, Copy)]
pub struct ClassifierEvaluator {
    pub threshold: f32,
}

impl ClassifierEvaluator {
    pub fn new() -> ClassifierEvaluator {
        ClassifierEvaluator { threshold: 0.5 }
    }

    pub fn class_of(&self, values: &[f32]) -> usize {
        if values.len() == 1 {
            return usize::from(values[0] >= self.threshold);
        }
        argmax(values)
    }
}

impl Default for ClassifierEvaluator {
    fn default() -> Self {
        ClassifierEvaluator::new()
    }
}

impl Evaluator for ClassifierEvaluator {
    type Metrics = ClassificationMetrics;

    fn evaluate(&self, network: &mut Network, test_set: &DataSet) -> Result<ClassificationMetrics> {
        if test_set.target_len() != network.output().len() {
            return Err(NetworkError::ShapeMismatch {
                expected: network.output().len(),
                got: test_set.target_len(),
            });
        }

        let labels = network.output_layer().labels();
        let labels = if labels.len() == 1 {
            vec![format!("not {}", labels[0]), labels[0].clone()]
        } else {
            labels.to_vec()
        };

        let mut confusion = ConfusionMatrix::new(labels);
        for item in test_set {
            let output = network.predict(item.input())?;
            confusion.inc(self.class_of(item.target()), self.class_of(&output));
        }
        Ok(ClassificationMetrics::from_confusion(confusion))
    }
}

/// Index of the maximum element in a slice.
fn argmax(v: &[f32]) -> usize {
    let mut best = 0;
    for (i, x) in v.iter().enumerate() {
        if *x > v[best] {
            best = i;
        }
    }
    best
}
