//! Held-out evaluation of a fitted forest.

use std::fmt;

use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

use super::forest::{RandomForestModel, argmax};
use super::metrics::{
    ConfusionMatrix, PerClassStats, accuracy, macro_average, precision_recall_by_class,
    weighted_average,
};

/// Class names used in reports, indexed by label.
pub const RAINFALL_CLASSES: [&str; 2] = ["No Rain", "Rain"];

/// Per-class row of a classification report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassReport {
    pub class_name: String,
    #[serde(flatten)]
    pub stats: PerClassStats,
}

/// Serialized metrics snapshot for a test partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub accuracy: f64,
    pub per_class: Vec<ClassReport>,
    pub macro_avg: PerClassStats,
    pub weighted_avg: PerClassStats,
    pub confusion: ConfusionMatrix,
    /// `(feature name, importance)` pairs sorted by decreasing importance.
    pub feature_importances: Vec<(String, f64)>,
}

/// Score `model` on standardized rows `x` with true labels `y`.
///
/// `class_names[i]` labels class `i`; missing names fall back to the index.
/// `feature_names` must follow the model's feature order.
pub fn evaluate(
    model: &RandomForestModel,
    x: ArrayView2<'_, f64>,
    y: &[usize],
    class_names: &[&str],
    feature_names: &[&str],
) -> EvaluationReport {
    let mut cm = ConfusionMatrix::new(model.n_classes);
    for (row, &truth) in x.rows().into_iter().zip(y) {
        let features = row.to_vec();
        let predicted = argmax(&model.predict_proba(&features));
        cm.add(truth, predicted);
    }
    let stats = precision_recall_by_class(&cm);
    let per_class = stats
        .iter()
        .enumerate()
        .map(|(idx, stats)| ClassReport {
            class_name: class_names
                .get(idx)
                .map(|name| name.to_string())
                .unwrap_or_else(|| idx.to_string()),
            stats: stats.clone(),
        })
        .collect();

    let mut feature_importances: Vec<(String, f64)> = feature_names
        .iter()
        .zip(&model.feature_importances)
        .map(|(name, &importance)| (name.to_string(), importance))
        .collect();
    feature_importances.sort_by(|a, b| b.1.total_cmp(&a.1));

    EvaluationReport {
        accuracy: accuracy(&cm),
        macro_avg: macro_average(&stats),
        weighted_avg: weighted_average(&stats),
        per_class,
        confusion: cm,
        feature_importances,
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "test accuracy: {:.4}", self.accuracy)?;
        writeln!(
            f,
            "{:<14} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        let rows = self
            .per_class
            .iter()
            .map(|row| (row.class_name.as_str(), &row.stats))
            .chain([
                ("macro avg", &self.macro_avg),
                ("weighted avg", &self.weighted_avg),
            ]);
        for (name, stats) in rows {
            writeln!(
                f,
                "{:<14} {:>9.3} {:>9.3} {:>9.3} {:>9}",
                name, stats.precision, stats.recall, stats.f1, stats.support
            )?;
        }
        write!(f, "{}", self.confusion)?;
        writeln!(f, "feature importances:")?;
        for (name, importance) in &self.feature_importances {
            writeln!(f, "  {name:<14} {importance:.4}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::forest::{TrainOptions, train_random_forest};
    use ndarray::array;

    #[test]
    fn perfect_model_scores_one() {
        let x = array![[0.0], [0.1], [0.2], [5.0], [5.1], [5.2]];
        let y = vec![0, 0, 0, 1, 1, 1];
        let options = TrainOptions {
            n_trees: 5,
            bootstrap: false,
            ..TrainOptions::default()
        };
        let model = train_random_forest(x.view(), &y, 2, &options).unwrap();
        let report = evaluate(&model, x.view(), &y, &RAINFALL_CLASSES, &["Humidity"]);
        assert_eq!(report.accuracy, 1.0);
        assert_eq!(report.per_class[1].class_name, "Rain");
        assert_eq!(report.per_class[1].stats.support, 3);
        assert_eq!(report.confusion.get(1, 1), 3);
        assert_eq!(report.feature_importances, vec![("Humidity".to_string(), 1.0)]);
        let text = report.to_string();
        assert!(text.contains("weighted avg"));
        assert!(text.contains("confusion matrix"));
    }
}
