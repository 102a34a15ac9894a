use crate::types::{BoundingBox, Detection};
use std::collections::HashMap;

/// Class-aware greedy non-maximum suppression.
#[derive(Debug, Clone, Copy)]
pub struct NonMaxSuppressor {
    iou_threshold: f32,
}

impl NonMaxSuppressor {
    pub fn new(iou_threshold: f32) -> Self {
        Self { iou_threshold }
    }

    pub fn iou_threshold(&self) -> f32 {
        self.iou_threshold
    }

    pub fn suppress(&self, candidates: Vec<Detection>) -> Vec<Detection> {
        suppress(candidates, self.iou_threshold)
    }
}

/// Intersection over union; 0 when both boxes are degenerate
pub fn iou(a: &BoundingBox, b: &BoundingBox) -> f32 {
    let intersection = a.intersection_area(b);
    let union = a.area() + b.area() - intersection;

    if union <= 0.0 {
        0.0
    } else {
        intersection / union
    }
}

/// Remove duplicates of the same object, one label at a time.
///
/// Within a label, candidates are visited by descending confidence (ties keep
/// their input order) and anything overlapping an already kept box by more
/// than `iou_threshold` is dropped. Labels never suppress each other. Output
/// is grouped by label in order of first appearance.
pub fn suppress(candidates: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut partitions: Vec<Vec<Detection>> = Vec::new();

    for det in candidates {
        let slot = *index.entry(det.label.clone()).or_insert_with(|| {
            partitions.push(Vec::new());
            partitions.len() - 1
        });
        partitions[slot].push(det);
    }

    let mut kept = Vec::new();
    for mut partition in partitions {
        // sort_by is stable
        partition.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        kept.extend(suppress_partition(partition, iou_threshold));
    }

    kept
}

fn suppress_partition(sorted: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    let mut suppressed = vec![false; sorted.len()];

    for i in 0..sorted.len() {
        if suppressed[i] {
            continue;
        }
        for j in (i + 1)..sorted.len() {
            if !suppressed[j] && iou(&sorted[i].bbox, &sorted[j].bbox) > iou_threshold {
                suppressed[j] = true;
            }
        }
    }

    sorted
        .into_iter()
        .zip(suppressed)
        .filter_map(|(det, gone)| (!gone).then_some(det))
        .collect()
}

/// Keep the `max` most confident detections, most confident first
pub fn limit_detections(mut detections: Vec<Detection>, max: usize) -> Vec<Detection> {
    detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    detections.truncate(max);
    detections
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(label: &str, confidence: f32, bbox: BoundingBox) -> Detection {
        Detection {
            label: label.to_string(),
            confidence,
            bbox,
        }
    }

    /// Two 10x10 boxes; the second is shifted right by `dx`
    fn pair_with_shift(dx: f32) -> (BoundingBox, BoundingBox) {
        (
            BoundingBox::new(0.0, 0.0, 10.0, 10.0),
            BoundingBox::new(dx, 0.0, 10.0 + dx, 10.0),
        )
    }

    #[test]
    fn test_iou_identical_and_disjoint() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        assert!((iou(&a, &a) - 1.0).abs() < 1e-6);

        let far = BoundingBox::new(20.0, 20.0, 30.0, 30.0);
        assert_eq!(iou(&a, &far), 0.0);
    }

    #[test]
    fn test_iou_known_values() {
        // Shift by 1: intersection 90, union 110 -> ~0.818
        let (a, b) = pair_with_shift(1.0);
        assert!((iou(&a, &b) - 90.0 / 110.0).abs() < 1e-6);

        // Shift by 5: intersection 50, union 150 -> 1/3
        let (a, b) = pair_with_shift(5.0);
        assert!((iou(&a, &b) - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_iou_degenerate_boxes() {
        let point = BoundingBox::new(5.0, 5.0, 5.0, 5.0);
        assert_eq!(iou(&point, &point), 0.0);
    }

    /// IoU ~0.9, same class, threshold 0.5: only the more confident box survives
    #[test]
    fn test_same_class_high_overlap_collapses() {
        // Shift 10/19: intersection 9.4737*10, union 10.5263*10 -> 0.9
        let (a, b) = pair_with_shift(10.0 / 19.0);
        assert!((iou(&a, &b) - 0.9).abs() < 1e-4);

        let kept = suppress(vec![det("dog", 0.6, a), det("dog", 0.8, b)], 0.5);

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].confidence, 0.8);
        assert_eq!(kept[0].bbox, b);
    }

    /// IoU ~0.9, different classes: both survive
    #[test]
    fn test_different_classes_never_suppress() {
        let (a, b) = pair_with_shift(10.0 / 19.0);

        let kept = suppress(vec![det("dog", 0.8, a), det("cat", 0.7, b)], 0.5);

        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].label, "dog");
        assert_eq!(kept[1].label, "cat");
    }

    /// IoU ~0.3, same class, threshold 0.5: both survive
    #[test]
    fn test_same_class_low_overlap_survives() {
        // Shift 10 * 7/13: intersection 46.15, union 153.85 -> 0.3
        let (a, b) = pair_with_shift(70.0 / 13.0);
        assert!((iou(&a, &b) - 0.3).abs() < 1e-4);

        let kept = suppress(vec![det("dog", 0.9, a), det("dog", 0.8, b)], 0.5);
        assert_eq!(kept.len(), 2);
    }

    /// IoU exactly at the threshold is kept (strict `>`)
    #[test]
    fn test_overlap_equal_to_threshold_survives() {
        let (a, b) = pair_with_shift(5.0);
        let threshold = iou(&a, &b);

        let kept = suppress(vec![det("dog", 0.9, a), det("dog", 0.8, b)], threshold);
        assert_eq!(kept.len(), 2);
    }

    /// A suppressed box cannot suppress others
    #[test]
    fn test_chain_suppression_uses_kept_boxes_only() {
        // a overlaps b heavily, b overlaps c heavily, a and c barely touch
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(3.0, 0.0, 13.0, 10.0);
        let c = BoundingBox::new(6.0, 0.0, 16.0, 10.0);
        assert!(iou(&a, &b) > 0.5);
        assert!(iou(&b, &c) > 0.5);
        assert!(iou(&a, &c) < 0.5);

        let kept = suppress(
            vec![det("car", 0.9, a), det("car", 0.8, b), det("car", 0.7, c)],
            0.5,
        );

        let confidences: Vec<f32> = kept.iter().map(|d| d.confidence).collect();
        assert_eq!(confidences, vec![0.9, 0.7]);
    }

    /// Equal confidences: the earlier candidate wins
    #[test]
    fn test_ties_keep_insertion_order() {
        let (a, b) = pair_with_shift(1.0);

        let first = det("person", 0.75, a);
        let second = det("person", 0.75, b);

        let kept = suppress(vec![first.clone(), second.clone()], 0.5);
        assert_eq!(kept, vec![first.clone()]);

        let kept = suppress(vec![second.clone(), first], 0.5);
        assert_eq!(kept, vec![second]);
    }

    #[test]
    fn test_suppression_is_idempotent() {
        let (a, b) = pair_with_shift(1.0);
        let (c, d) = pair_with_shift(6.0);
        let candidates = vec![
            det("dog", 0.9, a),
            det("dog", 0.85, b),
            det("cat", 0.6, c),
            det("cat", 0.7, d),
            det("dog", 0.4, BoundingBox::new(50.0, 50.0, 60.0, 60.0)),
        ];

        let once = suppress(candidates, 0.5);
        let twice = suppress(once.clone(), 0.5);

        assert_eq!(once, twice);
        assert_eq!(once.len(), 4);
    }

    #[test]
    fn test_empty_input() {
        assert!(suppress(Vec::new(), 0.5).is_empty());
    }

    #[test]
    fn test_suppressor_uses_configured_threshold() {
        let (a, b) = pair_with_shift(5.0); // IoU 1/3

        let strict = NonMaxSuppressor::new(0.2);
        assert_eq!(
            strict
                .suppress(vec![det("dog", 0.9, a), det("dog", 0.8, b)])
                .len(),
            1
        );

        let lenient = NonMaxSuppressor::new(0.5);
        assert_eq!(
            lenient
                .suppress(vec![det("dog", 0.9, a), det("dog", 0.8, b)])
                .len(),
            2
        );
    }

    #[test]
    fn test_limit_detections_keeps_most_confident() {
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        let detections = vec![
            det("a", 0.3, bbox),
            det("b", 0.9, bbox),
            det("c", 0.6, bbox),
        ];

        let limited = limit_detections(detections, 2);
        let labels: Vec<&str> = limited.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, vec!["b", "c"]);
    }
}
