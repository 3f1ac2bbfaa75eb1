// Flattens a frame's landmarks into the classifier feature layout

use crate::models::pose::LandmarkSet;
use crate::models::sample::FeatureVector;

/// `[x0, y0, z0, v0, x1, y1, ...]`, or `None` when no pose was detected
pub fn vectorize(landmarks: Option<&LandmarkSet>) -> Option<FeatureVector> {
    let set = landmarks?;
    Some(set.landmarks.iter().flat_map(|l| l.to_array()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::pose::{Landmark, POSE_LANDMARK_COUNT};

    #[test]
    fn test_absent_pose_yields_none() {
        assert_eq!(vectorize(None), None);
    }

    #[test]
    fn test_flatten_order() {
        let set = LandmarkSet::new(vec![
            Landmark::new(0.1, 0.2, 0.3, 0.4),
            Landmark::new(0.5, 0.6, 0.7, 0.8),
        ]);
        let v = vectorize(Some(&set)).unwrap();
        assert_eq!(v, vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8]);
    }

    #[test]
    fn test_full_pose_length_and_determinism() {
        let set = LandmarkSet::new(
            (0..POSE_LANDMARK_COUNT)
                .map(|i| Landmark::new(i as f32 / 33.0, 0.5, -0.1, 0.9))
                .collect(),
        );
        let a = vectorize(Some(&set)).unwrap();
        let b = vectorize(Some(&set)).unwrap();
        assert_eq!(a.len(), 4 * POSE_LANDMARK_COUNT);
        assert_eq!(a, b);
        assert_eq!(a[4 * 32], 32.0 / 33.0);
        assert_eq!(a[4 * 32 + 3], 0.9);
    }
}
