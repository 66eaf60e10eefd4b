//! Feature extraction from hand landmarks.
//!
//! Turns the 21 keypoints the hand detector reports per frame into one flat
//! feature vector: `[x0, y0, z0, x1, y1, z1, ..., x20, y20, z20]`.

use common::protocol::Landmark;

use crate::error::SignError;

/// Keypoints per detected hand.
pub const NUM_LANDMARKS: usize = 21;

/// Coordinates per keypoint.
pub const COORDS_PER_LANDMARK: usize = 3;

/// Values per feature vector.
pub const FEATURE_SIZE: usize = NUM_LANDMARKS * COORDS_PER_LANDMARK;

/// Index of the wrist keypoint.
pub const WRIST: usize = 0;

/// Per-frame feature vector, one value per landmark coordinate.
pub type FeatureVector = Vec<f32>;

/// Normalization applied to landmarks before they enter the window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Normalization {
    /// Coordinates pass through unchanged
    #[default]
    None,
    /// Coordinates relative to the wrist keypoint
    WristRelative,
}

/// Flatten one hand into a feature vector.
pub fn extract_features(
    landmarks: &[Landmark],
    normalization: Normalization,
) -> Result<FeatureVector, SignError> {
    if landmarks.len() != NUM_LANDMARKS {
        return Err(SignError::invalid_input(
            "landmark set",
            NUM_LANDMARKS,
            landmarks.len(),
        ));
    }

    let origin = match normalization {
        Normalization::None => Landmark::default(),
        Normalization::WristRelative => landmarks[WRIST],
    };

    let features = landmarks
        .iter()
        .flat_map(|landmark| {
            [
                landmark.x - origin.x,
                landmark.y - origin.y,
                landmark.z - origin.z,
            ]
        })
        .collect();

    Ok(features)
}

#[cfg(test)]
mod test {
    use super::*;

    fn hand() -> Vec<Landmark> {
        (0..NUM_LANDMARKS)
            .map(|i| {
                let i = i as f32;
                Landmark::new(0.5 + i * 0.01, 0.25 + i * 0.02, -i * 0.001)
            })
            .collect()
    }

    #[test]
    fn test_flattens_in_landmark_order() -> Result<(), SignError> {
        let landmarks = hand();
        let features = extract_features(&landmarks, Normalization::None)?;

        assert_eq!(features.len(), FEATURE_SIZE);
        for (i, landmark) in landmarks.iter().enumerate() {
            assert_eq!(features[i * 3], landmark.x);
            assert_eq!(features[i * 3 + 1], landmark.y);
            assert_eq!(features[i * 3 + 2], landmark.z);
        }

        Ok(())
    }

    #[test]
    fn test_wrist_relative() -> Result<(), SignError> {
        let landmarks = hand();
        let features = extract_features(&landmarks, Normalization::WristRelative)?;

        assert_eq!(&features[..3], &[0.0, 0.0, 0.0]);
        assert_eq!(features[3], landmarks[1].x - landmarks[WRIST].x);
        assert_eq!(features[5], landmarks[1].z - landmarks[WRIST].z);

        Ok(())
    }

    #[test]
    fn test_wrong_landmark_count() {
        let landmarks = vec![Landmark::default(); 20];
        let res = extract_features(&landmarks, Normalization::None);

        assert!(matches!(
            res,
            Err(SignError::InvalidInput {
                expected: 21,
                actual: 20,
                ..
            })
        ));
    }
}
