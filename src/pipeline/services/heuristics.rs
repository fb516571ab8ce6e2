use crate::common::{HandLandmark, HandSnapshot, PoseLandmark, PoseSnapshot};

pub const WAITING_FOR_PLAYER: &str = "Waiting for player to enter frame...";
pub const RAISE_ELBOW: &str = "Raise your elbow higher during release.";
pub const ADD_WRIST_FLICK: &str = "Add more wrist flick on your follow-through.";
pub const GOOD_KNEE_BEND: &str = "Good knee bend for shot power.";
pub const BEND_KNEES_MORE: &str = "Try bending knees more before jumping.";

pub const DEFAULT_KNEE_MARGIN: f32 = 0.1;

/// Maps a keypoint snapshot to coaching messages using fixed geometric rules.
///
/// Messages come out in rule order: elbow, wrist, knee. Consumers that
/// highlight the first message depend on that order.
#[derive(Debug, Clone)]
pub struct ShotHeuristics {
    knee_margin: f32,
    closing_tip: Option<String>,
}

impl Default for ShotHeuristics {
    fn default() -> Self {
        Self::new(DEFAULT_KNEE_MARGIN)
    }
}

impl ShotHeuristics {
    pub fn new(knee_margin: f32) -> Self {
        Self {
            knee_margin,
            closing_tip: None,
        }
    }

    /// Appends a fixed coaching tip after the rule messages.
    pub fn with_closing_tip(mut self, tip: Option<String>) -> Self {
        self.closing_tip = tip.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn evaluate(&self, pose: Option<&PoseSnapshot>, hands: Option<&HandSnapshot>) -> Vec<String> {
        let Some(pose) = pose else {
            return vec![WAITING_FOR_PLAYER.to_string()];
        };

        let mut feedback = Vec::with_capacity(4);

        let elbow = pose.landmark(PoseLandmark::LeftElbow);
        let shoulder = pose.landmark(PoseLandmark::LeftShoulder);
        if elbow.y > shoulder.y {
            feedback.push(RAISE_ELBOW.to_string());
        }

        if let Some(hand) = hands.and_then(HandSnapshot::first) {
            let wrist = hand.landmark(HandLandmark::Wrist);
            let index_tip = hand.landmark(HandLandmark::IndexTip);
            if index_tip.y > wrist.y {
                feedback.push(ADD_WRIST_FLICK.to_string());
            }
        }

        let knee = pose.landmark(PoseLandmark::LeftKnee);
        let hip = pose.landmark(PoseLandmark::LeftHip);
        if knee.y < hip.y - self.knee_margin {
            feedback.push(GOOD_KNEE_BEND.to_string());
        } else {
            feedback.push(BEND_KNEES_MORE.to_string());
        }

        if let Some(tip) = &self.closing_tip {
            feedback.push(tip.clone());
        }

        feedback
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::keypoint::fixtures;
    use proptest::prelude::*;

    #[test]
    fn test_absent_pose_yields_only_waiting_message() {
        let heuristics = ShotHeuristics::default();
        let hands = HandSnapshot::new(vec![fixtures::hand(0.2, 0.5)]);
        assert_eq!(
            heuristics.evaluate(None, Some(&hands)),
            vec![WAITING_FOR_PLAYER.to_string()]
        );
    }

    #[test]
    fn test_rule_order_is_elbow_wrist_knee() {
        let heuristics = ShotHeuristics::default();
        let pose = fixtures::pose(0.3, 0.5, 0.6, 0.7);
        let hands = HandSnapshot::new(vec![fixtures::hand(0.4, 0.45)]);
        assert_eq!(
            heuristics.evaluate(Some(&pose), Some(&hands)),
            vec![RAISE_ELBOW, ADD_WRIST_FLICK, BEND_KNEES_MORE]
        );
    }

    #[test]
    fn test_wrist_rule_skipped_without_hands() {
        let heuristics = ShotHeuristics::default();
        let pose = fixtures::pose(0.5, 0.3, 0.6, 0.4);
        assert_eq!(heuristics.evaluate(Some(&pose), None), vec![GOOD_KNEE_BEND]);
        let empty = HandSnapshot::default();
        assert_eq!(
            heuristics.evaluate(Some(&pose), Some(&empty)),
            vec![GOOD_KNEE_BEND]
        );
    }

    #[test]
    fn test_only_first_hand_is_checked() {
        let heuristics = ShotHeuristics::default();
        let pose = fixtures::pose(0.5, 0.3, 0.6, 0.4);
        let hands = HandSnapshot::new(vec![fixtures::hand(0.5, 0.4), fixtures::hand(0.2, 0.9)]);
        assert_eq!(
            heuristics.evaluate(Some(&pose), Some(&hands)),
            vec![GOOD_KNEE_BEND]
        );
    }

    #[test]
    fn test_knee_margin_boundary_asks_for_more_bend() {
        let heuristics = ShotHeuristics::new(0.25);
        // knee.y == hip.y - margin is not strictly less.
        let pose = fixtures::pose(0.5, 0.3, 0.75, 0.5);
        assert_eq!(heuristics.evaluate(Some(&pose), None), vec![BEND_KNEES_MORE]);
    }

    #[test]
    fn test_closing_tip_follows_rules_but_not_waiting() {
        let heuristics = ShotHeuristics::default()
            .with_closing_tip(Some("Tip: follow through.".to_string()));
        let pose = fixtures::pose(0.5, 0.3, 0.6, 0.4);
        assert_eq!(
            heuristics.evaluate(Some(&pose), None),
            vec![GOOD_KNEE_BEND, "Tip: follow through."]
        );
        assert_eq!(heuristics.evaluate(None, None), vec![WAITING_FOR_PLAYER]);
    }

    proptest! {
        #[test]
        fn elbow_message_tracks_elbow_below_shoulder(
            shoulder in 0.0f32..1.0,
            elbow in 0.0f32..1.0,
            hip in 0.0f32..1.0,
            knee in 0.0f32..1.0,
        ) {
            let heuristics = ShotHeuristics::default();
            let pose = fixtures::pose(shoulder, elbow, hip, knee);
            let feedback = heuristics.evaluate(Some(&pose), None);
            prop_assert_eq!(feedback.iter().any(|m| m == RAISE_ELBOW), elbow > shoulder);
        }

        #[test]
        fn exactly_one_knee_message(
            shoulder in 0.0f32..1.0,
            elbow in 0.0f32..1.0,
            hip in 0.0f32..1.0,
            knee in 0.0f32..1.0,
        ) {
            let heuristics = ShotHeuristics::default();
            let pose = fixtures::pose(shoulder, elbow, hip, knee);
            let feedback = heuristics.evaluate(Some(&pose), None);
            let good = feedback.iter().filter(|m| *m == GOOD_KNEE_BEND).count();
            let more = feedback.iter().filter(|m| *m == BEND_KNEES_MORE).count();
            prop_assert_eq!(good + more, 1);
            prop_assert_eq!(good == 1, (hip - DEFAULT_KNEE_MARGIN) - knee > 0.0);
        }

        #[test]
        fn evaluation_is_deterministic(
            shoulder in 0.0f32..1.0,
            elbow in 0.0f32..1.0,
            wrist in 0.0f32..1.0,
            tip in 0.0f32..1.0,
        ) {
            let heuristics = ShotHeuristics::default();
            let pose = fixtures::pose(shoulder, elbow, 0.6, 0.4);
            let hands = HandSnapshot::new(vec![fixtures::hand(wrist, tip)]);
            prop_assert_eq!(
                heuristics.evaluate(Some(&pose), Some(&hands)),
                heuristics.evaluate(Some(&pose), Some(&hands))
            );
        }
    }
}
