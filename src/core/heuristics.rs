use crate::camera_config::{CameraConfig, Relation};
use crate::core::file_event::Direction;
use std::collections::HashSet;

const IN_MARKERS: [&str; 6] = [
    "IN",
    "ENTER",
    "ENTRANCE",
    "REGION_ENTRANCE",
    "INTRUSION",
    "LINE_CROSSING_IN",
];
const OUT_MARKERS: [&str; 3] = ["OUT", "EXIT", "LINE_CROSSING_OUT"];

/// Splits on every run of non-alphanumeric characters and uppercases the pieces.
pub fn tokenize(raw: &str) -> HashSet<String> {
    raw.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_ascii_uppercase())
        .collect()
}

/// Camera-independent guess from the tokens alone.
pub fn guess_direction_from_tokens(tokens: &HashSet<String>) -> Direction {
    let has = |t: &str| tokens.contains(t);
    if has("LINE") && IN_MARKERS.iter().any(|m| has(m)) {
        return Direction::In;
    }
    if has("LINE") && OUT_MARKERS.iter().any(|m| has(m)) {
        return Direction::Out;
    }
    if has("REGION_ENTRANCE") || has("INTRUSION") {
        return Direction::In;
    }
    Direction::Unknown
}

/// Resolves the counted direction for one detection.
///
/// Order matters: a matching pattern hint decides first, then the generic token guess,
/// then the camera's relation, and finally `IN`.
pub fn decide_direction(camera: Option<&CameraConfig>, raw_name: &str) -> Direction {
    let tokens = tokenize(raw_name);

    if let Some(cam) = camera {
        let hint = cam.pattern_hint.to_ascii_uppercase();
        if !hint.is_empty() && tokens.contains(&hint) {
            return match cam.direction {
                Relation::AToB => Direction::In,
                Relation::BToA => Direction::Out,
                Relation::Both => guess_direction_from_tokens(&tokens).or(Direction::In),
            };
        }
    }

    let guess = guess_direction_from_tokens(&tokens);
    if guess != Direction::Unknown {
        return guess;
    }
    match camera {
        Some(cam) if cam.direction == Relation::BToA => Direction::Out,
        _ => Direction::In,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera(relation: Relation, hint: &str) -> CameraConfig {
        let mut cam = CameraConfig::new("test", "10.0.0.9");
        cam.direction = relation;
        cam.pattern_hint = hint.to_string();
        cam
    }

    #[test]
    fn tokenize_collapses_and_uppercases() {
        let t = tokenize("line--crossing__in.jpg line");
        assert_eq!(t.len(), 4);
        assert!(t.contains("LINE") && t.contains("CROSSING") && t.contains("IN") && t.contains("JPG"));
        assert!(tokenize("").is_empty());
        assert!(tokenize("___").is_empty());
    }

    #[test]
    fn line_enter_is_in_without_camera() {
        assert_eq!(decide_direction(None, "line_enter"), Direction::In);
        assert_eq!(decide_direction(None, "ENTER-LINE-cam3"), Direction::In);
    }

    #[test]
    fn line_out_is_out() {
        assert_eq!(decide_direction(None, "LINE.OUT"), Direction::Out);
        let cam = camera(Relation::AToB, "NOPE");
        assert_eq!(decide_direction(Some(&cam), "line out"), Direction::Out);
    }

    #[test]
    fn line_with_both_markers_prefers_in() {
        assert_eq!(decide_direction(None, "LINE IN OUT"), Direction::In);
    }

    #[test]
    fn region_entrance_without_line() {
        let tokens: HashSet<String> = ["REGION_ENTRANCE".to_string()].into_iter().collect();
        assert_eq!(guess_direction_from_tokens(&tokens), Direction::In);
        // The tokenizer splits underscores, so filenames never carry it intact.
        assert_eq!(guess_direction_from_tokens(&tokenize("REGION_ENTRANCE")), Direction::Unknown);
    }

    #[test]
    fn hint_with_reverse_relation_is_out() {
        let cam = camera(Relation::BToA, "DOOR");
        assert_eq!(decide_direction(Some(&cam), "door_cam_01"), Direction::Out);
    }

    #[test]
    fn hint_with_bidirectional_relation_defaults_in() {
        let cam = camera(Relation::Both, "DOOR");
        assert_eq!(decide_direction(Some(&cam), "door_cam_01"), Direction::In);
        assert_eq!(decide_direction(Some(&cam), "door line out"), Direction::Out);
    }

    #[test]
    fn hint_beats_generic_guess() {
        let cam = camera(Relation::AToB, "DOOR");
        assert_eq!(decide_direction(Some(&cam), "door line out"), Direction::In);
    }

    #[test]
    fn relation_fallback_without_hint_match() {
        let cam = camera(Relation::BToA, "DOOR");
        assert_eq!(decide_direction(Some(&cam), "something_else"), Direction::Out);
        let cam = camera(Relation::Both, "DOOR");
        assert_eq!(decide_direction(Some(&cam), "something_else"), Direction::In);
        assert_eq!(decide_direction(None, "something_else"), Direction::In);
    }

    #[test]
    fn compound_hint_never_matches_split_tokens() {
        let cam = camera(Relation::AToB, "LINE_CROSSING_DETECTION");
        let tokens = tokenize("LineCrossing-Detection_CH01");
        assert_eq!(tokens.len(), 3);
        assert!(tokens.contains("LINECROSSING") && tokens.contains("DETECTION") && tokens.contains("CH01"));
        assert_eq!(decide_direction(Some(&cam), "LineCrossing-Detection_CH01"), Direction::In);
    }

    #[test]
    fn empty_hint_is_ignored() {
        let cam = camera(Relation::BToA, "");
        assert_eq!(decide_direction(Some(&cam), "line in"), Direction::In);
    }
}
