//! Mapping of classifications to overlay lines and HUD payloads

use serde::{Deserialize, Serialize};

use crate::engine::{FinalClassification, Label, Millis};

/// Color for a verdict label (CSS hex)
pub fn label_color(label: Label) -> &'static str {
    match label {
        Label::CounterStrafe => "#00ff66",
        Label::Overlap => "#ffd200",
        Label::Bad => "#ff3b3b",
    }
}

/// JSON message pushed to HUD clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HudPayload {
    #[serde(rename = "type")]
    pub kind: String,
    pub diff: Option<Millis>,
    pub delay: Option<Millis>,
    pub color: String,
}

impl HudPayload {
    pub fn from_classification(c: &FinalClassification) -> Self {
        let (kind, diff, delay) = match c.label {
            Label::Overlap => ("Overlap", c.overlap_time, None),
            Label::CounterStrafe => ("Counter-strafe", c.cs_time, c.shot_delay),
            Label::Bad => ("Bad", c.cs_time, c.shot_delay),
        };
        Self {
            kind: kind.to_string(),
            diff,
            delay,
            color: label_color(c.label).to_string(),
        }
    }
}

/// Text lines shown by the overlay for one shot
///
/// Overlap shows the overlap duration; a graded shot shows the reversal gap
/// and the shot delay; a bare Bad shows only the label.
pub fn overlay_lines(c: &FinalClassification) -> Vec<String> {
    match (c.label, c.overlap_time, c.cs_time, c.shot_delay) {
        (Label::Overlap, Some(overlap), _, _) => vec![format!("Overlap - {} ms", overlap)],
        (_, _, Some(cs), Some(delay)) => vec![
            format!("Gap - {} ms", cs),
            format!("Shot Delay - {} ms", delay),
        ],
        (label, _, _, _) => vec![label.to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_strafe_payload() {
        let payload =
            HudPayload::from_classification(&FinalClassification::counter_strafe(Some(100), Some(150)));
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "Counter-strafe", "diff": 100, "delay": 150, "color": "#00ff66"})
        );
    }

    #[test]
    fn test_overlap_payload_has_no_delay() {
        let payload = HudPayload::from_classification(&FinalClassification::overlap(50));
        assert_eq!(payload.kind, "Overlap");
        assert_eq!(payload.diff, Some(50));
        assert_eq!(payload.delay, None);
    }

    #[test]
    fn test_bare_bad_payload() {
        let payload = HudPayload::from_classification(&FinalClassification::bad());
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "Bad", "diff": null, "delay": null, "color": "#ff3b3b"})
        );
    }

    #[test]
    fn test_overlay_lines() {
        assert_eq!(
            overlay_lines(&FinalClassification::overlap(50)),
            vec!["Overlap - 50 ms"]
        );
        assert_eq!(
            overlay_lines(&FinalClassification::graded_bad(100, 400)),
            vec!["Gap - 100 ms", "Shot Delay - 400 ms"]
        );
        assert_eq!(overlay_lines(&FinalClassification::bad()), vec!["Bad"]);
    }
}
