/// Outcome of gating one recognition result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Known,
    Unknown { raise_alarm: bool },
}

/// Classifies a distance-like confidence score.
///
/// Both comparisons are strict: a score equal to `confidence_threshold` is not
/// known, and a score equal to `auto_alarm_threshold` does not alarm.
pub fn classify(confidence: f64, confidence_threshold: f64, auto_alarm_threshold: f64) -> Verdict {
    if confidence < confidence_threshold {
        Verdict::Known
    } else {
        Verdict::Unknown {
            raise_alarm: confidence > auto_alarm_threshold,
        }
    }
}
