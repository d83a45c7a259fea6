use std::time::{Duration, Instant};

/// Longest the worker sleeps before checking its queue again.
pub const MAX_WAIT: Duration = Duration::from_millis(25);

/// MIDI number of A4.
const A4_PITCH: i32 = 69;

pub fn pitch_semitones_to_speed(semi: i32) -> f32 {
    2f32.powf(semi as f32 / 12.0)
}

/// Equal-tempered frequency of a MIDI pitch, A4 = 440 Hz.
pub fn pitch_to_frequency(pitch: i32) -> f32 {
    440.0 * pitch_semitones_to_speed(pitch - A4_PITCH)
}

/// Start time of every arpeggio step: the first sounds immediately.
pub fn arpeggio_schedule(start: Instant, steps: usize, interval: Duration) -> Vec<Instant> {
    (0..steps as u32).map(|i| start + interval * i).collect()
}

/// How long to sleep until `due`, bounded so control messages stay responsive.
pub fn wait_until(now: Instant, due: Option<Instant>) -> Duration {
    match due {
        Some(due) if due > now => (due - now).min(MAX_WAIT),
        Some(_) => Duration::ZERO,
        None => MAX_WAIT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pitch_speed_mapping_basic() {
        assert!((pitch_semitones_to_speed(0) - 1.0).abs() < 1e-6);
        assert!((pitch_semitones_to_speed(12) - 2.0).abs() < 1e-6);
        assert!((pitch_semitones_to_speed(-12) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn concert_pitch() {
        assert!((pitch_to_frequency(69) - 440.0).abs() < 1e-3);
        assert!((pitch_to_frequency(60) - 261.626).abs() < 1e-2);
    }

    #[test]
    fn arpeggio_steps_are_evenly_spaced() {
        let start = Instant::now();
        let times = arpeggio_schedule(start, 3, Duration::from_millis(400));
        assert_eq!(times.len(), 3);
        assert_eq!(times[0], start);
        assert_eq!(times[2] - times[1], Duration::from_millis(400));
    }

    #[test]
    fn wait_is_bounded() {
        let now = Instant::now();
        assert_eq!(wait_until(now, None), MAX_WAIT);
        assert_eq!(wait_until(now, Some(now)), Duration::ZERO);
        assert_eq!(wait_until(now, Some(now + Duration::from_millis(5))), Duration::from_millis(5));
        assert_eq!(wait_until(now, Some(now + Duration::from_secs(2))), MAX_WAIT);
    }
}
