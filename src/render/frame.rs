use crate::breath::breath::{Pattern, Phase, Snapshot};

pub const EXPANDED_SCALE: f32 = 1.8;
pub const CONTRACTED_SCALE: f32 = 0.8;
const CELLS_PER_SCALE: f32 = 10.0; // Terminal cells drawn per unit of circle scale

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Cyan,
    White,
    Purple,
}

impl Tone {
    fn ansi(&self) -> &'static str {
        match self {
            Tone::Cyan => "\x1b[36m",
            Tone::White => "\x1b[97m",
            Tone::Purple => "\x1b[35m",
        }
    }
}

/// Everything a presentation layer needs to draw one moment of the pacer.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub scale: f32,
    pub tone: Tone,
    /// Countdown and instruction, only while running.
    pub countdown: Option<(u32, &'static str)>,
    pub control: &'static str,
}

impl Frame {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        if !snapshot.running {
            // The idle circle rests at its exhaled size.
            return Self {
                scale: CONTRACTED_SCALE,
                tone: Tone::Purple,
                countdown: None,
                control: "BEGIN JOURNEY [enter]",
            };
        }

        let (scale, tone) = match snapshot.phase {
            Phase::Inhale => (EXPANDED_SCALE, Tone::Cyan),
            Phase::Hold => (EXPANDED_SCALE, Tone::White),
            Phase::Exhale => (CONTRACTED_SCALE, Tone::Purple),
        };

        Self {
            scale,
            tone,
            countdown: Some((snapshot.remaining, snapshot.phase.text())),
            control: "PAUSE [enter]",
        }
    }

    /// One terminal line: the circle drawn as a bar, the countdown and the control hint.
    pub fn to_line(&self, color: bool) -> String {
        let cells = (self.scale * CELLS_PER_SCALE).round() as usize;
        let width = (EXPANDED_SCALE * CELLS_PER_SCALE).round() as usize;
        let circle = format!("({:^width$})", "●".repeat(cells), width = width);
        let circle = if color {
            format!("{}{}\x1b[0m", self.tone.ansi(), circle)
        } else {
            circle
        };

        match self.countdown {
            Some((remaining, text)) => {
                format!("{}  {:>2}  {:<11}  {}", circle, remaining, text, self.control)
            }
            None => format!("{}  {:>2}  {:<11}  {}", circle, "", "", self.control),
        }
    }
}

/// Static description of the breathing pattern, e.g. `4 INHALE → 7 HOLD → 8 EXHALE`.
pub fn legend(pattern: &Pattern) -> String {
    Phase::ALL
        .iter()
        .map(|phase| format!("{} {}", pattern.duration_of(*phase), phase.as_str()))
        .collect::<Vec<_>>()
        .join(" → ")
}
