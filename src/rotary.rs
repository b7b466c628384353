use serde::Serialize;

use crate::line::{EncoderSample, LineState};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Rotation {
    #[serde(rename = "ROTARY_CW")]
    Clockwise,
    #[serde(rename = "ROTARY_CCW")]
    CounterClockwise,
}

impl Rotation {
    fn reversed(self) -> Self {
        match self {
            Rotation::Clockwise => Rotation::CounterClockwise,
            Rotation::CounterClockwise => Rotation::Clockwise,
        }
    }
}

/// Quadrature decoder that only looks at falling CLK edges.
///
/// At a falling edge the level of DT tells the direction: DT still high
/// means DT lags CLK (clockwise), DT already low means it leads.
/// Rising edges only refresh the remembered CLK level so one detent
/// yields one event.
pub struct Rotary {
    clk_prev: LineState,
    inverted: bool,
}

impl Rotary {
    pub fn new(clk: LineState) -> Self {
        Self {
            clk_prev: clk,
            inverted: false,
        }
    }

    /// Swap the reported directions, for encoders with CLK and DT wired the other way.
    pub fn inverted(mut self, inverted: bool) -> Self {
        self.inverted = inverted;
        self
    }

    pub fn update(&mut self, sample: EncoderSample) -> Option<Rotation> {
        if sample.clk == self.clk_prev {
            return None;
        }

        // Track every change, rising ones included
        self.clk_prev = sample.clk;

        if sample.clk != LineState::Low {
            return None;
        }

        let rotation = if sample.dt != sample.clk {
            Rotation::Clockwise
        } else {
            Rotation::CounterClockwise
        };

        Some(if self.inverted {
            rotation.reversed()
        } else {
            rotation
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use LineState::{High, Low};

    fn sample(clk: LineState, dt: LineState) -> EncoderSample {
        EncoderSample { clk, dt }
    }

    fn decode(rotary: &mut Rotary, samples: &[(LineState, LineState)]) -> Vec<Rotation> {
        samples
            .iter()
            .filter_map(|&(clk, dt)| rotary.update(sample(clk, dt)))
            .collect()
    }

    #[test]
    fn unchanged_clk_emits_nothing() {
        let mut rotary = Rotary::new(High);
        assert_eq!(rotary.update(sample(High, Low)), None);
        assert_eq!(rotary.update(sample(High, High)), None);

        let mut rotary = Rotary::new(Low);
        assert_eq!(rotary.update(sample(Low, High)), None);
        assert_eq!(rotary.update(sample(Low, Low)), None);
    }

    #[test]
    fn falling_edge_with_dt_high_is_clockwise() {
        let mut rotary = Rotary::new(High);
        assert_eq!(rotary.update(sample(Low, High)), Some(Rotation::Clockwise));
    }

    #[test]
    fn falling_edge_with_dt_low_is_counter_clockwise() {
        let mut rotary = Rotary::new(High);
        assert_eq!(
            rotary.update(sample(Low, Low)),
            Some(Rotation::CounterClockwise)
        );
    }

    #[test]
    fn rising_edge_is_silent_but_remembered() {
        let mut rotary = Rotary::new(Low);
        assert_eq!(rotary.update(sample(High, Low)), None);
        assert_eq!(rotary.clk_prev, High);

        // Only possible to see this falling edge if the rise was tracked
        assert_eq!(rotary.update(sample(Low, High)), Some(Rotation::Clockwise));
    }

    #[test]
    fn one_event_per_detent() {
        // Two clockwise detents: CLK falls while DT is still high, then both rise
        let mut rotary = Rotary::new(High);
        let events = decode(
            &mut rotary,
            &[
                (High, High),
                (Low, High),
                (Low, High),
                (Low, Low),
                (High, Low),
                (High, High),
                (Low, High),
                (Low, Low),
                (High, Low),
            ],
        );
        assert_eq!(events, vec![Rotation::Clockwise, Rotation::Clockwise]);
    }

    #[test]
    fn inverted_swaps_directions() {
        let mut rotary = Rotary::new(High).inverted(true);
        assert_eq!(
            rotary.update(sample(Low, High)),
            Some(Rotation::CounterClockwise)
        );
        rotary.update(sample(High, High));
        assert_eq!(rotary.update(sample(Low, Low)), Some(Rotation::Clockwise));
    }

    #[test]
    fn decoding_is_deterministic() {
        let samples = [
            (Low, High),
            (High, High),
            (Low, Low),
            (Low, Low),
            (High, Low),
            (Low, High),
        ];
        let first = decode(&mut Rotary::new(High), &samples);
        let second = decode(&mut Rotary::new(High), &samples);
        assert_eq!(first, second);
        assert_eq!(
            first,
            vec![
                Rotation::Clockwise,
                Rotation::CounterClockwise,
                Rotation::Clockwise
            ]
        );
    }
}
