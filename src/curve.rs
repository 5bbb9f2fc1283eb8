//! Response curves
//!
//! The focus evaluator maps "how centred is this item" (0..1) through two
//! curves to get size and shift. Anything that can `evaluate(x) -> y` works;
//! `KeyframeCurve` is the serialisable designer-facing implementation.

use serde::{Deserialize, Serialize};

/// A tunable mapping from a normalised input to an output value
pub trait ResponseCurve {
    fn evaluate(&self, x: f32) -> f32;
}

impl<F> ResponseCurve for F
where
    F: Fn(f32) -> f32,
{
    fn evaluate(&self, x: f32) -> f32 {
        self(x)
    }
}

/// A single curve key with Hermite tangents (slopes in output per input unit)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f32,
    pub value: f32,
    #[serde(default)]
    pub in_tangent: f32,
    #[serde(default)]
    pub out_tangent: f32,
}

impl Keyframe {
    /// Flat key (zero tangents)
    pub fn flat(time: f32, value: f32) -> Self {
        Self {
            time,
            value,
            in_tangent: 0.0,
            out_tangent: 0.0,
        }
    }

    pub fn with_tangents(time: f32, value: f32, in_tangent: f32, out_tangent: f32) -> Self {
        Self {
            time,
            value,
            in_tangent,
            out_tangent,
        }
    }
}

/// Piecewise cubic Hermite curve, clamped outside its key range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Keyframe>", into = "Vec<Keyframe>")]
pub struct KeyframeCurve {
    keys: Vec<Keyframe>,
}

impl From<Vec<Keyframe>> for KeyframeCurve {
    fn from(keys: Vec<Keyframe>) -> Self {
        Self::new(keys)
    }
}

impl From<KeyframeCurve> for Vec<Keyframe> {
    fn from(curve: KeyframeCurve) -> Self {
        curve.keys
    }
}

impl KeyframeCurve {
    /// Build a curve; keys are sorted by time and non-finite keys dropped
    pub fn new(mut keys: Vec<Keyframe>) -> Self {
        keys.retain(|k| k.time.is_finite() && k.value.is_finite());
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { keys }
    }

    /// Straight segments through the given (time, value) points
    pub fn linear(points: &[(f32, f32)]) -> Self {
        let mut sorted: Vec<(f32, f32)> = points.to_vec();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

        let slope = |a: (f32, f32), b: (f32, f32)| {
            let dt = b.0 - a.0;
            if dt.abs() > f32::EPSILON { (b.1 - a.1) / dt } else { 0.0 }
        };

        let keys = (0..sorted.len())
            .map(|i| {
                let (t, v) = sorted[i];
                let in_tangent = if i > 0 { slope(sorted[i - 1], sorted[i]) } else { 0.0 };
                let out_tangent = if i + 1 < sorted.len() {
                    slope(sorted[i], sorted[i + 1])
                } else {
                    0.0
                };
                Keyframe::with_tangents(t, v, in_tangent, out_tangent)
            })
            .collect();
        Self::new(keys)
    }

    /// Smooth S-curve from `(0, from)` to `(1, to)`
    pub fn ease_in_out(from: f32, to: f32) -> Self {
        Self::new(vec![Keyframe::flat(0.0, from), Keyframe::flat(1.0, to)])
    }

    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl ResponseCurve for KeyframeCurve {
    fn evaluate(&self, x: f32) -> f32 {
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(f), Some(l)) => (f, l),
            _ => return 0.0,
        };
        if x.is_nan() || x <= first.time {
            return first.value;
        }
        if x >= last.time {
            return last.value;
        }

        // First key strictly after x; guaranteed to be in 1..len here
        let hi = self.keys.partition_point(|k| k.time <= x);
        let k0 = self.keys[hi - 1];
        let k1 = self.keys[hi];

        let span = k1.time - k0.time;
        if span <= f32::EPSILON {
            return k1.value;
        }
        let u = (x - k0.time) / span;
        let u2 = u * u;
        let u3 = u2 * u;

        let h00 = 2.0 * u3 - 3.0 * u2 + 1.0;
        let h10 = u3 - 2.0 * u2 + u;
        let h01 = -2.0 * u3 + 3.0 * u2;
        let h11 = u3 - u2;

        h00 * k0.value + h10 * span * k0.out_tangent + h01 * k1.value + h11 * span * k1.in_tangent
    }
}
