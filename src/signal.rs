/* ==================================================================================================
 *                           This file is part of the bachelor thesis project
 *                  Implementation and Analysis of Selected Noise Reduction Methods
 *                                Weronika Tarnawska (Index No. 331171)
 *                                  Supervisor:  dr hab. Paweł Woźny
 *                                  University of Wrocław, June 2025
 * ================================================================================================== */
use std::ops::Deref;

/// Immutable sequence of 16-bit signed audio samples.
///
/// The sample rate is not stored here; whoever reads or writes the samples
/// carries it. Consumers only ever see the samples as `&[i16]`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Signal {
    samples: Vec<i16>,
}

impl Signal {
    pub fn new(samples: Vec<i16>) -> Self {
        Self { samples }
    }

    pub fn as_slice(&self) -> &[i16] {
        &self.samples
    }

    pub fn into_inner(self) -> Vec<i16> {
        self.samples
    }
}

impl Deref for Signal {
    type Target = [i16];

    fn deref(&self) -> &[i16] {
        &self.samples
    }
}

impl From<Vec<i16>> for Signal {
    fn from(samples: Vec<i16>) -> Self {
        Self::new(samples)
    }
}

impl From<&[i16]> for Signal {
    fn from(samples: &[i16]) -> Self {
        Self::new(samples.to_vec())
    }
}

impl FromIterator<i16> for Signal {
    fn from_iter<I: IntoIterator<Item = i16>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Clamp a wide integer to the 16-bit sample range.
pub fn saturate(value: i64) -> i16 {
    value.clamp(i16::MIN as i64, i16::MAX as i64) as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saturate_bounds() {
        assert_eq!(saturate(40_000), i16::MAX);
        assert_eq!(saturate(-40_000), i16::MIN);
        assert_eq!(saturate(-123), -123);
    }

    #[test]
    fn test_signal_views() {
        let signal: Signal = vec![1, -2, 3].into();
        assert_eq!(signal.len(), 3);
        assert_eq!(&signal[..2], &[1, -2]);
        assert_eq!(signal.as_slice().iter().map(|&s| s as i32).sum::<i32>(), 2);
        assert_eq!(signal.into_inner(), vec![1, -2, 3]);
    }
}
