/* ==================================================================================================
 *                           This file is part of the bachelor thesis project
 *                  Implementation and Analysis of Selected Noise Reduction Methods
 *                                Weronika Tarnawska (Index No. 331171)
 *                                  Supervisor:  dr hab. Paweł Woźny
 *                                  University of Wrocław, June 2025
 * ================================================================================================== */
use tracing::debug;

use crate::dataset::{Dataset, DatasetBuilder};
use crate::error::Result;
use crate::network::Network;
use crate::normalization::Normalization;
use crate::signal::Signal;
use crate::utils::mean_absolute_error;

/// Result of running a trained network over a noisy recording.
#[derive(Clone, Debug)]
pub struct Evaluation {
    pub recovered: Signal,
    /// Mean absolute sample error against the reference, if one of matching length was given
    pub mean_abs_error: Option<f64>,
}

/// Run every input row through the network and stitch the outputs back into samples.
fn forward_rows<N: Network + ?Sized>(
    network: &N,
    rows: &[Vec<f64>],
    normalization: &Normalization,
) -> Signal {
    rows.iter()
        .flat_map(|row| network.compute(row))
        .map(|output| normalization.inverse(output))
        .collect()
}

/// Forward pass over the whole dataset.
///
/// # Returns
/// The concatenated, inverse-normalized network outputs: `rows * width`
/// samples in aligned mode, `rows * output_width` in sliding mode.
pub fn recover_speech<N: Network + ?Sized>(network: &N, dataset: &Dataset) -> Signal {
    forward_rows(network, dataset.inputs(), &dataset.normalization())
}

/// Remove noise from `noisy` with a trained network.
///
/// The window layout is taken from the network's own input and output widths.
pub fn denoise<N: Network + ?Sized>(
    network: &N,
    noisy: &[i16],
    normalization: Normalization,
) -> Result<Signal> {
    let descriptor = network.descriptor();
    let builder = DatasetBuilder::new(
        descriptor.input_width(),
        descriptor.output_width(),
        normalization,
    )?;
    let rows = builder.input_rows(noisy)?;
    debug!(rows = rows.len(), layers = ?descriptor.layer_widths, "denoising signal");
    Ok(forward_rows(network, &rows, &normalization))
}

/// Denoise `noisy` and, when `reference` has the same length, score the result.
pub fn evaluate<N: Network + ?Sized>(
    network: &N,
    noisy: &[i16],
    reference: Option<&[i16]>,
    normalization: Normalization,
) -> Result<Evaluation> {
    let recovered = denoise(network, noisy, normalization)?;
    let mean_abs_error = reference
        .filter(|r| r.len() == noisy.len())
        .and_then(|r| mean_absolute_error(r, &recovered));
    Ok(Evaluation {
        recovered,
        mean_abs_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::mock::EchoNetwork;
    use float_cmp::approx_eq;

    #[test]
    fn test_recover_aligned_reproduces_input() {
        let mixed: Vec<i16> = vec![-32768, -5, 0, 7, 32767, 1200, -1200, 3];
        let builder = DatasetBuilder::new(4, 4, Normalization::default()).unwrap();
        let dataset = builder.build(&mixed, &mixed).unwrap();
        let recovered = recover_speech(&EchoNetwork::new(vec![4, 8, 4]), &dataset);
        assert_eq!(recovered.as_slice(), mixed.as_slice());
    }

    #[test]
    fn test_recover_sliding_length() {
        let mixed: Vec<i16> = (0..20).collect();
        let builder = DatasetBuilder::new(5, 1, Normalization::default()).unwrap();
        let dataset = builder.build(&mixed, &mixed).unwrap();
        let recovered = recover_speech(&EchoNetwork::new(vec![5, 3, 1]), &dataset);
        assert_eq!(recovered.len(), 16);
        assert_eq!(recovered[0], 4);
        assert_eq!(recovered[15], 19);
    }

    #[test]
    fn test_evaluate_with_reference() {
        let noisy: Vec<i16> = vec![10, 20, 30, 40];
        let reference: Vec<i16> = vec![12, 18, 30, 40];
        let network = EchoNetwork::new(vec![2, 4, 2]);
        let evaluation =
            evaluate(&network, &noisy, Some(&reference), Normalization::default()).unwrap();
        assert_eq!(evaluation.recovered.as_slice(), noisy.as_slice());
        let error = evaluation.mean_abs_error.unwrap();
        assert!(approx_eq!(f64, error, 1.0, epsilon = 1e-12));
    }

    #[test]
    fn test_evaluate_ignores_mismatched_reference() {
        let noisy: Vec<i16> = vec![1, 2, 3, 4];
        let network = EchoNetwork::new(vec![2, 4, 2]);
        let evaluation =
            evaluate(&network, &noisy, Some(&[1, 2]), Normalization::default()).unwrap();
        assert!(evaluation.mean_abs_error.is_none());
    }

    #[test]
    fn test_denoise_too_short() {
        let network = EchoNetwork::new(vec![8, 4, 1]);
        assert!(denoise(&network, &[1, 2, 3], Normalization::default()).is_err());
    }
}
