/* ==================================================================================================
 *                           This file is part of the bachelor thesis project
 *                  Implementation and Analysis of Selected Noise Reduction Methods
 *                                Weronika Tarnawska (Index No. 331171)
 *                                  Supervisor:  dr hab. Paweł Woźny
 *                                  University of Wrocław, June 2025
 * ================================================================================================== */

/// Mean absolute sample difference between a reference and a recovered signal.
///
/// If the signals have different lengths, only the common prefix is compared.
///
/// # Returns
/// * `None` if there is nothing to compare.
pub fn mean_absolute_error(reference: &[i16], recovered: &[i16]) -> Option<f64> {
    let len = reference.len().min(recovered.len());
    if len == 0 {
        return None;
    }
    let total: f64 = reference
        .iter()
        .zip(recovered.iter())
        .map(|(&r, &p)| (r as f64 - p as f64).abs())
        .sum();
    Some(total / len as f64)
}

/// Compute the linear signal-to-noise ratio between a clean reference and a processed signal.
/// SNR = P_clean / P_noise, where noise = clean - processed.
///
/// If input signals have different lengths, cuts both to the length of the shorter one.
///
/// # Returns
/// * Linear SNR, infinite when the signals are identical.
pub fn sig_to_noise_ratio(clean: &[i16], processed: &[i16]) -> f64 {
    let len = clean.len().min(processed.len());
    let clean = &clean[..len];
    let processed = &processed[..len];

    let pow_signal = clean.iter().map(|&x| (x as f64).powi(2)).sum::<f64>();
    let pow_error = clean
        .iter()
        .zip(processed.iter())
        .map(|(&d, &pd)| (d as f64 - pd as f64).powi(2))
        .sum::<f64>();
    if pow_error == 0.0 {
        return f64::INFINITY;
    }
    pow_signal / pow_error
}

/// Compute the SNR in decibels: 10 * log10(linear SNR).
pub fn sig_to_noise_ratio_db(clean: &[i16], processed: &[i16]) -> f64 {
    10.0 * sig_to_noise_ratio(clean, processed).log10()
}

/// Improvement in SNR (dB) from a noisy input to a processed output,
/// relative to a clean reference.
///
/// improvement_dB = SNR_db(clean, processed) - SNR_db(clean, noisy)
pub fn snr_improvement_db(clean: &[i16], noisy: &[i16], processed: &[i16]) -> f64 {
    sig_to_noise_ratio_db(clean, processed) - sig_to_noise_ratio_db(clean, noisy)
}
