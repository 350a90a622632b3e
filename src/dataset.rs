/* ==================================================================================================
 *                           This file is part of the bachelor thesis project
 *                  Implementation and Analysis of Selected Noise Reduction Methods
 *                                Weronika Tarnawska (Index No. 331171)
 *                                  Supervisor:  dr hab. Paweł Woźny
 *                                  University of Wrocław, June 2025
 * ================================================================================================== */
use std::io::Write;

use tracing::debug;

use crate::error::{NoiseError, Result};
use crate::normalization::Normalization;

/// Windowing strategy, chosen by comparing the input and output widths.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowMode {
    /// Non-overlapping chunks; chunk `i` of the noisy signal maps to chunk `i` of the clean one
    Aligned,
    /// Input windows advance by one sample; targets are the samples at the end of each window
    Sliding,
}

/// Shape of the rows fed to the network.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowLayout {
    pub input_width: usize,
    pub output_width: usize,
}

impl WindowLayout {
    pub fn new(input_width: usize, output_width: usize) -> Result<Self> {
        if input_width == 0 || output_width == 0 {
            return Err(NoiseError::InvalidParameter(format!(
                "window widths must be positive, got input={} output={}",
                input_width, output_width
            )));
        }
        Ok(Self {
            input_width,
            output_width,
        })
    }

    pub fn mode(&self) -> WindowMode {
        if self.input_width == self.output_width {
            WindowMode::Aligned
        } else {
            WindowMode::Sliding
        }
    }

    /// Number of input rows a noisy signal of `mixed_len` samples yields.
    fn input_rows(&self, mixed_len: usize) -> usize {
        match self.mode() {
            WindowMode::Aligned => mixed_len / self.input_width,
            WindowMode::Sliding => (mixed_len + 1).saturating_sub(self.input_width),
        }
    }

    /// Number of complete (input, target) rows for the given signal lengths.
    fn paired_rows(&self, mixed_len: usize, clean_len: usize) -> usize {
        match self.mode() {
            WindowMode::Aligned => mixed_len.min(clean_len) / self.input_width,
            WindowMode::Sliding => {
                // clean has to reach the first target sample, clean[r + iw - 1]
                let target_rows = (clean_len + 1).saturating_sub(self.input_width);
                self.input_rows(mixed_len).min(target_rows)
            }
        }
    }

    /// First sample of input row `row`.
    fn input_start(&self, row: usize) -> usize {
        match self.mode() {
            WindowMode::Aligned => row * self.input_width,
            WindowMode::Sliding => row,
        }
    }

    /// First sample of target row `row`.
    fn target_start(&self, row: usize) -> usize {
        match self.mode() {
            WindowMode::Aligned => row * self.output_width,
            WindowMode::Sliding => row + self.input_width - 1,
        }
    }
}

/// Matched input and target matrices for one training session.
#[derive(Clone, Debug, PartialEq)]
pub struct Dataset {
    inputs: Vec<Vec<f64>>,
    targets: Vec<Vec<f64>>,
    layout: WindowLayout,
    normalization: Normalization,
}

impl Dataset {
    pub fn inputs(&self) -> &[Vec<f64>] {
        &self.inputs
    }

    pub fn targets(&self) -> &[Vec<f64>] {
        &self.targets
    }

    pub fn layout(&self) -> WindowLayout {
        self.layout
    }

    pub fn normalization(&self) -> Normalization {
        self.normalization
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Write every row as one CSV record: inputs first, then targets.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        let header: Vec<String> = (0..self.layout.input_width)
            .map(|i| format!("input_{}", i))
            .chain((0..self.layout.output_width).map(|i| format!("target_{}", i)))
            .collect();
        csv_writer.write_record(&header)?;

        for (input, target) in self.inputs.iter().zip(self.targets.iter()) {
            csv_writer.write_record(input.iter().chain(target.iter()).map(|v| v.to_string()))?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

/// Slices signals into network rows.
#[derive(Clone, Copy, Debug)]
pub struct DatasetBuilder {
    layout: WindowLayout,
    normalization: Normalization,
}

impl DatasetBuilder {
    pub fn new(input_width: usize, output_width: usize, normalization: Normalization) -> Result<Self> {
        normalization.validate()?;
        Ok(Self {
            layout: WindowLayout::new(input_width, output_width)?,
            normalization,
        })
    }

    pub fn layout(&self) -> WindowLayout {
        self.layout
    }

    /// Build the training rows from a noisy signal and its clean counterpart.
    ///
    /// # Arguments
    /// * `mixed` - speech with noise, becomes the network inputs
    /// * `clean` - clean speech, becomes the network targets
    ///
    /// # Returns
    /// A dataset with `min(len) / width` rows in aligned mode, or
    /// `mixed.len() - input_width + 1` rows in sliding mode (fewer only if
    /// `clean` ends before the first target sample of the last windows;
    /// targets running past its end repeat its last sample). Fails with
    /// `InsufficientData` when no complete row fits.
    pub fn build(&self, mixed: &[i16], clean: &[i16]) -> Result<Dataset> {
        let rows = self.layout.paired_rows(mixed.len(), clean.len());
        if rows == 0 {
            return Err(NoiseError::InsufficientData(format!(
                "signals of {} and {} samples are too short for windows {}/{}",
                mixed.len(),
                clean.len(),
                self.layout.input_width,
                self.layout.output_width
            )));
        }

        let inputs = self.input_matrix(mixed, rows);
        let targets = (0..rows)
            .map(|row| {
                let start = self.layout.target_start(row);
                // a sliding row near the end repeats the last clean sample
                (start..start + self.layout.output_width)
                    .map(|i| self.normalization.target(clean[i.min(clean.len() - 1)]))
                    .collect()
            })
            .collect();

        debug!(
            rows,
            mode = ?self.layout.mode(),
            input_width = self.layout.input_width,
            output_width = self.layout.output_width,
            "dataset built"
        );

        Ok(Dataset {
            inputs,
            targets,
            layout: self.layout,
            normalization: self.normalization,
        })
    }

    /// Replace the input rows of `dataset` with rows cut from a new noisy signal.
    ///
    /// Targets and the row count are kept as they are.
    pub fn rebuild_inputs(&self, dataset: &mut Dataset, mixed: &[i16]) -> Result<()> {
        if dataset.layout != self.layout {
            return Err(NoiseError::InvalidParameter(format!(
                "dataset layout {:?} does not match builder layout {:?}",
                dataset.layout, self.layout
            )));
        }
        let rows = dataset.len();
        if self.layout.input_rows(mixed.len()) < rows {
            return Err(NoiseError::InsufficientData(format!(
                "{} samples cannot refill {} rows of width {}",
                mixed.len(),
                rows,
                self.layout.input_width
            )));
        }
        dataset.inputs = self.input_matrix(mixed, rows);
        dataset.normalization = self.normalization;
        Ok(())
    }

    /// Build only the input rows, for running a trained network over a noisy signal.
    pub fn input_rows(&self, mixed: &[i16]) -> Result<Vec<Vec<f64>>> {
        let rows = self.layout.input_rows(mixed.len());
        if rows == 0 {
            return Err(NoiseError::InsufficientData(format!(
                "{} samples are too short for input width {}",
                mixed.len(),
                self.layout.input_width
            )));
        }
        Ok(self.input_matrix(mixed, rows))
    }

    fn input_matrix(&self, mixed: &[i16], rows: usize) -> Vec<Vec<f64>> {
        (0..rows)
            .map(|row| {
                let start = self.layout.input_start(row);
                mixed[start..start + self.layout.input_width]
                    .iter()
                    .map(|&s| self.normalization.input(s))
                    .collect()
            })
            .collect()
    }
}
