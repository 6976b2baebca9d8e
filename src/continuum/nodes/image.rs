// SPDX-License-Identifier: MIT

//! Image grid to batch
//!
//! Images travel as `ImageBatch`: a row-major `[batch, height, width, channels]`
//! buffer of f32 samples, the same layout the host uses for image tensors.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::continuum::config::PackConfig;
use crate::runtime::{ContinuumError, ExecutionContext, Inputs, Node, NodeOutput};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageBatch {
    pub batch: usize,
    pub height: usize,
    pub width: usize,
    pub channels: usize,
    pub data: Vec<f32>,
}

impl ImageBatch {
    pub fn new(
        batch: usize,
        height: usize,
        width: usize,
        channels: usize,
        data: Vec<f32>,
    ) -> Result<Self, String> {
        let image = Self {
            batch,
            height,
            width,
            channels,
            data,
        };
        image.check_shape()?;
        Ok(image)
    }

    pub fn check_shape(&self) -> Result<(), String> {
        let expected = sample_count(&[self.batch, self.height, self.width, self.channels])
            .ok_or_else(|| {
                format!(
                    "image shape {}x{}x{}x{} is too large",
                    self.batch, self.height, self.width, self.channels
                )
            })?;
        if self.data.len() != expected {
            return Err(format!(
                "image data has {} samples, shape {}x{}x{}x{} needs {}",
                self.data.len(),
                self.batch,
                self.height,
                self.width,
                self.channels,
                expected
            ));
        }
        Ok(())
    }

    fn index(&self, b: usize, y: usize, x: usize) -> usize {
        ((b * self.height + y) * self.width + x) * self.channels
    }

    /// Split every image into a `rows x columns` grid of cells and stack the
    /// cells into one batch, image by image, left to right, top to bottom.
    /// Pixels that don't fill a whole cell on the right or bottom edge are
    /// dropped.
    pub fn grid_to_batch(&self, columns: usize, rows: usize) -> Result<ImageBatch, String> {
        if columns == 0 || rows == 0 {
            return Err("rows and columns must be at least 1".to_string());
        }
        self.check_shape()?;
        let cell_height = self.height / rows;
        let cell_width = self.width / columns;
        if cell_height == 0 || cell_width == 0 {
            return Err(format!(
                "{}x{} image is too small for a {}x{} grid",
                self.width, self.height, columns, rows
            ));
        }

        // Cells never hold more samples than the source, so once the source
        // shape is checked these products fit.
        let row_len = cell_width * self.channels;
        let cells = sample_count(&[self.batch, rows, columns]).ok_or_else(|| {
            format!(
                "{} images in a {}x{} grid is too many cells",
                self.batch, columns, rows
            )
        })?;
        let mut data = Vec::with_capacity(cells * cell_height * row_len);
        for b in 0..self.batch {
            for row in 0..rows {
                for col in 0..columns {
                    for y in 0..cell_height {
                        let start = self.index(b, row * cell_height + y, col * cell_width);
                        data.extend_from_slice(&self.data[start..start + row_len]);
                    }
                }
            }
        }

        ImageBatch::new(
            cells,
            cell_height,
            cell_width,
            self.channels,
            data,
        )
    }
}

/// Product of the dimensions, or `None` when it doesn't fit in `usize`
fn sample_count(dims: &[usize]) -> Option<usize> {
    dims.iter().try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
}

static GRID_TO_BATCH_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "properties": {
            "image": { "x-type": "IMAGE" },
            "columns": { "type": "integer", "default": 3, "minimum": 1, "maximum": 10, "step": 1 },
            "rows": { "type": "integer", "default": 3, "minimum": 1, "maximum": 10, "step": 1 }
        },
        "required": ["image"],
        "output": "IMAGE"
    })
});

pub struct CustomImageGridToBatch {
    category: String,
}

impl CustomImageGridToBatch {
    pub fn new(config: &PackConfig) -> Self {
        Self {
            category: config.category("Image"),
        }
    }
}

#[async_trait]
impl Node for CustomImageGridToBatch {
    fn class_name(&self) -> &str {
        "CustomImageGridToBatch"
    }

    fn display_name(&self) -> &str {
        "Image Grid to Batch"
    }

    fn category(&self) -> &str {
        &self.category
    }

    fn description(&self) -> &str {
        "Converts a grid of images to a batch, allowing for non-square grids with customizable rows and columns."
    }

    fn schema(&self) -> &Value {
        &GRID_TO_BATCH_SCHEMA
    }

    async fn execute(
        &self,
        inputs: Value,
        _ctx: &ExecutionContext,
    ) -> Result<NodeOutput, ContinuumError> {
        let fields = Inputs::new(self.class_name(), &inputs);
        let image = ImageBatch::deserialize(fields.required("image")?)
            .map_err(|e| fields.invalid(e.to_string()))?;
        image.check_shape().map_err(|e| fields.invalid(e))?;

        let columns = fields.i64_or("columns", 3)?;
        let rows = fields.i64_or("rows", 3)?;
        if !(1..=10).contains(&columns) || !(1..=10).contains(&rows) {
            return Err(fields.invalid("rows and columns must be between 1 and 10"));
        }

        let batch = image
            .grid_to_batch(columns as usize, rows as usize)
            .map_err(|e| fields.invalid(e))?;
        log::debug!(
            "Split {} grid image(s) into {} cells of {}x{}",
            image.batch,
            batch.batch,
            batch.width,
            batch.height
        );
        Ok(NodeOutput::single(serde_json::to_value(batch)?))
    }
}
