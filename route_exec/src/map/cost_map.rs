//! # Cost Map
//!
//! A [`CostMap`] wraps a 2D grid of scalar intensity values, typically the luminance of a map
//! image, and classifies each cell as free or obstacle by comparing it against a threshold.
//!
//! Cells brighter than the threshold are obstacles:
//! ```text
//!   value > obstacle_threshold  =>  obstacle
//!   value <= obstacle_threshold =>  free
//! ```
//!
//! In addition to the hard free/obstacle split the map provides a soft proximity cost, which
//! grows as a cell gets closer to obstacles. For every obstacle within `search_radius` cells
//! (Chebyshev) of the sampled cell the cost increases by `proximity_weight / (d + 1)`, where `d`
//! is the euclidean distance in cells. Sampling is `O(search_radius^2)` and is not cached, so
//! large radii on large maps make each search expansion expensive.

// ------------------------------------------------------------------------------------------------
// INCLUDES
// ------------------------------------------------------------------------------------------------

use std::path::Path;

use image::{GrayImage, ImageBuffer, Luma, Rgb, RgbImage};
use log::debug;
use nalgebra::{Point2, Vector2};
use ndarray::Array2;
use noise::{NoiseFn, Perlin};
use serde::{Deserialize, Serialize};

use super::Cell;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Cost Map
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CostMap {
    /// Raw intensity values, indexed `[[row, col]]`
    data: Array2<f64>,

    params: CostMapParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CostMapParams {
    /// Cells with a value strictly greater than this threshold are obstacles.
    pub obstacle_threshold: f64,

    /// Half-width, in cells, of the square neighbourhood sampled for the proximity cost.
    pub search_radius: usize,

    /// Cost contributed by an obstacle at zero distance, decaying as `1 / (distance + 1)`.
    pub proximity_weight: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors that can arise from building or saving cost maps.
#[derive(Debug, thiserror::Error)]
pub enum CostMapError {
    #[error("Cannot build a CostMap from an empty grid (shape {0} x {1})")]
    EmptyGrid(usize, usize),

    #[error("Cannot build a CostMap, expected {0} values but got {1}")]
    ShapeMismatch(usize, usize),

    #[error("Couldn't load or save the map image: {0}")]
    ImageError(image::ImageError),

    #[error("The map is too large to be saved as an image")]
    TooLargeForImage,
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Returns `true` if the given cell value represents an obstacle under `threshold`.
///
/// The convention is that values strictly above the threshold (bright cells) are obstacles.
pub fn is_obstacle(value: f64, threshold: f64) -> bool {
    value > threshold
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for CostMapParams {
    fn default() -> Self {
        Self {
            obstacle_threshold: 200.0,
            search_radius: 10,
            proximity_weight: 10.0,
        }
    }
}

impl CostMap {
    /// Create a new cost map from the given grid.
    ///
    /// The grid must have at least one row and one column.
    pub fn new(data: Array2<f64>, params: CostMapParams) -> Result<Self, CostMapError> {
        let (rows, cols) = data.dim();
        if rows == 0 || cols == 0 {
            return Err(CostMapError::EmptyGrid(rows, cols));
        }

        Ok(Self { data, params })
    }

    /// Create a new cost map from a row-major vector of values.
    pub fn from_vec(
        num_rows: usize,
        num_cols: usize,
        values: Vec<f64>,
        params: CostMapParams,
    ) -> Result<Self, CostMapError> {
        if num_rows == 0 || num_cols == 0 {
            return Err(CostMapError::EmptyGrid(num_rows, num_cols));
        }

        let num_values = values.len();
        let data = Array2::from_shape_vec((num_rows, num_cols), values)
            .map_err(|_| CostMapError::ShapeMismatch(num_rows * num_cols, num_values))?;

        Self::new(data, params)
    }

    /// Load a cost map from an image file, using the luminance of each pixel as the cell value.
    pub fn from_image<P: AsRef<Path>>(path: P, params: CostMapParams) -> Result<Self, CostMapError> {
        let image = image::open(path)
            .map_err(CostMapError::ImageError)?
            .to_luma8();

        Self::from_gray_image(&image, params)
    }

    /// Build a cost map from an 8-bit luminance image.
    pub fn from_gray_image(image: &GrayImage, params: CostMapParams) -> Result<Self, CostMapError> {
        let (width, height) = image.dimensions();

        let data = Array2::from_shape_fn((height as usize, width as usize), |(row, col)| {
            image.get_pixel(col as u32, row as u32).0[0] as f64
        });

        Self::new(data, params)
    }

    /// Generate a random cost map using a Perlin noise system.
    ///
    /// Noise values are mapped from `[-1, 1]` onto `[0, 255]`, so that the map has the same range
    /// as one loaded from an image.
    pub fn generate_random(
        num_cells: Vector2<usize>,
        perlin_scale: Point2<f64>,
        perlin_offset: Point2<f64>,
        params: CostMapParams,
    ) -> Result<Self, CostMapError> {
        let perlin = Perlin::new();

        let data = Array2::from_shape_fn((num_cells.y, num_cells.x), |(row, col)| {
            let noise = perlin.get([
                col as f64 * perlin_scale.x + perlin_offset.x,
                row as f64 * perlin_scale.y + perlin_offset.y,
            ]);

            ((noise + 1.0) * 127.5).max(0.0).min(255.0)
        });

        Self::new(data, params)
    }

    /// Render the map as a grayscale image, clamping values into `[0, 255]`.
    pub fn to_gray_image(&self) -> Result<GrayImage, CostMapError> {
        let (rows, cols) = self.data.dim();
        if rows > u32::MAX as usize || cols > u32::MAX as usize {
            return Err(CostMapError::TooLargeForImage);
        }

        Ok(ImageBuffer::from_fn(cols as u32, rows as u32, |x, y| {
            Luma([self.data[[y as usize, x as usize]].max(0.0).min(255.0) as u8])
        }))
    }

    /// Render the map as an RGB image, each cell drawn as a gray pixel. Used as the background
    /// when drawing routes over the map.
    pub fn to_rgb_image(&self) -> Result<RgbImage, CostMapError> {
        let gray = self.to_gray_image()?;

        Ok(ImageBuffer::from_fn(gray.width(), gray.height(), |x, y| {
            let v = gray.get_pixel(x, y).0[0];
            Rgb([v, v, v])
        }))
    }

    /// Save the map as a grayscale image.
    pub fn save_image<P: AsRef<Path>>(&self, path: P) -> Result<(), CostMapError> {
        self.to_gray_image()?
            .save(path)
            .map_err(CostMapError::ImageError)
    }

    /// The parameters this map was built with.
    pub fn params(&self) -> &CostMapParams {
        &self.params
    }

    /// Number of rows (the `y` extent) in the map.
    pub fn num_rows(&self) -> usize {
        self.data.nrows()
    }

    /// Number of columns (the `x` extent) in the map.
    pub fn num_cols(&self) -> usize {
        self.data.ncols()
    }

    /// Total number of cells in the map.
    pub fn num_cells(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the cell lies inside the map.
    pub fn contains(&self, cell: &Cell) -> bool {
        self.index(cell).is_some()
    }

    /// Get the flat row-major index of the cell, or `None` if it's outside the map.
    pub fn index(&self, cell: &Cell) -> Option<usize> {
        if cell.x < 0 || cell.y < 0 {
            return None;
        }

        let (x, y) = (cell.x as usize, cell.y as usize);
        if x >= self.num_cols() || y >= self.num_rows() {
            return None;
        }

        Some(y * self.num_cols() + x)
    }

    /// Get the cell at the given flat row-major index.
    pub fn cell(&self, index: usize) -> Cell {
        Cell::new(
            (index % self.num_cols()) as isize,
            (index / self.num_cols()) as isize,
        )
    }

    /// Get the raw value of the cell, or `None` if it's outside the map.
    pub fn get(&self, cell: &Cell) -> Option<f64> {
        self.index(cell)
            .map(|_| self.data[[cell.y as usize, cell.x as usize]])
    }

    /// Returns `true` if the cell is inside the map and is not an obstacle.
    pub fn is_free(&self, cell: &Cell) -> bool {
        match self.get(cell) {
            Some(v) => !is_obstacle(v, self.params.obstacle_threshold),
            None => false,
        }
    }

    /// Compute the proximity cost of the cell, the sum of the repulsive penalties of every
    /// obstacle within the search radius.
    pub fn proximity_cost(&self, cell: &Cell) -> f64 {
        // A radius wider than the map covers the same cells as one equal to its largest side
        let radius = self
            .params
            .search_radius
            .min(self.num_rows().max(self.num_cols())) as isize;
        let threshold = self.params.obstacle_threshold;

        // Clip the search window to the map so the inner loop needs no bounds checks
        let min_x = cell.x.saturating_sub(radius).max(0);
        let max_x = cell.x.saturating_add(radius).min(self.num_cols() as isize - 1);
        let min_y = cell.y.saturating_sub(radius).max(0);
        let max_y = cell.y.saturating_add(radius).min(self.num_rows() as isize - 1);

        let mut cost = 0.0;

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                if is_obstacle(self.data[[y as usize, x as usize]], threshold) {
                    let dx = (x - cell.x) as f64;
                    let dy = (y - cell.y) as f64;
                    cost += self.params.proximity_weight / ((dx * dx + dy * dy).sqrt() + 1.0);
                }
            }
        }

        cost
    }

    /// Count the obstacle cells in the map.
    pub fn num_obstacles(&self) -> usize {
        let num = self
            .data
            .iter()
            .filter(|&&v| is_obstacle(v, self.params.obstacle_threshold))
            .count();

        debug!("{} of {} cells are obstacles", num, self.num_cells());

        num
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
