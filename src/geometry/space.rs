//! Coordinate spaces a box passes through on its way from the labeling tool
//! to a training format. The markers are uninhabited and only ever appear as
//! type parameters.

/// Percent of the image on both axes (0 to 100), as the labeling tool exports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Percent {}

/// Fractions of the image (0 to 1), as YOLO labels expect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Normalized {}

/// Absolute pixels of a decoded raster.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Pixel {}
