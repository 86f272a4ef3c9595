//! Typed annotation entities.
//!
//! A [`Task`] is one source image. Each labeling pass over it is an
//! [`Annotation`], which owns the resolved [`AnnotationData`] entities: spatial
//! [`Region`]s and categorical [`Choices`].

use std::collections::BTreeSet;

use super::raw::{
    ChoicesValue, LabelsValue, PartKind, PolygonValue, RawPart, RectangleValue, TextAreaValue,
};
use crate::error::ExportError;
use crate::geometry::{BBoxXYXY, Coord, Percent};

/// Split name that routes an annotation into the training set.
pub const TRAINING_CATEGORY: &str = "Training";

/// Split name that routes an annotation into the validation set.
pub const VALIDATION_CATEGORY: &str = "Validation";

/// One source image and all annotation passes made on it.
#[derive(Clone, Debug, PartialEq)]
pub struct Task {
    pub id: String,
    /// Locator handed to the [`ImageSource`](crate::source::ImageSource).
    pub image_url: String,
    /// Annotation passes in arrival order.
    pub annotations: Vec<Annotation>,
}

impl Task {
    pub fn new(
        id: impl Into<String>,
        image_url: impl Into<String>,
        annotations: Vec<Annotation>,
    ) -> Self {
        Self {
            id: id.into(),
            image_url: image_url.into(),
            annotations,
        }
    }
}

/// One complete labeling pass over a task's image.
#[derive(Clone, Debug, PartialEq)]
pub struct Annotation {
    pub id: String,
    data: Vec<AnnotationData>,
    /// Mean of the regions' rotations, in degrees.
    pub image_rotation: f64,
    /// Externally assigned split membership (e.g. `Training`, `Validation`).
    pub data_categories: BTreeSet<String>,
}

impl Annotation {
    /// Creates an annotation with no data.
    pub fn new(id: impl Into<String>, data_categories: BTreeSet<String>) -> Self {
        Self {
            id: id.into(),
            data: Vec::new(),
            image_rotation: 0.0,
            data_categories,
        }
    }

    /// Creates an annotation from resolved entities and resolves its rotation.
    ///
    /// Entities keep their order; an entity whose id is already present
    /// replaces the earlier one.
    pub fn from_data(
        id: impl Into<String>,
        data_categories: BTreeSet<String>,
        data: impl IntoIterator<Item = AnnotationData>,
    ) -> Self {
        let mut annotation = Self::new(id, data_categories);
        for entity in data {
            match annotation
                .data
                .iter_mut()
                .find(|existing| existing.id() == entity.id())
            {
                Some(existing) => *existing = entity,
                None => annotation.data.push(entity),
            }
        }
        annotation.image_rotation = annotation.mean_region_rotation();
        annotation
    }

    /// All resolved entities, in order of first appearance.
    pub fn data(&self) -> &[AnnotationData] {
        &self.data
    }

    /// Looks up an entity by id.
    pub fn get(&self, id: &str) -> Option<&AnnotationData> {
        self.data.iter().find(|entity| entity.id() == id)
    }

    pub fn regions(&self) -> impl Iterator<Item = &Region> {
        self.data.iter().filter_map(|entity| match entity {
            AnnotationData::Region(region) => Some(region),
            AnnotationData::Choices(_) => None,
        })
    }

    pub fn choices(&self) -> impl Iterator<Item = &Choices> {
        self.data.iter().filter_map(|entity| match entity {
            AnnotationData::Choices(choices) => Some(choices),
            AnnotationData::Region(_) => None,
        })
    }

    /// Returns true if the annotation carries any spatial data.
    pub fn has_regions(&self) -> bool {
        self.regions().next().is_some()
    }

    pub fn in_category(&self, category: &str) -> bool {
        self.data_categories.contains(category)
    }

    fn mean_region_rotation(&self) -> f64 {
        let (sum, count) = self
            .regions()
            .fold((0.0, 0usize), |(sum, count), region| {
                (sum + region.image_rotation, count + 1)
            });
        if count == 0 {
            0.0
        } else {
            sum / count as f64
        }
    }
}

/// A resolved annotation data entity.
#[derive(Clone, Debug, PartialEq)]
pub enum AnnotationData {
    Region(Region),
    Choices(Choices),
}

impl AnnotationData {
    pub fn id(&self) -> &str {
        match self {
            AnnotationData::Region(region) => &region.id,
            AnnotationData::Choices(choices) => &choices.id,
        }
    }

    /// Feeds one raw part into the entity, dispatching on the part's type.
    ///
    /// `context` names the part in error messages.
    pub fn process_part(&mut self, part: &RawPart, context: &str) -> Result<(), ExportError> {
        match self {
            AnnotationData::Region(region) => region.process_part(part, context),
            AnnotationData::Choices(choices) => choices.process_part(part, context),
        }
    }
}

/// A spatial annotation: a closed ring of points plus its transcription.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Region {
    pub id: String,
    pub text: String,
    pub labels: Vec<String>,
    /// Closed ring in percentage space (first point repeated last).
    pub points: Vec<Coord<Percent>>,
    /// Rotation of the image when the region was drawn, in degrees.
    pub image_rotation: f64,
    /// Pixel width of the source image, as reported by the labeling tool.
    pub original_width: Option<u32>,
    /// Pixel height of the source image, as reported by the labeling tool.
    pub original_height: Option<u32>,
}

impl Region {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// A region needs a transcription and some geometry.
    pub fn recognizes(kinds: &BTreeSet<PartKind>) -> bool {
        kinds.contains(&PartKind::TextArea)
            && (kinds.contains(&PartKind::Rectangle) || kinds.contains(&PartKind::Polygon))
    }

    pub fn process_part(&mut self, part: &RawPart, context: &str) -> Result<(), ExportError> {
        match part.kind() {
            PartKind::Labels => {
                let value: LabelsValue = decode(part, context)?;
                self.labels = value.labels;
            }
            PartKind::TextArea => {
                let value: TextAreaValue = decode(part, context)?;
                self.text = value
                    .text
                    .into_iter()
                    .next()
                    .ok_or_else(|| ExportError::MissingField {
                        context: context.to_string(),
                        field: "text[0]".to_string(),
                    })?;
            }
            PartKind::Rectangle => {
                let RectangleValue {
                    x,
                    y,
                    width,
                    height,
                } = decode(part, context)?;
                self.points.extend([
                    Coord::new(x, y),
                    Coord::new(x + width, y),
                    Coord::new(x + width, y + height),
                    Coord::new(x, y + height),
                ]);
                self.close_ring();
            }
            PartKind::Polygon => {
                let value: PolygonValue = decode(part, context)?;
                if value.points.is_empty() {
                    return Err(ExportError::MissingField {
                        context: context.to_string(),
                        field: "points[0]".to_string(),
                    });
                }
                self.points.extend(
                    value
                        .points
                        .iter()
                        .map(|[x, y]| Coord::new(x.round_ties_even(), y.round_ties_even())),
                );
                self.close_ring();
            }
            PartKind::Choices | PartKind::Other => return Ok(()),
        }

        if let Some(rotation) = part.image_rotation {
            self.image_rotation = rotation;
        }
        if part.original_width.is_some() {
            self.original_width = part.original_width;
        }
        if part.original_height.is_some() {
            self.original_height = part.original_height;
        }
        Ok(())
    }

    /// Axis-aligned bounds of the ring, or `None` before any geometry.
    pub fn bounding_box(&self) -> Option<BBoxXYXY<Percent>> {
        let first = self.points.first()?;
        let init = BBoxXYXY::from_xyxy(first.x, first.y, first.x, first.y);
        Some(self.points.iter().fold(init, |bbox, point| {
            BBoxXYXY::from_xyxy(
                bbox.xmin().min(point.x),
                bbox.ymin().min(point.y),
                bbox.xmax().max(point.x),
                bbox.ymax().max(point.y),
            )
        }))
    }

    fn close_ring(&mut self) {
        if let Some(first) = self.points.first().copied() {
            self.points.push(first);
        }
    }
}

/// A categorical annotation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Choices {
    pub id: String,
    pub choices: Vec<String>,
}

impl Choices {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            choices: Vec::new(),
        }
    }

    pub fn recognizes(kinds: &BTreeSet<PartKind>) -> bool {
        kinds.contains(&PartKind::Choices)
    }

    pub fn process_part(&mut self, part: &RawPart, context: &str) -> Result<(), ExportError> {
        if part.kind() == PartKind::Choices {
            let value: ChoicesValue = decode(part, context)?;
            self.choices.extend(value.choices);
        }
        Ok(())
    }
}

fn decode<T: serde::de::DeserializeOwned>(part: &RawPart, context: &str) -> Result<T, ExportError> {
    part.decode_value()
        .map_err(|source| ExportError::PartValueInvalid {
            context: context.to_string(),
            part_type: part.part_type.clone(),
            source,
        })
}
