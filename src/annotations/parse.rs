//! Resolution of raw parts into typed annotation entities.

use std::collections::{BTreeSet, HashMap};

use super::model::{Annotation, AnnotationData, Choices, Region, Task};
use super::raw::{PartKind, RawAnnotation, RawPart, RawTask};
use crate::diagnostics::{DiagnosticCode, DiagnosticContext, Diagnostics};
use crate::error::ExportError;

/// Options that apply while turning raw tasks into [`Task`]s.
#[derive(Clone, Debug, Default)]
pub struct ParseOptions {
    /// Split membership for annotations that carry no `data_categories` of
    /// their own.
    pub default_categories: BTreeSet<String>,
}

impl ParseOptions {
    pub fn with_default_categories<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            default_categories: categories.into_iter().map(Into::into).collect(),
        }
    }
}

type Recognizer = fn(&BTreeSet<PartKind>) -> bool;
type Constructor = fn(String) -> AnnotationData;

/// Variants in priority order; the first one that recognizes a group's tag
/// set wins.
const VARIANTS: [(Recognizer, Constructor); 2] = [
    (Region::recognizes, new_region),
    (Choices::recognizes, new_choices),
];

fn new_region(id: String) -> AnnotationData {
    AnnotationData::Region(Region::new(id))
}

fn new_choices(id: String) -> AnnotationData {
    AnnotationData::Choices(Choices::new(id))
}

/// Parses one raw task into a [`Task`].
///
/// Part groups that match no variant are dropped and reported in
/// `diagnostics`. Malformed part values abort with an error.
pub fn parse_task(
    raw: &RawTask,
    options: &ParseOptions,
    diagnostics: &mut Diagnostics,
) -> Result<Task, ExportError> {
    let task_id = raw.id.to_string();
    let image_url = raw
        .data
        .image
        .clone()
        .ok_or_else(|| ExportError::MissingField {
            context: format!("task {task_id}"),
            field: "data.image".to_string(),
        })?;

    let mut annotations = Vec::with_capacity(raw.annotations.len());
    for raw_annotation in &raw.annotations {
        if raw_annotation.was_cancelled {
            tracing::debug!(
                task = %task_id,
                annotation = %raw_annotation.id,
                "skipping cancelled annotation"
            );
            continue;
        }
        annotations.push(parse_annotation(
            &task_id,
            raw_annotation,
            options,
            diagnostics,
        )?);
    }

    Ok(Task::new(task_id, image_url, annotations))
}

/// Parses one labeling pass into an [`Annotation`].
pub fn parse_annotation(
    task_id: &str,
    raw: &RawAnnotation,
    options: &ParseOptions,
    diagnostics: &mut Diagnostics,
) -> Result<Annotation, ExportError> {
    let annotation_id = raw.id.to_string();
    let data_categories = match &raw.data_categories {
        Some(categories) => categories.iter().cloned().collect(),
        None => options.default_categories.clone(),
    };

    let mut data = Vec::new();
    for (group_id, parts) in group_parts(&raw.result) {
        let kinds: BTreeSet<PartKind> = parts.iter().map(|part| part.kind()).collect();

        let Some((_, construct)) = VARIANTS.iter().find(|(recognizes, _)| recognizes(&kinds))
        else {
            let tags: Vec<&str> = parts.iter().map(|part| part.part_type.as_str()).collect();
            diagnostics.warn(
                DiagnosticCode::UnresolvedAnnotationData,
                format!("no annotation data type matches part types {tags:?}; dropped"),
                DiagnosticContext::Region {
                    task_id: task_id.to_string(),
                    annotation_id: annotation_id.clone(),
                    region_id: group_id,
                },
            );
            continue;
        };

        let context = format!("task {task_id} annotation {annotation_id} part {group_id}");
        let mut entity = construct(group_id);
        for part in parts {
            entity.process_part(part, &context)?;
        }
        data.push(entity);
    }

    Ok(Annotation::from_data(annotation_id, data_categories, data))
}

/// Groups parts by id, keeping groups in order of first appearance and parts
/// in arrival order.
fn group_parts(parts: &[RawPart]) -> Vec<(String, Vec<&RawPart>)> {
    let mut groups: Vec<(String, Vec<&RawPart>)> = Vec::new();
    let mut index_by_id: HashMap<String, usize> = HashMap::new();

    for part in parts {
        let id = part.id.to_string();
        match index_by_id.get(&id) {
            Some(&idx) => groups[idx].1.push(part),
            None => {
                index_by_id.insert(id.clone(), groups.len());
                groups.push((id, vec![part]));
            }
        }
    }

    groups
}
