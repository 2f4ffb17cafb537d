//! Result classification.
//!
//! The first object decides the type of the whole result; traversals are
//! assumed to yield one kind of object. A stream mixing kinds is not
//! rejected, later objects of another kind are simply not extracted.

use notegraph_core::{CellLanguage, GraphObject, ResultType};

pub fn classify(language: CellLanguage, first: Option<&GraphObject>) -> ResultType {
    if language == CellLanguage::Markdown {
        return ResultType::Markdown;
    }
    match first {
        None => ResultType::Empty,
        Some(GraphObject::Vertex(_)) => ResultType::Vertex,
        Some(GraphObject::Edge(_)) => ResultType::Edge,
        Some(GraphObject::Path(_)) => ResultType::Path,
        Some(GraphObject::Integer(_)) => ResultType::Number,
        Some(GraphObject::Scalar(_) | GraphObject::Opaque(_)) => ResultType::Other,
    }
}
