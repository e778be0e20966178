//! Multi-document YAML rendering.

use kubeforge_common::constants::DOCUMENT_SEPARATOR;
use kubeforge_common::error::Result;

use crate::objects::ManifestObject;

/// Renders a manifest set as one multi-document YAML stream, separated by
/// `---` lines, in the order the objects were generated.
///
/// # Errors
///
/// Returns an error if an object fails to serialize.
pub fn to_yaml(objects: &[ManifestObject]) -> Result<String> {
    let mut documents = Vec::with_capacity(objects.len());
    for object in objects {
        documents.push(serde_yaml::to_string(object.as_value())?);
    }
    Ok(documents.join(&format!("{DOCUMENT_SEPARATOR}\n")))
}
