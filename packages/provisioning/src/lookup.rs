// ABOUTME: Resolves a user-supplied identifier to a known container or image
// ABOUTME: Accepts full ids, 12-character id prefixes and names

use dockyard_runtime::{strip_name_separator, ContainerSummary, ImageSummary};

/// Find the container a full id, short id or name refers to
pub fn find_container<'a>(
    containers: &'a [ContainerSummary],
    ident: &str,
) -> Option<&'a ContainerSummary> {
    let ident = ident.trim();
    if ident.is_empty() {
        return None;
    }
    let name = strip_name_separator(ident);

    containers.iter().find(|c| {
        c.id == ident
            || (ident.len() == 12 && c.id.starts_with(ident))
            || c.display_names().any(|n| n == name)
    })
}

/// Find the local image an id, id prefix or tag refers to.
///
/// Tried in order: exact id, `sha256:` id, id prefix, exact tag, tag substring.
pub fn find_image<'a>(images: &'a [ImageSummary], ident: &str) -> Option<&'a ImageSummary> {
    let ident = ident.trim();
    if ident.is_empty() {
        return None;
    }
    let digest = format!("sha256:{}", ident);

    let by_id = images
        .iter()
        .find(|i| i.id == ident || i.id == digest || i.id.starts_with(&digest));
    if by_id.is_some() {
        return by_id;
    }

    images
        .iter()
        .find(|i| i.repo_tags.iter().any(|t| t == ident))
        .or_else(|| {
            images
                .iter()
                .find(|i| i.repo_tags.iter().any(|t| t.contains(ident)))
        })
}

/// Tags and short ids of local images, offered when a lookup fails
pub fn available_images(images: &[ImageSummary]) -> Vec<String> {
    images
        .iter()
        .flat_map(|i| {
            i.repo_tags
                .iter()
                .filter(|t| t.as_str() != "<none>:<none>")
                .cloned()
                .chain(std::iter::once(i.short_id().to_string()))
        })
        .collect()
}
