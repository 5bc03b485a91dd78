//! Per-build image deduplication
//!
//! Every image copied during one build is remembered by the SHA-256 of its
//! bytes. A byte-identical image is stored once in the output; every
//! reference to it gets its own relationship to that one part.

use sha2::{Digest, Sha256};
use store::{relationship_types as rt, PartContent, PartKind, Package, StoreResult};

/// An image already present in the output package
#[derive(Debug, Clone)]
struct ImageResource {
    signature: [u8; 32],
    content_type: String,
    part_name: String,
}

/// Images copied so far in one build
#[derive(Debug, Default)]
pub struct ImageCache {
    images: Vec<ImageResource>,
}

impl ImageCache {
    /// Number of distinct image parts created
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Bind an image into `destination`, returning a new relationship id to
    /// reference it by. Creates the image part only for new content.
    pub fn bind(
        &mut self,
        out: &mut Package,
        destination: &str,
        content_type: &str,
        extension: &str,
        bytes: &[u8],
    ) -> StoreResult<String> {
        let signature: [u8; 32] = Sha256::digest(bytes).into();

        let existing = self.images.iter().find(|image| {
            image.signature == signature
                && image.content_type == content_type
                && out.binary(&image.part_name) == Some(bytes)
        });
        if let Some(image) = existing {
            tracing::debug!("Reusing image {} in {}", image.part_name, destination);
            return out.add_relationship(destination, &image.part_name, rt::IMAGE);
        }

        let new_part = out.add_part(
            destination,
            PartKind::image(content_type, extension),
            PartContent::Binary(bytes.to_vec()),
        )?;
        self.images.push(ImageResource {
            signature,
            content_type: content_type.to_string(),
            part_name: new_part.name,
        });
        Ok(new_part.rel_id)
    }
}
