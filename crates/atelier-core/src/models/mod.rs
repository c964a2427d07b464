//! Data models for textile design content.
//!
//! - `Project`: a design with its images, materials and dimensions
//! - `NavigationContext`, `ProjectLink`: previous/next links between designs
//! - `SlugRecord`, `SlugEntry`: slug listings for static generation

pub mod project;

pub use project::{
    Dimensions, GalleryImage, ImageAsset, ImageDimensions, ImageMetadata, ImageSource,
    NavigationContext, NavigationEntry, Project, ProjectLink, Slug, SlugEntry, SlugRecord,
};
