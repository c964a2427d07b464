//! GROQ queries for textile design content.

/// Designs for the home gallery, manual order first, then featured, then newest.
pub const DESIGNS_FOR_HOME: &str = r#"*[_type == "textileDesign"] {
  _id, title, slug, year, featured, order, _createdAt,
  image { asset-> { _id, metadata { dimensions } } }
} | order(order asc, featured desc, _createdAt desc)[0...20]"#;

/// A single design by slug or document id. Expects `$slug`.
pub const PROJECT_BY_SLUG: &str = r#"*[_type == "textileDesign" && (slug.current == $slug || _id == $slug)][0] {
  _id, title, slug, year, featured, order, _createdAt,
  image { asset-> { _id, metadata { dimensions } } },
  gallery[] { _key, asset-> { _id, metadata { dimensions } }, caption },
  description, detailedDescription, materials, dimensions, technique
}"#;

/// Previous/next designs around `$slug` by manual order.
pub const PROJECT_NAVIGATION: &str = r#"{
  "current": *[_type == "textileDesign" && slug.current == $slug][0] { _id, title, slug, order },
  "previous": *[_type == "textileDesign" && order < *[_type == "textileDesign" && slug.current == $slug][0].order] | order(order desc)[0] { _id, title, slug },
  "next": *[_type == "textileDesign" && order > *[_type == "textileDesign" && slug.current == $slug][0].order] | order(order asc)[0] { _id, title, slug }
}"#;

/// Every published slug, for sitemaps and static generation.
pub const ALL_SLUGS: &str = r#"*[_type == "textileDesign" && defined(slug.current)] {
  "slug": slug.current, _updatedAt
}"#;

/// Maximum accepted slug length in characters
const MAX_SLUG_LENGTH: usize = 200;

pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty() && slug.chars().count() < MAX_SLUG_LENGTH
}
