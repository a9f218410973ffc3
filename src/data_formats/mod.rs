mod request;
mod response;

pub use request::*;
pub use response::*;

/// Slug reserved for the list of posts without a category.
pub const NO_CATEGORY_SLUG: &str = "no_category";

#[derive(Debug, Default, Clone)]
pub struct PostFilter {
    pub category: Option<String>,
    pub uncategorized: bool,
    pub tag: Option<String>,
    pub search: Option<String>,
    pub limit: Option<i64>,
}

impl PostFilter {
    pub fn recent(limit: i64) -> Self {
        PostFilter {
            limit: Some(limit),
            ..Default::default()
        }
    }

    pub fn category(slug: &str) -> Self {
        if slug == NO_CATEGORY_SLUG {
            return PostFilter {
                uncategorized: true,
                ..Default::default()
            };
        }
        PostFilter {
            category: Some(slug.to_owned()),
            ..Default::default()
        }
    }

    pub fn tag(slug: &str) -> Self {
        PostFilter {
            tag: Some(slug.to_owned()),
            ..Default::default()
        }
    }

    pub fn search(term: &str) -> Self {
        PostFilter {
            search: Some(term.to_owned()),
            ..Default::default()
        }
    }
}
