use crate::models::{Category, CategoryCount, Comment, Post, Tag};

/// A post with the tags attached to it, ready to render.
#[derive(Debug, Clone)]
pub struct PostView {
    pub post: Post,
    pub tags: Vec<Tag>,
}

impl PostView {
    pub fn new(post: Post, tags: Vec<Tag>) -> Self {
        PostView { post, tags }
    }

    pub fn url(&self) -> String {
        format!("/board/{}/", self.post.id)
    }

    /// Tag names joined the way the tag field of the edit form expects them.
    pub fn tags_str(&self) -> String {
        self.tags
            .iter()
            .map(|tag| tag.name.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone)]
pub struct PostDetail {
    pub post: PostView,
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, Default)]
pub struct Sidebar {
    pub categories: Vec<CategoryCount>,
    pub uncategorized: i64,
}

/// What a post list was filtered by; drives the page heading.
#[derive(Debug, Clone)]
pub enum ListHeading {
    All,
    Category(Category),
    Uncategorized,
    Tag(Tag),
    Search(String),
}

impl ListHeading {
    pub fn title(&self, count: usize) -> String {
        match self {
            ListHeading::All => "Board".to_owned(),
            ListHeading::Category(category) => format!("Category: {} ({count})", category.name),
            ListHeading::Uncategorized => format!("Category: uncategorized ({count})"),
            ListHeading::Tag(tag) => format!("Tag: {} ({count})", tag.name),
            ListHeading::Search(term) => format!("Search: {term} ({count})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headings_report_counts() {
        assert_eq!(ListHeading::All.title(3), "Board");
        assert_eq!(
            ListHeading::Search("python".to_owned()).title(1),
            "Search: python (1)"
        );
        assert_eq!(
            ListHeading::Uncategorized.title(0),
            "Category: uncategorized (0)"
        );
        let tag = Tag {
            id: 1,
            name: "Korean Tag".to_owned(),
            slug: "korean-tag".to_owned(),
        };
        assert_eq!(ListHeading::Tag(tag).title(2), "Tag: Korean Tag (2)");
    }
}
