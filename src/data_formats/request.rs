use serde::{Deserialize, Serialize};

use crate::models::Category;

pub const TITLE_MAX_CHARS: usize = 30;
pub const CATEGORY_NAME_MAX_CHARS: usize = 50;
pub const USERNAME_MAX_CHARS: usize = 150;
pub const PASSWORD_MIN_CHARS: usize = 8;

/// Field name and message pairs, rendered next to the offending input.
pub type FieldErrors = Vec<(&'static str, String)>;

// ----------------- Account Forms -----------------
#[derive(Deserialize, Serialize, Debug, Default)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize, Serialize, Debug, Default)]
#[serde(default)]
pub struct SignupForm {
    pub username: String,
    pub password1: String,
    pub password2: String,
}

impl SignupForm {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        let username = self.username.trim();
        if username.is_empty() {
            errors.push(("username", "This field is required.".to_owned()));
        } else if username.chars().count() > USERNAME_MAX_CHARS {
            errors.push((
                "username",
                format!("Use at most {USERNAME_MAX_CHARS} characters."),
            ));
        } else if !username
            .chars()
            .all(|c| c.is_alphanumeric() || "@.+-_".contains(c))
        {
            errors.push((
                "username",
                "Use only letters, digits and @/./+/-/_ characters.".to_owned(),
            ));
        }
        if self.password1.chars().count() < PASSWORD_MIN_CHARS {
            errors.push((
                "password1",
                format!("Use at least {PASSWORD_MIN_CHARS} characters."),
            ));
        } else if self.password1 != self.password2 {
            errors.push(("password2", "The two passwords do not match.".to_owned()));
        }
        errors
    }
}

// ----------------- Post Forms -----------------
#[derive(Deserialize, Serialize, Debug, Default, Clone)]
#[serde(default)]
pub struct PostForm {
    pub title: String,
    pub content: String,
    /// Category id, empty for uncategorized.
    pub category: String,
    pub tags_str: String,
}

/// A post form that passed validation.
#[derive(Debug, Clone)]
pub struct PostInput {
    pub title: String,
    pub content: String,
    pub category_id: Option<i64>,
    pub tag_names: Vec<String>,
}

impl PostForm {
    pub fn validate(&self, categories: &[Category]) -> Result<PostInput, FieldErrors> {
        let mut errors = FieldErrors::new();
        let title = self.title.trim();
        if title.is_empty() {
            errors.push(("title", "This field is required.".to_owned()));
        } else if title.chars().count() > TITLE_MAX_CHARS {
            errors.push(("title", format!("Use at most {TITLE_MAX_CHARS} characters.")));
        }
        if self.content.trim().is_empty() {
            errors.push(("content", "This field is required.".to_owned()));
        }
        let category = self.category.trim();
        let category_id = if category.is_empty() {
            None
        } else {
            match category.parse::<i64>() {
                Ok(id) if categories.iter().any(|c| c.id == id) => Some(id),
                _ => {
                    errors.push(("category", "Select a valid category.".to_owned()));
                    None
                }
            }
        };
        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(PostInput {
            title: title.to_owned(),
            content: self.content.clone(),
            category_id,
            tag_names: crate::parse_tag_names(&self.tags_str),
        })
    }
}

// ----------------- Comment & Category Forms -----------------
#[derive(Deserialize, Serialize, Debug, Default, Clone)]
#[serde(default)]
pub struct CommentForm {
    pub content: String,
}

impl CommentForm {
    pub fn validate(&self) -> Result<String, FieldErrors> {
        if self.content.trim().is_empty() {
            return Err(vec![("content", "This field is required.".to_owned())]);
        }
        Ok(self.content.clone())
    }
}

#[derive(Deserialize, Serialize, Debug, Default, Clone)]
#[serde(default)]
pub struct CategoryForm {
    pub name: String,
}

impl CategoryForm {
    pub fn validate(&self) -> Result<String, FieldErrors> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(vec![("name", "This field is required.".to_owned())]);
        }
        if name.chars().count() > CATEGORY_NAME_MAX_CHARS {
            return Err(vec![(
                "name",
                format!("Use at most {CATEGORY_NAME_MAX_CHARS} characters."),
            )]);
        }
        Ok(name.to_owned())
    }
}
