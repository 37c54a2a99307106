//! Fixed expense categories.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the ten expense categories. Anything unknown is [`Category::Otros`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Comida,
    Transporte,
    Servicios,
    Entretenimiento,
    Salud,
    Educacion,
    Ropa,
    Tecnologia,
    Hogar,
    #[default]
    Otros,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::Comida,
        Category::Transporte,
        Category::Servicios,
        Category::Entretenimiento,
        Category::Salud,
        Category::Educacion,
        Category::Ropa,
        Category::Tecnologia,
        Category::Hogar,
        Category::Otros,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Category::Comida => "comida",
            Category::Transporte => "transporte",
            Category::Servicios => "servicios",
            Category::Entretenimiento => "entretenimiento",
            Category::Salud => "salud",
            Category::Educacion => "educacion",
            Category::Ropa => "ropa",
            Category::Tecnologia => "tecnologia",
            Category::Hogar => "hogar",
            Category::Otros => "otros",
        }
    }

    /// Exact (case-insensitive) match against the category names.
    #[must_use]
    pub fn from_keyword(value: &str) -> Option<Self> {
        let value = value.trim().to_lowercase();
        Self::ALL.into_iter().find(|c| c.as_str() == value)
    }

    /// First category whose name appears anywhere in `text`.
    ///
    /// `text` is expected to be lowercase and accent-folded.
    #[must_use]
    pub fn find_in(text: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| text.contains(c.as_str()))
    }

    /// Comma separated list of every category, for help texts.
    #[must_use]
    pub fn names() -> String {
        Self::ALL
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Category {
    fn from(value: String) -> Self {
        Self::from_keyword(&value).unwrap_or_default()
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        value.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_match_is_case_insensitive() {
        assert_eq!(Category::from_keyword("Comida"), Some(Category::Comida));
        assert_eq!(Category::from_keyword("pizza"), None);
    }

    #[test]
    fn unknown_stored_category_reads_back_as_otros() {
        let parsed: Category = serde_json::from_str("\"viajes\"").unwrap();
        assert_eq!(parsed, Category::Otros);
        assert_eq!(serde_json::to_string(&Category::Salud).unwrap(), "\"salud\"");
    }

    #[test]
    fn find_in_returns_first_listed_match() {
        assert_eq!(
            Category::find_in("200 en transporte"),
            Some(Category::Transporte)
        );
        assert_eq!(Category::find_in("nada que ver"), None);
    }
}
