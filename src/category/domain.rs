//! Core taxonomy types: sections, category names and the taxonomy itself.

use std::{fmt::Display, str::FromStr};

use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{MapAccess, Visitor},
};

use crate::Error;

/// A validated, non-empty section name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SectionName(String);

impl SectionName {
    /// Create a section name.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::EmptySectionName] if `name` is empty or only
    /// whitespace.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptySectionName)
        } else {
            Ok(Self(name.to_string()))
        }
    }
}

impl AsRef<str> for SectionName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for SectionName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated, non-empty category name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::EmptyCategoryName] if `name` is empty or only
    /// whitespace.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyCategoryName)
        } else {
            Ok(Self(name.to_string()))
        }
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for CategoryName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoryName::new(s)
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named group of related categories, e.g. "Housing" holding "Rent" and "Home Insurance".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// The section's display name.
    pub name: String,
    /// The section's category names in display order.
    pub categories: Vec<String>,
}

impl Section {
    /// Create a section from a name and its categories.
    pub fn new(name: &str, categories: &[&str]) -> Self {
        Self {
            name: name.to_owned(),
            categories: categories.iter().map(|&name| name.to_owned()).collect(),
        }
    }
}

/// The mapping from section names to their ordered lists of category names.
///
/// Category names are unique within a section but may repeat across sections.
/// Lookups scan the sections in order and the first match wins.
///
/// Serialized as a JSON object whose keys follow the section order, e.g.
/// `{"Housing": ["Rent"], "Income": ["Salary"]}`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Taxonomy {
    sections: Vec<Section>,
}

impl Taxonomy {
    /// Create a taxonomy from sections in display order.
    pub fn new(sections: Vec<Section>) -> Self {
        Self { sections }
    }

    /// The sections in display order.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Whether the taxonomy has no sections.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// The name of the first section that lists `category`, matching names exactly.
    pub fn section_of(&self, category: &str) -> Option<&str> {
        self.sections
            .iter()
            .find(|section| section.categories.iter().any(|name| name == category))
            .map(|section| section.name.as_str())
    }

    /// Find `category` ignoring case, returning the taxonomy's spelling of it.
    pub fn find_category(&self, category: &str) -> Option<&str> {
        let category = category.trim();

        self.sections
            .iter()
            .flat_map(|section| section.categories.iter())
            .find(|name| name.eq_ignore_ascii_case(category))
            .map(String::as_str)
    }
}

impl Serialize for Taxonomy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(
            self.sections
                .iter()
                .map(|section| (&section.name, &section.categories)),
        )
    }
}

struct TaxonomyVisitor;

impl<'de> Visitor<'de> for TaxonomyVisitor {
    type Value = Taxonomy;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("a map of section names to lists of category names")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut sections = Vec::with_capacity(map.size_hint().unwrap_or(0));

        while let Some((name, categories)) = map.next_entry::<String, Vec<String>>()? {
            sections.push(Section { name, categories });
        }

        Ok(Taxonomy { sections })
    }
}

impl<'de> Deserialize<'de> for Taxonomy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(TaxonomyVisitor)
    }
}
