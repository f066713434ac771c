// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Tag filtering for the draw-list lane.

use thiserror::Error;

/// Errors produced while parsing a tag filter pattern.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TagFilterError {
    /// The pattern is empty or only whitespace.
    #[error("tag filter pattern is empty")]
    Empty,
    /// One of the `|`-separated alternatives is empty.
    #[error("tag filter pattern '{pattern}' has an empty alternative at position {index}")]
    EmptyAlternative {
        /// The full pattern.
        pattern: String,
        /// Zero-based index of the empty alternative.
        index: usize,
    },
}

/// A parsed tag filter.
///
/// The pattern is a `|`-separated list of globs, where `*` matches any run of
/// characters and `?` matches exactly one. A tag passes when it matches any
/// alternative. Untagged entities always pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagFilter {
    pattern: String,
    alternatives: Vec<Vec<char>>,
}

impl TagFilter {
    /// Parses `pattern`.
    pub fn parse(pattern: &str) -> Result<Self, TagFilterError> {
        let trimmed = pattern.trim();
        if trimmed.is_empty() {
            return Err(TagFilterError::Empty);
        }
        let mut alternatives = Vec::new();
        for (index, alternative) in trimmed.split('|').enumerate() {
            let alternative = alternative.trim();
            if alternative.is_empty() {
                return Err(TagFilterError::EmptyAlternative {
                    pattern: trimmed.to_owned(),
                    index,
                });
            }
            alternatives.push(alternative.chars().collect());
        }
        Ok(Self {
            pattern: trimmed.to_owned(),
            alternatives,
        })
    }

    /// The source pattern.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Whether an entity with `tag` passes.
    pub fn accepts(&self, tag: Option<&str>) -> bool {
        let Some(tag) = tag else {
            return true;
        };
        let tag: Vec<char> = tag.chars().collect();
        self.alternatives
            .iter()
            .any(|glob| glob_matches(glob, &tag))
    }
}

impl std::str::FromStr for TagFilter {
    type Err = TagFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Iterative wildcard match, backtracking to the most recent `*`.
fn glob_matches(glob: &[char], text: &[char]) -> bool {
    let (mut g, mut t) = (0, 0);
    let mut star: Option<(usize, usize)> = None;
    while t < text.len() {
        match glob.get(g) {
            Some('*') => {
                star = Some((g, t));
                g += 1;
            }
            Some(&c) if c == '?' || c == text[t] => {
                g += 1;
                t += 1;
            }
            _ => match star {
                Some((star_g, star_t)) => {
                    g = star_g + 1;
                    t = star_t + 1;
                    star = Some((star_g, star_t + 1));
                }
                None => return false,
            },
        }
    }
    glob[g..].iter().all(|&c| c == '*')
}
