//! Parsing of the `Link` pagination header
//!
//! The header is a comma separated list of relations:
//!
//! ```text
//! <https://api.github.com/search/repositories?q=octo&per_page=40&page=2>; rel="next",
//! <https://api.github.com/search/repositories?q=octo&per_page=40&page=25>; rel="last"
//! ```
//!
//! Only the `last` relation is of interest: its `page` parameter is the
//! number of the final page.

const LAST_RELATION: &str = "rel=\"last\"";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("no rel=\"last\" relation")]
    MissingLastRelation,

    #[error("rel=\"last\" has no <url>")]
    MissingUrl,

    #[error("last url has no page parameter")]
    MissingPageParam,

    #[error("invalid page number '{0}'")]
    InvalidPage(String),
}

/// Extract the last page number from a `Link` header value.
pub fn parse_last_page(link: &str) -> Result<u32, ParseError> {
    let relation = link
        .split(',')
        .rev()
        .find(|part| part.contains(LAST_RELATION))
        .ok_or(ParseError::MissingLastRelation)?;

    let start = relation.find('<').ok_or(ParseError::MissingUrl)?;
    let end = relation[start..]
        .find('>')
        .map(|offset| start + offset)
        .ok_or(ParseError::MissingUrl)?;
    let url = &relation[start + 1..end];

    let (_, query_string) = url.split_once('?').ok_or(ParseError::MissingPageParam)?;
    let value = query_string
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .filter(|(key, _)| *key == "page")
        .map(|(_, value)| value)
        .last()
        .ok_or(ParseError::MissingPageParam)?;

    match value.parse::<u32>() {
        Ok(page) if page > 0 => Ok(page),
        _ => Err(ParseError::InvalidPage(value.to_string())),
    }
}
